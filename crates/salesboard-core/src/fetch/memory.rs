use std::collections::HashMap;

use async_trait::async_trait;
use salesboard_sheets::RawWorksheet;

use super::{FetchError, WorksheetSource};

/// Worksheets held in memory, keyed by sheet id. Used by tests and by
/// offline runs that already have the cells.
#[derive(Debug, Clone, Default)]
pub struct StaticWorksheets {
    sheets: HashMap<String, Vec<RawWorksheet>>,
    failures: HashMap<String, String>,
}

impl StaticWorksheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet_id: impl Into<String>, sheet: RawWorksheet) -> Self {
        self.sheets.entry(sheet_id.into()).or_default().push(sheet);
        self
    }

    /// Makes every fetch of `sheet_id` fail with the given upstream message.
    pub fn with_failure(mut self, sheet_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(sheet_id.into(), message.into());
        self
    }
}

#[async_trait]
impl WorksheetSource for StaticWorksheets {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn fetch_worksheet(
        &self,
        sheet_id: &str,
        worksheet: &str,
    ) -> Result<RawWorksheet, FetchError> {
        if let Some(message) = self.failures.get(sheet_id) {
            return Err(FetchError::Status {
                status: 429,
                body: message.clone(),
            });
        }

        self.sheets
            .get(sheet_id)
            .and_then(|sheets| sheets.iter().find(|sheet| sheet.name == worksheet))
            .cloned()
            .ok_or_else(|| FetchError::WorksheetNotFound {
                sheet_id: sheet_id.to_string(),
                worksheet: worksheet.to_string(),
            })
    }
}
