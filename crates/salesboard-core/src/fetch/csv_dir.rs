use std::path::PathBuf;

use async_trait::async_trait;
use salesboard_sheets::RawWorksheet;

use super::{FetchError, WorksheetSource};

/// Reads exported worksheets from `<root>/<sheet_id>/<worksheet>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    root: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn worksheet_path(&self, sheet_id: &str, worksheet: &str) -> PathBuf {
        self.root.join(sheet_id).join(format!("{worksheet}.csv"))
    }
}

#[async_trait]
impl WorksheetSource for CsvDirectorySource {
    fn kind(&self) -> &'static str {
        "csv"
    }

    async fn fetch_worksheet(
        &self,
        sheet_id: &str,
        worksheet: &str,
    ) -> Result<RawWorksheet, FetchError> {
        let path = self.worksheet_path(sheet_id, worksheet);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::WorksheetNotFound {
                    sheet_id: sheet_id.to_string(),
                    worksheet: worksheet.to_string(),
                });
            }
            Err(source) => return Err(FetchError::Io { path, source }),
        };
        Ok(RawWorksheet::from_csv_reader(worksheet, bytes.as_slice())?)
    }
}
