use crate::errors::{FormatAttempt, SheetError};
use crate::formats::{ColumnAliases, SalesSheetFormat, StatusSheetFormat, StatusVocabulary};
use crate::model::{NormalizedSheet, RawWorksheet};

pub trait SheetFormat {
    fn name(&self) -> &'static str;
    fn normalize(
        &self,
        source: &str,
        sheet: &RawWorksheet,
        aliases: &ColumnAliases,
        vocabulary: &StatusVocabulary,
    ) -> Result<NormalizedSheet, SheetError>;
}

pub fn normalize_worksheet(
    source: &str,
    sheet: &RawWorksheet,
    aliases: &ColumnAliases,
    vocabulary: &StatusVocabulary,
) -> Result<NormalizedSheet, SheetError> {
    let status_sheet = StatusSheetFormat;
    let sales_sheet = SalesSheetFormat;
    let formats: [&dyn SheetFormat; 2] = [&status_sheet, &sales_sheet];
    normalize_with_formats(source, sheet, aliases, vocabulary, &formats)
}

pub fn normalize_with_formats(
    source: &str,
    sheet: &RawWorksheet,
    aliases: &ColumnAliases,
    vocabulary: &StatusVocabulary,
    formats: &[&dyn SheetFormat],
) -> Result<NormalizedSheet, SheetError> {
    if sheet.header().is_none() {
        return Err(SheetError::EmptyWorksheet {
            worksheet: sheet.name.clone(),
        });
    }

    let mut attempts = Vec::new();

    for format in formats {
        match format.normalize(source, sheet, aliases, vocabulary) {
            Ok(normalized) => return Ok(normalized),
            Err(SheetError::FormatMismatch { reason, .. }) => {
                attempts.push(FormatAttempt::new(format.name(), reason));
            }
            Err(err) => return Err(err),
        }
    }

    Err(SheetError::NoMatchingFormat {
        worksheet: sheet.name.clone(),
        attempts,
    })
}
