use crate::errors::SheetError;
use crate::formats::{collect_rows, resolve_columns, ColumnAliases, StatusSource, StatusVocabulary};
use crate::frame::sales_frame;
use crate::model::{NormalizedSheet, RawWorksheet};
use crate::registry::SheetFormat;

/// Pipeline sheets: one row per opportunity with a status column and,
/// optionally, a separate offer product/amount/date triple.
pub struct StatusSheetFormat;

const FORMAT_NAME: &str = "status_sheet_v1";

impl SheetFormat for StatusSheetFormat {
    fn name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn normalize(
        &self,
        source: &str,
        sheet: &RawWorksheet,
        aliases: &ColumnAliases,
        vocabulary: &StatusVocabulary,
    ) -> Result<NormalizedSheet, SheetError> {
        let columns = resolve_columns(FORMAT_NAME, sheet, aliases)?;
        let Some(status_index) = columns.status else {
            return Err(SheetError::FormatMismatch {
                format: FORMAT_NAME,
                reason: format!("no status column (tried {:?})", aliases.status),
            });
        };

        let collection = collect_rows(
            sheet,
            &columns,
            StatusSource::Column {
                index: status_index,
                vocabulary,
            },
        );
        let frame = sales_frame(source, &collection.rows)?;

        Ok(NormalizedSheet {
            worksheet: sheet.name.clone(),
            format: FORMAT_NAME,
            frame,
            skipped_rows: collection.skipped_rows,
            unparsed_amounts: collection.unparsed_amounts,
            missing_dates: collection.missing_dates,
        })
    }
}
