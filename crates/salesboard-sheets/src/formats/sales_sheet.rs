use crate::errors::SheetError;
use crate::formats::{collect_rows, resolve_columns, ColumnAliases, StatusSource, StatusVocabulary};
use crate::frame::sales_frame;
use crate::model::{NormalizedSheet, RawWorksheet};
use crate::registry::SheetFormat;

/// Plain sales ledgers (product, price, sale date). Every record is a sale.
pub struct SalesSheetFormat;

const FORMAT_NAME: &str = "sales_sheet_v1";

impl SheetFormat for SalesSheetFormat {
    fn name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn normalize(
        &self,
        source: &str,
        sheet: &RawWorksheet,
        aliases: &ColumnAliases,
        _vocabulary: &StatusVocabulary,
    ) -> Result<NormalizedSheet, SheetError> {
        let mut columns = resolve_columns(FORMAT_NAME, sheet, aliases)?;
        // Without statuses there is nothing to route to the offer columns.
        columns.offer = None;

        let collection = collect_rows(sheet, &columns, StatusSource::AlwaysSold);
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
