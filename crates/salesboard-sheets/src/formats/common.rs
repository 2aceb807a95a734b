use crate::coerce::{parse_amount, parse_day_first_date};
use crate::errors::SheetError;
use crate::formats::{ColumnAliases, StatusVocabulary};
use crate::model::{Cell, NormalizedRow, RawWorksheet, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OfferColumns {
    pub product: Option<usize>,
    pub amount: Option<usize>,
    pub date: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedColumns {
    pub product: usize,
    pub amount: usize,
    pub date: Option<usize>,
    pub status: Option<usize>,
    pub offer: Option<OfferColumns>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum StatusSource<'a> {
    /// Sheets without a status column only ever list completed sales.
    AlwaysSold,
    Column {
        index: usize,
        vocabulary: &'a StatusVocabulary,
    },
}

#[derive(Debug, Default)]
pub(crate) struct RowCollection {
    pub rows: Vec<NormalizedRow>,
    pub skipped_rows: usize,
    pub unparsed_amounts: usize,
    pub missing_dates: usize,
}

pub(crate) fn find_column(header: &[Cell], aliases: &[String]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        let wanted = alias.trim().to_lowercase();
        header.iter().position(|cell| {
            cell.as_text()
                .is_some_and(|text| text.trim().to_lowercase() == wanted)
        })
    })
}

pub(crate) fn resolve_columns(
    format: &'static str,
    sheet: &RawWorksheet,
    aliases: &ColumnAliases,
) -> Result<ResolvedColumns, SheetError> {
    let header = sheet.header().ok_or_else(|| SheetError::EmptyWorksheet {
        worksheet: sheet.name.clone(),
    })?;

    let product = find_column(header, &aliases.product).ok_or_else(|| SheetError::FormatMismatch {
        format,
        reason: format!("no product column (tried {:?})", aliases.product),
    })?;
    let amount = find_column(header, &aliases.amount).ok_or_else(|| SheetError::FormatMismatch {
        format,
        reason: format!("no amount column (tried {:?})", aliases.amount),
    })?;

    if product == amount {
        return Err(SheetError::InvalidHeader {
            worksheet: sheet.name.clone(),
            column_index: product,
            message: "product and amount resolve to the same column".to_string(),
        });
    }

    let offer = OfferColumns {
        product: find_column(header, &aliases.offer_product),
        amount: find_column(header, &aliases.offer_amount),
        date: find_column(header, &aliases.offer_date),
    };
    let has_offer = offer.product.is_some() || offer.amount.is_some() || offer.date.is_some();

    Ok(ResolvedColumns {
        product,
        amount,
        date: find_column(header, &aliases.date),
        status: find_column(header, &aliases.status),
        offer: has_offer.then_some(offer),
    })
}

pub(crate) fn collect_rows(
    sheet: &RawWorksheet,
    columns: &ResolvedColumns,
    status_source: StatusSource<'_>,
) -> RowCollection {
    let mut collection = RowCollection::default();

    for row in sheet.data_rows() {
        if row.iter().all(Cell::is_blank) {
            continue;
        }

        let status = match status_source {
            StatusSource::AlwaysSold => Status::Sold,
            StatusSource::Column { index, vocabulary } => RawWorksheet::cell(row, index)
                .as_text()
                .map_or(Status::Unknown, |label| vocabulary.classify(&label)),
        };

        let offer = match (status, columns.offer) {
            (Status::Offered | Status::Rejected, Some(offer)) => Some(offer),
            _ => None,
        };

        let product_cell = pick_cell(row, offer.and_then(|o| o.product), columns.product);
        let amount_cell = pick_cell(row, offer.and_then(|o| o.amount), columns.amount);
        let date_cell = match (offer.and_then(|o| o.date), columns.date) {
            (Some(offer_index), main) => {
                let offered = RawWorksheet::cell(row, offer_index);
                if offered.is_blank() {
                    main.map(|index| RawWorksheet::cell(row, index))
                } else {
                    Some(offered)
                }
            }
            (None, main) => main.map(|index| RawWorksheet::cell(row, index)),
        };

        if product_cell.is_blank() || amount_cell.is_blank() {
            collection.skipped_rows += 1;
            continue;
        }

        let product = product_cell
            .as_text()
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        let amount = parse_amount(amount_cell);
        if amount.is_none() {
            collection.unparsed_amounts += 1;
        }

        let event_date = date_cell.and_then(parse_day_first_date);
        if event_date.is_none() {
            collection.missing_dates += 1;
        }

        collection.rows.push(NormalizedRow {
            product,
            amount,
            event_date,
            status,
        });
    }

    collection
}

fn pick_cell(row: &[Cell], preferred: Option<usize>, fallback: usize) -> &Cell {
    match preferred {
        Some(index) if !RawWorksheet::cell(row, index).is_blank() => RawWorksheet::cell(row, index),
        _ => RawWorksheet::cell(row, fallback),
    }
}
