use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::coerce::iso_week_of;
use crate::model::NormalizedRow;

/// Days between 0001-01-01 and 1970-01-01; polars stores dates as days since the epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub const SALES_COLUMNS: [&str; 7] = [
    "source",
    "product",
    "amount",
    "event_date",
    "iso_year",
    "week",
    "status",
];

/// Builds the normalized sales frame for one source. The schema is fixed so
/// frames from different sources (or empty ones) always stack.
pub fn sales_frame(source: &str, rows: &[NormalizedRow]) -> Result<DataFrame, PolarsError> {
    let len = rows.len();

    let mut products: Vec<&str> = Vec::with_capacity(len);
    let mut amounts: Vec<Option<f64>> = Vec::with_capacity(len);
    let mut dates: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut iso_years: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut weeks: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut statuses: Vec<&str> = Vec::with_capacity(len);

    for row in rows {
        products.push(row.product.as_str());
        amounts.push(row.amount);
        dates.push(row.event_date.map(date_to_epoch_days));
        let iso = row.event_date.map(iso_week_of);
        iso_years.push(iso.map(|(year, _)| year));
        weeks.push(iso.map(|(_, week)| week as i32));
        statuses.push(row.status.as_str());
    }

    let date_series = Series::new("event_date".into(), dates).cast(&DataType::Date)?;

    DataFrame::new(vec![
        Series::new("source".into(), vec![source; len]).into(),
        Series::new("product".into(), products).into(),
        Series::new("amount".into(), amounts).into(),
        date_series.into(),
        Series::new("iso_year".into(), iso_years).into(),
        Series::new("week".into(), weeks).into(),
        Series::new("status".into(), statuses).into(),
    ])
}

pub fn empty_sales_frame() -> Result<DataFrame, PolarsError> {
    sales_frame("", &[])
}

/// Concatenates per-source frames in order.
pub fn stack_frames(frames: Vec<DataFrame>) -> Result<DataFrame, PolarsError> {
    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return empty_sales_frame();
    };
    for df in iter {
        combined.vstack_mut(&df)?;
    }
    Ok(combined)
}

pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}
