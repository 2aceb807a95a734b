use chrono::{Datelike, Duration, NaiveDate};

use crate::model::Cell;

/// Two-digit years must be tried before `%Y`, which would otherwise read "25" as year 25.
static DATE_FORMATS: &[&str] = &[
    "%d-%m-%y", "%d/%m/%y", "%d.%m.%y", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d",
];

/// Largest serial the spreadsheet epoch can represent (31-12-9999).
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

const CURRENCY_MARKERS: &[&str] = &["dkk", "kr.", "kr", ",-"];

pub fn parse_day_first_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(serial) => serial_to_date(*serial),
        Cell::Text(text) => parse_date_text(text),
        Cell::Bool(_) | Cell::Empty => None,
    }
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or_default();
    if date_part.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Coerces a price cell. Negative, non-finite and unparseable values are missing.
pub fn parse_amount(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(value) => *value,
        Cell::Text(text) => parse_amount_text(text)?,
        Cell::Bool(_) | Cell::Empty => return None,
    };

    (value.is_finite() && value >= 0.0).then_some(value)
}

fn parse_amount_text(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();

    for marker in CURRENCY_MARKERS {
        if let Some(stripped) = cleaned.strip_suffix(marker) {
            cleaned = stripped.to_string();
        }
        if let Some(stripped) = cleaned.strip_prefix(marker) {
            cleaned = stripped.to_string();
        }
    }

    if cleaned.is_empty() {
        return None;
    }

    let canonical = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(comma), None) => {
            let decimals = cleaned.len() - comma - 1;
            if cleaned.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, Some(dot)) => {
            let decimals = cleaned.len() - dot - 1;
            if cleaned.matches('.').count() > 1 || decimals == 3 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    canonical.parse::<f64>().ok()
}

/// Trims, collapses inner whitespace and title-cases every word.
pub fn title_case_label(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut titled: String = first.to_uppercase().collect();
                    titled.push_str(&chars.as_str().to_lowercase());
                    titled
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `(iso_year, iso_week)`.
pub fn iso_week_of(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}
