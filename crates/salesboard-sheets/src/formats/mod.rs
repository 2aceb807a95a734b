mod common;
mod sales_sheet;
mod status_sheet;

pub use sales_sheet::SalesSheetFormat;
pub use status_sheet::StatusSheetFormat;

pub(crate) use common::{collect_rows, resolve_columns, StatusSource};

use serde::{Deserialize, Serialize};

use crate::coerce::title_case_label;
use crate::model::Status;

/// Header aliases per logical column, tried in order. The first alias present
/// in the header wins, which covers renamed columns between sheet revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub product: Vec<String>,
    pub amount: Vec<String>,
    pub date: Vec<String>,
    pub status: Vec<String>,
    pub offer_product: Vec<String>,
    pub offer_amount: Vec<String>,
    pub offer_date: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            product: strings(&["Produkt"]),
            amount: strings(&["Pris"]),
            date: strings(&["Dato for salg", "Dato"]),
            status: strings(&["Status"]),
            offer_product: strings(&["Tilbudt produkt"]),
            offer_amount: strings(&["Tilbudspris"]),
            offer_date: strings(&["Tilbudsdato"]),
        }
    }
}

/// Status labels recognised per canonical status, including known misspellings.
/// Labels are compared after trimming and title-casing, so casing in the
/// configuration does not matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusVocabulary {
    pub sold: Vec<String>,
    pub offered: Vec<String>,
    pub rejected: Vec<String>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self {
            sold: strings(&["Solgt", "Sold"]),
            offered: strings(&["Tilbudt", "Tilbud Sendt", "Offered"]),
            rejected: strings(&["Afvist", "Afvidst", "Rejected"]),
        }
    }
}

impl StatusVocabulary {
    pub fn classify(&self, raw: &str) -> Status {
        let label = title_case_label(raw);
        if label.is_empty() {
            return Status::Unknown;
        }

        let groups = [
            (Status::Sold, &self.sold),
            (Status::Offered, &self.offered),
            (Status::Rejected, &self.rejected),
        ];
        for (status, labels) in groups {
            if labels.iter().any(|known| title_case_label(known) == label) {
                return status;
            }
        }

        Status::Unknown
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
