use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct FormatAttempt {
    pub format: &'static str,
    pub message: String,
}

impl FormatAttempt {
    pub fn new(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
        }
    }
}

impl fmt::Display for FormatAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.format, self.message)
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("{format} layout mismatch: {reason}")]
    FormatMismatch {
        format: &'static str,
        reason: String,
    },

    #[error("worksheet '{worksheet}' has no header row")]
    EmptyWorksheet { worksheet: String },

    #[error("worksheet '{worksheet}' header cell {column_index} invalid: {message}")]
    InvalidHeader {
        worksheet: String,
        column_index: usize,
        message: String,
    },

    #[error("worksheet CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to build normalized frame: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("no layout recognized worksheet '{worksheet}'; attempts: {attempts:?}")]
    NoMatchingFormat {
        worksheet: String,
        attempts: Vec<FormatAttempt>,
    },
}
