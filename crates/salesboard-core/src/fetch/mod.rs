mod credentials;
mod csv_dir;
mod google;
mod memory;

pub use credentials::{ServiceAccountKey, TokenProvider, SHEETS_SCOPES};
pub use csv_dir::CsvDirectorySource;
pub use google::{GoogleSheetsClient, DEFAULT_SHEETS_ENDPOINT};
pub use memory::StaticWorksheets;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use polars::prelude::*;
use salesboard_sheets::{
    normalize_worksheet, stack_frames, ColumnAliases, NormalizedSheet, RawWorksheet, SheetError,
    StatusVocabulary,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Source;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("worksheet '{worksheet}' not found in spreadsheet {sheet_id}")]
    WorksheetNotFound { sheet_id: String, worksheet: String },
    #[error("credentials error: {0}")]
    Credentials(String),
    #[error("failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid endpoint URL: {0}")]
    Endpoint(String),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Anything that can hand back the raw cell grid of a worksheet.
#[async_trait]
pub trait WorksheetSource: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn fetch_worksheet(
        &self,
        sheet_id: &str,
        worksheet: &str,
    ) -> Result<RawWorksheet, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLoad {
    pub source: String,
    pub format: &'static str,
    pub records: usize,
    pub skipped_rows: usize,
    pub unparsed_amounts: usize,
    pub missing_dates: usize,
}

impl SourceLoad {
    fn from_sheet(source: &str, sheet: &NormalizedSheet) -> Self {
        Self {
            source: source.to_string(),
            format: sheet.format,
            records: sheet.record_count(),
            skipped_rows: sheet.skipped_rows,
            unparsed_amounts: sheet.unparsed_amounts,
            missing_dates: sheet.missing_dates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceWarning {
    pub source: String,
    pub message: String,
}

/// Result of one pass over every configured source.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub frame: DataFrame,
    pub loaded: Vec<SourceLoad>,
    pub warnings: Vec<SourceWarning>,
}

impl FetchOutcome {
    /// Names of the sources that produced a warning instead of rows.
    pub fn failed_sources(&self) -> HashSet<&str> {
        self.warnings
            .iter()
            .map(|warning| warning.source.as_str())
            .collect()
    }
}

/// Error body text for warnings; a body that could not be read says so.
pub(crate) fn body_text<E: std::fmt::Display>(body: Result<String, E>) -> String {
    match body {
        Ok(text) => text,
        Err(err) => format!("<unreadable body: {err}>"),
    }
}

/// Sequential fetcher with a fixed pause between sources.
pub struct Fetcher<'a> {
    source: &'a dyn WorksheetSource,
    delay: Duration,
}

impl<'a> Fetcher<'a> {
    pub fn new(source: &'a dyn WorksheetSource, delay: Duration) -> Self {
        Self { source, delay }
    }

    pub async fn fetch_one(
        &self,
        source: &Source,
        aliases: &ColumnAliases,
        vocabulary: &StatusVocabulary,
    ) -> Result<NormalizedSheet, FetchError> {
        let raw = self
            .source
            .fetch_worksheet(&source.sheet_id, &source.worksheet)
            .await?;
        let normalized = normalize_worksheet(&source.name, &raw, aliases, vocabulary)?;
        debug!(
            source = %source.name,
            format = normalized.format,
            records = normalized.record_count(),
            skipped = normalized.skipped_rows,
            unparsed_amounts = normalized.unparsed_amounts,
            missing_dates = normalized.missing_dates,
            "Normalized worksheet"
        );
        Ok(normalized)
    }

    /// Fetches every source in order. A failing source becomes a warning and
    /// contributes no rows; it never aborts the pass.
    pub async fn fetch_all(
        &self,
        sources: &[Source],
        aliases: &ColumnAliases,
        vocabulary: &StatusVocabulary,
    ) -> Result<FetchOutcome, PolarsError> {
        let mut frames = Vec::with_capacity(sources.len());
        let mut loaded = Vec::with_capacity(sources.len());
        let mut warnings = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.fetch_one(source, aliases, vocabulary).await {
                Ok(normalized) => {
                    loaded.push(SourceLoad::from_sheet(&source.name, &normalized));
                    frames.push(normalized.frame);
                }
                Err(err) => {
                    warn!(
                        source = %source.name,
                        backend = self.source.kind(),
                        error = %err,
                        "Failed to load source"
                    );
                    warnings.push(SourceWarning {
                        source: source.name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(FetchOutcome {
            frame: stack_frames(frames)?,
            loaded,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesboard_sheets::Cell;

    #[test]
    fn unreadable_error_body_is_reported() {
        assert_eq!(body_text::<String>(Ok("quota".to_string())), "quota");
        assert_eq!(
            body_text(Err("connection reset")),
            "<unreadable body: connection reset>"
        );
    }

    fn sheet(rows: &[&[&str]]) -> RawWorksheet {
        RawWorksheet::new(
            "Salg",
            rows.iter()
                .map(|row| row.iter().map(|value| Cell::from(*value)).collect())
                .collect(),
        )
    }

    fn source(name: &str, sheet_id: &str) -> Source {
        Source {
            name: name.to_string(),
            sheet_id: sheet_id.to_string(),
            worksheet: "Salg".to_string(),
            goal: 100.0,
        }
    }

    #[tokio::test]
    async fn one_failing_source_out_of_three_is_a_warning() {
        let backend = StaticWorksheets::new()
            .with_sheet(
                "a",
                sheet(&[&["Produkt", "Pris", "Dato"], &["Banner", "100", "01-07-2025"]]),
            )
            .with_failure("b", "rate limit exceeded")
            .with_sheet(
                "c",
                sheet(&[&["Produkt", "Pris", "Dato"], &["Video", "50", "08-07-2025"]]),
            );
        let sources = [source("A", "a"), source("B", "b"), source("C", "c")];

        let outcome = Fetcher::new(&backend, Duration::ZERO)
            .fetch_all(&sources, &ColumnAliases::default(), &StatusVocabulary::default())
            .await
            .unwrap();

        assert_eq!(outcome.frame.height(), 2);
        assert_eq!(outcome.loaded.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].source, "B");
        assert!(outcome.warnings[0].message.contains("rate limit"));
        assert_eq!(outcome.failed_sources(), HashSet::from(["B"]));
    }

    #[tokio::test]
    async fn missing_required_column_fails_only_that_source() {
        let backend = StaticWorksheets::new()
            .with_sheet("a", sheet(&[&["Navn", "Pris"], &["x", "1"]]))
            .with_sheet("b", sheet(&[&["Produkt", "Pris"], &["y", "2"]]));
        let sources = [source("A", "a"), source("B", "b")];

        let outcome = Fetcher::new(&backend, Duration::ZERO)
            .fetch_all(&sources, &ColumnAliases::default(), &StatusVocabulary::default())
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].source, "A");
        assert_eq!(outcome.loaded[0].source, "B");
        assert_eq!(outcome.loaded[0].format, "sales_sheet_v1");
    }

    #[tokio::test]
    async fn every_source_failing_yields_an_empty_frame() {
        let backend = StaticWorksheets::new();
        let sources = [source("A", "a"), source("B", "b")];

        let outcome = Fetcher::new(&backend, Duration::ZERO)
            .fetch_all(&sources, &ColumnAliases::default(), &StatusVocabulary::default())
            .await
            .unwrap();

        assert_eq!(outcome.frame.height(), 0);
        assert_eq!(outcome.frame.get_column_names(), salesboard_sheets::SALES_COLUMNS);
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_delay_separates_consecutive_fetches() {
        let backend = StaticWorksheets::new()
            .with_sheet("a", sheet(&[&["Produkt", "Pris"], &["x", "1"]]))
            .with_sheet("b", sheet(&[&["Produkt", "Pris"], &["y", "2"]]))
            .with_sheet("c", sheet(&[&["Produkt", "Pris"], &["z", "3"]]));
        let sources = [source("A", "a"), source("B", "b"), source("C", "c")];

        let started = tokio::time::Instant::now();
        Fetcher::new(&backend, Duration::from_millis(1100))
            .fetch_all(&sources, &ColumnAliases::default(), &StatusVocabulary::default())
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(2200));
        assert!(elapsed < Duration::from_millis(3300));
    }
}
