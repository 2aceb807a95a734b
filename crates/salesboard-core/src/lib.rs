pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod pacing;
pub mod partition;

pub use cache::TimedCache;
pub use config::{DashboardConfig, Source, WeekWindow};
pub use dashboard::{build_dashboard, refresh_dashboard, Dashboard};
pub use error::{DashboardError, Result};
pub use fetch::{FetchError, FetchOutcome, Fetcher, SourceLoad, SourceWarning, WorksheetSource};
