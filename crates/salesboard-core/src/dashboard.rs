use chrono::{DateTime, NaiveDate, Utc};
use salesboard_sheets::coerce::iso_week_of;
use serde::Serialize;
use tracing::info;

use crate::aggregate::{
    department_summaries, top_products, weekly_series, DepartmentSummary, PeriodBreakdown,
    ProductSummary, WeeklySeries,
};
use crate::config::{DashboardConfig, WeekWindow};
use crate::error::Result;
use crate::fetch::{FetchOutcome, Fetcher, SourceLoad, SourceWarning, WorksheetSource};
use crate::pacing::{completion_ratio, hit_rate, weekly_goal, Pacing};
use crate::partition::{partition, tag_periods, Period, PeriodWindows};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub current_week: u32,
    pub period: WeekWindow,
    pub reporting: WeekWindow,
    pub year: Option<i32>,
    pub weekly: WeeklySeries,
    pub total_goal: f64,
    pub total_sold: f64,
    pub total_sold_count: usize,
    pub completion_ratio: f64,
    pub weekly_goal: f64,
    pub pacing: Pacing,
    pub hit_rate: f64,
    pub quarter: PeriodBreakdown,
    pub departments: Vec<DepartmentSummary>,
    pub top_products: Vec<ProductSummary>,
    pub sources: Vec<SourceLoad>,
    pub warnings: Vec<SourceWarning>,
}

impl Dashboard {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Week used for pacing. With a pinned year, a later year means the whole
/// window has elapsed and an earlier one means none of it has.
fn elapsed_through(today: NaiveDate, year: Option<i32>) -> u32 {
    let (iso_year, week) = iso_week_of(today);
    match year {
        Some(year) if iso_year > year => u32::MAX,
        Some(year) if iso_year < year => 0,
        _ => week,
    }
}

pub fn build_dashboard(
    config: &DashboardConfig,
    outcome: &FetchOutcome,
    today: NaiveDate,
    generated_at: DateTime<Utc>,
) -> Result<Dashboard> {
    let quarter_window = config.quarter_window();
    let windows = PeriodWindows {
        quarter: quarter_window,
        reporting: config.reporting_window(),
        year: config.period.year,
    };
    let df = tag_periods(&outcome.frame, &windows)?;

    let quarter_buckets = partition(&df, Period::Quarter)?;
    let quarter = PeriodBreakdown::from_buckets(&df, &quarter_buckets)?;
    let weekly = weekly_series(&df, &quarter_buckets.sold, quarter_window)?;

    let total_goal = config.total_goal();
    let total_sold = quarter.sold.sum;
    let (_, current_week) = iso_week_of(today);
    let pacing = Pacing::compute(
        total_goal,
        total_sold,
        quarter_window,
        elapsed_through(today, config.period.year),
    );

    let departments = department_summaries(&df, &config.sources, &outcome.failed_sources())?;
    let top = top_products(&df, &quarter_buckets.sold, config.dashboard.top_products)?;

    Ok(Dashboard {
        title: config.dashboard.title.clone(),
        generated_at,
        today,
        current_week,
        period: quarter_window,
        reporting: windows.reporting,
        year: config.period.year,
        weekly,
        total_goal,
        total_sold,
        total_sold_count: quarter.sold.count,
        completion_ratio: completion_ratio(total_sold, total_goal),
        weekly_goal: weekly_goal(total_goal, quarter_window),
        pacing,
        hit_rate: hit_rate(
            quarter.sold.count,
            quarter.offered.count,
            quarter.rejected.count,
        ),
        quarter,
        departments,
        top_products: top,
        sources: outcome.loaded.clone(),
        warnings: outcome.warnings.clone(),
    })
}

/// One full refresh cycle: fetch every source, then aggregate.
pub async fn refresh_dashboard(
    config: &DashboardConfig,
    source: &dyn WorksheetSource,
    now: DateTime<Utc>,
) -> Result<Dashboard> {
    let fetcher = Fetcher::new(source, config.fetch_delay());
    let outcome = fetcher
        .fetch_all(&config.sources, &config.columns, &config.statuses)
        .await?;

    let today = now.with_timezone(&config.timezone()).date_naive();
    let dashboard = build_dashboard(config, &outcome, today, now)?;

    info!(
        backend = source.kind(),
        rows = outcome.frame.height(),
        loaded = dashboard.sources.len(),
        failed = dashboard.warnings.len(),
        total_sold = dashboard.total_sold,
        total_goal = dashboard.total_goal,
        completion_ratio = dashboard.completion_ratio,
        current_week = dashboard.current_week,
        "Dashboard refreshed"
    );

    Ok(dashboard)
}
