use std::path::PathBuf;

use chrono::{NaiveDate, TimeZone, Utc};
use salesboard_core::config::DashboardConfig;
use salesboard_core::fetch::{CsvDirectorySource, StaticWorksheets};
use salesboard_core::{build_dashboard, refresh_dashboard, Fetcher};
use salesboard_sheets::{Cell, RawWorksheet};

const CONFIG: &str = r#"
[dashboard]
title = "Channels - Q3"
fetch_delay_ms = 0

[period]
start_week = 27
end_week = 39

[[sources]]
name = "Google Ads"
sheet_id = "ads-sheet"
worksheet = "Mersalg"
goal = 96555

[[sources]]
name = "Social"
sheet_id = "social-sheet"
goal = 90880

[[sources]]
name = "SEO"
sheet_id = "seo-sheet"
goal = 80000
"#;

fn sheets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/sheets")
}

fn sheet(name: &str, rows: &[&[&str]]) -> RawWorksheet {
    RawWorksheet::new(
        name,
        rows.iter()
            .map(|row| row.iter().map(|value| Cell::from(*value)).collect())
            .collect(),
    )
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[tokio::test]
async fn csv_sources_with_one_missing_department() {
    let config = DashboardConfig::from_toml_str(CONFIG).unwrap();
    let source = CsvDirectorySource::new(sheets_dir());
    let now = Utc.with_ymd_and_hms(2025, 9, 15, 10, 0, 0).unwrap();

    let dashboard = refresh_dashboard(&config, &source, now).await.unwrap();

    assert_eq!(dashboard.current_week, 38);
    assert_eq!(dashboard.warnings.len(), 1);
    assert_eq!(dashboard.warnings[0].source, "Social");
    assert_eq!(dashboard.sources.len(), 2);

    // Goals of failed sources still count.
    assert!(approx(dashboard.total_goal, 267_435.0));
    assert!(approx(dashboard.total_sold, 28_985.0));
    assert_eq!(dashboard.total_sold_count, 6);
    assert!(approx(dashboard.weekly.total(), dashboard.total_sold));
    assert!(approx(
        dashboard.completion_ratio,
        28_985.0 / 267_435.0
    ));

    assert_eq!(dashboard.weekly.len(), 13);
    assert_eq!(dashboard.weekly.amount(27), Some(9_000.0));
    assert_eq!(dashboard.weekly.amount(28), Some(14_990.0));
    assert_eq!(dashboard.weekly.amount(29), Some(4_995.0));
    assert_eq!(dashboard.weekly.amount(30), Some(0.0));

    assert_eq!(dashboard.pacing.remaining_weeks, 1);
    assert!(approx(dashboard.pacing.pacing_target, 238_450.0));
    assert!(approx(dashboard.weekly_goal, 267_435.0 / 13.0));
    assert!(approx(dashboard.hit_rate, 6.0 / 9.0 * 100.0));

    let department_total: f64 = dashboard
        .departments
        .iter()
        .map(|department| department.quarter.sold.sum)
        .sum();
    assert!(approx(department_total, dashboard.total_sold));

    let seo = &dashboard.departments[2];
    assert_eq!(seo.source, "SEO");
    assert_eq!(seo.quarter.offered.count, 2);
    assert!(approx(seo.quarter.offered.sum, 18_000.0));
    assert_eq!(seo.quarter.rejected.count, 1);
    assert_eq!(seo.quarter.unknown_count, 1);
    assert!(!dashboard.departments[1].loaded);

    let products: Vec<&str> = dashboard
        .top_products
        .iter()
        .map(|product| product.product.as_str())
        .collect();
    assert_eq!(
        products,
        vec![
            "Google Ads Pro",
            "Google Ads Basis",
            "SEO Plus",
            "SEO Start",
            "Shopping Kampagne"
        ]
    );
}

#[tokio::test]
async fn every_source_failing_gives_a_zero_dashboard() {
    let config = DashboardConfig::from_toml_str(CONFIG).unwrap();
    let source = StaticWorksheets::new();
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();

    let dashboard = refresh_dashboard(&config, &source, now).await.unwrap();

    assert_eq!(dashboard.warnings.len(), 3);
    assert_eq!(dashboard.total_sold, 0.0);
    assert_eq!(dashboard.completion_ratio, 0.0);
    assert_eq!(dashboard.hit_rate, 0.0);
    assert_eq!(dashboard.weekly.len(), 13);
    assert!(dashboard.weekly.points.iter().all(|point| point.amount == 0.0));
    assert!(dashboard.top_products.is_empty());
    assert!(dashboard.departments.iter().all(|department| !department.loaded));
}

#[tokio::test]
async fn zero_goals_keep_the_ratio_at_zero() {
    let config = DashboardConfig::from_toml_str(
        r#"
        [dashboard]
        fetch_delay_ms = 0

        [period]
        start_week = 27
        end_week = 39

        [[sources]]
        name = "Project"
        sheet_id = "project-sheet"
        goal = 0
        "#,
    )
    .unwrap();
    let source = StaticWorksheets::new().with_sheet(
        "project-sheet",
        sheet(
            "Salg",
            &[&["Produkt", "Pris", "Dato for salg"], &["Website", "25000", "07-07-2025"]],
        ),
    );

    let outcome = Fetcher::new(&source, config.fetch_delay())
        .fetch_all(&config.sources, &config.columns, &config.statuses)
        .await
        .unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
    let dashboard = build_dashboard(&config, &outcome, today, Utc::now()).unwrap();

    assert_eq!(dashboard.total_sold, 25_000.0);
    assert_eq!(dashboard.completion_ratio, 0.0);
    assert_eq!(dashboard.pacing.remaining_goal, 0.0);
    assert_eq!(dashboard.weekly_goal, 0.0);
}

#[tokio::test]
async fn pinned_year_ignores_other_years_and_closes_the_window() {
    let config = DashboardConfig::from_toml_str(
        r#"
        [dashboard]
        fetch_delay_ms = 0

        [period]
        start_week = 27
        end_week = 39
        year = 2025

        [[sources]]
        name = "Project"
        sheet_id = "project-sheet"
        goal = 1000
        "#,
    )
    .unwrap();
    let source = StaticWorksheets::new().with_sheet(
        "project-sheet",
        sheet(
            "Salg",
            &[
                &["Produkt", "Pris", "Dato for salg"],
                &["Website", "400", "07-07-2025"],
                &["Website", "900", "06-07-2026"],
            ],
        ),
    );
    let now = Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap();

    let dashboard = refresh_dashboard(&config, &source, now).await.unwrap();

    assert_eq!(dashboard.total_sold, 400.0);
    assert_eq!(dashboard.pacing.remaining_weeks, 0);
    assert_eq!(dashboard.pacing.pacing_target, 600.0);
    assert_eq!(dashboard.departments[0].all_rows.sold.count, 2);
}

#[tokio::test]
async fn dashboard_serializes_to_json() {
    let config = DashboardConfig::from_toml_str(CONFIG).unwrap();
    let source = CsvDirectorySource::new(sheets_dir());
    let now = Utc.with_ymd_and_hms(2025, 8, 4, 9, 0, 0).unwrap();

    let dashboard = refresh_dashboard(&config, &source, now).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&dashboard.to_json().unwrap()).unwrap();

    assert_eq!(json["title"], "Channels - Q3");
    assert_eq!(json["weekly"]["points"][0]["label"], "Uge 27");
    assert_eq!(json["warnings"][0]["source"], "Social");
    assert_eq!(json["departments"].as_array().map(Vec::len), Some(3));
}
