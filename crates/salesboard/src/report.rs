use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use salesboard_core::config::DashboardConfig;
use salesboard_core::{Dashboard, FetchOutcome};

use crate::render::format_kr;

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

fn amount_cell(amount: f64) -> Cell {
    Cell::new(format_kr(amount)).set_alignment(CellAlignment::Right)
}

pub fn summary_table(dashboard: &Dashboard) -> Table {
    let mut summary = table(&["Nøgletal", "Værdi"]);
    summary
        .add_row(vec![Cell::new("Solgt i perioden"), amount_cell(dashboard.total_sold)])
        .add_row(vec![Cell::new("Mål"), amount_cell(dashboard.total_goal)])
        .add_row(vec![
            Cell::new("Realiseret"),
            Cell::new(format!("{:.2}%", dashboard.completion_ratio * 100.0)),
        ])
        .add_row(vec![Cell::new("Mål pr. uge"), amount_cell(dashboard.weekly_goal)])
        .add_row(vec![
            Cell::new(format!(
                "Nyt ugemål ({} uger tilbage)",
                dashboard.pacing.remaining_weeks
            )),
            amount_cell(dashboard.pacing.pacing_target),
        ])
        .add_row(vec![
            Cell::new("Hit rate"),
            Cell::new(format!("{:.1}%", dashboard.hit_rate)),
        ])
        .add_row(vec![
            Cell::new("Antal produkter solgt"),
            Cell::new(dashboard.total_sold_count),
        ]);
    summary
}

pub fn weekly_table(dashboard: &Dashboard) -> Table {
    let mut weekly = table(&["Uge", "Solgt"]);
    for point in &dashboard.weekly.points {
        let label = if point.week == dashboard.current_week {
            format!("{} *", point.label)
        } else {
            point.label.clone()
        };
        weekly.add_row(vec![Cell::new(label), amount_cell(point.amount)]);
    }
    weekly
}

pub fn department_table(dashboard: &Dashboard) -> Table {
    let mut departments = table(&[
        "Afdeling",
        "Mål",
        "Solgt",
        "Tilbudt",
        "Afvist",
        "Solgt år til dato",
        "Rækker",
    ]);
    for department in &dashboard.departments {
        let name = if department.loaded {
            department.source.clone()
        } else {
            format!("{} (fejlede)", department.source)
        };
        departments.add_row(vec![
            Cell::new(name),
            amount_cell(department.goal),
            amount_cell(department.quarter.sold.sum),
            amount_cell(department.quarter.offered.sum),
            amount_cell(department.quarter.rejected.sum),
            amount_cell(department.year_to_date.sold.sum),
            Cell::new(department.all_rows.row_count()),
        ]);
    }
    departments
}

pub fn product_table(dashboard: &Dashboard) -> Table {
    let mut products = table(&["Produkt", "Antal", "Solgt"]);
    for product in &dashboard.top_products {
        products.add_row(vec![
            Cell::new(&product.product),
            Cell::new(product.count),
            amount_cell(product.sum),
        ]);
    }
    products
}

pub fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", dashboard.title);
    for warning in &dashboard.warnings {
        println!("ADVARSEL: {}: {}", warning.source, warning.message);
    }
    println!("{}", summary_table(dashboard));
    println!("{}", weekly_table(dashboard));
    println!("{}", department_table(dashboard));
    println!("{}", product_table(dashboard));
}

pub fn source_check_table(config: &DashboardConfig, outcome: &FetchOutcome) -> Table {
    let mut sources = table(&[
        "Kilde",
        "Ark",
        "Format",
        "Rækker",
        "Sprunget over",
        "Ugyldigt beløb",
        "Mangler dato",
        "Fejl",
    ]);
    for source in &config.sources {
        let worksheet = format!("{}/{}", source.sheet_id, source.worksheet);
        if let Some(load) = outcome.loaded.iter().find(|load| load.source == source.name) {
            sources.add_row(vec![
                Cell::new(&source.name),
                Cell::new(worksheet),
                Cell::new(load.format),
                Cell::new(load.records),
                Cell::new(load.skipped_rows),
                Cell::new(load.unparsed_amounts),
                Cell::new(load.missing_dates),
                Cell::new(""),
            ]);
        } else {
            let message = outcome
                .warnings
                .iter()
                .find(|warning| warning.source == source.name)
                .map(|warning| warning.message.as_str())
                .unwrap_or("not loaded");
            sources.add_row(vec![
                Cell::new(&source.name),
                Cell::new(worksheet),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(message),
            ]);
        }
    }
    sources
}

pub fn print_source_check(config: &DashboardConfig, outcome: &FetchOutcome) {
    println!("{}", source_check_table(config, outcome));
}
