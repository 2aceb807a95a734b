use salesboard_core::aggregate::WeeklySeries;
use salesboard_core::Dashboard;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 260.0;
const CHART_PADDING: f64 = 40.0;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f5f7fa; margin: 0; padding: 24px; color: #1d2733; }
h1 { text-align: center; margin: 0 0 16px; }
.warning { background: #fff4e5; border-left: 4px solid #ff9800; padding: 8px 12px; margin-bottom: 8px; }
.row { display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }
.card { flex: 1; min-width: 140px; text-align: center; padding: 10px; background: white; border-radius: 10px; box-shadow: 0 2px 8px rgba(0,0,0,0.05); }
.card .name { font-size: 18px; font-weight: bold; }
.card .value { font-size: 24px; }
.total { text-align: center; font-size: 24px; font-weight: bold; margin-bottom: 10px; }
.progress { background: #e0e0e0; border-radius: 10px; height: 30px; width: 100%; }
.progress .bar { background: linear-gradient(90deg, #1f77b4, #66b3ff); height: 30px; border-radius: 10px; }
table { border-collapse: collapse; width: 100%; background: white; }
th, td { padding: 6px 10px; border-bottom: 1px solid #e0e0e0; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.muted { color: #8a94a0; }
"#;

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Whole kroner with `.` as thousands separator, e.g. `96.555 kr.`.
pub fn format_kr(amount: f64) -> String {
    let rounded = amount.round().abs() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let sign = if amount.round() < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} kr.")
}

fn card(name: &str, value: &str, detail: &str) -> String {
    format!(
        r#"<div class="card"><div class="name">{}</div><div class="value">{}</div><div>{}</div></div>"#,
        escape(name),
        escape(value),
        escape(detail)
    )
}

fn weekly_chart(series: &WeeklySeries, weekly_goal: f64, pacing_target: f64, current_week: u32) -> String {
    if series.is_empty() {
        return String::new();
    }

    let max_amount = series
        .points
        .iter()
        .map(|point| point.amount)
        .fold(weekly_goal.max(pacing_target), f64::max);
    let scale_max = if max_amount > 0.0 { max_amount * 1.1 } else { 1.0 };
    let plot_width = CHART_WIDTH - 2.0 * CHART_PADDING;
    let plot_height = CHART_HEIGHT - 2.0 * CHART_PADDING;
    let step = if series.len() > 1 {
        plot_width / (series.len() - 1) as f64
    } else {
        0.0
    };
    let x_at = |idx: usize| CHART_PADDING + step * idx as f64;
    let y_at = |amount: f64| CHART_HEIGHT - CHART_PADDING - amount / scale_max * plot_height;

    let mut svg = format!(
        r#"<svg viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}" width="100%" role="img" aria-label="Salg pr. uge">"#
    );

    if let Some(idx) = series.points.iter().position(|point| point.week == current_week) {
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{CHART_PADDING}" width="{:.1}" height="{plot_height}" fill="lightblue" opacity="0.3"/>"#,
            x_at(idx) - step.max(20.0) / 4.0,
            step.max(20.0) / 2.0
        ));
    }

    for (value, color, label) in [
        (weekly_goal, "orange", "Mål pr. uge"),
        (pacing_target, "red", "Nyt ugemål"),
    ] {
        if value > 0.0 {
            let y = y_at(value);
            svg.push_str(&format!(
                r#"<line x1="{CHART_PADDING}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{color}" stroke-dasharray="6 4"><title>{label}: {}</title></line>"#,
                CHART_WIDTH - CHART_PADDING,
                format_kr(value)
            ));
        }
    }

    let points: Vec<String> = series
        .points
        .iter()
        .enumerate()
        .map(|(idx, point)| format!("{:.1},{:.1}", x_at(idx), y_at(point.amount)))
        .collect();
    svg.push_str(&format!(
        r#"<polyline fill="none" stroke="steelblue" stroke-width="2" points="{}"/>"#,
        points.join(" ")
    ));

    for (idx, point) in series.points.iter().enumerate() {
        let (x, y) = (x_at(idx), y_at(point.amount));
        svg.push_str(&format!(
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="steelblue"><title>{}: {}</title></circle>"#,
            escape(&point.label),
            format_kr(point.amount)
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{:.1}" font-size="10" text-anchor="middle">{}</text>"#,
            CHART_HEIGHT - CHART_PADDING / 2.0,
            point.week
        ));
    }

    svg.push_str("</svg>");
    svg
}

pub fn dashboard_page(dashboard: &Dashboard, refresh_secs: u64) -> String {
    let mut body = String::new();

    body.push_str(&format!("<h1>{}</h1>", escape(&dashboard.title)));

    for warning in &dashboard.warnings {
        body.push_str(&format!(
            r#"<div class="warning">Fejl ved indlæsning af {}: {}</div>"#,
            escape(&warning.source),
            escape(&warning.message)
        ));
    }

    body.push_str(r#"<div class="row"><div class="card" style="flex:2">"#);
    body.push_str(&weekly_chart(
        &dashboard.weekly,
        dashboard.weekly_goal,
        dashboard.pacing.pacing_target,
        dashboard.current_week,
    ));
    body.push_str("</div>");
    body.push_str(&card(
        "Realiseret",
        &format!("{:.2}%", dashboard.completion_ratio * 100.0),
        &format!("Hit rate {:.1}%", dashboard.hit_rate),
    ));
    body.push_str(&card(
        "Mål pr. uge",
        &format_kr(dashboard.weekly_goal),
        &format!(
            "Nyt ugemål {} ({} uger tilbage)",
            format_kr(dashboard.pacing.pacing_target),
            dashboard.pacing.remaining_weeks
        ),
    ));
    body.push_str("</div>");

    body.push_str(r#"<div class="row">"#);
    for product in &dashboard.top_products {
        body.push_str(&card(
            &product.product,
            &format_kr(product.sum),
            &format!("{} solgt", product.count),
        ));
    }
    body.push_str(&card(
        "Antal produkter solgt",
        &dashboard.total_sold_count.to_string(),
        "",
    ));
    body.push_str("</div>");

    let progress_width = (dashboard.completion_ratio * 100.0).clamp(0.0, 100.0);
    body.push_str(&format!(
        r#"<div class="total">Samlet: {}</div><div style="text-align:center">{} / {}</div><div class="progress"><div class="bar" style="width:{progress_width:.2}%"></div></div>"#,
        format_kr(dashboard.total_sold),
        format_kr(dashboard.total_sold),
        format_kr(dashboard.total_goal)
    ));

    body.push_str(
        "<h2>Afdelinger</h2><table><tr><th>Afdeling</th><th>Mål</th><th>Solgt (kvartal)</th>\
         <th>Tilbudt</th><th>Afvist</th><th>Solgt (år til dato)</th><th>Rækker i alt</th></tr>",
    );
    for department in &dashboard.departments {
        let class = if department.loaded { "" } else { r#" class="muted""# };
        body.push_str(&format!(
            "<tr{class}><td>{}</td><td>{}</td><td>{} ({})</td><td>{} ({})</td><td>{} ({})</td><td>{}</td><td>{}</td></tr>",
            escape(&department.source),
            format_kr(department.goal),
            format_kr(department.quarter.sold.sum),
            department.quarter.sold.count,
            format_kr(department.quarter.offered.sum),
            department.quarter.offered.count,
            format_kr(department.quarter.rejected.sum),
            department.quarter.rejected.count,
            format_kr(department.year_to_date.sold.sum),
            department.all_rows.row_count(),
        ));
    }
    body.push_str("</table>");

    body.push_str(&format!(
        r#"<p class="muted">Uge {} · opdateret {}</p>"#,
        dashboard.current_week,
        dashboard.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    format!(
        r#"<!DOCTYPE html>
<html lang="da">
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh_secs}">
<title>{}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        escape(&dashboard.title)
    )
}
