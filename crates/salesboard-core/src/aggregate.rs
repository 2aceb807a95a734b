use std::collections::{BTreeMap, HashMap, HashSet};

use polars::prelude::*;
use serde::Serialize;

use crate::config::{Source, WeekWindow};
use crate::partition::{partition, Period, StatusBuckets};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketTotals {
    /// Every row in the bucket, including rows without a usable amount.
    pub count: usize,
    pub sum: f64,
}

/// Counts and sums the `amount` of the given rows. Missing amounts count but
/// add nothing.
pub fn bucket_totals(df: &DataFrame, rows: &[usize]) -> Result<BucketTotals, PolarsError> {
    let amounts = df.column("amount")?.f64()?;
    let sum = rows.iter().filter_map(|idx| amounts.get(*idx)).sum();
    Ok(BucketTotals {
        count: rows.len(),
        sum,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPoint {
    pub week: u32,
    pub label: String,
    pub amount: f64,
}

/// Dense week series: one point per week of the window, in week order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySeries {
    pub points: Vec<WeeklyPoint>,
}

impl WeeklySeries {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|point| point.amount).sum()
    }

    pub fn amount(&self, week: u32) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.week == week)
            .map(|point| point.amount)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn week_label(week: u32) -> String {
    format!("Uge {week}")
}

/// Sums amounts per week over `rows`, zero-filled across `window`. Rows with
/// a week outside the window are ignored.
pub fn weekly_series(
    df: &DataFrame,
    rows: &[usize],
    window: WeekWindow,
) -> Result<WeeklySeries, PolarsError> {
    let weeks = df.column("week")?.i32()?;
    let amounts = df.column("amount")?.f64()?;

    let mut per_week: BTreeMap<u32, f64> = window.weeks().map(|week| (week, 0.0)).collect();
    for &idx in rows {
        let (Some(week), Some(amount)) = (weeks.get(idx), amounts.get(idx)) else {
            continue;
        };
        let Ok(week) = u32::try_from(week) else {
            continue;
        };
        if let Some(total) = per_week.get_mut(&week) {
            *total += amount;
        }
    }

    Ok(WeeklySeries {
        points: per_week
            .into_iter()
            .map(|(week, amount)| WeeklyPoint {
                week,
                label: week_label(week),
                amount,
            })
            .collect(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodBreakdown {
    pub sold: BucketTotals,
    pub offered: BucketTotals,
    pub rejected: BucketTotals,
    pub unknown_count: usize,
}

impl PeriodBreakdown {
    pub fn from_buckets(df: &DataFrame, buckets: &StatusBuckets) -> Result<Self, PolarsError> {
        Ok(Self {
            sold: bucket_totals(df, &buckets.sold)?,
            offered: bucket_totals(df, &buckets.offered)?,
            rejected: bucket_totals(df, &buckets.rejected)?,
            unknown_count: buckets.unknown.len(),
        })
    }

    /// Sold, offered and rejected rows; unknown rows are not opportunities.
    pub fn opportunities(&self) -> usize {
        self.sold.count + self.offered.count + self.rejected.count
    }

    pub fn row_count(&self) -> usize {
        self.opportunities() + self.unknown_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentSummary {
    pub source: String,
    pub goal: f64,
    pub loaded: bool,
    pub quarter: PeriodBreakdown,
    pub year_to_date: PeriodBreakdown,
    pub all_rows: PeriodBreakdown,
}

/// Per-source breakdowns in configuration order. Sources that failed to load
/// are listed with zero totals.
pub fn department_summaries(
    df: &DataFrame,
    sources: &[Source],
    failed: &HashSet<&str>,
) -> Result<Vec<DepartmentSummary>, PolarsError> {
    let source_names = df.column("source")?.str()?;
    let mut rows_by_source: HashMap<&str, HashSet<usize>> = HashMap::new();
    for idx in 0..df.height() {
        if let Some(name) = source_names.get(idx) {
            rows_by_source.entry(name).or_default().insert(idx);
        }
    }

    let periods = [
        partition(df, Period::Quarter)?,
        partition(df, Period::YearToDate)?,
        partition(df, Period::AllRows)?,
    ];
    let empty = HashSet::new();

    let mut summaries = Vec::with_capacity(sources.len());
    for source in sources {
        let own_rows = rows_by_source.get(source.name.as_str()).unwrap_or(&empty);
        let mut breakdowns = Vec::with_capacity(periods.len());
        for buckets in &periods {
            let scoped = buckets.retain(|idx| own_rows.contains(&idx));
            breakdowns.push(PeriodBreakdown::from_buckets(df, &scoped)?);
        }

        summaries.push(DepartmentSummary {
            source: source.name.clone(),
            goal: source.goal,
            loaded: !failed.contains(source.name.as_str()),
            quarter: breakdowns[0],
            year_to_date: breakdowns[1],
            all_rows: breakdowns[2],
        });
    }

    Ok(summaries)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product: String,
    pub count: usize,
    pub sum: f64,
}

/// Groups `rows` by product, ranked by summed amount then name.
pub fn top_products(
    df: &DataFrame,
    rows: &[usize],
    limit: usize,
) -> Result<Vec<ProductSummary>, PolarsError> {
    let products = df.column("product")?.str()?;
    let amounts = df.column("amount")?.f64()?;

    let mut grouped: HashMap<&str, (usize, f64)> = HashMap::new();
    for &idx in rows {
        let Some(product) = products.get(idx) else {
            continue;
        };
        let entry = grouped.entry(product).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += amounts.get(idx).unwrap_or(0.0);
    }

    let mut ranked: Vec<ProductSummary> = grouped
        .into_iter()
        .map(|(product, (count, sum))| ProductSummary {
            product: product.to_string(),
            count,
            sum,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.sum
            .total_cmp(&a.sum)
            .then_with(|| a.product.cmp(&b.product))
    });
    ranked.truncate(limit);
    Ok(ranked)
}
