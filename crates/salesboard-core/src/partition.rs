use polars::prelude::*;
use salesboard_sheets::Status;

use crate::config::WeekWindow;

pub const IN_QUARTER: &str = "in_quarter";
pub const IN_REPORTING: &str = "in_reporting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindows {
    pub quarter: WeekWindow,
    pub reporting: WeekWindow,
    pub year: Option<i32>,
}

impl PeriodWindows {
    fn admits(&self, window: &WeekWindow, iso_year: Option<i32>, week: Option<i32>) -> bool {
        let Some(week) = week else {
            return false;
        };
        if let Some(year) = self.year {
            if iso_year != Some(year) {
                return false;
            }
        }
        u32::try_from(week).is_ok_and(|week| window.contains(week))
    }
}

/// Appends `in_quarter` / `in_reporting` flags. Rows without a week are
/// never in a window.
pub fn tag_periods(df: &DataFrame, windows: &PeriodWindows) -> Result<DataFrame, PolarsError> {
    let len = df.height();
    let iso_years = df.column("iso_year")?.i32()?;
    let weeks = df.column("week")?.i32()?;

    let mut in_quarter = Vec::with_capacity(len);
    let mut in_reporting = Vec::with_capacity(len);
    for idx in 0..len {
        let (iso_year, week) = (iso_years.get(idx), weeks.get(idx));
        in_quarter.push(windows.admits(&windows.quarter, iso_year, week));
        in_reporting.push(windows.admits(&windows.reporting, iso_year, week));
    }

    let mut output = df.clone();
    let columns: [Column; 2] = [
        Series::new(IN_QUARTER.into(), in_quarter).into(),
        Series::new(IN_REPORTING.into(), in_reporting).into(),
    ];
    output.hstack_mut(&columns)?;
    Ok(output)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Quarter,
    YearToDate,
    AllRows,
}

impl Period {
    fn flag_column(&self) -> Option<&'static str> {
        match self {
            Period::Quarter => Some(IN_QUARTER),
            Period::YearToDate => Some(IN_REPORTING),
            Period::AllRows => None,
        }
    }
}

/// Row indices per canonical status. Unknown rows are kept apart so raw
/// counts still see them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBuckets {
    pub sold: Vec<usize>,
    pub offered: Vec<usize>,
    pub rejected: Vec<usize>,
    pub unknown: Vec<usize>,
}

impl StatusBuckets {
    pub fn rows(&self, status: Status) -> &[usize] {
        match status {
            Status::Sold => &self.sold,
            Status::Offered => &self.offered,
            Status::Rejected => &self.rejected,
            Status::Unknown => &self.unknown,
        }
    }

    fn push(&mut self, status: Status, idx: usize) {
        match status {
            Status::Sold => self.sold.push(idx),
            Status::Offered => self.offered.push(idx),
            Status::Rejected => self.rejected.push(idx),
            Status::Unknown => self.unknown.push(idx),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.sold.len() + self.offered.len() + self.rejected.len() + self.unknown.len()
    }

    /// Keeps only the rows the predicate accepts.
    pub fn retain(&self, mut keep: impl FnMut(usize) -> bool) -> StatusBuckets {
        let mut filter = |rows: &[usize]| -> Vec<usize> {
            rows.iter().copied().filter(|idx| keep(*idx)).collect()
        };
        StatusBuckets {
            sold: filter(&self.sold),
            offered: filter(&self.offered),
            rejected: filter(&self.rejected),
            unknown: filter(&self.unknown),
        }
    }
}

/// Splits a tagged frame into status buckets for one period.
pub fn partition(df: &DataFrame, period: Period) -> Result<StatusBuckets, PolarsError> {
    let statuses = df.column("status")?.str()?;
    let flags = match period.flag_column() {
        Some(name) => Some(df.column(name)?.bool()?),
        None => None,
    };

    let mut buckets = StatusBuckets::default();
    for idx in 0..df.height() {
        if let Some(flags) = flags {
            if flags.get(idx) != Some(true) {
                continue;
            }
        }
        let status = statuses
            .get(idx)
            .and_then(|value| Status::try_from(value).ok())
            .unwrap_or(Status::Unknown);
        buckets.push(status, idx);
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(windows: &PeriodWindows) -> DataFrame {
        let df = df!(
            "source" => ["A", "A", "A", "B", "B"],
            "iso_year" => [Some(2025), Some(2025), None, Some(2024), Some(2025)],
            "week" => [Some(27), Some(12), None, Some(30), Some(40)],
            "status" => ["sold", "sold", "sold", "offered", "rejected"],
        )
        .unwrap();
        tag_periods(&df, windows).unwrap()
    }

    fn q3() -> PeriodWindows {
        PeriodWindows {
            quarter: WeekWindow::new(27, 39),
            reporting: WeekWindow::new(1, 39),
            year: None,
        }
    }

    #[test]
    fn flags_follow_week_windows() {
        let df = tagged(&q3());
        let flags = |name: &str| -> Vec<Option<bool>> {
            df.column(name).unwrap().bool().unwrap().into_iter().collect()
        };
        let quarter = flags(IN_QUARTER);
        let reporting = flags(IN_REPORTING);
        assert_eq!(quarter, vec![Some(true), Some(false), Some(false), Some(true), Some(false)]);
        assert_eq!(reporting, vec![Some(true), Some(true), Some(false), Some(true), Some(false)]);
    }

    #[test]
    fn configured_year_excludes_other_iso_years() {
        let windows = PeriodWindows {
            year: Some(2025),
            ..q3()
        };
        let df = tagged(&windows);
        let buckets = partition(&df, Period::Quarter).unwrap();
        assert_eq!(buckets.sold, vec![0]);
        assert!(buckets.offered.is_empty());
    }

    #[test]
    fn all_rows_keeps_undated_and_out_of_window_records() {
        let df = tagged(&q3());
        let all = partition(&df, Period::AllRows).unwrap();
        assert_eq!(all.sold, vec![0, 1, 2]);
        assert_eq!(all.offered, vec![3]);
        assert_eq!(all.rejected, vec![4]);
        assert_eq!(all.total_rows(), 5);

        let quarter = partition(&df, Period::Quarter).unwrap();
        assert_eq!(quarter.sold, vec![0]);
        assert_eq!(quarter.offered, vec![3]);
        assert!(quarter.rejected.is_empty());

        let ytd = partition(&df, Period::YearToDate).unwrap();
        assert_eq!(ytd.sold, vec![0, 1]);
    }

    #[test]
    fn retain_filters_every_bucket() {
        let df = tagged(&q3());
        let all = partition(&df, Period::AllRows).unwrap();
        let only_b = all.retain(|idx| idx >= 3);
        assert!(only_b.sold.is_empty());
        assert_eq!(only_b.rows(Status::Offered), &[3]);
        assert_eq!(only_b.rows(Status::Rejected), &[4]);
    }
}
