use serde::Serialize;

use crate::config::WeekWindow;

/// Share of the goal reached so far. Zero when there is no goal.
pub fn completion_ratio(total_sold: f64, total_goal: f64) -> f64 {
    if total_goal <= 0.0 {
        return 0.0;
    }
    (total_sold / total_goal).max(0.0)
}

/// Even split of the goal across the weeks of the window.
pub fn weekly_goal(total_goal: f64, window: WeekWindow) -> f64 {
    match window.len() {
        0 => 0.0,
        weeks => total_goal / weeks as f64,
    }
}

/// Sold rows as a percentage of all resolved opportunities, in `[0, 100]`.
pub fn hit_rate(sold: usize, offered: usize, rejected: usize) -> f64 {
    let denominator = sold + offered + rejected;
    if denominator == 0 {
        return 0.0;
    }
    sold as f64 / denominator as f64 * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pacing {
    pub remaining_goal: f64,
    pub remaining_weeks: usize,
    /// Revenue needed per remaining week; the whole remainder once no weeks are left.
    pub pacing_target: f64,
}

impl Pacing {
    /// `current_week` counts as elapsed: only weeks strictly after it remain.
    pub fn compute(total_goal: f64, total_sold: f64, window: WeekWindow, current_week: u32) -> Self {
        let remaining_goal = (total_goal - total_sold).max(0.0);
        let remaining_weeks = window.weeks().filter(|week| *week > current_week).count();
        let pacing_target = if remaining_weeks > 0 {
            remaining_goal / remaining_weeks as f64
        } else {
            remaining_goal
        };

        Self {
            remaining_goal,
            remaining_weeks,
            pacing_target,
        }
    }
}
