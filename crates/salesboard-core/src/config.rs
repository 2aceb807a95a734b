use std::collections::HashSet;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use salesboard_sheets::{ColumnAliases, StatusVocabulary};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const EMBEDDED_DEFAULT: &str = include_str!("../config/salesboard.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclusive range of ISO week numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub start_week: u32,
    pub end_week: u32,
}

impl WeekWindow {
    pub fn new(start_week: u32, end_week: u32) -> Self {
        Self {
            start_week,
            end_week,
        }
    }

    pub fn contains(&self, week: u32) -> bool {
        (self.start_week..=self.end_week).contains(&week)
    }

    pub fn weeks(&self) -> RangeInclusive<u32> {
        self.start_week..=self.end_week
    }

    pub fn len(&self) -> usize {
        if self.end_week < self.start_week {
            0
        } else {
            (self.end_week - self.start_week + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        for week in [self.start_week, self.end_week] {
            if !(1..=53).contains(&week) {
                return Err(ConfigError::Invalid(format!(
                    "[{section}] week {week} is outside 1..=53"
                )));
            }
        }
        if self.start_week > self.end_week {
            return Err(ConfigError::Invalid(format!(
                "[{section}] start_week {} is after end_week {}",
                self.start_week, self.end_week
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub start_week: u32,
    pub end_week: u32,
    /// Restricts both windows to one ISO year. Without it, week numbers match
    /// regardless of year.
    #[serde(default)]
    pub year: Option<i32>,
}

impl PeriodConfig {
    pub fn window(&self) -> WeekWindow {
        WeekWindow::new(self.start_week, self.end_week)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub title: String,
    pub refresh_interval_secs: u64,
    pub fetch_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub top_products: usize,
    pub timezone: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            title: "Sales dashboard".to_string(),
            refresh_interval_secs: 300,
            fetch_delay_ms: 1100,
            request_timeout_secs: 30,
            top_products: 5,
            timezone: "Europe/Copenhagen".to_string(),
        }
    }
}

/// One department worksheet and its revenue goal for the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub sheet_id: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    pub goal: f64,
}

fn default_worksheet() -> String {
    "Salg".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub dashboard: DashboardSettings,
    pub period: PeriodConfig,
    #[serde(default)]
    pub reporting: Option<WeekWindow>,
    #[serde(default)]
    pub columns: ColumnAliases,
    #[serde(default)]
    pub statuses: StatusVocabulary,
    pub sources: Vec<Source>,
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// The four department sheets the dashboard was built for.
    pub fn embedded_default() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_DEFAULT)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[sources]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Invalid("source name is empty".to_string()));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            if source.sheet_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has an empty sheet_id",
                    source.name
                )));
            }
            if source.worksheet.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has an empty worksheet name",
                    source.name
                )));
            }
            if !source.goal.is_finite() || source.goal < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has invalid goal {}",
                    source.name, source.goal
                )));
            }
        }

        self.period.window().validate("period")?;
        self.reporting_window().validate("reporting")?;

        if self.dashboard.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.dashboard.timezone.parse::<Tz>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "unknown timezone '{}'",
                self.dashboard.timezone
            )));
        }

        Ok(())
    }

    pub fn quarter_window(&self) -> WeekWindow {
        self.period.window()
    }

    /// Year-to-date window; defaults to week 1 through the end of the quarter.
    pub fn reporting_window(&self) -> WeekWindow {
        self.reporting
            .unwrap_or_else(|| WeekWindow::new(1, self.period.end_week))
    }

    pub fn total_goal(&self) -> f64 {
        self.sources.iter().map(|source| source.goal).sum()
    }

    pub fn timezone(&self) -> Tz {
        self.dashboard.timezone.parse().unwrap_or(Tz::UTC)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.refresh_interval_secs)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.dashboard.fetch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.dashboard.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [period]
        start_week = 27
        end_week = 39

        [[sources]]
        name = "SEO"
        sheet_id = "sheet-seo"
        goal = 80000
    "#;

    #[test]
    fn embedded_default_lists_the_four_departments() {
        let config = DashboardConfig::embedded_default().expect("embedded config is valid");
        let names: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Google Ads", "Project", "Social", "SEO"]);
        assert_eq!(config.sources[0].worksheet, "Mersalg");
        assert_eq!(config.sources[1].worksheet, "Salg");
        assert_eq!(config.total_goal(), 339_900.0);
        assert_eq!(config.quarter_window(), WeekWindow::new(27, 39));
        assert_eq!(config.quarter_window().len(), 13);
        assert_eq!(config.timezone(), chrono_tz::Europe::Copenhagen);
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = DashboardConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.dashboard.refresh_interval_secs, 300);
        assert_eq!(config.fetch_delay(), Duration::from_millis(1100));
        assert_eq!(config.dashboard.top_products, 5);
        assert_eq!(config.sources[0].worksheet, "Salg");
        assert_eq!(config.reporting_window(), WeekWindow::new(1, 39));
        assert_eq!(config.columns, ColumnAliases::default());
        assert!(config.period.year.is_none());
    }

    #[test]
    fn duplicate_source_names_are_rejected() {
        let text = format!(
            "{MINIMAL}\n[[sources]]\nname = \"SEO\"\nsheet_id = \"other\"\ngoal = 1\n"
        );
        let err = DashboardConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("duplicate")));
    }

    #[test]
    fn inverted_or_out_of_range_windows_are_rejected() {
        let inverted = MINIMAL.replace("start_week = 27", "start_week = 40");
        assert!(matches!(
            DashboardConfig::from_toml_str(&inverted),
            Err(ConfigError::Invalid(_))
        ));

        let overflow = MINIMAL.replace("end_week = 39", "end_week = 54");
        assert!(matches!(
            DashboardConfig::from_toml_str(&overflow),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn negative_goal_and_bad_timezone_are_rejected() {
        let negative = MINIMAL.replace("goal = 80000", "goal = -1");
        assert!(DashboardConfig::from_toml_str(&negative).is_err());

        let tz = format!("[dashboard]\ntimezone = \"Mars/Olympus\"\n{MINIMAL}");
        assert!(DashboardConfig::from_toml_str(&tz).is_err());
    }

    #[test]
    fn missing_sources_is_a_parse_error() {
        let err = DashboardConfig::from_toml_str("[period]\nstart_week = 1\nend_week = 2\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn week_window_membership() {
        let window = WeekWindow::new(27, 39);
        assert!(window.contains(27));
        assert!(window.contains(39));
        assert!(!window.contains(26));
        assert!(!window.contains(40));
        assert_eq!(window.weeks().count(), 13);
    }
}
