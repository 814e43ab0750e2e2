//! TOML-based configuration.
//!
//! Describes:
//! - Recurring task definitions (intervals, avoided weekdays and dates)
//! - The per-day task limit and the scheduling horizon
//! - The managed aggregate event (name, time of day, marker phrase)
//! - Where history files live
//!
//! Configuration is stored at `~/.config/taskcal/config.toml` unless a path
//! is given explicitly.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound for `horizon_days` and interval ranges, about a century.
pub const MAX_DAYS: u32 = 36_500;

/// Returns `~/.config/taskcal[-dev]/` based on TASKCAL_ENV.
///
/// Set TASKCAL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKCAL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("taskcal-dev")
    } else {
        base_dir.join("taskcal")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default location of the configuration file.
pub fn default_config_path() -> Result<PathBuf, std::io::Error> {
    Ok(data_dir()?.join("config.toml"))
}

/// Where a task's first interval is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAnchor {
    Today,
    Tomorrow,
    Date(NaiveDate),
}

impl StartAnchor {
    /// Resolve against the date the scheduler runs on.
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            StartAnchor::Today => today,
            StartAnchor::Tomorrow => today + Days::new(1),
            StartAnchor::Date(date) => *date,
        }
    }
}

impl FromStr for StartAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(StartAnchor::Today),
            "tomorrow" => Ok(StartAnchor::Tomorrow),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(StartAnchor::Date)
                .map_err(|_| format!("expected \"today\", \"tomorrow\" or YYYY-MM-DD, got \"{s}\"")),
        }
    }
}

impl fmt::Display for StartAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartAnchor::Today => f.write_str("today"),
            StartAnchor::Tomorrow => f.write_str("tomorrow"),
            StartAnchor::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for StartAnchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StartAnchor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Offset range from the previous occurrence, repeated `repetitions` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// `[min_days, max_days]`
    pub range: (u32, u32),
    pub repetitions: u32,
}

impl Interval {
    pub fn min_days(&self) -> u32 {
        self.range.0
    }

    pub fn max_days(&self) -> u32 {
        self.range.1
    }
}

/// Days a task must never land on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoidDays {
    /// Weekday indices, 0 = Monday .. 6 = Sunday.
    #[serde(default)]
    pub weekdays: BTreeSet<u8>,
    #[serde(default)]
    pub dates: BTreeSet<NaiveDate>,
}

/// A recurring task as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub category: String,
    pub start_date: StartAnchor,
    #[serde(default)]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub avoid_days: AvoidDays,
}

/// Time of day of the managed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimeConfig {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl Default for EventTimeConfig {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or_default(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_time_zone", with = "tz_name")]
    pub time_zone: Tz,
    /// Exact summary of the managed aggregate event.
    pub event_name: String,
    /// Marker contained in the summary of task-bearing events.
    pub task_phrase: String,
    #[serde(default)]
    pub max_tasks_per_day: Option<usize>,
    pub horizon_days: u32,
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub exclusive_categories: bool,
    #[serde(default)]
    pub event_time: EventTimeConfig,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

fn default_calendar_id() -> String {
    "primary".into()
}
fn default_time_zone() -> Tz {
    chrono_tz::Europe::Warsaw
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// A relative `history_dir` is resolved against the directory holding
    /// the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(dir) = config.history_dir.as_ref().filter(|d| d.is_relative()) {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.history_dir = Some(base.join(dir));
        }

        Ok(config)
    }

    /// Parse and validate a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| {
            let message = e.message().to_string();
            match message.strip_prefix("missing field ") {
                Some(field) => ConfigError::MissingKey(field.trim_matches('`').to_string()),
                None => ConfigError::ParseFailed(e.to_string()),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.event_name.trim().is_empty() {
            return Err(invalid("event_name", "must not be empty"));
        }
        if self.task_phrase.trim().is_empty() {
            return Err(invalid("task_phrase", "must not be empty"));
        }
        if self.horizon_days == 0 {
            return Err(invalid("horizon_days", "must be greater than zero"));
        }
        if self.horizon_days > MAX_DAYS {
            return Err(invalid("horizon_days", &format!("must be at most {MAX_DAYS}")));
        }
        if self.max_tasks_per_day == Some(0) {
            return Err(invalid("max_tasks_per_day", "must be greater than zero"));
        }

        let mut names = HashSet::new();
        for (index, task) in self.tasks.iter().enumerate() {
            let key = |field: &str| format!("tasks[{index}].{field}");
            if task.name.trim().is_empty() {
                return Err(invalid(&key("name"), "must not be empty"));
            }
            // one description line per task
            if task.name.contains(['\n', '\r']) {
                return Err(invalid(&key("name"), "must not contain line breaks"));
            }
            if !names.insert(task.name.as_str()) {
                return Err(invalid(&key("name"), &format!("duplicate task name \"{}\"", task.name)));
            }
            for (i, interval) in task.intervals.iter().enumerate() {
                if interval.min_days() > interval.max_days() {
                    return Err(invalid(
                        &key(&format!("intervals[{i}].range")),
                        &format!("min {} exceeds max {}", interval.min_days(), interval.max_days()),
                    ));
                }
                if interval.max_days() > MAX_DAYS {
                    return Err(invalid(
                        &key(&format!("intervals[{i}].range")),
                        &format!("max {} exceeds {MAX_DAYS} days", interval.max_days()),
                    ));
                }
            }
            if let Some(day) = task.avoid_days.weekdays.iter().find(|d| **d > 6) {
                return Err(invalid(
                    &key("avoid_days.weekdays"),
                    &format!("{day} is not a weekday index (0 = Monday .. 6 = Sunday)"),
                ));
            }
        }
        Ok(())
    }

    /// Directory holding history files.
    pub fn history_dir(&self) -> PathBuf {
        match &self.history_dir {
            Some(dir) => dir.clone(),
            None => data_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("history"),
        }
    }

    /// Start instant of the managed event on `date`.
    pub fn event_start(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.event_time.start)
    }

    /// End instant of the managed event on `date`.
    ///
    /// Mirrors the start instant: managed events are created with zero
    /// duration and `event_time.end` is not consulted.
    pub fn event_end(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.event_time.start)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|_| serde::de::Error::custom(format!("expected HH:MM, got \"{raw}\"")))
    }
}

mod tz_name {
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Tz, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Tz>()
            .map_err(|_| serde::de::Error::custom(format!("unknown time zone \"{raw}\"")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
event_name = "#tasks for today"
task_phrase = "tasks"
horizon_days = 30
"##;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(cfg.calendar_id, "primary");
        assert_eq!(cfg.time_zone, chrono_tz::Europe::Warsaw);
        assert!(cfg.exclusive_categories);
        assert_eq!(cfg.max_tasks_per_day, None);
        assert_eq!(cfg.event_time.start, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert!(cfg.tasks.is_empty());
    }

    #[test]
    fn full_task_definition_parses() {
        let doc = format!(
            "{MINIMAL}
max_tasks_per_day = 2
time_zone = \"UTC\"

[event_time]
start = \"07:30\"
end = \"22:00\"

[[tasks]]
name = \"Water plants\"
category = \"home\"
start_date = \"2024-01-01\"
avoid_days = {{ weekdays = [5, 6], dates = [\"2024-01-10\"] }}
intervals = [{{ range = [3, 5], repetitions = 3 }}, {{ range = [7, 7], repetitions = 1 }}]

[[tasks]]
name = \"Call mum\"
category = \"family\"
start_date = \"tomorrow\"
"
        );
        let cfg = Config::from_toml_str(&doc).unwrap();
        assert_eq!(cfg.max_tasks_per_day, Some(2));
        assert_eq!(cfg.time_zone, chrono_tz::UTC);
        assert_eq!(cfg.event_time.start, NaiveTime::from_hms_opt(7, 30, 0).unwrap());

        let plants = &cfg.tasks[0];
        assert_eq!(
            plants.start_date,
            StartAnchor::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(plants.intervals.len(), 2);
        assert_eq!(plants.intervals[0].min_days(), 3);
        assert_eq!(plants.intervals[0].max_days(), 5);
        assert!(plants.avoid_days.weekdays.contains(&6));
        assert!(plants
            .avoid_days
            .dates
            .contains(&NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));

        assert_eq!(cfg.tasks[1].start_date, StartAnchor::Tomorrow);
        assert!(cfg.tasks[1].intervals.is_empty());
    }

    #[test]
    fn missing_required_key_is_reported() {
        let err = Config::from_toml_str("task_phrase = \"x\"\nhorizon_days = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "event_name"), "{err}");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let doc = format!(
            "{MINIMAL}
[[tasks]]
name = \"a\"
category = \"c\"
start_date = \"today\"
intervals = [{{ range = [5, 3], repetitions = 1 }}]
"
        );
        let err = Config::from_toml_str(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tasks[0].intervals[0].range"));
    }

    #[test]
    fn oversized_horizon_is_rejected() {
        let doc = MINIMAL.replace("horizon_days = 30", "horizon_days = 4000000000");
        let err = Config::from_toml_str(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "horizon_days"));

        let doc = MINIMAL.replace("horizon_days = 30", &format!("horizon_days = {MAX_DAYS}"));
        assert_eq!(Config::from_toml_str(&doc).unwrap().horizon_days, MAX_DAYS);
    }

    #[test]
    fn oversized_range_is_rejected() {
        let doc = format!(
            "{MINIMAL}
[[tasks]]
name = \"a\"
category = \"c\"
start_date = \"today\"
intervals = [{{ range = [1, 3], repetitions = 1 }}, {{ range = [4000000000, 4000000000], repetitions = 1 }}]
"
        );
        let err = Config::from_toml_str(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tasks[0].intervals[1].range"));
    }

    #[test]
    fn multi_line_task_names_are_rejected() {
        for name in [r"a\nb", r"a\r\nb", r"a\r"] {
            let doc = format!(
                "{MINIMAL}
[[tasks]]
name = \"{name}\"
category = \"c\"
start_date = \"today\"
intervals = [{{ range = [1, 1], repetitions = 1 }}]
"
            );
            let err = Config::from_toml_str(&doc).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "tasks[0].name"),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn bad_weekday_and_duplicate_names_are_rejected() {
        let weekday = format!(
            "{MINIMAL}
[[tasks]]
name = \"a\"
category = \"c\"
start_date = \"today\"
avoid_days = {{ weekdays = [7] }}
"
        );
        assert!(Config::from_toml_str(&weekday).is_err());

        let duplicate = format!(
            "{MINIMAL}
[[tasks]]
name = \"a\"
category = \"c\"
start_date = \"today\"

[[tasks]]
name = \"a\"
category = \"d\"
start_date = \"today\"
"
        );
        assert!(Config::from_toml_str(&duplicate).is_err());
    }

    #[test]
    fn bad_time_and_zone_fail_to_parse() {
        let time = format!("{MINIMAL}\n[event_time]\nstart = \"6am\"\nend = \"23:00\"\n");
        assert!(matches!(Config::from_toml_str(&time), Err(ConfigError::ParseFailed(_))));

        let zone = format!("time_zone = \"Mars/Olympus\"\n{MINIMAL}");
        assert!(matches!(Config::from_toml_str(&zone), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn start_anchor_resolution() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert_eq!(StartAnchor::Today.resolve(today), today);
        assert_eq!(
            StartAnchor::Tomorrow.resolve(today),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        let fixed = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(StartAnchor::Date(fixed).resolve(today), fixed);
    }

    #[test]
    fn event_instants_share_the_start_time() {
        let cfg = Config::from_toml_str(MINIMAL).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        assert_eq!(cfg.event_start(date), cfg.event_end(date));
        assert_eq!(cfg.event_start(date).time(), cfg.event_time.start);
    }

    #[test]
    fn load_resolves_relative_history_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, format!("history_dir = \"hist\"\n{MINIMAL}")).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.history_dir(), dir.path().join("hist"));
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { .. }));
    }
}
