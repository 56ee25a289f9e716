use chrono_tz::Tz;

/// Default organization time zone (pantry is in Saskatchewan, no DST).
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Regina;

/// Volunteer categories that stay bookable on weekends and holidays.
pub const DEFAULT_ALWAYS_OPEN_CATEGORIES: &[&str] = &["Gardening", "Special Events"];

/// Longest span a recurring series may cover.
pub const DEFAULT_MAX_RECURRENCE_DAYS: u32 = 366;

/// How far ahead a past-date availability request looks for an open day.
pub const DEFAULT_NEXT_OPEN_SEARCH_DAYS: u32 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Booking engine configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Zone used for "today" and elapsed-slot comparisons.
    pub timezone: Tz,
    pub always_open_categories: Vec<String>,
    pub max_recurrence_days: u32,
    pub next_open_search_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            always_open_categories: DEFAULT_ALWAYS_OPEN_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            max_recurrence_days: DEFAULT_MAX_RECURRENCE_DAYS,
            next_open_search_days: DEFAULT_NEXT_OPEN_SEARCH_DAYS,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `ORG_TIMEZONE`           | `America/Regina`           |
    /// | `ALWAYS_OPEN_CATEGORIES` | `Gardening,Special Events` |
    /// | `MAX_RECURRENCE_DAYS`    | `366`                      |
    /// | `NEXT_OPEN_SEARCH_DAYS`  | `60`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(tz) = std::env::var("ORG_TIMEZONE") {
            config.timezone = parse_timezone(&tz)?;
        }
        if let Ok(raw) = std::env::var("ALWAYS_OPEN_CATEGORIES") {
            config.always_open_categories = parse_list(&raw);
        }
        if let Ok(raw) = std::env::var("MAX_RECURRENCE_DAYS") {
            config.max_recurrence_days = parse_days("MAX_RECURRENCE_DAYS", &raw)?;
        }
        if let Ok(raw) = std::env::var("NEXT_OPEN_SEARCH_DAYS") {
            config.next_open_search_days = parse_days("NEXT_OPEN_SEARCH_DAYS", &raw)?;
        }

        Ok(config)
    }
}

fn parse_timezone(raw: &str) -> Result<Tz, ConfigError> {
    raw.trim().parse::<Tz>().map_err(|e| ConfigError::Invalid {
        var: "ORG_TIMEZONE",
        message: e.to_string(),
    })
}

fn parse_days(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        message: format!("expected a whole number of days, got '{raw}'"),
    })
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.timezone, chrono_tz::America::Regina);
        assert_eq!(
            config.always_open_categories,
            vec!["Gardening".to_string(), "Special Events".to_string()]
        );
        assert_eq!(config.max_recurrence_days, 366);
    }

    #[test]
    fn list_parsing_trims_and_drops_blanks() {
        assert_eq!(
            parse_list(" Gardening , ,Special Events,"),
            vec!["Gardening".to_string(), "Special Events".to_string()]
        );
    }

    #[test]
    fn timezone_parsing() {
        assert_eq!(parse_timezone("UTC").unwrap(), chrono_tz::UTC);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn day_parsing() {
        assert_eq!(parse_days("X", " 30 ").unwrap(), 30);
        assert!(parse_days("X", "-1").is_err());
    }
}
