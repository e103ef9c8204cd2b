use crate::logging::LogFormat;

pub const DEFAULT_DATA_PATH: &str = "database/cleaned_trips.csv";
pub const DEFAULT_TRIPS_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_path: String,
    pub trips_limit: usize,
    pub log_format: LogFormat,
    pub clean_limit: Option<usize>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: DEFAULT_DATA_PATH.to_string(),
            trips_limit: DEFAULT_TRIPS_LIMIT,
            log_format: LogFormat::default(),
            clean_limit: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            data_path: lookup("TRIPS_CSV")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.data_path),
            trips_limit: lookup("TRIPS_LIMIT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.trips_limit),
            log_format: lookup("LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),
            clean_limit: lookup("CLEAN_LIMIT").and_then(|v| v.trim().parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_env_is_empty() {
        let cfg = DashboardConfig::from_lookup(|_| None);
        assert_eq!(cfg, DashboardConfig::default());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("TRIPS_CSV", "otros/viajes.csv"),
            ("TRIPS_LIMIT", "abc"),
            ("LOG_FORMAT", "json"),
            ("CLEAN_LIMIT", "100"),
        ]
        .into_iter()
        .collect();
        let cfg = DashboardConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.data_path, "otros/viajes.csv");
        assert_eq!(cfg.trips_limit, DEFAULT_TRIPS_LIMIT);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.clean_limit, Some(100));
    }
}
