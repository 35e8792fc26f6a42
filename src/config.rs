use std::fmt;
use std::path::PathBuf;

use crate::engine::{AvailabilityTracker, QuotaError};
use crate::model::Status;

/// Spaces in the lot.
pub const DEFAULT_CAPACITY: u32 = 36;
/// Spaces kept back for emergencies; never handed out.
pub const DEFAULT_EMERGENCY_SPACES: u32 = 4;
/// Free spaces for "Other" holders when the lot is first configured.
pub const DEFAULT_OTHER_QUOTA: u32 = 15;

/// Process configuration, read from `PARKBAY_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub compact_threshold: u64,
    pub capacity: u32,
    pub emergency_spaces: u32,
    pub quotas: Vec<(Status, u32)>,
    pub metrics: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { var: &'static str, value: String },
    Quota(QuotaError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { var, value } => write!(f, "{var}: cannot use {value:?}"),
            ConfigError::Quota(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            compact_threshold: 1000,
            capacity: DEFAULT_CAPACITY,
            emergency_spaces: DEFAULT_EMERGENCY_SPACES,
            quotas: vec![
                (Status::Disabled, 0),
                (Status::EdMd, 0),
                (Status::CriticalWorker, 0),
                (Status::Other, DEFAULT_OTHER_QUOTA),
            ],
            metrics: false,
        }
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let quota_vars = [
            (Status::Disabled, "PARKBAY_QUOTA_DISABLED"),
            (Status::EdMd, "PARKBAY_QUOTA_ED_MD"),
            (Status::CriticalWorker, "PARKBAY_QUOTA_CRITICAL"),
            (Status::Other, "PARKBAY_QUOTA_OTHER"),
        ];
        let mut quotas = Vec::with_capacity(quota_vars.len());
        for (status, var) in quota_vars {
            let default = defaults
                .quotas
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, q)| *q);
            quotas.push((status, parsed(&lookup, var, default)?));
        }

        let config = Self {
            data_dir: lookup("PARKBAY_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            compact_threshold: parsed(&lookup, "PARKBAY_COMPACT_THRESHOLD", defaults.compact_threshold)?,
            capacity: parsed(&lookup, "PARKBAY_CAPACITY", defaults.capacity)?,
            emergency_spaces: parsed(&lookup, "PARKBAY_EMERGENCY_SPACES", defaults.emergency_spaces)?,
            quotas,
            metrics: lookup("PARKBAY_METRICS").is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes")),
        };
        config.tracker()?;
        Ok(config)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("parkbay.journal")
    }

    /// Seeded counters for a fresh engine.
    pub fn tracker(&self) -> Result<AvailabilityTracker, ConfigError> {
        AvailabilityTracker::new(self.quotas.iter().copied(), self.capacity).map_err(ConfigError::Quota)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_match_the_lot() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, Config::default());
        let tracker = config.tracker().unwrap();
        assert_eq!(tracker.capacity(), 36);
        assert_eq!(tracker.free_spaces(), 15);
        assert_eq!(config.emergency_spaces, 4);
        assert_eq!(config.journal_path(), PathBuf::from("./data/parkbay.journal"));
    }

    #[test]
    fn overrides_apply() {
        let config = from_pairs(&[
            ("PARKBAY_DATA_DIR", "/var/lib/parkbay"),
            ("PARKBAY_QUOTA_DISABLED", "6"),
            ("PARKBAY_QUOTA_OTHER", "20"),
            ("PARKBAY_METRICS", "1"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/parkbay"));
        assert!(config.metrics);
        let tracker = config.tracker().unwrap();
        assert_eq!(tracker.free_for(Status::Disabled), 6);
        assert_eq!(tracker.free_spaces(), 26);
    }

    #[test]
    fn bad_number_names_the_variable() {
        let err = from_pairs(&[("PARKBAY_CAPACITY", "lots")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { var: "PARKBAY_CAPACITY", value: "lots".into() });
    }

    #[test]
    fn quotas_over_capacity_rejected() {
        let err = from_pairs(&[("PARKBAY_CAPACITY", "10")]).unwrap_err();
        assert!(matches!(err, ConfigError::Quota(QuotaError::ExceedsCapacity { total: 15, capacity: 10 })));
    }
}
