//! Configuration file handling for saving and loading maintenance configs.
//!
//! Enum fields (the disposition rule) are typed, so a typo in the file fails
//! at parse time instead of during a scan.

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_TTL_HOURS;
use crate::criteria::FilterCriteria;
use crate::scan::DEFAULT_ADMIN_EMAIL;
use crate::types::DispositionRule;

/// Longest cache lifetime a config may ask for: one year
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365;

/// What the scheduled scan looks for and what it does with matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub criteria: FilterCriteria,
    #[serde(default)]
    pub rule: DispositionRule,
}

/// Maintenance configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// JSON content store the scans run against
    pub store_path: PathBuf,
    /// Where the latest result is cached between runs
    pub cache_path: PathBuf,
    pub admin_email: String,
    pub cache_ttl_hours: i64,
    /// Append notifications here instead of logging them
    pub notify_spool: Option<PathBuf>,
    pub schedule: ScheduleConfig,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("content.json"),
            cache_path: PathBuf::from("postsweep-cache.json"),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            cache_ttl_hours: DEFAULT_TTL_HOURS,
            notify_spool: None,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl MaintenanceConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Cache lifetime, clamped to the range `validate` accepts
    pub fn cache_ttl(&self) -> Duration {
        Duration::hours(self.cache_ttl_hours.clamp(1, MAX_CACHE_TTL_HOURS))
    }

    /// Validate the configuration.
    ///
    /// Content types and categories can only be checked against a loaded
    /// store, so those are left to the scan itself.
    pub fn validate(&self) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            anyhow::bail!("Store path must be specified");
        }
        if self.cache_path.as_os_str().is_empty() {
            anyhow::bail!("Cache path must be specified");
        }

        let email = self.admin_email.trim();
        if email.is_empty() {
            anyhow::bail!("Admin email must be specified");
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => anyhow::bail!("Admin email must look like user@host"),
        }
        if email.contains(char::is_whitespace) {
            anyhow::bail!("Admin email cannot contain whitespace");
        }

        if self.cache_ttl_hours <= 0 {
            anyhow::bail!("Cache TTL must be at least one hour");
        }
        if self.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
            anyhow::bail!("Cache TTL cannot exceed {} hours", MAX_CACHE_TTL_HOURS);
        }

        let criteria = &self.schedule.criteria;
        if criteria.content_types.is_empty() {
            anyhow::bail!("Schedule must select at least one post type");
        }
        if criteria.content_types.iter().any(|t| t.trim().is_empty()) {
            anyhow::bail!("Schedule post types cannot be blank");
        }
        if criteria.age_threshold_days <= 0 {
            anyhow::bail!("Schedule age threshold must be at least one day");
        }
        if criteria.engagement_threshold < 0 {
            anyhow::bail!("Schedule engagement threshold cannot be negative");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = MaintenanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.criteria.age_threshold_days, 365);
        assert_eq!(config.schedule.rule, DispositionRule::Delete);
        assert_eq!(config.cache_ttl(), Duration::hours(12));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("postsweep.json");
        let mut config = MaintenanceConfig::default();
        config.admin_email = "ops@example.com".into();
        config.schedule.rule = DispositionRule::Archive;
        config.notify_spool = Some(dir.path().join("mail.jsonl"));

        config.save_to_file(&path).unwrap();
        let loaded = MaintenanceConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("postsweep.json");
        fs::write(
            &path,
            r#"{"store_path": "site.json", "schedule": {"rule": "archive"}}"#,
        )
        .unwrap();

        let config = MaintenanceConfig::load_from_file(&path).unwrap();
        assert_eq!(config.store_path, PathBuf::from("site.json"));
        assert_eq!(config.schedule.rule, DispositionRule::Archive);
        assert_eq!(config.schedule.criteria, FilterCriteria::default());
        assert_eq!(config.cache_ttl_hours, DEFAULT_TTL_HOURS);
    }

    #[test]
    fn test_unknown_rule_fails_to_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("postsweep.json");
        fs::write(&path, r#"{"schedule": {"rule": "shred"}}"#).unwrap();
        assert!(MaintenanceConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_missing_file_mentions_path() {
        let err = MaintenanceConfig::load_from_file("/nonexistent/postsweep.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read configuration"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = MaintenanceConfig::default();
        config.admin_email = "nobody".into();
        assert!(config.validate().is_err());

        let mut config = MaintenanceConfig::default();
        config.cache_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = MaintenanceConfig::default();
        config.schedule.criteria.content_types.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("post type"));

        let mut config = MaintenanceConfig::default();
        config.schedule.criteria.engagement_threshold = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schedule_age_zero_is_rejected() {
        let mut config = MaintenanceConfig::default();
        config.schedule.criteria.age_threshold_days = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("age threshold"));

        config.schedule.criteria.age_threshold_days = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_cache_ttl() {
        let mut config = MaintenanceConfig::default();
        config.cache_ttl_hours = i64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Cache TTL cannot exceed"));
        assert_eq!(config.cache_ttl(), Duration::hours(MAX_CACHE_TTL_HOURS));

        config.cache_ttl_hours = MAX_CACHE_TTL_HOURS;
        assert!(config.validate().is_ok());
    }
}
