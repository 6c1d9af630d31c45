use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use carbjournal_core::models::DEFAULT_DAILY_LIMIT_G;
use carbjournal_core::service::DEFAULT_BACKUP_REMINDER_MINUTES;

const DATA_DIR_VAR: &str = "CARBJOURNAL_DATA_DIR";
const DAILY_LIMIT_VAR: &str = "CARBJOURNAL_DAILY_LIMIT";
const REMINDER_MINUTES_VAR: &str = "CARBJOURNAL_BACKUP_REMINDER_MINUTES";

pub struct Config {
    pub db_path: PathBuf,
    pub backup_dir: PathBuf,
    pub daily_limit: f64,
    pub backup_reminder_minutes: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from("", "", "carbjournal")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        let daily_limit = parse_env(DAILY_LIMIT_VAR, std::env::var(DAILY_LIMIT_VAR).ok())?
            .unwrap_or(DEFAULT_DAILY_LIMIT_G);
        let backup_reminder_minutes =
            parse_env(REMINDER_MINUTES_VAR, std::env::var(REMINDER_MINUTES_VAR).ok())?
                .unwrap_or(DEFAULT_BACKUP_REMINDER_MINUTES);

        Self::in_dir(&data_dir, daily_limit, backup_reminder_minutes)
    }

    fn in_dir(data_dir: &Path, daily_limit: f64, backup_reminder_minutes: i64) -> Result<Self> {
        if !daily_limit.is_finite() || daily_limit <= 0.0 {
            bail!("{DAILY_LIMIT_VAR} must be a positive number, got {daily_limit}");
        }
        if backup_reminder_minutes < 0 {
            bail!("{REMINDER_MINUTES_VAR} must not be negative");
        }

        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("journal.db"),
            backup_dir: data_dir.join("backups"),
            daily_limit,
            backup_reminder_minutes,
        })
    }

    /// Backup directory, created on first use.
    pub fn ensure_backup_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.backup_dir).with_context(|| {
            format!(
                "Failed to create backup directory: {}",
                self.backup_dir.display()
            )
        })?;
        Ok(&self.backup_dir)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Invalid value for {name}: '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let config = Config::in_dir(&data_dir, 100.0, 10).unwrap();
        assert!(data_dir.is_dir());
        assert_eq!(config.db_path, data_dir.join("journal.db"));
        assert!(!config.backup_dir.exists());
        let backups = config.ensure_backup_dir().unwrap();
        assert!(backups.is_dir());
    }

    #[test]
    fn test_in_dir_rejects_bad_limits() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::in_dir(dir.path(), 0.0, 10).is_err());
        assert!(Config::in_dir(dir.path(), f64::NAN, 10).is_err());
        assert!(Config::in_dir(dir.path(), 100.0, -1).is_err());
    }

    #[test]
    fn test_parse_env() {
        assert_eq!(parse_env::<f64>("X", None).unwrap(), None);
        assert_eq!(parse_env::<f64>("X", Some("  ".into())).unwrap(), None);
        assert_eq!(parse_env::<f64>("X", Some("80".into())).unwrap(), Some(80.0));
        assert_eq!(parse_env::<i64>("X", Some(" 15 ".into())).unwrap(), Some(15));
        assert!(parse_env::<i64>("X", Some("soon".into())).is_err());
    }
}
