use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use grnsync_core::{SyncError, SyncResult};

pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_MONTHS_AHEAD: u32 = 2;

const TEMPLATE: &str = r#"[garoon]
url = ""            # e.g. "https://example.cybozu.com/g"
account = ""
password = ""

[google]
client_id = ""      # "...apps.googleusercontent.com"
client_secret = ""
# calendar_id = "primary"   # defaults to the first calendar in your list

[sync]
timezone = "Asia/Tokyo"     # used when a Garoon event carries no zone
months_ahead = 2            # sync until the end of this month plus N months
concurrency = 8             # events handled at once
"#;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub garoon: GaroonConfig,
    pub google: GoogleConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Deserialize)]
pub struct GaroonConfig {
    pub url: String,
    pub account: String,
    #[serde(default)]
    pub password: String,
}

/// OAuth credentials for Google Calendar
#[derive(Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub calendar_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub timezone: String,
    pub months_ahead: u32,
    pub concurrency: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            timezone: DEFAULT_TIMEZONE.to_string(),
            months_ahead: DEFAULT_MONTHS_AHEAD,
            concurrency: grnsync_core::context::DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> SyncResult<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SyncResult<()> {
        let required = [
            ("garoon.url", &self.garoon.url),
            ("garoon.account", &self.garoon.account),
            ("google.client_id", &self.google.client_id),
            ("google.client_secret", &self.google.client_secret),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(SyncError::Config(format!("{} must not be empty", key)));
            }
        }

        self.timezone()?;

        if self.sync.concurrency == 0 {
            return Err(SyncError::Config(
                "sync.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timezone(&self) -> SyncResult<Tz> {
        self.sync.timezone.parse::<Tz>().map_err(|_| {
            SyncError::Config(format!("Unknown sync.timezone: {}", self.sync.timezone))
        })
    }

    /// A configured calendar id, ignoring blank values.
    pub fn calendar_id(&self) -> Option<&str> {
        self.google
            .calendar_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Get the config file path (~/.config/grnsync/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("grnsync")
        .join("config.toml"))
}

/// Write the commented template to `path` unless a file already exists there.
/// Returns true when the template was written.
pub fn ensure_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
    }

    std::fs::write(path, TEMPLATE)
        .with_context(|| format!("Failed to write config template at {}", path.display()))?;

    // The file will hold the Garoon password
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(true)
}

pub fn load(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    Config::parse(&contents)
        .with_context(|| format!("Invalid config file at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        [garoon]
        url = "https://example.cybozu.com/g"
        account = "alice"
        password = "pw"

        [google]
        client_id = "id.apps.googleusercontent.com"
        client_secret = "secret"
    "#;

    #[test]
    fn defaults_fill_sync_section() {
        let config = Config::parse(VALID).unwrap();
        assert_eq!(config.sync.timezone, "Asia/Tokyo");
        assert_eq!(config.sync.months_ahead, 2);
        assert_eq!(config.sync.concurrency, 8);
        assert_eq!(config.calendar_id(), None);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn explicit_settings_are_read() {
        let toml = format!(
            "{}\ncalendar_id = \"team@group.calendar.google.com\"\n\n[sync]\ntimezone = \"Europe/Berlin\"\nmonths_ahead = 5\nconcurrency = 2\n",
            VALID
        );
        let config = Config::parse(&toml).unwrap();
        assert_eq!(config.calendar_id(), Some("team@group.calendar.google.com"));
        assert_eq!(config.sync.months_ahead, 5);
        assert_eq!(config.sync.concurrency, 2);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn blank_required_value_is_rejected() {
        let toml = VALID.replace("account = \"alice\"", "account = \" \"");
        let err = Config::parse(&toml).unwrap_err();
        assert_eq!(
            err,
            SyncError::Config("garoon.account must not be empty".to_string())
        );
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let toml = format!("{}\n[sync]\ntimezone = \"Mars/Olympus\"\n", VALID);
        assert!(matches!(Config::parse(&toml), Err(SyncError::Config(_))));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let toml = format!("{}\n[sync]\nconcurrency = 0\n", VALID);
        assert!(matches!(Config::parse(&toml), Err(SyncError::Config(_))));
    }

    #[test]
    fn untouched_template_fails_validation() {
        assert!(matches!(Config::parse(TEMPLATE), Err(SyncError::Config(_))));
    }

    #[test]
    fn template_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grnsync").join("config.toml");

        assert!(ensure_template(&path).unwrap());
        std::fs::write(&path, VALID).unwrap();
        assert!(!ensure_template(&path).unwrap());

        let config = load(&path).unwrap();
        assert_eq!(config.garoon.account, "alice");
    }
}
