use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file consulted when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "glacier-drain.toml";

/// Prefix for environment overrides, e.g. `GLACIER_DRAIN_POLLING__INTERVAL_SECS=60`.
pub const ENV_PREFIX: &str = "GLACIER_DRAIN_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub region: String,
    /// Account owning the vaults. `-` means the account of the active credentials.
    pub account_id: String,
    pub vault_list: PathBuf,
    pub database_path: PathBuf,
    pub simulation: bool,
    /// Remove the vault once every archive in it was deleted successfully.
    pub delete_vault: bool,
    pub logging: LoggingConfig,
    pub polling: PollingConfig,
    pub throttle: ThrottleConfig,
    pub notifications: NotificationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: "-".to_string(),
            vault_list: PathBuf::from("VaultsToBeDeleted.txt"),
            database_path: PathBuf::from("glacier_drain.db"),
            simulation: false,
            delete_vault: true,
            logging: LoggingConfig::default(),
            polling: PollingConfig::default(),
            throttle: ThrottleConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append-only log destination. `None` logs to stdout.
    pub file: Option<PathBuf>,
    pub json: bool,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("app.log")),
            json: false,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    /// Give up on an inventory job after this long. Unbounded when unset.
    pub max_wait_secs: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 20 * 60,
            max_wait_secs: None,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Pause after this many processed archives.
    pub pause_every: u64,
    pub pause_ms: u64,
    /// Log a progress line after this many processed archives.
    pub progress_every: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            pause_every: 100,
            pause_ms: 1000,
            progress_every: 10_000,
        }
    }
}

impl ThrottleConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannelType {
    #[default]
    None,
    Slack,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel: NotificationChannelType,
    pub slack_webhook: Option<String>,
}

impl AppConfig {
    /// Layer defaults, the TOML file, `GLACIER_DRAIN_*` variables and CLI overrides,
    /// in increasing order of precedence.
    pub fn new<T: Serialize>(config_file: Option<&Path>, overrides: Option<&T>) -> Result<Self> {
        let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            bail!("polling.interval_secs must be greater than zero");
        }
        if self.throttle.pause_every == 0 {
            bail!("throttle.pause_every must be greater than zero");
        }
        if self.throttle.progress_every == 0 {
            bail!("throttle.progress_every must be greater than zero");
        }
        Ok(())
    }
}
