use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use slide_api::{CloudConfig, DEFAULT_CLOUD_HOST};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub username: String,
    pub password: String,
    /// Overrides the public GoSlide endpoint
    pub host: Option<String>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// Intervals in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinator {
    pub update_interval: u64,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverSettings {
    pub offset: f64,
    /// Milliseconds added to the calibration time before the correction resend
    pub settle_margin: u64,
    /// Milliseconds assumed when a slide never reported its calibration time
    pub calibration_fallback: u64,
    /// Seconds between per-entity updates, 0 disables them
    pub scan_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub cloud: Cloud,
    pub coordinator: Coordinator,
    pub cover: CoverSettings,
}

fn default_verify_ssl() -> bool {
    true
}

impl Settings {
    /// Layer `configs/default`, `configs/{RUN_MODE}` and `SLIDE_*` variables,
    /// e.g. `SLIDE_CLOUD__PASSWORD`.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("SLIDE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Load settings from a TOML document only.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cloud.username.trim().is_empty() || self.cloud.password.is_empty() {
            return Err(ConfigError::Message(
                "cloud.username and cloud.password are required".into(),
            ));
        }
        if self.coordinator.update_interval == 0 {
            return Err(ConfigError::Message(
                "coordinator.update_interval must be positive".into(),
            ));
        }
        if self.coordinator.request_timeout == 0 {
            return Err(ConfigError::Message(
                "coordinator.request_timeout must be positive".into(),
            ));
        }
        if !(0.0..=0.5).contains(&self.cover.offset) {
            return Err(ConfigError::Message(format!(
                "cover.offset must be within [0, 0.5], got {}",
                self.cover.offset
            )));
        }

        Ok(())
    }

    pub fn cloud_config(&self) -> CloudConfig {
        let mut config = CloudConfig::new(&self.cloud.username, &self.cloud.password);
        config.host = self
            .cloud
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_CLOUD_HOST.to_string());
        config.verify_ssl = self.cloud.verify_ssl;
        config
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.coordinator.update_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.coordinator.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../configs/default.toml"));

    fn with_credentials(content: &str) -> String {
        content
            .replace("username = \"\"", "username = \"user@example.com\"")
            .replace("password = \"\"", "password = \"secret\"")
    }

    #[test]
    fn test_default_config_requires_credentials() {
        let err = Settings::from_toml(DEFAULT_CONFIG).unwrap_err();
        assert!(err.to_string().contains("cloud.username"));
    }

    #[test]
    fn test_default_config() {
        let settings = Settings::from_toml(&with_credentials(DEFAULT_CONFIG)).unwrap();

        assert_eq!(settings.update_interval(), Duration::from_secs(60));
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.cover.offset, 0.15);
        assert_eq!(settings.cover.settle_margin, 2000);
        assert_eq!(settings.cover.scan_interval, 20);

        let cloud = settings.cloud_config();
        assert_eq!(cloud.host, DEFAULT_CLOUD_HOST);
        assert!(cloud.verify_ssl);
    }

    #[test]
    fn test_host_override() {
        let content = with_credentials(DEFAULT_CONFIG).replace(
            "verify_ssl = true",
            "verify_ssl = false\nhost = \"https://slide.local/api\"",
        );
        let cloud = Settings::from_toml(&content).unwrap().cloud_config();

        assert_eq!(cloud.host, "https://slide.local/api");
        assert!(!cloud.verify_ssl);
    }

    #[test]
    fn test_offset_out_of_range() {
        let content = with_credentials(DEFAULT_CONFIG).replace("offset = 0.15", "offset = 0.7");
        assert!(Settings::from_toml(&content).is_err());
    }
}
