use super::defaults::API_URL_ENV;
use super::types::{Config, ConfigError};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the default config, falling back to built-in defaults on any error
    pub fn load() -> Config {
        Config::load().unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable configuration: {}", e);
            Config::default()
        })
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from default location, then apply environment
    /// overrides
    pub fn load() -> Result<Config, ConfigError> {
        let config_path = Self::get_config_path();

        let mut config = if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            ConfigLoader::load_from_path(&config_path)?
        } else {
            Config::default()
        };

        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    fn apply_api_url_override(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            debug!("{} overrides api.base_url", API_URL_ENV);
            self.api.base_url = url.trim().to_string();
        }
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        ConfigLoader::save_to_path(self, Self::get_config_path())
    }

    /// Get the default config file path (~/.ratecard/config.toml)
    pub fn get_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(".ratecard").join("config.toml")
        } else {
            PathBuf::from(".ratecard/config.toml")
        }
    }

    /// Initialize config directory and create default config
    pub fn init() -> Result<(), ConfigError> {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            Config::default().save()?;
            println!("Created config at {}", config_path.display());
        } else {
            println!("Config already exists at {}", config_path.display());
        }

        Ok(())
    }

    /// Validate configuration
    pub fn check(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL: {}",
                url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        let currency = self.billing.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid(format!(
                "billing.currency must be a three-letter ISO 4217 code: {:?}",
                self.billing.currency
            )));
        }

        Ok(())
    }

    /// Print configuration as TOML
    pub fn print(&self) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        println!("{}", content);
        Ok(())
    }
}
