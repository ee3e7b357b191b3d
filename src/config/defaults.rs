use super::types::{ApiConfig, BillingConfig, Config};
use crate::billing::calculator::DEFAULT_CURRENCY;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Overrides `api.base_url`
pub const API_URL_ENV: &str = "RATECARD_API_URL";

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            fallback_file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            billing: BillingConfig::default(),
        }
    }
}
