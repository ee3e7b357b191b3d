use log::{debug, warn};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

use super::product::{is_product_name_taken, Product};
use super::rate_plan::{PlanFileError, RatePlan};
use crate::config::Config;

/// Rate plans fetched so far, keyed by backend base URL
static RATE_PLAN_CACHE: Lazy<RwLock<HashMap<String, Vec<RatePlan>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("fallback rate plans unavailable: {0}")]
    Fallback(#[from] PlanFileError),
}

/// Read-only client for the catalog REST backend
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    fallback_file: Option<PathBuf>,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            fallback_file: config.billing.fallback_file.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode { url, source })
    }

    /// `GET /products`
    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        self.get_json("products").await
    }

    /// `GET /rateplans`, bypassing the cache.
    ///
    /// Plans whose pricing does not decode are skipped with a warning rather
    /// than failing the whole listing.
    pub async fn fetch_rate_plans(&self) -> Result<Vec<RatePlan>, ClientError> {
        let raw: Vec<serde_json::Value> = self.get_json("rateplans").await?;
        let total = raw.len();

        let plans: Vec<RatePlan> = raw
            .into_iter()
            .filter_map(|value| {
                let name = value
                    .get("ratePlanName")
                    .and_then(|n| n.as_str())
                    .unwrap_or("<unnamed>")
                    .to_string();
                match serde_json::from_value::<RatePlan>(value) {
                    Ok(plan) => Some(plan),
                    Err(e) => {
                        warn!("Skipping rate plan {:?}: {}", name, e);
                        None
                    }
                }
            })
            .collect();

        debug!(
            "Catalog: fetched {} rate plans, {} with usable pricing",
            total,
            plans.len()
        );

        Ok(plans)
    }

    /// Rate plans, served from the process-wide cache after the first fetch
    pub async fn list_rate_plans(&self) -> Result<Vec<RatePlan>, ClientError> {
        if let Some(cached) = RATE_PLAN_CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.base_url)
        {
            return Ok(cached.clone());
        }

        let plans = self.fetch_rate_plans().await?;
        RATE_PLAN_CACHE
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.base_url.clone(), plans.clone());

        Ok(plans)
    }

    /// Rate plans from the backend, or from the configured fallback file when
    /// the backend cannot be reached
    pub async fn rate_plans_with_fallback(&self) -> Result<Vec<RatePlan>, ClientError> {
        match self.list_rate_plans().await {
            Ok(plans) => Ok(plans),
            Err(e) => match &self.fallback_file {
                Some(path) => {
                    warn!("Failed to fetch rate plans from {}: {}", self.base_url, e);
                    warn!("Using fallback rate plans from {}", path.display());
                    Ok(RatePlan::load_list(path)?)
                }
                None => Err(e),
            },
        }
    }

    /// Whether a product with this name already exists (case-insensitive)
    pub async fn check_product_name(&self, name: &str) -> Result<bool, ClientError> {
        let products = self.list_products().await?;
        Ok(is_product_name_taken(&products, name))
    }

    /// Drop this backend's cached rate plans
    pub fn invalidate(&self) {
        RATE_PLAN_CACHE
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.base_url);
    }
}

/// Clear the rate plan cache for every backend
pub fn clear_rate_plan_cache() {
    RATE_PLAN_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{evaluate, RatePlanType};
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, fallback_file: Option<PathBuf>) -> CatalogClient {
        let mut config = Config::default();
        config.api.base_url = format!("{}/api/", server.uri());
        config.api.timeout_secs = 5;
        config.billing.fallback_file = fallback_file;
        CatalogClient::new(&config).unwrap()
    }

    fn rate_plans_body() -> serde_json::Value {
        serde_json::json!([
            {
                "ratePlanName": "API Tiered",
                "productName": "Weather API",
                "ratePlanType": "TIERED",
                "billingFrequency": "MONTHLY",
                "noUpperLimit": true,
                "tiers": [
                    {"from": 0, "to": 100, "price": 1},
                    {"from": 100, "to": 500, "price": 0.8},
                    {"from": 500, "to": null, "price": 0.5}
                ]
            },
            {
                "ratePlanName": "Broken",
                "ratePlanType": "FLAT_FEE"
            }
        ])
    }

    #[tokio::test]
    async fn test_fetch_rate_plans_skips_undecodable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rateplans"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rate_plans_body()))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert_eq!(client.base_url(), format!("{}/api", server.uri()));

        let plans = client.fetch_rate_plans().await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].pricing.rate_plan_type(), RatePlanType::Tiered);
        assert_eq!(evaluate(&plans[0].pricing, dec!(300)), Ok(dec!(260)));
    }

    #[tokio::test]
    async fn test_list_rate_plans_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rateplans"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rate_plans_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let first = client.list_rate_plans().await.unwrap();
        let second = client.list_rate_plans().await.unwrap();
        assert_eq!(first, second);

        client.invalidate();
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        match client.list_products().await {
            Err(ClientError::Status { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(matches!(
            client.list_products().await,
            Err(ClientError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_fallback_file_used_when_backend_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rateplans"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("rateplans.json");
        std::fs::write(
            &fallback,
            serde_json::to_string(&vec![rate_plans_body()[0].clone()]).unwrap(),
        )
        .unwrap();

        let client = client_for(&server, Some(fallback));
        let plans = client.rate_plans_with_fallback().await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].rate_plan_name, "API Tiered");

        let without_fallback = client_for(&server, None);
        assert!(matches!(
            without_fallback.rate_plans_with_fallback().await,
            Err(ClientError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_check_product_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"productId": 1, "productName": "Weather API", "productType": "API"},
                {"productId": 2, "productName": "Token Meter", "productType": "LLMToken"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(client.check_product_name("weather api").await.unwrap());
        assert!(!client.check_product_name("Sales Export").await.unwrap());
    }
}
