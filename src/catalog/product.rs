use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::CatalogId;

/// Message the product form shows for a duplicate name
pub const DUPLICATE_NAME_MESSAGE: &str = "Product Name must be unique.";

/// Kind of data product sold through the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "FlatFile")]
    FlatFile,
    #[serde(rename = "SQLResult")]
    SqlResult,
    #[serde(rename = "LLMToken")]
    LlmToken,
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProductType::Api => "API",
            ProductType::FlatFile => "FlatFile",
            ProductType::SqlResult => "SQLResult",
            ProductType::LlmToken => "LLMToken",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown product type: {0}")]
pub struct UnknownProductType(pub String);

impl FromStr for ProductType {
    type Err = UnknownProductType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "api" => Ok(ProductType::Api),
            "flatfile" => Ok(ProductType::FlatFile),
            "sqlresult" => Ok(ProductType::SqlResult),
            "llmtoken" => Ok(ProductType::LlmToken),
            _ => Err(UnknownProductType(s.to_string())),
        }
    }
}

/// Product record as listed by `GET /api/products`.
/// Type-specific configuration fields are not modeled and are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<CatalogId>,
    pub product_name: String,
    /// Kept raw so unknown types from the backend still decode
    #[serde(default)]
    pub product_type: String,
    #[serde(default, alias = "productDescription")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub visibility: bool,
    #[serde(default)]
    pub effective_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub effective_end_date: Option<NaiveDate>,
}

impl Product {
    pub fn kind(&self) -> Option<ProductType> {
        self.product_type.parse().ok()
    }

    /// Whether `date` falls inside the product's effective window (inclusive)
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.effective_start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.effective_end_date {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive, whitespace-trimmed name collision check
pub fn is_product_name_taken(products: &[Product], name: &str) -> bool {
    let wanted = name.trim().to_lowercase();
    products
        .iter()
        .any(|product| product.product_name.trim().to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product {
            product_id: Some(CatalogId::Number(1)),
            product_name: name.to_string(),
            product_type: "API".to_string(),
            description: None,
            category: None,
            status: None,
            version: None,
            visibility: true,
            effective_start_date: None,
            effective_end_date: None,
        }
    }

    #[test]
    fn test_decode_backend_product() {
        let json = r#"{
            "productId": "p-42",
            "productName": "Weather API",
            "productType": "API",
            "description": "Hourly forecasts",
            "category": "Data",
            "status": "ACTIVE",
            "version": "1.0",
            "visibility": true,
            "endpointUrl": "https://example.com/weather",
            "effectiveStartDate": "2024-01-01"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_id, Some(CatalogId::Text("p-42".into())));
        assert_eq!(product.kind(), Some(ProductType::Api));
        assert_eq!(
            product.effective_start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn test_unknown_product_type_still_decodes() {
        let json = r#"{"productId": 7, "productName": "Legacy", "productType": "Widget"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.kind(), None);
        assert!(!product.visibility);
    }

    #[test]
    fn test_product_type_parsing() {
        assert_eq!("SQLResult".parse::<ProductType>(), Ok(ProductType::SqlResult));
        assert_eq!("llm_token".parse::<ProductType>(), Ok(ProductType::LlmToken));
        assert_eq!("Flat File".parse::<ProductType>(), Ok(ProductType::FlatFile));
        assert_eq!(
            "Widget".parse::<ProductType>(),
            Err(UnknownProductType("Widget".to_string()))
        );
        assert_eq!(ProductType::LlmToken.to_string(), "LLMToken");
    }

    #[test]
    fn test_name_taken_is_case_insensitive() {
        let products = vec![product("Weather API"), product("Token Meter")];
        assert!(is_product_name_taken(&products, "weather api"));
        assert!(is_product_name_taken(&products, "  TOKEN METER "));
        assert!(!is_product_name_taken(&products, "Weather"));
    }

    #[test]
    fn test_effective_window() {
        let mut p = product("Windowed");
        p.effective_start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        p.effective_end_date = NaiveDate::from_ymd_opt(2024, 12, 31);

        assert!(!p.is_effective_on(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        assert!(p.is_effective_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(p.is_effective_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!p.is_effective_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }
}
