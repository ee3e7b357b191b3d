pub mod client;
pub mod product;
pub mod rate_plan;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::{clear_rate_plan_cache, CatalogClient, ClientError};
pub use product::{
    is_product_name_taken, Product, ProductType, UnknownProductType, DUPLICATE_NAME_MESSAGE,
};
pub use rate_plan::{find_rate_plan, BillingFrequency, PlanFileError, RatePlan};

/// Record id as the backend returns it (numeric or string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogId::Number(id) => write!(f, "{}", id),
            CatalogId::Text(id) => f.write_str(id),
        }
    }
}
