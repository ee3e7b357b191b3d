use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::CatalogId;
use crate::billing::PricingModel;

/// Invoice cadence chosen on the plan details step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BillingFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillingFrequency::Hourly => "HOURLY",
            BillingFrequency::Daily => "DAILY",
            BillingFrequency::Weekly => "WEEKLY",
            BillingFrequency::Monthly => "MONTHLY",
            BillingFrequency::Yearly => "YEARLY",
        };
        f.pad(label)
    }
}

/// A named pricing model attached to a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_plan_id: Option<CatalogId>,
    pub rate_plan_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<CatalogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_frequency: Option<BillingFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub pricing: PricingModel,
}

impl RatePlan {
    /// Wrap a bare pricing model, e.g. one read from a file without plan
    /// details
    pub fn from_model(name: impl Into<String>, pricing: PricingModel) -> Self {
        Self {
            rate_plan_id: None,
            rate_plan_name: name.into(),
            product_id: None,
            product_name: None,
            description: None,
            billing_frequency: None,
            currency: None,
            pricing,
        }
    }
}

#[derive(Debug, Error)]
pub enum PlanFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_json(path: &Path) -> Result<serde_json::Value, PlanFileError> {
    let content = fs::read_to_string(path).map_err(|source| PlanFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| PlanFileError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

impl RatePlan {
    /// Load a rate plan file. Accepts a full plan object or a bare pricing
    /// model; a bare model is named after the file stem.
    pub fn load(path: &Path) -> Result<Self, PlanFileError> {
        let value = read_json(path)?;
        let decode_error = |source| PlanFileError::Decode {
            path: path.to_path_buf(),
            source,
        };

        if value.get("ratePlanName").is_some() {
            return serde_json::from_value(value).map_err(decode_error);
        }

        let pricing: PricingModel = serde_json::from_value(value).map_err(decode_error)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("rate plan");
        Ok(Self::from_model(name, pricing))
    }

    /// Load a JSON array of rate plans (offline catalog snapshot)
    pub fn load_list(path: &Path) -> Result<Vec<Self>, PlanFileError> {
        let value = read_json(path)?;
        serde_json::from_value(value).map_err(|source| PlanFileError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Find a plan by name: exact match first, then case-insensitive
pub fn find_rate_plan<'a>(plans: &'a [RatePlan], name: &str) -> Option<&'a RatePlan> {
    if let Some(plan) = plans.iter().find(|p| p.rate_plan_name == name) {
        return Some(plan);
    }

    let wanted = name.trim().to_lowercase();
    plans
        .iter()
        .find(|p| p.rate_plan_name.trim().to_lowercase() == wanted)
}
