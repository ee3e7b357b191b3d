//! JSON shape exchanged between the rate plan wizard and the catalog backend.
//!
//! ```json
//! { "ratePlanType": "TIERED",
//!   "noUpperLimit": true,
//!   "tiers": [ { "from": 0, "to": 100, "price": 1 },
//!              { "from": 100, "to": null, "price": "$0.50" } ] }
//! ```
//!
//! Amounts arrive either as JSON numbers or as the form's `"$1,250.00"`
//! strings. Decoding always produces decimals.

use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::types::{PricingModel, RatePlanType, TierRange, UpperBound};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("missing ratePlanType")]
    MissingPlanType,
    #[error("unknown rate plan type: {0}")]
    UnknownPlanType(String),
    #[error("{plan_type} rate plan is missing `{field}`")]
    MissingField {
        plan_type: RatePlanType,
        field: &'static str,
    },
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
    #[error("malformed pricing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw pricing fields as they appear on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingModelWire {
    #[serde(alias = "pricingModel", skip_serializing_if = "Option::is_none")]
    pub rate_plan_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<TierWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<TierWire>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_upper_limit: bool,
    #[serde(
        default,
        deserialize_with = "optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub recurring_fee: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub usage_limit: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_unit_amount: Option<Decimal>,
}

/// One tier row. The volume and stair-step editors once used
/// `start`/`end`/`cost`, which are still accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierWire {
    #[serde(alias = "start", deserialize_with = "required_amount")]
    pub from: Decimal,
    #[serde(default, alias = "end", deserialize_with = "optional_amount")]
    pub to: Option<Decimal>,
    #[serde(alias = "cost", deserialize_with = "required_amount")]
    pub price: Decimal,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

/// Parse a form amount: `"$1,250.00"`, `" 0.8 "`, `"1e3"`.
/// Empty input is `None`.
pub fn parse_amount(raw: &str) -> Result<Option<Decimal>, WireError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Ok(None);
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(Some)
        .map_err(|_| WireError::InvalidAmount(raw.to_string()))
}

fn decode_raw(raw: RawAmount) -> Result<Option<Decimal>, WireError> {
    match raw {
        RawAmount::Number(number) => parse_amount(&number.to_string()),
        RawAmount::Text(text) => parse_amount(&text),
    }
}

fn optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        Some(raw) => decode_raw(raw).map_err(de::Error::custom),
        None => Ok(None),
    }
}

fn required_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawAmount::deserialize(deserializer)?;
    decode_raw(raw)
        .map_err(de::Error::custom)?
        .ok_or_else(|| de::Error::custom("amount is empty"))
}

/// Apply the `noUpperLimit` flag: when set the last row is unbounded
/// whatever its `to` says.
fn tier_list(rows: Option<Vec<TierWire>>, no_upper_limit: bool) -> Vec<TierRange> {
    let rows = rows.unwrap_or_default();
    let last = rows.len().saturating_sub(1);

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| TierRange {
            from: row.from,
            to: if no_upper_limit && index == last {
                UpperBound::Unbounded
            } else {
                UpperBound::from(row.to)
            },
            price: row.price,
        })
        .collect()
}

impl TryFrom<PricingModelWire> for PricingModel {
    type Error = WireError;

    fn try_from(wire: PricingModelWire) -> Result<Self, Self::Error> {
        let plan_type: RatePlanType = wire
            .rate_plan_type
            .as_deref()
            .ok_or(WireError::MissingPlanType)?
            .parse()?;

        let model = match plan_type {
            RatePlanType::FlatFee => PricingModel::FlatFee {
                recurring_fee: wire.recurring_fee.ok_or(WireError::MissingField {
                    plan_type,
                    field: "recurringFee",
                })?,
                usage_limit: wire.usage_limit,
            },
            RatePlanType::Tiered => PricingModel::Tiered {
                tiers: tier_list(wire.tiers, wire.no_upper_limit),
            },
            RatePlanType::VolumeBased => PricingModel::VolumeBased {
                tiers: tier_list(wire.tiers, wire.no_upper_limit),
            },
            RatePlanType::StairStep => PricingModel::StairStep {
                steps: tier_list(wire.steps.or(wire.tiers), wire.no_upper_limit),
            },
            RatePlanType::UsageBased => PricingModel::UsageBased {
                per_unit_amount: wire.per_unit_amount.ok_or(WireError::MissingField {
                    plan_type,
                    field: "perUnitAmount",
                })?,
            },
        };

        Ok(model)
    }
}

impl From<PricingModel> for PricingModelWire {
    fn from(model: PricingModel) -> Self {
        let mut wire = PricingModelWire {
            rate_plan_type: Some(model.rate_plan_type().to_string()),
            ..Default::default()
        };

        match model {
            PricingModel::FlatFee {
                recurring_fee,
                usage_limit,
            } => {
                wire.recurring_fee = Some(recurring_fee);
                wire.usage_limit = usage_limit;
            }
            PricingModel::UsageBased { per_unit_amount } => {
                wire.per_unit_amount = Some(per_unit_amount);
            }
            PricingModel::Tiered { tiers }
            | PricingModel::VolumeBased { tiers }
            | PricingModel::StairStep { steps: tiers } => {
                wire.no_upper_limit = tiers.last().is_some_and(|t| t.to.is_unbounded());
                wire.tiers = Some(
                    tiers
                        .into_iter()
                        .map(|tier| TierWire {
                            from: tier.from,
                            to: tier.to.value(),
                            price: tier.price,
                        })
                        .collect(),
                );
            }
        }

        wire
    }
}

/// Decode a pricing model from its JSON form
pub fn decode_model(json: &str) -> Result<PricingModel, WireError> {
    let wire: PricingModelWire = serde_json::from_str(json)?;
    PricingModel::try_from(wire)
}

/// Encode a pricing model to its canonical JSON form
pub fn encode_model(model: &PricingModel) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(model)?)
}
