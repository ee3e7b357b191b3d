use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::wire::{PricingModelWire, WireError};

/// Monetary amount, always decimal
pub type Money = Decimal;

/// Usage quantity (API calls, rows, tokens, files...)
pub type Quantity = Decimal;

/// Upper limit of a tier. `Unbounded` is the UI's "no upper limit" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Quantity>", into = "Option<Quantity>")]
pub enum UpperBound {
    Bounded(Quantity),
    Unbounded,
}

impl UpperBound {
    pub fn value(&self) -> Option<Quantity> {
        match self {
            UpperBound::Bounded(to) => Some(*to),
            UpperBound::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, UpperBound::Unbounded)
    }
}

impl From<Option<Quantity>> for UpperBound {
    fn from(value: Option<Quantity>) -> Self {
        value.map_or(UpperBound::Unbounded, UpperBound::Bounded)
    }
}

impl From<UpperBound> for Option<Quantity> {
    fn from(bound: UpperBound) -> Self {
        bound.value()
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpperBound::Bounded(to) => write!(f, "{}", to),
            UpperBound::Unbounded => write!(f, "∞"),
        }
    }
}

/// A usage range `[from, to)` with its price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRange {
    pub from: Quantity,
    pub to: UpperBound,
    pub price: Money,
}

impl TierRange {
    pub fn new(from: Quantity, to: Quantity, price: Money) -> Self {
        Self {
            from,
            to: UpperBound::Bounded(to),
            price,
        }
    }

    /// Final tier with no upper limit
    pub fn unbounded(from: Quantity, price: Money) -> Self {
        Self {
            from,
            to: UpperBound::Unbounded,
            price,
        }
    }

    /// Half-open containment: `from <= usage < to`
    pub fn contains(&self, usage: Quantity) -> bool {
        if usage < self.from {
            return false;
        }
        match self.to {
            UpperBound::Bounded(to) => usage < to,
            UpperBound::Unbounded => true,
        }
    }

    /// Number of units the tier spans, `None` when unbounded
    pub fn width(&self) -> Option<Quantity> {
        self.to.value().map(|to| to - self.from)
    }
}

/// Rate plan pricing model selected in the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatePlanType {
    #[serde(rename = "FLAT_FEE")]
    FlatFee,
    #[serde(rename = "TIERED")]
    Tiered,
    #[serde(rename = "VOLUME_BASED")]
    VolumeBased,
    #[serde(rename = "STAIRSTEP", alias = "STAIR_STEP")]
    StairStep,
    #[serde(rename = "USAGE_BASED")]
    UsageBased,
}

impl RatePlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatePlanType::FlatFee => "FLAT_FEE",
            RatePlanType::Tiered => "TIERED",
            RatePlanType::VolumeBased => "VOLUME_BASED",
            RatePlanType::StairStep => "STAIRSTEP",
            RatePlanType::UsageBased => "USAGE_BASED",
        }
    }
}

impl fmt::Display for RatePlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RatePlanType {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The wizard sends upper case; its setup screen compares lower case.
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "FLAT_FEE" | "FLAT" => Ok(RatePlanType::FlatFee),
            "TIERED" => Ok(RatePlanType::Tiered),
            "VOLUME_BASED" | "VOLUME" => Ok(RatePlanType::VolumeBased),
            "STAIRSTEP" | "STAIR_STEP" => Ok(RatePlanType::StairStep),
            "USAGE_BASED" | "USAGE" => Ok(RatePlanType::UsageBased),
            _ => Err(WireError::UnknownPlanType(s.to_string())),
        }
    }
}

/// Pricing model definition of a rate plan.
///
/// Values are immutable once built; `validate` and `evaluate` only read them.
/// The JSON form is the wizard's `{ ratePlanType, tiers: [...] }` shape, see
/// [`crate::billing::wire`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PricingModelWire", into = "PricingModelWire")]
pub enum PricingModel {
    FlatFee {
        recurring_fee: Money,
        usage_limit: Option<Quantity>,
    },
    Tiered {
        tiers: Vec<TierRange>,
    },
    VolumeBased {
        tiers: Vec<TierRange>,
    },
    StairStep {
        steps: Vec<TierRange>,
    },
    UsageBased {
        per_unit_amount: Money,
    },
}

impl PricingModel {
    pub fn rate_plan_type(&self) -> RatePlanType {
        match self {
            PricingModel::FlatFee { .. } => RatePlanType::FlatFee,
            PricingModel::Tiered { .. } => RatePlanType::Tiered,
            PricingModel::VolumeBased { .. } => RatePlanType::VolumeBased,
            PricingModel::StairStep { .. } => RatePlanType::StairStep,
            PricingModel::UsageBased { .. } => RatePlanType::UsageBased,
        }
    }

    /// Tier (or step) list for the bracket models
    pub fn tiers(&self) -> Option<&[TierRange]> {
        match self {
            PricingModel::Tiered { tiers } | PricingModel::VolumeBased { tiers } => Some(tiers),
            PricingModel::StairStep { steps } => Some(steps),
            PricingModel::FlatFee { .. } | PricingModel::UsageBased { .. } => None,
        }
    }
}
