use crate::billing::validate::{validate, ValidatedModel, ValidationError};
use crate::billing::{Money, PricingModel, Quantity, RatePlanType, TierRange, UpperBound};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

/// Decimal places used when no currency is given
pub const DEFAULT_SCALE: u32 = 2;

/// Currency assumed when neither the plan nor the config names one
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("usage cannot be negative (got {0})")]
    NegativeUsage(Quantity),
    #[error("pricing model is invalid: {0}")]
    InvalidModel(#[from] ValidationError),
    #[error("no tier covers usage {0}")]
    NoMatchingTier(Quantity),
    #[error("charge exceeds the largest representable amount")]
    Overflow,
}

/// One row of a charge breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeLine {
    /// Zero-based tier index, `None` for flat fee and usage based lines
    pub tier_index: Option<usize>,
    pub from: Quantity,
    pub to: UpperBound,
    /// Units billed on this line
    pub quantity: Quantity,
    /// Per-unit rate, `None` when the line is a flat amount
    pub unit_price: Option<Money>,
    /// Unrounded line amount
    pub amount: Money,
}

/// Evaluated charge with the lines it was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub rate_plan_type: RatePlanType,
    pub usage: Quantity,
    pub currency: String,
    pub lines: Vec<ChargeLine>,
    /// Sum of the lines, rounded half-up to the currency's minor unit
    pub total: Money,
}

/// Minor-unit precision of an ISO 4217 currency
pub fn minor_units(currency: &str) -> u32 {
    match currency.trim().to_ascii_uppercase().as_str() {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "UYI" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        _ => DEFAULT_SCALE,
    }
}

/// Round half-up (away from zero) to `scale` decimal places
pub fn round_money(amount: Money, scale: u32) -> Money {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Evaluate the charge for `usage`, rounded to two decimal places.
///
/// The model is checked before evaluation; a model that fails [`validate`]
/// yields [`EvaluationError::InvalidModel`]. Use [`ValidatedModel::evaluate`]
/// to skip the check for models validated at submission time.
pub fn evaluate(model: &PricingModel, usage: Quantity) -> Result<Money, EvaluationError> {
    check_usage(usage)?;
    validate(model)?;
    let lines = charge_lines(model, usage)?;
    Ok(round_money(sum_lines(&lines)?, DEFAULT_SCALE))
}

/// Evaluate the charge rounded to `currency`'s minor unit
pub fn evaluate_in(
    model: &PricingModel,
    usage: Quantity,
    currency: &str,
) -> Result<Money, EvaluationError> {
    quote(model, usage, currency).map(|quote| quote.total)
}

/// Evaluate the charge together with its per-tier breakdown
pub fn quote(
    model: &PricingModel,
    usage: Quantity,
    currency: &str,
) -> Result<Quote, EvaluationError> {
    check_usage(usage)?;
    validate(model)?;
    build_quote(model, usage, currency)
}

impl ValidatedModel {
    /// Evaluate without re-validating, rounded to two decimal places
    pub fn evaluate(&self, usage: Quantity) -> Result<Money, EvaluationError> {
        check_usage(usage)?;
        let lines = charge_lines(self.model(), usage)?;
        Ok(round_money(sum_lines(&lines)?, DEFAULT_SCALE))
    }

    pub fn quote(&self, usage: Quantity, currency: &str) -> Result<Quote, EvaluationError> {
        check_usage(usage)?;
        build_quote(self.model(), usage, currency)
    }
}

fn check_usage(usage: Quantity) -> Result<(), EvaluationError> {
    if usage < Decimal::ZERO {
        return Err(EvaluationError::NegativeUsage(usage));
    }
    Ok(())
}

fn build_quote(
    model: &PricingModel,
    usage: Quantity,
    currency: &str,
) -> Result<Quote, EvaluationError> {
    let lines = charge_lines(model, usage)?;
    let total = round_money(sum_lines(&lines)?, minor_units(currency));

    Ok(Quote {
        rate_plan_type: model.rate_plan_type(),
        usage,
        currency: currency.trim().to_ascii_uppercase(),
        lines,
        total,
    })
}

fn sum_lines(lines: &[ChargeLine]) -> Result<Money, EvaluationError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total
            .checked_add(line.amount)
            .ok_or(EvaluationError::Overflow)
    })
}

fn line_amount(quantity: Quantity, price: Money) -> Result<Money, EvaluationError> {
    quantity
        .checked_mul(price)
        .ok_or(EvaluationError::Overflow)
}

/// Build the breakdown for a model that already passed validation
fn charge_lines(model: &PricingModel, usage: Quantity) -> Result<Vec<ChargeLine>, EvaluationError> {
    match model {
        // The usage limit is informational: the fee does not scale past it.
        PricingModel::FlatFee {
            recurring_fee,
            usage_limit,
        } => Ok(vec![ChargeLine {
            tier_index: None,
            from: Decimal::ZERO,
            to: UpperBound::from(*usage_limit),
            quantity: usage,
            unit_price: None,
            amount: *recurring_fee,
        }]),
        PricingModel::UsageBased { per_unit_amount } => Ok(vec![ChargeLine {
            tier_index: None,
            from: Decimal::ZERO,
            to: UpperBound::Unbounded,
            quantity: usage,
            unit_price: Some(*per_unit_amount),
            amount: line_amount(usage, *per_unit_amount)?,
        }]),
        PricingModel::Tiered { tiers } => graduated_lines(tiers, usage),
        PricingModel::VolumeBased { tiers } => bracket_line(tiers, usage).map(|line| vec![line]),
        PricingModel::StairStep { steps } => bracket_line(steps, usage).map(|line| vec![line]),
    }
}

/// Progressive pricing: each crossed tier bills its full width at its own
/// rate, the containing tier bills the remainder. Usage past a bounded last
/// tier bills every tier in full.
fn graduated_lines(tiers: &[TierRange], usage: Quantity) -> Result<Vec<ChargeLine>, EvaluationError> {
    let mut lines = Vec::new();

    for (index, tier) in tiers.iter().enumerate() {
        if usage < tier.from {
            // Only reachable on the first tier of a contiguous list
            return Ok(lines);
        }

        let (quantity, done) = match tier.to {
            UpperBound::Bounded(to) if usage >= to => (to - tier.from, false),
            _ => (usage - tier.from, true),
        };

        lines.push(ChargeLine {
            tier_index: Some(index),
            from: tier.from,
            to: tier.to,
            quantity,
            unit_price: Some(tier.price),
            amount: line_amount(quantity, tier.price)?,
        });

        if done {
            break;
        }
    }

    Ok(lines)
}

/// Volume and stair-step pricing: the bracket holding the total usage sets a
/// flat charge for all of it.
fn bracket_line(tiers: &[TierRange], usage: Quantity) -> Result<ChargeLine, EvaluationError> {
    tiers
        .iter()
        .enumerate()
        .find(|(_, tier)| tier.contains(usage))
        .map(|(index, tier)| ChargeLine {
            tier_index: Some(index),
            from: tier.from,
            to: tier.to,
            quantity: usage,
            unit_price: None,
            amount: tier.price,
        })
        .ok_or(EvaluationError::NoMatchingTier(usage))
}

/// Format an amount with its currency, e.g. `260.00 USD`
pub fn format_money(amount: Money, currency: &str) -> String {
    let scale = minor_units(currency);
    format!(
        "{:.*} {}",
        scale as usize,
        round_money(amount, scale),
        currency.trim().to_ascii_uppercase()
    )
}
