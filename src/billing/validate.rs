use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{PricingModel, TierRange, UpperBound};

/// Structural problems in a pricing model.
///
/// `index` is the zero-based position of the offending tier; `None` points at
/// the flat fee, usage limit or per-unit amount of a tierless model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tier list is empty")]
    EmptyTierList,
    #[error("tier {} overlaps the tier before it", .index + 1)]
    OverlappingTiers { index: usize },
    #[error("gap in coverage before tier {}", .index + 1)]
    GapInCoverage { index: usize },
    #[error("negative price{}", position(.index))]
    NegativePrice { index: Option<usize> },
    #[error("invalid bounds{}", position(.index))]
    InvalidBounds { index: Option<usize> },
    #[error("tier {} has no upper limit but is not the last tier", .index + 1)]
    MisplacedUnboundedTier { index: usize },
}

fn position(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(" in tier {}", index + 1),
        None => String::new(),
    }
}

impl ValidationError {
    /// Field-level message for the rate plan form
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyTierList => "Add at least one tier.",
            ValidationError::OverlappingTiers { .. } => "Tier ranges must not overlap.",
            ValidationError::GapInCoverage { .. } => "Tier ranges must be contiguous.",
            ValidationError::NegativePrice { .. } => "Price cannot be negative.",
            ValidationError::InvalidBounds { index: Some(_) } => {
                "Tier upper limit must be greater than its lower limit."
            }
            ValidationError::InvalidBounds { index: None } => "Usage limit cannot be negative.",
            ValidationError::MisplacedUnboundedTier { .. } => {
                "Only the last tier can have no upper limit."
            }
        }
    }
}

/// Check a pricing model's invariants
pub fn validate(model: &PricingModel) -> Result<(), ValidationError> {
    match model {
        PricingModel::FlatFee {
            recurring_fee,
            usage_limit,
        } => {
            if *recurring_fee < Decimal::ZERO {
                return Err(ValidationError::NegativePrice { index: None });
            }
            match usage_limit {
                Some(limit) if *limit < Decimal::ZERO => {
                    Err(ValidationError::InvalidBounds { index: None })
                }
                _ => Ok(()),
            }
        }
        PricingModel::UsageBased { per_unit_amount } => {
            if *per_unit_amount < Decimal::ZERO {
                return Err(ValidationError::NegativePrice { index: None });
            }
            Ok(())
        }
        PricingModel::Tiered { tiers } | PricingModel::VolumeBased { tiers } => {
            validate_tiers(tiers)
        }
        PricingModel::StairStep { steps } => validate_tiers(steps),
    }
}

/// Tiers must be non-empty, ordered, contiguous and at most the last one
/// unbounded. Each tier is checked for bounds, then price, then placement of
/// an unbounded tier, then against the tier before it. Out-of-order tiers
/// surface as `OverlappingTiers` since the later tier starts before the
/// earlier one ends.
fn validate_tiers(tiers: &[TierRange]) -> Result<(), ValidationError> {
    let Some(last) = tiers.len().checked_sub(1) else {
        return Err(ValidationError::EmptyTierList);
    };

    for (index, tier) in tiers.iter().enumerate() {
        let bad_bounds = match tier.to {
            UpperBound::Bounded(to) => tier.from >= to,
            UpperBound::Unbounded => false,
        };
        if bad_bounds || (index == 0 && tier.from < Decimal::ZERO) {
            return Err(ValidationError::InvalidBounds { index: Some(index) });
        }
        if tier.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice { index: Some(index) });
        }
        if tier.to.is_unbounded() && index != last {
            return Err(ValidationError::MisplacedUnboundedTier { index });
        }

        if index > 0 {
            // The previous tier is bounded, otherwise it was rejected above.
            if let UpperBound::Bounded(prev_to) = tiers[index - 1].to {
                if tier.from < prev_to {
                    return Err(ValidationError::OverlappingTiers { index });
                }
                if tier.from > prev_to {
                    return Err(ValidationError::GapInCoverage { index });
                }
            }
        }
    }

    Ok(())
}

/// A pricing model that passed [`validate`].
///
/// Holding one is the proof evaluation relies on to skip re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedModel(PricingModel);

impl ValidatedModel {
    pub fn new(model: PricingModel) -> Result<Self, ValidationError> {
        validate(&model)?;
        Ok(Self(model))
    }

    pub fn model(&self) -> &PricingModel {
        &self.0
    }

    pub fn into_inner(self) -> PricingModel {
        self.0
    }
}

impl TryFrom<PricingModel> for ValidatedModel {
    type Error = ValidationError;

    fn try_from(model: PricingModel) -> Result<Self, Self::Error> {
        Self::new(model)
    }
}

impl AsRef<PricingModel> for ValidatedModel {
    fn as_ref(&self) -> &PricingModel {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tiered(tiers: Vec<TierRange>) -> PricingModel {
        PricingModel::Tiered { tiers }
    }

    #[test]
    fn test_valid_tier_list() {
        let model = tiered(vec![
            TierRange::new(dec!(0), dec!(100), dec!(1)),
            TierRange::new(dec!(100), dec!(500), dec!(0.8)),
            TierRange::unbounded(dec!(500), dec!(0.5)),
        ]);
        assert_eq!(validate(&model), Ok(()));
    }

    #[test]
    fn test_bounded_last_tier_is_valid() {
        let model = PricingModel::VolumeBased {
            tiers: vec![
                TierRange::new(dec!(0), dec!(10), dec!(5)),
                TierRange::new(dec!(10), dec!(20), dec!(8)),
            ],
        };
        assert_eq!(validate(&model), Ok(()));
    }

    #[test]
    fn test_empty_tier_list() {
        assert_eq!(
            validate(&tiered(vec![])),
            Err(ValidationError::EmptyTierList)
        );
        let stair = PricingModel::StairStep { steps: vec![] };
        assert_eq!(validate(&stair), Err(ValidationError::EmptyTierList));
    }

    #[test]
    fn test_gap_in_coverage() {
        let model = tiered(vec![
            TierRange::new(dec!(0), dec!(10), dec!(5)),
            TierRange::new(dec!(20), dec!(30), dec!(8)),
        ]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::GapInCoverage { index: 1 })
        );
    }

    #[test]
    fn test_overlapping_tiers() {
        let model = tiered(vec![
            TierRange::new(dec!(0), dec!(10), dec!(5)),
            TierRange::new(dec!(5), dec!(15), dec!(8)),
        ]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::OverlappingTiers { index: 1 })
        );
    }

    #[test]
    fn test_out_of_order_tiers_are_overlapping() {
        let model = tiered(vec![
            TierRange::new(dec!(10), dec!(20), dec!(5)),
            TierRange::new(dec!(0), dec!(10), dec!(8)),
        ]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::OverlappingTiers { index: 1 })
        );
    }

    #[test]
    fn test_negative_tier_price() {
        let model = tiered(vec![
            TierRange::new(dec!(0), dec!(10), dec!(5)),
            TierRange::unbounded(dec!(10), dec!(-1)),
        ]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::NegativePrice { index: Some(1) })
        );
    }

    #[test]
    fn test_zero_price_is_allowed() {
        let model = tiered(vec![
            TierRange::new(dec!(0), dec!(1000), dec!(0)),
            TierRange::unbounded(dec!(1000), dec!(0.01)),
        ]);
        assert_eq!(validate(&model), Ok(()));
    }

    #[test]
    fn test_invalid_bounds() {
        // The wizard's untouched rows are { from: 0, to: 0, price: 0 }
        let model = tiered(vec![TierRange::new(dec!(0), dec!(0), dec!(0))]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::InvalidBounds { index: Some(0) })
        );

        let reversed = tiered(vec![
            TierRange::new(dec!(0), dec!(10), dec!(1)),
            TierRange::new(dec!(10), dec!(5), dec!(1)),
        ]);
        assert_eq!(
            validate(&reversed),
            Err(ValidationError::InvalidBounds { index: Some(1) })
        );
    }

    #[test]
    fn test_negative_first_from() {
        let model = tiered(vec![TierRange::unbounded(dec!(-5), dec!(1))]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::InvalidBounds { index: Some(0) })
        );
    }

    #[test]
    fn test_unbounded_tier_not_last() {
        let model = tiered(vec![
            TierRange::new(dec!(0), dec!(10), dec!(5)),
            TierRange::unbounded(dec!(10), dec!(4)),
            TierRange::new(dec!(20), dec!(30), dec!(3)),
        ]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::MisplacedUnboundedTier { index: 1 })
        );
    }

    #[test]
    fn test_price_is_checked_before_unbounded_placement() {
        let model = tiered(vec![
            TierRange::unbounded(dec!(0), dec!(-2)),
            TierRange::new(dec!(10), dec!(20), dec!(3)),
        ]);
        assert_eq!(
            validate(&model),
            Err(ValidationError::NegativePrice { index: Some(0) })
        );
    }

    #[test]
    fn test_two_unbounded_tiers() {
        let model = PricingModel::StairStep {
            steps: vec![
                TierRange::unbounded(dec!(0), dec!(5)),
                TierRange::unbounded(dec!(0), dec!(4)),
            ],
        };
        assert_eq!(
            validate(&model),
            Err(ValidationError::MisplacedUnboundedTier { index: 0 })
        );
    }

    #[test]
    fn test_flat_fee_checks() {
        let ok = PricingModel::FlatFee {
            recurring_fee: dec!(99),
            usage_limit: Some(dec!(1000)),
        };
        assert_eq!(validate(&ok), Ok(()));

        let negative = PricingModel::FlatFee {
            recurring_fee: dec!(-1),
            usage_limit: None,
        };
        assert_eq!(
            validate(&negative),
            Err(ValidationError::NegativePrice { index: None })
        );

        let bad_limit = PricingModel::FlatFee {
            recurring_fee: dec!(10),
            usage_limit: Some(dec!(-1)),
        };
        assert_eq!(
            validate(&bad_limit),
            Err(ValidationError::InvalidBounds { index: None })
        );
    }

    #[test]
    fn test_usage_based_checks() {
        let negative = PricingModel::UsageBased {
            per_unit_amount: dec!(-0.02),
        };
        assert_eq!(
            validate(&negative),
            Err(ValidationError::NegativePrice { index: None })
        );
    }

    #[test]
    fn test_validated_model() {
        let model = PricingModel::UsageBased {
            per_unit_amount: dec!(0.02),
        };
        let validated = ValidatedModel::new(model.clone()).unwrap();
        assert_eq!(validated.model(), &model);
        assert_eq!(validated.into_inner(), model);

        let invalid = ValidatedModel::try_from(tiered(vec![]));
        assert_eq!(invalid, Err(ValidationError::EmptyTierList));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::GapInCoverage { index: 1 }.user_message(),
            "Tier ranges must be contiguous."
        );
        assert_eq!(
            ValidationError::GapInCoverage { index: 1 }.to_string(),
            "gap in coverage before tier 2"
        );
        assert_eq!(
            ValidationError::NegativePrice { index: Some(0) }.to_string(),
            "negative price in tier 1"
        );
        assert_eq!(
            ValidationError::NegativePrice { index: None }.to_string(),
            "negative price"
        );
    }
}
