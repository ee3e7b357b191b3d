pub mod calculator;
pub mod types;
pub mod validate;
pub mod wire;

pub use calculator::{
    evaluate, evaluate_in, format_money, quote, ChargeLine, EvaluationError, Quote,
};
pub use types::{Money, PricingModel, Quantity, RatePlanType, TierRange, UpperBound};
pub use validate::{validate, ValidatedModel, ValidationError};
pub use wire::{decode_model, encode_model, WireError};
