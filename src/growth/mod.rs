//! Growth blocks
//!
//! Definitions are shared, immutable records. Individual placed blocks can be
//! tuned through typed mutations which accumulate into per-position overrides.

pub mod definition;
pub mod field;
pub mod mutation;

pub use definition::GrowthBlockDefinition;
pub use field::{
    BoolField, DoubleField, FieldValue, GrowthField, Identifier, IdentifierField, IntField,
};
pub use mutation::{GrowthMutation, GrowthOverrides, ScheduledMutation};
