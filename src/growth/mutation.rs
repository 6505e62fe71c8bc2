//! Growth mutations and per-position overrides
//!
//! A `GrowthMutation` is a small patch: values to set and fields to clear.
//! `GrowthOverrides` accumulates patches for one block position and layers
//! them over a base definition on demand.

use std::collections::{BTreeMap, BTreeSet};

use glam::IVec3;
use serde::{Deserialize, Serialize};

use super::definition::GrowthBlockDefinition;
use super::field::{
    BoolField, DoubleField, FieldValue, GrowthField, Identifier, IdentifierField, IntField,
};
use crate::WorldKey;
use crate::error::{CollapseError, Result};

/// A patch to a growth block's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MutationRecord", into = "MutationRecord")]
pub struct GrowthMutation {
    values: BTreeMap<GrowthField, FieldValue>,
    clears: BTreeSet<GrowthField>,
}

impl GrowthMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bool(mut self, field: BoolField, value: bool) -> Self {
        self.put(GrowthField::Bool(field), FieldValue::Bool(value));
        self
    }

    /// Set a tick count; negative counts are rejected
    pub fn set_int(mut self, field: IntField, value: i32) -> Result<Self> {
        let field = GrowthField::Int(field);
        let value = FieldValue::Int(value);
        value.check(field)?;
        self.put(field, value);
        Ok(self)
    }

    /// Set a fractional value; non-finite values are rejected
    pub fn set_double(mut self, field: DoubleField, value: f64) -> Result<Self> {
        let field = GrowthField::Double(field);
        let value = FieldValue::Double(value);
        value.check(field)?;
        self.put(field, value);
        Ok(self)
    }

    pub fn set_identifier(mut self, field: IdentifierField, value: Identifier) -> Self {
        self.put(GrowthField::Identifier(field), FieldValue::Identifier(value));
        self
    }

    /// Set any field from an untyped value, checking the type at runtime
    pub fn set(mut self, field: GrowthField, value: FieldValue) -> Result<Self> {
        value.check(field)?;
        self.put(field, value);
        Ok(self)
    }

    /// Set a field by name from a raw string, as typed in a command
    pub fn set_named(self, name: &str, raw: &str) -> Result<Self> {
        let field = GrowthField::from_name(name)?;
        let value = field.parse_value(raw)?;
        self.set(field, value)
    }

    /// Drop any override for `field`, falling back to the base value
    pub fn clear(mut self, field: GrowthField) -> Self {
        self.values.remove(&field);
        self.clears.insert(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.clears.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = (&GrowthField, &FieldValue)> {
        self.values.iter()
    }

    pub fn clears(&self) -> impl Iterator<Item = &GrowthField> {
        self.clears.iter()
    }

    fn put(&mut self, field: GrowthField, value: FieldValue) {
        self.clears.remove(&field);
        self.values.insert(field, value);
    }
}

/// Name-keyed form used in saves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct MutationRecord {
    set: BTreeMap<String, FieldValue>,
    clear: BTreeSet<String>,
}

impl TryFrom<MutationRecord> for GrowthMutation {
    type Error = CollapseError;

    fn try_from(record: MutationRecord) -> Result<Self> {
        let mut mutation = GrowthMutation::new();
        for name in &record.clear {
            mutation = mutation.clear(GrowthField::from_name(name)?);
        }
        for (name, value) in record.set {
            mutation = mutation.set(GrowthField::from_name(&name)?, value)?;
        }
        Ok(mutation)
    }
}

impl From<GrowthMutation> for MutationRecord {
    fn from(mutation: GrowthMutation) -> Self {
        Self {
            set: mutation
                .values
                .into_iter()
                .map(|(f, v)| (f.name().to_string(), v))
                .collect(),
            clear: mutation
                .clears
                .into_iter()
                .map(|f| f.name().to_string())
                .collect(),
        }
    }
}

/// Accumulated overrides for one growth block position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, FieldValue>",
    into = "BTreeMap<String, FieldValue>"
)]
pub struct GrowthOverrides {
    values: BTreeMap<GrowthField, FieldValue>,
}

impl GrowthOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, field: GrowthField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Merge a mutation; returns whether any override actually changed
    pub fn apply_mutation(&mut self, mutation: &GrowthMutation) -> bool {
        let mut changed = false;
        for field in &mutation.clears {
            if mutation.values.contains_key(field) {
                continue;
            }
            changed |= self.values.remove(field).is_some();
        }
        for (field, value) in &mutation.values {
            if self.values.get(field) != Some(value) {
                self.values.insert(*field, value.clone());
                changed = true;
            }
        }
        changed
    }

    /// New definition with these overrides layered over `base`
    pub fn apply(&self, base: &GrowthBlockDefinition) -> GrowthBlockDefinition {
        let mut out = base.clone();
        for (field, value) in &self.values {
            out.set(*field, value);
        }
        out
    }
}

impl TryFrom<BTreeMap<String, FieldValue>> for GrowthOverrides {
    type Error = CollapseError;

    fn try_from(map: BTreeMap<String, FieldValue>) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (name, value) in map {
            let field = GrowthField::from_name(&name)?;
            value.check(field)?;
            values.insert(field, value);
        }
        Ok(Self { values })
    }
}

impl From<GrowthOverrides> for BTreeMap<String, FieldValue> {
    fn from(overrides: GrowthOverrides) -> Self {
        overrides
            .values
            .into_iter()
            .map(|(f, v)| (f.name().to_string(), v))
            .collect()
    }
}

/// A mutation waiting in the scheduler
///
/// Holds only the world key; the world is looked up again when the task runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMutation {
    pub world: WorldKey,
    pub pos: IVec3,
    pub mutation: GrowthMutation,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> GrowthBlockDefinition {
        GrowthBlockDefinition::new(Identifier::parse("collapse:void_growth").unwrap())
    }

    fn mutation() -> GrowthMutation {
        GrowthMutation::new()
            .set_bool(BoolField::Pulling, true)
            .set_double(DoubleField::PullingForce, 0.3)
            .unwrap()
            .set_int(IntField::RateTicks, 5)
            .unwrap()
            .set_identifier(
                IdentifierField::ParticleEffect,
                Identifier::parse("minecraft:reverse_portal").unwrap(),
            )
    }

    #[test]
    fn test_apply_layers_over_base() {
        let base = base();
        let mut overrides = GrowthOverrides::new();
        assert!(overrides.apply_mutation(&mutation()));

        let applied = overrides.apply(&base);
        assert!(applied.pulling);
        assert_eq!(applied.pulling_force, 0.3);
        assert_eq!(applied.rate_ticks, 5);
        assert_eq!(applied.particle_effect.as_str(), "minecraft:reverse_portal");
        assert_eq!(applied.max_scale, base.max_scale);
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let base = base();
        let mut overrides = GrowthOverrides::new();
        assert!(overrides.apply_mutation(&mutation()));
        let first = overrides.apply(&base);
        assert!(!overrides.apply_mutation(&mutation()));
        assert_eq!(overrides.apply(&base), first);
    }

    #[test]
    fn test_apply_never_mutates_base() {
        let base = base();
        let snapshot = base.clone();
        let mut overrides = GrowthOverrides::new();
        overrides.apply_mutation(&mutation());
        let a = overrides.apply(&base);
        let b = overrides.apply(&base);
        assert_eq!(base, snapshot);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear_reverts_to_base() {
        let base = base();
        let mut overrides = GrowthOverrides::new();
        overrides.apply_mutation(&mutation());

        let clear = GrowthMutation::new().clear(GrowthField::Int(IntField::RateTicks));
        assert!(overrides.apply_mutation(&clear));
        assert_eq!(overrides.apply(&base).rate_ticks, base.rate_ticks);
        assert!(!overrides.apply_mutation(&clear));
    }

    #[test]
    fn test_set_after_clear_wins() {
        let field = GrowthField::Bool(BoolField::HasFuse);
        let m = GrowthMutation::new()
            .clear(field)
            .set_bool(BoolField::HasFuse, true);
        assert_eq!(m.clears().count(), 0);
        let m = m.clear(field);
        assert_eq!(m.values().count(), 0);
    }

    #[test]
    fn test_dynamic_set_checks_types() {
        let err = GrowthMutation::new()
            .set(GrowthField::Double(DoubleField::MaxScale), FieldValue::Int(3))
            .unwrap_err();
        assert!(matches!(err, CollapseError::FieldTypeMismatch { .. }));

        let ok = GrowthMutation::new().set_named("max_scale", "3.5").unwrap();
        assert_eq!(ok.values().count(), 1);
        assert!(GrowthMutation::new().set_named("max_scale", "huge").is_err());
        assert!(GrowthMutation::new().set_int(IntField::FuseTicks, -1).is_err());
    }

    #[test]
    fn test_overrides_json_uses_field_names() {
        let mut overrides = GrowthOverrides::new();
        overrides.apply_mutation(&mutation());
        let json = serde_json::to_string(&overrides).unwrap();
        assert!(json.contains("\"pulling_force\""));
        let back: GrowthOverrides = serde_json::from_str(&json).unwrap();
        assert_eq!(back, overrides);

        let bad = r#"{ "pulling_force": { "Bool": true } }"#;
        assert!(serde_json::from_str::<GrowthOverrides>(bad).is_err());
    }

    #[test]
    fn test_scheduled_mutation_json() {
        let task = ScheduledMutation {
            world: WorldKey::new("minecraft:overworld"),
            pos: IVec3::new(4, 64, -9),
            mutation: mutation().clear(GrowthField::Bool(BoolField::HasFuse)),
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"clear\":[\"has_fuse\"]"));
        let back: ScheduledMutation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
