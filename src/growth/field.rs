//! Typed growth fields
//!
//! Every overridable property of a growth block belongs to exactly one value
//! category, so a mutation can only pair a field with a value of its type.
//! The name-based path (`GrowthField::from_name` + `FieldValue`) exists for
//! commands and loaders and is checked at runtime instead.

use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, Result};

/// Namespaced resource identifier, `namespace:path`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self> {
        let (namespace, path) = match raw.split_once(':') {
            Some(parts) => parts,
            None => ("minecraft", raw),
        };
        let valid_namespace = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-.".contains(c));
        let valid_path = !path.is_empty()
            && path
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-./".contains(c));
        if !valid_namespace || !valid_path {
            return Err(CollapseError::invalid(format!("invalid identifier '{raw}'")));
        }
        Ok(Self(format!("{namespace}:{path}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = CollapseError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! field_category {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|f| f.name() == name)
            }
        }
    };
}

field_category!(
    /// On/off growth properties
    BoolField {
        GrowthEnabled => "growth_enabled",
        HasCollision => "has_collision",
        DoesDestruction => "does_destruction",
        HasFuse => "has_fuse",
        TouchToUnfuse => "touch_to_unfuse",
        Pulling => "pulling",
        Pushing => "pushing",
    }
);

field_category!(
    /// Whole-number growth properties (tick counts)
    IntField {
        RateTicks => "rate_ticks",
        FuseTicks => "fuse_ticks",
        ForceDurationTicks => "force_duration_ticks",
    }
);

field_category!(
    /// Fractional growth properties
    DoubleField {
        RateScale => "rate_scale",
        StartScale => "start_scale",
        MaxScale => "max_scale",
        HitboxScale => "hitbox_scale",
        PullingForce => "pulling_force",
        PushingForce => "pushing_force",
        ForceRadius => "force_radius",
    }
);

field_category!(
    /// Resource-reference growth properties
    IdentifierField {
        GrowthBlock => "growth_block",
        ParticleEffect => "particle_effect",
        SoundEffect => "sound_effect",
        FuseParticle => "fuse_particle",
    }
);

/// Any overridable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrowthField {
    Bool(BoolField),
    Int(IntField),
    Double(DoubleField),
    Identifier(IdentifierField),
}

impl GrowthField {
    pub fn name(&self) -> &'static str {
        match self {
            GrowthField::Bool(f) => f.name(),
            GrowthField::Int(f) => f.name(),
            GrowthField::Double(f) => f.name(),
            GrowthField::Identifier(f) => f.name(),
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        BoolField::from_name(name)
            .map(GrowthField::Bool)
            .or_else(|| IntField::from_name(name).map(GrowthField::Int))
            .or_else(|| DoubleField::from_name(name).map(GrowthField::Double))
            .or_else(|| IdentifierField::from_name(name).map(GrowthField::Identifier))
            .ok_or_else(|| CollapseError::UnknownField(name.to_string()))
    }

    /// Name of the value type this field accepts
    pub fn type_name(&self) -> &'static str {
        match self {
            GrowthField::Bool(_) => "boolean",
            GrowthField::Int(_) => "int",
            GrowthField::Double(_) => "double",
            GrowthField::Identifier(_) => "identifier",
        }
    }

    /// Parse a raw command argument into a value of this field's type
    pub fn parse_value(&self, raw: &str) -> Result<FieldValue> {
        let bad = |expected: &str| {
            CollapseError::invalid(format!(
                "'{raw}' is not a valid {expected} for {}",
                self.name()
            ))
        };
        match self {
            GrowthField::Bool(_) => raw
                .parse::<bool>()
                .map(FieldValue::Bool)
                .map_err(|_| bad("boolean")),
            GrowthField::Int(_) => raw
                .parse::<i32>()
                .map(FieldValue::Int)
                .map_err(|_| bad("int")),
            GrowthField::Double(_) => raw
                .parse::<f64>()
                .map(FieldValue::Double)
                .map_err(|_| bad("double")),
            GrowthField::Identifier(_) => Identifier::parse(raw).map(FieldValue::Identifier),
        }
    }
}

impl std::fmt::Display for GrowthField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value for a growth field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    Identifier(Identifier),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "int",
            FieldValue::Double(_) => "double",
            FieldValue::Identifier(_) => "identifier",
        }
    }

    /// Check the value fits `field`, by type and range
    pub fn check(&self, field: GrowthField) -> Result<()> {
        let matches = matches!(
            (field, self),
            (GrowthField::Bool(_), FieldValue::Bool(_))
                | (GrowthField::Int(_), FieldValue::Int(_))
                | (GrowthField::Double(_), FieldValue::Double(_))
                | (GrowthField::Identifier(_), FieldValue::Identifier(_))
        );
        if !matches {
            return Err(CollapseError::FieldTypeMismatch {
                field: field.name(),
                expected: field.type_name(),
                actual: self.type_name(),
            });
        }
        match self {
            FieldValue::Int(v) if *v < 0 => Err(CollapseError::invalid(format!(
                "{} must not be negative, got {v}",
                field.name()
            ))),
            FieldValue::Double(v) if !v.is_finite() => Err(CollapseError::invalid(format!(
                "{} must be finite, got {v}",
                field.name()
            ))),
            _ => Ok(()),
        }
    }
}
