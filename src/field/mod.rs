//! Radial force fields
//!
//! Growth blocks, vortex pulls and shockwave pushes all reduce to the same
//! thing: a center, a radius and a force that changes direction over the
//! field's lifetime. Curves and zones are pure values; the service owns the
//! live registry.

pub mod falloff;
pub mod phase;
pub mod radial;
pub mod service;
pub mod zone;

pub use falloff::FalloffCurve;
pub use phase::{ForcePhase, ForcePolarity, PhaseNotification, Severity, phase_at};
pub use radial::{
    ForceContext, ForceFieldConfig, ForceTuning, GravityModel, OrbitMode, RadialForceField,
};
pub use service::{ActiveForceField, FieldEvent, FieldId, ForceFieldService};
pub use zone::ForceZone;
