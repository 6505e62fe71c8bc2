//! Singularity collapse phase machine
//!
//! DORMANT -> FUSING -> CORE -> RING -> DISSIPATION -> (RESET ->) DORMANT
//!
//! Handlers are pure; effects are data. The orchestrator in `sim::tick`
//! applies the effects and feeds chunk changes to the broadcast manager.

pub mod broadcast;
pub mod effects;
pub mod handlers;
pub mod state;

pub use broadcast::{ChunkSync, CollapseBroadcastManager};
pub use effects::{CollapseEffect, EffectSink};
pub use handlers::{Step, TickInput, step};
pub use state::{PhaseKind, SingularityPhase, SingularityRecord, SingularityState};
