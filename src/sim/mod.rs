//! Simulation host layer
//!
//! Everything here runs on the world's tick thread:
//! - Fixed timestep only (one call per world per scheduler step)
//! - Seeded RNG only (persisted with each world's singularity)
//! - Stable iteration order (fields by id, worlds and chunks by key)

pub mod sandbox;
pub mod tick;
pub mod world;

pub use tick::{Simulation, WorldTickReport};
pub use world::{ActorWorld, CollapseWorld, ForceTarget};
