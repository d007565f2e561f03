//! Client-side simulation modules

pub mod body;
pub mod input;
pub mod physics;
pub mod roster;
pub mod simulation;
pub mod snapshot;
pub mod world;

pub use simulation::{Simulation, SimulationSettings, StepOutcome};

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

/// Simulation shared between the frame loop and the network tasks
pub type SharedSimulation = Arc<Mutex<Simulation>>;

/// Movement intent for one frame, already in world space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    /// Sum of the unit vectors of every held movement key
    pub wish: Vec3,
    pub jump: bool,
}
