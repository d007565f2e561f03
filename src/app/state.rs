//! Application state shared between the frame loop and the hub connection

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::game::input::Camera;
use crate::game::roster::RosterHooks;
use crate::game::world::StaticWorld;
use crate::game::{SharedSimulation, Simulation, SimulationSettings};
use crate::net::Dispatcher;

/// Half the side length of the walled arena the headless client plays in
pub const ARENA_HALF_EXTENT: f32 = 25.0;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub simulation: SharedSimulation,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let mut simulation = Simulation::new(SimulationSettings::from_config(&config));
        simulation.attach_world(Arc::new(StaticWorld::arena(ARENA_HALF_EXTENT)));
        simulation.attach_camera(Camera::default());

        Self {
            config,
            simulation: Arc::new(Mutex::new(simulation)),
        }
    }

    /// Dispatcher for one hub connection
    pub fn dispatcher<H: RosterHooks>(&self, outbound: mpsc::Sender<String>, hooks: H) -> Dispatcher<H> {
        Dispatcher::new(self.simulation.clone(), outbound, hooks)
            .with_silence_timeout(self.config.hub_silence_timeout)
    }
}
