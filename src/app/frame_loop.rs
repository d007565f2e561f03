//! Headless frame loop driving the shared simulation

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::game::input::MovementKeys;
use crate::game::{SharedSimulation, StepOutcome};
use crate::util::time::FrameClock;

/// Frames between status log lines
const STATUS_EVERY_FRAMES: u64 = 600;

pub struct FrameLoop {
    simulation: SharedSimulation,
    clock: FrameClock,
    frame_duration: Duration,
}

impl FrameLoop {
    pub fn new(simulation: SharedSimulation, frame_duration: Duration) -> Self {
        Self {
            simulation,
            clock: FrameClock::new(),
            frame_duration,
        }
    }

    /// Step one frame using the time elapsed since the previous one
    pub fn tick(&mut self, keys: &MovementKeys) -> StepOutcome {
        let delta = self.clock.delta();
        let mut sim = self.simulation.lock();
        let outcome = sim.step(delta, keys);

        match outcome {
            StepOutcome::Skipped => trace!("Frame skipped, simulation not ready"),
            StepOutcome::Stepped { respawned, .. } => {
                if respawned {
                    info!(player_id = %sim.local().player_id, "Local player respawned");
                }
                if sim.frame() % STATUS_EVERY_FRAMES == 0 {
                    debug!(
                        frame = sim.frame(),
                        position = ?sim.local().position(),
                        on_floor = sim.local().on_floor,
                        remote_players = sim.roster().len(),
                        "Frame loop status"
                    );
                }
            }
        }
        outcome
    }

    /// Run forever with idle input; cancel by dropping or aborting the task
    pub async fn run(mut self) {
        let mut ticker = interval(self.frame_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let keys = MovementKeys::default();

        info!(frame_ms = self.frame_duration.as_millis() as u64, "Frame loop started");
        self.clock.reset();

        loop {
            ticker.tick().await;
            self.tick(&keys);
        }
    }
}
