//! Lead-only control requests
//!
//! The hub grants lead to one player per session; only that player may clear
//! the world for everyone or start the game.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::game::roster::RosterHooks;
use crate::game::SharedSimulation;

use super::channel::ChannelError;
use super::protocol::{OutboundMsg, StartRequest};

/// Sends control requests on behalf of the local player
#[derive(Clone)]
pub struct LeadControl {
    simulation: SharedSimulation,
    outbound: mpsc::Sender<String>,
}

impl LeadControl {
    pub fn new(simulation: SharedSimulation, outbound: mpsc::Sender<String>) -> Self {
        Self {
            simulation,
            outbound,
        }
    }

    pub fn is_lead(&self) -> bool {
        self.simulation.lock().local().is_lead
    }

    /// Clear local effects; as lead, also ask the hub to clear every client
    ///
    /// Returns whether the request went out.
    pub async fn clear_world(&self, hooks: &mut dyn RosterHooks) -> Result<bool, ChannelError> {
        hooks.on_clear_world();
        self.send_if_lead(OutboundMsg::ClearWorld).await
    }

    /// Ask the hub to start the game; ignored unless this player is lead
    pub async fn start_game(&self, request: StartRequest) -> Result<bool, ChannelError> {
        self.send_if_lead(OutboundMsg::Start(request)).await
    }

    async fn send_if_lead(&self, msg: OutboundMsg) -> Result<bool, ChannelError> {
        if !self.is_lead() {
            debug!(kind = msg.kind(), "Not the lead player, request not sent");
            return Ok(false);
        }

        let text = msg.to_json()?;
        self.outbound
            .send(text)
            .await
            .map_err(|_| ChannelError::Closed)?;

        info!(kind = msg.kind(), "Lead request sent");
        Ok(true)
    }
}
