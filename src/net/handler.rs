//! Inbound message dispatcher
//!
//! Reads the hub channel, owns the network session and routes roster ticks
//! into the shared simulation.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

use crate::game::roster::RosterHooks;
use crate::game::SharedSimulation;

use super::channel::{ChannelEvent, InboundStream};
use super::control::LeadControl;
use super::protocol::{Connected, InboundMsg};
use super::session::{NetworkSession, SendLoopReport};

/// Why the dispatcher stopped reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// Hub closed the channel
    Closed,
    /// Transport error reported by the channel
    Failed(String),
    /// Nothing arrived within the configured silence window
    HubSilent,
}

/// Inbound counters for debugging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub messages: u64,
    pub roster_ticks: u64,
    pub ignored_ticks: u64,
    pub unrecognized: u64,
    pub sessions_started: u64,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub disconnect: Disconnect,
    pub stats: DispatchStats,
    /// Report of the last session's send loop, if one ran
    pub session: Option<SendLoopReport>,
}

pub struct Dispatcher<H: RosterHooks> {
    simulation: SharedSimulation,
    outbound: mpsc::Sender<String>,
    hooks: H,
    silence_timeout: Option<Duration>,
    session: Option<NetworkSession>,
    stats: DispatchStats,
}

impl<H: RosterHooks> Dispatcher<H> {
    pub fn new(simulation: SharedSimulation, outbound: mpsc::Sender<String>, hooks: H) -> Self {
        Self {
            simulation,
            outbound,
            hooks,
            silence_timeout: None,
            session: None,
            stats: DispatchStats::default(),
        }
    }

    /// Treat a hub that sends nothing for `timeout` as disconnected
    pub fn with_silence_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.silence_timeout = timeout;
        self
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn session(&self) -> Option<&NetworkSession> {
        self.session.as_ref()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Handle for lead-only requests on this connection
    pub fn control(&self) -> LeadControl {
        LeadControl::new(self.simulation.clone(), self.outbound.clone())
    }

    /// Dispatch inbound events until the channel fails, closes or goes silent
    ///
    /// On exit the session is stopped and every remote player is dropped.
    pub async fn run(&mut self, mut inbound: InboundStream) -> DispatchOutcome {
        let disconnect = loop {
            let event = match self.silence_timeout {
                Some(limit) => match time::timeout(limit, inbound.next()).await {
                    Ok(event) => event,
                    Err(_) => {
                        warn!(timeout_ms = limit.as_millis() as u64, "Hub silent, dropping connection");
                        break Disconnect::HubSilent;
                    }
                },
                None => inbound.next().await,
            };

            match event {
                Some(ChannelEvent::Message(text)) => {
                    self.stats.messages += 1;
                    self.handle_message(InboundMsg::classify(&text));
                }
                Some(ChannelEvent::Error(reason)) => {
                    warn!(error = %reason, "Hub channel error");
                    break Disconnect::Failed(reason);
                }
                Some(ChannelEvent::Closed) | None => {
                    info!("Hub closed the channel");
                    break Disconnect::Closed;
                }
            }
        };

        let session = self.shutdown().await;
        DispatchOutcome {
            disconnect,
            stats: self.stats,
            session,
        }
    }

    /// Route one classified message
    pub fn handle_message(&mut self, msg: InboundMsg) {
        match msg {
            InboundMsg::Connected(connected) => self.on_connected(connected),
            InboundMsg::State(state) => {
                if self.session.is_none() {
                    // Roster ticks only make sense once we know our own id
                    self.stats.ignored_ticks += 1;
                    debug!(players = state.len(), "Roster tick before handshake, ignoring");
                    return;
                }
                self.stats.roster_ticks += 1;
                self.simulation.lock().apply_roster(&state, &mut self.hooks);
            }
            InboundMsg::ClearWorld => self.hooks.on_clear_world(),
            InboundMsg::ScreenData(content) => {
                debug!(bytes = content.len(), "Screen data received");
            }
            InboundMsg::Started(started) => {
                info!(world = ?started.world, "Game started");
            }
            InboundMsg::Unrecognized { reason } => {
                self.stats.unrecognized += 1;
                warn!(reason = %reason, "Dropping unrecognized hub message");
            }
        }
    }

    fn on_connected(&mut self, connected: Connected) {
        // A repeated handshake replaces the session; the old loop exits on its next wake
        if let Some(mut previous) = self.session.take() {
            previous.stop();
        }

        self.simulation
            .lock()
            .assign_identity(&connected.player_id, connected.is_lead);

        let interval = connected.send_interval();
        let mut session = NetworkSession::new(interval);
        match session.start(self.outbound.clone(), self.simulation.clone()) {
            Ok(()) => {
                self.stats.sessions_started += 1;
                info!(
                    player_id = %connected.player_id,
                    is_lead = connected.is_lead,
                    interval_ms = interval.as_millis() as u64,
                    "Joined hub"
                );
            }
            Err(e) => warn!(error = %e, "Failed to start network session"),
        }
        self.session = Some(session);
    }

    async fn shutdown(&mut self) -> Option<SendLoopReport> {
        let report = match self.session.as_mut() {
            Some(session) => {
                session.stop();
                session.finish().await
            }
            None => None,
        };
        self.simulation.lock().clear_roster(&mut self.hooks);
        report
    }
}
