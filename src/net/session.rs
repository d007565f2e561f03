//! Network session: periodic deadline-scheduled send loop
//!
//! One session per connection. Lifecycle is Idle -> Running -> Stopped and a
//! stopped session is never restarted; the dispatcher builds a fresh one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::game::body::UNASSIGNED_PLAYER_ID;
use crate::game::snapshot::SnapshotStats;
use crate::game::SharedSimulation;

use super::channel::OutboundChannel;
use super::protocol::{OutboundMsg, StateSnapshot};

/// Supplies the local snapshot for each send
pub trait SnapshotSource: Send + Sync + 'static {
    /// `None` when there is nothing to send yet
    fn snapshot(&self) -> Option<StateSnapshot>;
}

impl SnapshotSource for SharedSimulation {
    fn snapshot(&self) -> Option<StateSnapshot> {
        let mut sim = self.lock();
        if sim.local().player_id == UNASSIGNED_PLAYER_ID {
            return None;
        }
        Some(sim.build_snapshot())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session is stopped; construct a new one")]
    Stopped,
}

/// Why the send loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    ChannelClosed,
}

/// Summary returned by a finished send loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendLoopReport {
    pub stats: SnapshotStats,
    pub reason: StopReason,
}

pub struct NetworkSession {
    interval: Duration,
    phase: SessionPhase,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<SendLoopReport>>,
}

impl NetworkSession {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            phase: SessionPhase::Idle,
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current phase; a loop that ended on a channel failure reports `Stopped`
    pub fn phase(&self) -> SessionPhase {
        match self.phase {
            SessionPhase::Running if !self.running.load(Ordering::Acquire) => SessionPhase::Stopped,
            phase => phase,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() == SessionPhase::Running
    }

    /// Spawn the send loop; the first send happens one interval from now
    pub fn start<C, S>(&mut self, outbound: C, source: S) -> Result<(), SessionError>
    where
        C: OutboundChannel,
        S: SnapshotSource,
    {
        match self.phase() {
            SessionPhase::Idle => {}
            SessionPhase::Running => return Err(SessionError::AlreadyStarted),
            SessionPhase::Stopped => return Err(SessionError::Stopped),
        }

        let first_deadline = Instant::now() + self.interval;
        self.running.store(true, Ordering::Release);
        self.phase = SessionPhase::Running;

        info!(interval_ms = self.interval.as_millis() as u64, "Network session started");

        self.task = Some(tokio::spawn(send_loop(
            outbound,
            source,
            self.interval,
            first_deadline,
            self.running.clone(),
        )));
        Ok(())
    }

    /// Request the loop to stop; safe to call any number of times
    ///
    /// The loop notices on its next wake, so an in-flight send still completes.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            debug!("Network session stop requested");
        }
        self.phase = SessionPhase::Stopped;
    }

    /// Wait for the send loop to exit; `None` if it never started or was already joined
    pub async fn finish(&mut self) -> Option<SendLoopReport> {
        let task = self.task.take()?;
        match task.await {
            Ok(report) => {
                info!(
                    snapshots = report.stats.total_snapshots,
                    bytes = report.stats.total_bytes,
                    shots = report.stats.total_shots,
                    avg_bytes = report.stats.avg_bytes_per_snapshot,
                    reason = ?report.reason,
                    "Network session finished"
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Send loop task failed");
                None
            }
        }
    }
}

impl Drop for NetworkSession {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

async fn send_loop<C, S>(
    mut outbound: C,
    source: S,
    interval: Duration,
    first_deadline: Instant,
    running: Arc<AtomicBool>,
) -> SendLoopReport
where
    C: OutboundChannel,
    S: SnapshotSource,
{
    let mut stats = SnapshotStats::default();
    let mut deadline = first_deadline;

    let reason = loop {
        time::sleep_until(deadline).await;
        if !running.load(Ordering::Acquire) {
            break StopReason::Requested;
        }

        // Start-to-start spacing: send latency does not push later deadlines
        deadline = Instant::now() + interval;

        let Some(snapshot) = source.snapshot() else {
            continue;
        };
        let shots = snapshot.events.len();

        let text = match OutboundMsg::Player(snapshot).to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize snapshot, skipping");
                continue;
            }
        };
        let bytes = text.len();

        if let Err(e) = outbound.send_text(text).await {
            info!(error = %e, "Outbound channel gone, stopping send loop");
            running.store(false, Ordering::Release);
            break StopReason::ChannelClosed;
        }
        stats.record(shots, bytes);
    };

    SendLoopReport { stats, reason }
}
