//! Hub connection: wire protocol, transport, send loop and inbound dispatch

pub mod channel;
pub mod control;
pub mod handler;
pub mod protocol;
pub mod session;

pub use channel::{ChannelError, ChannelEvent, MessageChannel};
pub use control::LeadControl;
pub use handler::{Dispatcher, Disconnect};
pub use session::{NetworkSession, SessionError, SessionPhase};
