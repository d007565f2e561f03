//! Arena client - networked first-person movement and collision
//!
//! Core modules:
//! - `game`: Per-frame simulation (locomotion, collision, roster sync)
//! - `net`: Hub wire protocol, transport and the periodic send loop
//! - `app`: Shared state and the headless frame loop
//! - `config`: Environment-driven configuration

pub mod app;
pub mod config;
pub mod game;
pub mod net;
pub mod util;
