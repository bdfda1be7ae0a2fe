//! The scripted workflow simulator.
//!
//! Split in two layers: [`state::Engine`] holds the pure run state machine
//! (phase, stage statuses, branch resolution, event log, visible messages)
//! and is fully deterministic given timestamps; [`runner::Simulator`] is the
//! actor that owns an engine, drives it from tokio timers, and serializes
//! every command and timer through one task so observers can never see a
//! half-applied transition.

pub mod config;
pub mod runner;
pub mod state;

pub use config::SimConfig;
pub use runner::{Simulator, SimulatorError, SimulatorHandle};
pub use state::{Engine, Phase, SimError, SimSnapshot, VisibleMessage};
