//! # Claimsim: Scripted Insurance-Claims Pipeline Simulator
//!
//! Claimsim animates an insurance claims intake pipeline: a validated flow
//! graph of processing stages, a timer-driven stepper that walks a claim
//! through them, narrated stage messages, an IGO/NIGO branch gate, and a
//! capped event log — the full engine behind a claims-processing demo
//! dashboard.
//!
//! ## Core Concepts
//!
//! - **Flows**: Validated stage graphs with one entry, one terminal, and at
//!   most one branch gate ([`flow`])
//! - **Branching**: Pluggable gate policies with a hard guarantee that a run
//!   takes NIGO at most once ([`branch`])
//! - **Scripts**: Per-stage narration with per-claim overrides ([`scripts`])
//! - **Simulator**: A pure state machine driven by a single actor task, so
//!   every observer sees consistent run state ([`sim`])
//! - **Events**: Display events fanned out to pluggable sinks ([`events`]),
//!   and a capped append-only log with in-place action edits ([`log`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use claimsim::branch::BranchPolicy;
//! use claimsim::claims;
//! use claimsim::events::{EventBus, MemorySink};
//! use claimsim::sim::{SimConfig, Simulator};
//!
//! # async fn demo() -> Result<(), claimsim::sim::SimulatorError> {
//! let sink = MemorySink::new();
//! let bus = EventBus::with_sink(sink.clone());
//! bus.listen_for_events();
//!
//! let config = SimConfig::new()
//!     .with_policy(BranchPolicy::AlwaysNigoOnce)
//!     .with_speed(4.0);
//! let (sim, _task) = Simulator::spawn(claims::demo_claim(), config, bus.get_sender());
//!
//! sim.play().await?;
//! // ... later:
//! let snapshot = sim.snapshot().await?;
//! println!("phase: {:?}", snapshot.phase);
//! # Ok(())
//! # }
//! ```
//!
//! ## Deterministic Testing
//!
//! The engine underneath the actor is pure: every transition takes a caller
//! timestamp and returns the display events it produced, so the whole
//! machine can be driven synchronously in tests. Branch randomness is
//! seedable through [`sim::SimConfig::with_seed`].

pub mod archive;
#[cfg(feature = "assistant")]
pub mod assistant;
pub mod branch;
pub mod claims;
pub mod events;
pub mod extract;
pub mod flow;
pub mod layout;
pub mod log;
pub mod scripts;
pub mod sim;
pub mod telemetry;
pub mod types;
