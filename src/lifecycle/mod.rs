//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → endpoints → one actor per listener + signal (+ metrics)
//!
//! Run (run_group.rs):
//!     First actor returns → interrupt the others in order → wait for all
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → signal actor returns → orderly shutdown
//! ```
//!
//! # Design Decisions
//! - Any actor ending ends the process; there is no partial operation
//! - Interrupts are cooperative: they cancel a token, never abort a task
//! - Shutdown wait is unbounded unless a drain timeout is configured

pub mod run_group;
pub mod signals;
pub mod startup;

pub use run_group::RunGroup;
pub use signals::wait_for_signal;
pub use startup::{build_endpoints, build_run_group, exit_status, run, RunError};
