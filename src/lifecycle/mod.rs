//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Resolve config → Init logging → Install sink → Register signals → Start tasks → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop generator and upkeep → Drain HTTP connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One broadcast channel reaches every background task

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
