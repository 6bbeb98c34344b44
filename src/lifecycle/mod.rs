//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build registries → Start sweepers → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Stop sweepers → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Background work (sweeper.rs):
//!     Periodic eviction owned by each registry, stoppable on shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod sweeper;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{shutdown_signal, spawn_signal_listener};
pub use sweeper::Sweeper;
