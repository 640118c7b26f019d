// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod clock;
pub mod config;
pub mod error;
pub mod intel;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::IntelConfig;
pub use crate::error::{IntelError, IntelResult};
pub use crate::intel::{Orchestrator, OrchestratorStatus};
