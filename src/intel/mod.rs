// src/intel/mod.rs
pub mod adjustments;
pub mod alerts;
pub mod cache;
pub mod health;
pub mod orchestrator;
pub mod providers;
pub mod read;
pub mod registry;
pub mod runner;
pub mod signals;
pub mod sinks;
pub mod state;
pub mod types;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use read::OrchestratorStatus;
pub use registry::{Collector, FnCollector, SourceRegistry};
pub use types::*;
