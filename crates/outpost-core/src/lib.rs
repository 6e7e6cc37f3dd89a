//! Outpost Core - Settlement Behavior Engine
//!
//! A tick-driven behavioral engine for a multi-agent settlement simulation:
//! it decides which long-running activity each worker performs, executes
//! activities through explicit multi-phase state machines, and arbitrates
//! access to scarce medical stations among competing workers.
//!
//! # Architecture
//!
//! - **Components** (`hecs` ECS): pure data attached to worker entities
//!   (skills, attributes, physical condition, location).
//! - **Medical model**: complaints, health problems, death records, and
//!   capacity-bounded stations with structurally disjoint queues.
//! - **Tasks**: multi-phase state machines bound to one worker each,
//!   advancing on a millisol time budget and returning leftover time.
//! - **Meta-tasks**: stateless scorers that enumerate and rank candidate
//!   activities each scheduling pass.
//! - **Engine**: advances workers one at a time per tick; single-claim
//!   locks are won by advancement order and losers end gracefully.
//!
//! # Example
//!
//! ```rust,no_run
//! use outpost_core::prelude::*;
//! use outpost_core::generation::SettlementConfig;
//!
//! let mut engine = SettlementEngine::new(42);
//! engine.generate(&SettlementConfig::default());
//!
//! // Run the simulation at 25 millisols per tick
//! loop {
//!     engine.advance(25.0);
//! }
//! ```

pub mod components;
pub mod engine;
pub mod generation;
pub mod hooks;
pub mod medical;
pub mod meta;
pub mod persistence;
pub mod task;

/// Commonly used types for convenient importing.
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::SettlementEngine;
    pub use crate::medical::*;
    pub use crate::task::{Task, TaskContext};
}
