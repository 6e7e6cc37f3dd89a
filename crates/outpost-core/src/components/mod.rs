//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior beyond their own bookkeeping - decisions live in
//! the task and meta-task layers.

mod people;

pub use people::*;
