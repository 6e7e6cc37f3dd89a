//! The medical data model: complaints, problems, death records, stations.
//!
//! Behavior lives in the task state machines; these types hold state and
//! enforce the structural invariants (disjoint queues, single-claim locks).

mod complaint;
mod death;
mod manager;
mod problem;
mod station;

pub use complaint::*;
pub use death::*;
pub use manager::*;
pub use problem::*;
pub use station::*;
