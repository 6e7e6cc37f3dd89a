//! The task phase state machines.
//!
//! A task is bound to exactly one worker and advances through an explicit
//! phase enum, one tick at a time. `advance(ctx, Δt)` consumes some or all
//! of the tick and returns the unconsumed remainder; the engine re-invokes
//! with the leftover so a task can pass through several phases inside one
//! tick without losing time.
//!
//! Failure is never an error value here. Precondition failures at
//! construction, malfunction aborts mid-phase, and contention losses all end
//! the task silently; the scheduler simply re-offers work on a later pass.
//! Every ending path runs the task's cleanup exactly once, releasing any
//! queue membership the task claimed.

mod examine_body;
mod prescribe_medication;
mod request_treatment;
mod resting_recovery;
mod treat_health_problem;

pub use examine_body::*;
pub use prescribe_medication::*;
pub use request_treatment::*;
pub use resting_recovery::*;
pub use treat_health_problem::*;

use hecs::{Entity, World};

use outpost_logic::condition::{is_fit, FitnessBounds};

use crate::components::{Location, PhysicalCondition, Skills, SkillType};
use crate::hooks::{SimulationHooks, WorkerMover};
use crate::medical::MedicalManager;

/// Everything a task may touch while advancing.
pub struct TaskContext<'a> {
    pub world: &'a mut World,
    pub medical: &'a mut MedicalManager,
    pub mover: &'a mut dyn WorkerMover,
    pub hooks: &'a mut dyn SimulationHooks,
    pub rng: &'a mut dyn rand::RngCore,
    /// Current sim time in millisols.
    pub now: f64,
}

/// A stateful multi-phase activity bound to one worker.
pub trait Task {
    fn name(&self) -> &'static str;

    fn worker(&self) -> Entity;

    /// Terminal state: no further phase dispatch occurs.
    fn is_done(&self) -> bool;

    /// Run the current phase handler for up to `time` millisols and return
    /// the unconsumed remainder (`0 ≤ leftover ≤ time`).
    fn advance(&mut self, ctx: &mut TaskContext, time: f64) -> f64;

    /// External cancellation. Runs cleanup if the task has not already
    /// ended; safe to call more than once.
    fn cancel(&mut self, ctx: &mut TaskContext);
}

/// Skill level lookup; workers without a skill profile count as untrained.
pub(crate) fn skill_level(world: &World, worker: Entity, skill: SkillType) -> u32 {
    world
        .get::<&Skills>(worker)
        .map(|s| s.level(skill))
        .unwrap_or(0)
}

/// Where a worker is; missing location data counts as outside.
pub(crate) fn location_of(world: &World, worker: Entity) -> Location {
    world
        .get::<&Location>(worker)
        .map(|l| *l)
        .unwrap_or(Location::Outside)
}

/// Fitness gate. Robots carry no physical condition and always pass.
pub(crate) fn fit_for(world: &World, worker: Entity, bounds: &FitnessBounds) -> bool {
    match world.get::<&PhysicalCondition>(worker) {
        Ok(c) => c.alive && is_fit(c.stress, c.fatigue, c.hunger, bounds),
        Err(_) => true,
    }
}
