//! Candidate enumeration and utility scoring for the scheduler.
//!
//! A meta-task is a stateless scorer/factory: given a worker and a read-only
//! view of the settlement, it emits zero or more scored candidates, and can
//! instantiate the winning candidate into a live task. Resource claims
//! happen inside instantiation (task construction), so a candidate that
//! loses its resources between scoring and instantiation simply yields no
//! task and is re-offered on a later pass.

mod medical;

pub use medical::*;

use hecs::{Entity, World};

use outpost_logic::rating::RatingScore;

use crate::medical::{DeathId, MedicalManager, ProblemRef, StationId};
use crate::task::{Task, TaskContext};

/// Read-only view handed to meta-tasks during scoring.
pub struct SchedulerContext<'a> {
    pub world: &'a World,
    pub medical: &'a MedicalManager,
    /// Current sim time in millisols.
    pub now: f64,
}

/// What a meta-task proposes to do. Candidates carry just enough data to
/// reconstruct the job at instantiation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    /// Examine one specific pending death.
    ExamineBody(DeathId),
    /// Treat some waiting patient; the concrete patient is drawn uniformly
    /// at instantiation.
    TreatPatient,
    /// Treat one's own most serious self-treatable problem.
    SelfTreat {
        problem: ProblemRef,
        station: StationId,
    },
    /// Queue up at a station and wait for a doctor.
    RequestTreatment,
    /// Bed rest while recovering.
    BedRest,
    /// Prescribe medication to whoever needs it.
    Prescribe,
}

/// A candidate plus the score that ranks it.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: RatingScore,
}

/// A stateless scorer/factory for one kind of task.
pub trait MetaTask {
    fn name(&self) -> &'static str;

    /// Enumerate scored candidates for this worker. Workers failing the
    /// task's fitness gate are excluded here, not scored to zero.
    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate>;

    /// Build the task for a winning candidate. Returns `None` when
    /// construction preconditions fail (the task would be born ended).
    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>>;
}

/// The full set of medical meta-tasks, in scheduling order.
pub fn default_meta_tasks() -> Vec<Box<dyn MetaTask>> {
    vec![
        Box::new(ExamineBodyMeta),
        Box::new(TreatMedicalPatientMeta),
        Box::new(SelfTreatHealthProblemMeta),
        Box::new(RequestMedicalTreatmentMeta),
        Box::new(RestingMedicalRecoveryMeta),
        Box::new(PrescribeMedicationMeta),
    ]
}

/// Wrap a constructed task, discarding it if construction already ended it.
pub(crate) fn live(task: impl Task + 'static) -> Option<Box<dyn Task>> {
    if task.is_done() {
        None
    } else {
        Some(Box::new(task))
    }
}
