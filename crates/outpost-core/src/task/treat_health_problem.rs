//! Doctor-administered treatment of one health problem.
//!
//! Phases: DISPATCH (reach the station) → TREATMENT (count down the
//! skill-adjusted duration) → done. The same machine drives both
//! doctor-to-patient treatment and self-treatment; only candidate discovery
//! differs, and that lives in the meta-task layer.

use hecs::Entity;

use outpost_logic::constants::chances;
use outpost_logic::medical::adjusted_treatment_duration;

use crate::components::{Location, PhysicalCondition, SkillType};
use crate::medical::{ProblemRef, StationId};
use crate::task::{location_of, skill_level, Task, TaskContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TreatPhase {
    Dispatch,
    Treatment,
}

/// Administer one treatment to one patient at one station.
pub struct TreatHealthProblem {
    name: &'static str,
    worker: Entity,
    problem: ProblemRef,
    station: StationId,
    phase: TreatPhase,
    duration_remaining: f64,
    /// Whether this task has entered the station's treatment queue.
    started: bool,
    done: bool,
}

impl TreatHealthProblem {
    /// A doctor treating a waiting patient.
    pub fn treat_patient(
        ctx: &mut TaskContext,
        doctor: Entity,
        problem: ProblemRef,
        station: StationId,
    ) -> Self {
        Self::new(ctx, doctor, problem, station, "Treating Medical Patient")
    }

    /// A sufferer treating their own problem.
    pub fn self_treat(
        ctx: &mut TaskContext,
        worker: Entity,
        problem: ProblemRef,
        station: StationId,
    ) -> Self {
        Self::new(ctx, worker, problem, station, "Self Treating Health Problem")
    }

    fn new(
        ctx: &mut TaskContext,
        worker: Entity,
        problem: ProblemRef,
        station: StationId,
        name: &'static str,
    ) -> Self {
        let treatment = problem.complaint.descriptor().treatment;
        let mut task = Self {
            name,
            worker,
            problem,
            station,
            phase: TreatPhase::Treatment,
            duration_remaining: 0.0,
            started: false,
            done: false,
        };

        let Some(treatment) = treatment else {
            // Nothing to administer for this complaint.
            task.done = true;
            return task;
        };
        let skill = skill_level(ctx.world, worker, SkillType::Medicine);
        task.duration_remaining =
            adjusted_treatment_duration(treatment.duration, treatment.required_skill, skill);

        // Workers already aboard a vehicle sick bay skip dispatch.
        if location_of(ctx.world, worker) == Location::Settlement {
            task.phase = TreatPhase::Dispatch;
        }
        task
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn problem(&self) -> ProblemRef {
        self.problem
    }

    fn dispatch(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        let arrived = ctx.mover.dispatch_to_existing_spot(self.worker)
            || ctx.mover.walk_to_station(self.worker, self.station, true);
        if !arrived {
            // The patient simply is not treated this tick; the meta-task
            // re-offers the job on a later scheduling pass.
            log::debug!("no reachable treatment spot, abandoning treatment");
            self.end(ctx);
            return 0.0;
        }
        self.phase = TreatPhase::Treatment;
        self.treatment(ctx, time)
    }

    fn treatment(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        if ctx.medical.station(self.station).has_malfunction() {
            self.end(ctx);
            return 0.0;
        }

        if !self.started {
            // The patient's problem may have resolved or worsened away
            // between scheduling and arrival.
            let patient_ok = ctx
                .world
                .get::<&PhysicalCondition>(self.problem.person)
                .map(|c| {
                    c.alive
                        && c.problem(self.problem.complaint)
                            .map_or(false, |p| !p.is_resolved())
                })
                .unwrap_or(false);
            if !patient_ok {
                log::debug!("patient no longer needs this treatment");
                self.end(ctx);
                return 0.0;
            }

            if !ctx
                .medical
                .station(self.station)
                .treating()
                .contains(&self.problem)
            {
                // Check-then-act bed gate: claiming a treatment slot puts
                // the patient in a bed. Losing the race is a silent end,
                // not an error.
                let station = ctx.medical.station(self.station);
                if station.patient_num() >= station.sick_beds() {
                    log::debug!("no free bed to start treatment");
                    self.end(ctx);
                    return 0.0;
                }
                if let Ok(mut condition) = ctx
                    .world
                    .get::<&mut PhysicalCondition>(self.problem.person)
                {
                    if let Some(problem) = condition.problem_mut(self.problem.complaint) {
                        problem.start_treatment(self.duration_remaining);
                    }
                }
                ctx.medical
                    .station_mut(self.station)
                    .start_treatment(self.problem);
                ctx.hooks.register_event("treatment started", self.worker);
            }
            self.started = true;
        }

        ctx.hooks
            .check_for_accident(self.station, time, chances::TREATMENT_ACCIDENT);
        ctx.hooks
            .add_experience(self.worker, SkillType::Medicine, time);

        self.duration_remaining -= time;
        if self.duration_remaining <= 0.0 {
            let leftover = (-self.duration_remaining).min(time);
            if let Ok(mut condition) = ctx
                .world
                .get::<&mut PhysicalCondition>(self.problem.person)
            {
                if let Some(problem) = condition.problem_mut(self.problem.complaint) {
                    problem.start_recovery();
                }
            }
            ctx.medical
                .station_mut(self.station)
                .stop_treatment(self.problem);
            self.started = false;
            log::info!(
                "treatment complete: {}",
                self.problem.complaint.descriptor().name
            );
            self.end(ctx);
            return leftover;
        }
        0.0
    }

    fn end(&mut self, ctx: &mut TaskContext) {
        if self.done {
            return;
        }
        self.done = true;
        // An interrupted treatment gives the patient their queue place back;
        // a finished one already left the treatment set.
        if self.started
            && ctx
                .medical
                .station(self.station)
                .treating()
                .contains(&self.problem)
        {
            ctx.medical
                .station_mut(self.station)
                .stop_treatment(self.problem);
            if let Ok(mut condition) = ctx
                .world
                .get::<&mut PhysicalCondition>(self.problem.person)
            {
                if let Some(problem) = condition.problem_mut(self.problem.complaint) {
                    problem.stop_treatment();
                }
            }
            ctx.medical
                .station_mut(self.station)
                .request_treatment(self.problem);
        }
    }
}

impl Task for TreatHealthProblem {
    fn name(&self) -> &'static str {
        self.name
    }

    fn worker(&self) -> Entity {
        self.worker
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn advance(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        if self.done {
            return time;
        }
        match self.phase {
            TreatPhase::Dispatch => self.dispatch(ctx, time),
            TreatPhase::Treatment => self.treatment(ctx, time),
        }
    }

    fn cancel(&mut self, ctx: &mut TaskContext) {
        self.end(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Person, Skills};
    use crate::hooks::{AlwaysArrive, EventLog, NeverArrive, WorkerMover};
    use crate::medical::{
        ComplaintType, MedicalManager, MedicalStation, ProblemState, StationKind,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        world: hecs::World,
        medical: MedicalManager,
        mover: AlwaysArrive,
        hooks: EventLog,
        rng: StdRng,
    }

    impl Fixture {
        fn new() -> Self {
            let mut medical = MedicalManager::new();
            medical.add_station(MedicalStation::new(
                StationKind::Building { building_id: 1 },
                3,
                2,
            ));
            Self {
                world: hecs::World::new(),
                medical,
                mover: AlwaysArrive,
                hooks: EventLog::new(),
                rng: StdRng::seed_from_u64(11),
            }
        }

        fn spawn_doctor(&mut self, medicine: u32) -> Entity {
            self.world.spawn((
                Person,
                Location::Settlement,
                Skills {
                    medicine,
                    ..Default::default()
                },
                PhysicalCondition::default(),
            ))
        }

        fn spawn_patient(&mut self, complaint: ComplaintType) -> ProblemRef {
            let mut condition = PhysicalCondition::default();
            condition.add_problem(complaint);
            condition
                .problem_mut(complaint)
                .unwrap()
                .await_treatment();
            let person = self
                .world
                .spawn((Person, Location::Settlement, condition));
            let problem = ProblemRef { person, complaint };
            self.medical
                .station_mut(StationId(0))
                .request_treatment(problem);
            problem
        }

        fn ctx(&mut self) -> TaskContext<'_> {
            TaskContext {
                world: &mut self.world,
                medical: &mut self.medical,
                mover: &mut self.mover,
                hooks: &mut self.hooks,
                rng: &mut self.rng,
                now: 0.0,
            }
        }

        fn ctx_with<'a>(&'a mut self, mover: &'a mut dyn WorkerMover) -> TaskContext<'a> {
            TaskContext {
                world: &mut self.world,
                medical: &mut self.medical,
                mover,
                hooks: &mut self.hooks,
                rng: &mut self.rng,
                now: 0.0,
            }
        }
    }

    #[test]
    fn test_no_treatment_definition_ends_immediately() {
        let mut fx = Fixture::new();
        let doctor = fx.spawn_doctor(3);
        let patient = fx.world.spawn((Person, Location::Settlement));
        let problem = ProblemRef {
            person: patient,
            complaint: ComplaintType::PanicAttack,
        };
        let task =
            TreatHealthProblem::treat_patient(&mut fx.ctx(), doctor, problem, StationId(0));
        assert!(task.is_done());
    }

    #[test]
    fn test_dispatch_failure_abandons_silently() {
        let mut fx = Fixture::new();
        let doctor = fx.spawn_doctor(3);
        let problem = fx.spawn_patient(ComplaintType::BrokenBone);
        let mut stranded = NeverArrive;
        let mut task = TreatHealthProblem::treat_patient(
            &mut fx.ctx_with(&mut stranded),
            doctor,
            problem,
            StationId(0),
        );
        assert!(!task.is_done());
        task.advance(&mut fx.ctx_with(&mut stranded), 10.0);
        assert!(task.is_done());
        // The patient keeps their place in the waiting queue
        assert!(fx.medical.station(StationId(0)).awaiting().contains(&problem));
    }

    #[test]
    fn test_treatment_claims_and_completes_with_leftover() {
        let mut fx = Fixture::new();
        // Skill 4 vs required 2: duration 80 * 2/4 = 40
        let doctor = fx.spawn_doctor(4);
        let problem = fx.spawn_patient(ComplaintType::BrokenBone);
        let mut task =
            TreatHealthProblem::treat_patient(&mut fx.ctx(), doctor, problem, StationId(0));

        // Dispatch falls through into treatment in the same call
        let leftover = task.advance(&mut fx.ctx(), 25.0);
        assert!((leftover - 0.0).abs() < f64::EPSILON);
        assert!(fx.medical.station(StationId(0)).treating().contains(&problem));
        assert!(!fx.medical.station(StationId(0)).awaiting().contains(&problem));

        // 25 consumed; 15 remain. A 20-millisol tick overshoots by 5.
        let leftover = task.advance(&mut fx.ctx(), 20.0);
        assert!((leftover - 5.0).abs() < 1e-9);
        assert!(task.is_done());
        assert!(!fx.medical.station(StationId(0)).treating().contains(&problem));
        let condition = fx
            .world
            .get::<&PhysicalCondition>(problem.person)
            .unwrap();
        assert_eq!(
            condition.problem(problem.complaint).unwrap().state,
            ProblemState::Recovering
        );
    }

    #[test]
    fn test_experience_awarded_every_tick() {
        let mut fx = Fixture::new();
        let doctor = fx.spawn_doctor(2);
        let problem = fx.spawn_patient(ComplaintType::BrokenBone);
        let mut task =
            TreatHealthProblem::treat_patient(&mut fx.ctx(), doctor, problem, StationId(0));
        task.advance(&mut fx.ctx(), 10.0);
        task.advance(&mut fx.ctx(), 10.0);
        assert!((fx.hooks.experience_for(doctor, SkillType::Medicine) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_requeues_patient() {
        let mut fx = Fixture::new();
        let doctor = fx.spawn_doctor(3);
        let problem = fx.spawn_patient(ComplaintType::BrokenBone);
        let mut task =
            TreatHealthProblem::treat_patient(&mut fx.ctx(), doctor, problem, StationId(0));
        task.advance(&mut fx.ctx(), 10.0);
        assert!(fx.medical.station(StationId(0)).treating().contains(&problem));

        task.cancel(&mut fx.ctx());
        assert!(task.is_done());
        let station = fx.medical.station(StationId(0));
        assert!(!station.treating().contains(&problem));
        assert!(station.awaiting().contains(&problem));
        let condition = fx
            .world
            .get::<&PhysicalCondition>(problem.person)
            .unwrap();
        assert_eq!(
            condition.problem(problem.complaint).unwrap().state,
            ProblemState::AwaitingTreatment
        );
    }

    #[test]
    fn test_cancel_after_completion_is_harmless() {
        let mut fx = Fixture::new();
        let doctor = fx.spawn_doctor(4);
        let problem = fx.spawn_patient(ComplaintType::BrokenBone);
        let mut task =
            TreatHealthProblem::treat_patient(&mut fx.ctx(), doctor, problem, StationId(0));
        task.advance(&mut fx.ctx(), 100.0);
        assert!(task.is_done());
        task.cancel(&mut fx.ctx());
        // Completed treatment stays completed; nothing re-queued
        assert!(fx.medical.station(StationId(0)).awaiting().is_empty());
    }

    #[test]
    fn test_malfunction_aborts_and_requeues() {
        let mut fx = Fixture::new();
        let doctor = fx.spawn_doctor(3);
        let problem = fx.spawn_patient(ComplaintType::BrokenBone);
        let mut task =
            TreatHealthProblem::treat_patient(&mut fx.ctx(), doctor, problem, StationId(0));
        task.advance(&mut fx.ctx(), 10.0);

        fx.medical.station_mut(StationId(0)).set_malfunction(true);
        task.advance(&mut fx.ctx(), 10.0);
        assert!(task.is_done());
        assert!(fx.medical.station(StationId(0)).awaiting().contains(&problem));
    }
}
