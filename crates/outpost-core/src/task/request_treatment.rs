//! A sufferer requesting treatment at a medical station and waiting for it.
//!
//! Phases: WAITING_FOR_TREATMENT → TREATMENT → (back to WAITING if problems
//! remain queued) → done. Waiting carries a hard timeout; the budget applies
//! per waiting episode, and the overflow is handed back to the scheduler.

use hecs::Entity;

use outpost_logic::constants::durations;

use crate::components::{Location, PhysicalCondition};
use crate::medical::{ProblemRef, StationId, StationKind};
use crate::task::{location_of, Task, TaskContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestPhase {
    Waiting,
    Treatment,
}

/// Queue up every treatable problem and wait for a doctor.
pub struct RequestMedicalTreatment {
    worker: Entity,
    station: StationId,
    phase: RequestPhase,
    /// Bulk enqueue happens once per task, not once per tick.
    requested: bool,
    /// Time waited in the current waiting episode. Deliberately not reset
    /// when the task first enters WAITING, only on TREATMENT → WAITING
    /// cycles.
    waiting: f64,
    done: bool,
}

impl RequestMedicalTreatment {
    pub fn new(ctx: &mut TaskContext, worker: Entity) -> Self {
        let mut task = Self {
            worker,
            station: StationId(0),
            phase: RequestPhase::Waiting,
            requested: false,
            waiting: 0.0,
            done: false,
        };

        let location = location_of(ctx.world, worker);
        if location == Location::Outside {
            task.done = true;
            return task;
        }

        let complaints: Vec<_> = match ctx.world.get::<&PhysicalCondition>(worker) {
            Ok(c) if c.alive => c
                .active_problems()
                .filter(|p| p.needs_treatment())
                .map(|p| p.complaint)
                .collect(),
            _ => Vec::new(),
        };

        // Pick the first station able to treat any of the worker's problems.
        let station = ctx
            .medical
            .stations()
            .find(|(_, s)| complaints.iter().any(|&c| s.can_treat(c)))
            .map(|(id, _)| id);
        let Some(station) = station else {
            task.done = true;
            return task;
        };
        task.station = station;

        let arrived = match ctx.medical.station(station).kind {
            StationKind::Building { .. } => ctx.mover.walk_to_station(worker, station, false),
            StationKind::Vehicle { vehicle_id } => {
                ctx.mover.walk_to_sick_bay(worker, vehicle_id, false)
            }
        };
        if !arrived {
            task.done = true;
        }
        task
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    fn my_problem_in(&self, queue: &[ProblemRef]) -> bool {
        queue.iter().any(|p| p.person == self.worker)
    }

    fn waiting_phase(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        if !self.requested {
            self.enqueue_problems(ctx);
            self.requested = true;
            ctx.hooks
                .register_event("requested medical treatment", self.worker);
        }

        let station = ctx.medical.station(self.station);
        if self.my_problem_in(station.treating()) {
            self.phase = RequestPhase::Treatment;
            return self.treatment_phase(ctx, time);
        }
        if !self.my_problem_in(station.awaiting()) {
            // Everything resolved or withdrawn while we waited.
            self.end(ctx);
            return time;
        }

        self.waiting += time;
        if self.waiting > durations::TREATMENT_WAIT_TIMEOUT {
            let overflow = (self.waiting - durations::TREATMENT_WAIT_TIMEOUT).min(time);
            log::debug!("gave up waiting for treatment");
            self.end(ctx);
            return overflow;
        }
        0.0
    }

    fn treatment_phase(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        let station = ctx.medical.station(self.station);
        if self.my_problem_in(station.treating()) {
            // Sit still while the doctor works.
            return 0.0;
        }
        if self.my_problem_in(station.awaiting()) {
            // Re-afflicted or partially treated: wait again with a fresh
            // timeout budget.
            self.phase = RequestPhase::Waiting;
            self.waiting = 0.0;
            return self.waiting_phase(ctx, time);
        }
        self.end(ctx);
        time
    }

    /// Queue every currently-untreated problem this station can handle.
    fn enqueue_problems(&mut self, ctx: &mut TaskContext) {
        let candidates: Vec<_> = match ctx.world.get::<&PhysicalCondition>(self.worker) {
            Ok(c) => c
                .active_problems()
                .filter(|p| p.needs_treatment())
                .map(|p| p.complaint)
                .collect(),
            Err(_) => Vec::new(),
        };
        for complaint in candidates {
            let problem = ProblemRef {
                person: self.worker,
                complaint,
            };
            let station = ctx.medical.station(self.station);
            if station.can_treat(complaint) && !station.is_queued(problem) {
                if let Ok(mut condition) =
                    ctx.world.get::<&mut PhysicalCondition>(self.worker)
                {
                    if let Some(p) = condition.problem_mut(complaint) {
                        p.await_treatment();
                    }
                }
                ctx.medical
                    .station_mut(self.station)
                    .request_treatment(problem);
            }
        }
    }

    fn end(&mut self, ctx: &mut TaskContext) {
        if self.done {
            return;
        }
        self.done = true;
        // Queued problems deliberately stay queued: a doctor can still pick
        // them up after the sufferer stops actively waiting.
        let _ = ctx;
    }
}

impl Task for RequestMedicalTreatment {
    fn name(&self) -> &'static str {
        "Requesting Medical Treatment"
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
            RequestPhase::Waiting => self.waiting_phase(ctx, time),
            RequestPhase::Treatment => self.treatment_phase(ctx, time),
        }
    }

    fn cancel(&mut self, ctx: &mut TaskContext) {
        self.end(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Person;
    use crate::hooks::{AlwaysArrive, EventLog};
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
                rng: StdRng::seed_from_u64(3),
            }
        }

        fn spawn_sufferer(&mut self, complaints: &[ComplaintType]) -> Entity {
            let mut condition = PhysicalCondition::default();
            for &c in complaints {
                condition.add_problem(c);
            }
            self.world.spawn((Person, Location::Settlement, condition))
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
    }

    #[test]
    fn test_bulk_enqueue_once() {
        let mut fx = Fixture::new();
        let sufferer =
            fx.spawn_sufferer(&[ComplaintType::BrokenBone, ComplaintType::Laceration]);
        let mut task = RequestMedicalTreatment::new(&mut fx.ctx(), sufferer);
        assert!(!task.is_done());

        task.advance(&mut fx.ctx(), 10.0);
        assert_eq!(fx.medical.station(StationId(0)).awaiting().len(), 2);
        // Repeat ticks do not re-enqueue
        task.advance(&mut fx.ctx(), 10.0);
        assert_eq!(fx.medical.station(StationId(0)).awaiting().len(), 2);

        let condition = fx.world.get::<&PhysicalCondition>(sufferer).unwrap();
        assert_eq!(
            condition.problem(ComplaintType::BrokenBone).unwrap().state,
            ProblemState::AwaitingTreatment
        );
    }

    #[test]
    fn test_timeout_returns_overflow() {
        let mut fx = Fixture::new();
        let sufferer = fx.spawn_sufferer(&[ComplaintType::BrokenBone]);
        let mut task = RequestMedicalTreatment::new(&mut fx.ctx(), sufferer);

        // Accumulate exactly the timeout
        for _ in 0..4 {
            let leftover = task.advance(&mut fx.ctx(), 50.0);
            assert!((leftover - 0.0).abs() < f64::EPSILON);
        }
        assert!(!task.is_done());

        // The next tick overflows: 200 + 30 - 200 = 30 handed back
        let leftover = task.advance(&mut fx.ctx(), 30.0);
        assert!((leftover - 30.0).abs() < 1e-9);
        assert!(task.is_done());
        // The request stays queued for doctors
        assert_eq!(fx.medical.station(StationId(0)).awaiting().len(), 1);
    }

    #[test]
    fn test_transitions_to_treatment_when_doctor_starts() {
        let mut fx = Fixture::new();
        let sufferer = fx.spawn_sufferer(&[ComplaintType::BrokenBone]);
        let mut task = RequestMedicalTreatment::new(&mut fx.ctx(), sufferer);
        task.advance(&mut fx.ctx(), 10.0);

        // A doctor picks the problem up
        let problem = ProblemRef {
            person: sufferer,
            complaint: ComplaintType::BrokenBone,
        };
        fx.medical.station_mut(StationId(0)).start_treatment(problem);

        task.advance(&mut fx.ctx(), 10.0);
        // Treatment finishes and nothing else is queued: task ends
        fx.medical.station_mut(StationId(0)).stop_treatment(problem);
        let leftover = task.advance(&mut fx.ctx(), 10.0);
        assert!(task.is_done());
        assert!((leftover - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_waiting_budget_resets_per_episode() {
        let mut fx = Fixture::new();
        let sufferer =
            fx.spawn_sufferer(&[ComplaintType::BrokenBone, ComplaintType::Laceration]);
        let mut task = RequestMedicalTreatment::new(&mut fx.ctx(), sufferer);
        // Wait 150 of the 200 budget
        task.advance(&mut fx.ctx(), 150.0);

        // Doctor treats the broken bone only
        let bone = ProblemRef {
            person: sufferer,
            complaint: ComplaintType::BrokenBone,
        };
        fx.medical.station_mut(StationId(0)).start_treatment(bone);
        task.advance(&mut fx.ctx(), 10.0); // now in TREATMENT
        fx.medical.station_mut(StationId(0)).stop_treatment(bone);

        // Laceration still queued: back to WAITING with a fresh budget,
        // so another 150 does not time out
        task.advance(&mut fx.ctx(), 150.0);
        assert!(!task.is_done());
        // ...but 60 more does (150 + 60 > 200)
        let leftover = task.advance(&mut fx.ctx(), 60.0);
        assert!(task.is_done());
        assert!((leftover - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_treatable_problem_fails_construction() {
        let mut fx = Fixture::new();
        let healthy = fx.spawn_sufferer(&[]);
        let task = RequestMedicalTreatment::new(&mut fx.ctx(), healthy);
        assert!(task.is_done());
        assert!(fx.medical.station(StationId(0)).awaiting().is_empty());
    }
}
