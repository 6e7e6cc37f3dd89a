//! Settlement engine - drives conditions, scheduling, and task advancement.
//!
//! One discrete tick advances every worker in entity order. Whichever
//! worker's task runs first observes and mutates shared medical state first;
//! single-claim locks are therefore won by order of advancement, and losers
//! degrade gracefully. No task ever blocks: waiting is an explicit phase
//! that re-enters on the next tick.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::{PhysicalCondition, Skills};
use crate::generation::{generate_settlement, GeneratedSettlement, SettlementConfig};
use crate::hooks::{AlwaysArrive, EventLog, WorkerMover};
use crate::medical::{DeathInfo, MedicalManager, ProblemState};
use crate::meta::{default_meta_tasks, Candidate, MetaTask, SchedulerContext};
use crate::task::{Task, TaskContext};

/// Cap on task reassignments per worker per tick, so leftover-time reuse
/// can never spin.
const MAX_ROUNDS_PER_TICK: usize = 8;

/// The behavioral engine for one settlement.
pub struct SettlementEngine {
    /// ECS world containing all workers.
    pub world: World,
    /// Shared medical state: stations, queues, death records.
    pub medical: MedicalManager,
    /// Movement collaborator; swapped out by tests and the simulation shell.
    pub mover: Box<dyn WorkerMover>,
    /// Accident/experience/event sink. The shell drains it each tick.
    pub hooks: EventLog,
    sim_time: f64,
    tasks: HashMap<Entity, Box<dyn Task>>,
    metas: Vec<Box<dyn MetaTask>>,
    rng: StdRng,
}

impl SettlementEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            world: World::new(),
            medical: MedicalManager::new(),
            mover: Box::new(AlwaysArrive),
            hooks: EventLog::new(),
            sim_time: 0.0,
            tasks: HashMap::new(),
            metas: default_meta_tasks(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Populate the settlement from a config.
    pub fn generate(&mut self, config: &SettlementConfig) -> GeneratedSettlement {
        generate_settlement(&mut self.world, &mut self.medical, config, &mut self.rng)
    }

    /// Current sim time in millisols.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub(crate) fn set_sim_time(&mut self, time: f64) {
        self.sim_time = time;
    }

    /// Name of the task a worker is currently on, if any.
    pub fn current_task_name(&self, worker: Entity) -> Option<&'static str> {
        self.tasks.get(&worker).map(|t| t.name())
    }

    /// All workers, in deterministic advancement order.
    pub fn workers(&self) -> Vec<Entity> {
        let mut workers: Vec<Entity> = self
            .world
            .query::<&Skills>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        workers.sort_by_key(|e| e.to_bits());
        workers
    }

    /// Advance the whole settlement by one tick of `delta` millisols.
    pub fn advance(&mut self, delta: f64) {
        self.sim_time += delta;
        self.tick_conditions(delta);
        self.prune_stale_queue_entries();
        for worker in self.workers() {
            self.advance_worker(worker, delta);
        }
    }

    /// Age every person's condition; handle degradations and deaths.
    fn tick_conditions(&mut self, delta: f64) {
        let mut deaths = Vec::new();
        for (entity, condition) in self.world.query_mut::<&mut PhysicalCondition>() {
            if !condition.alive {
                continue;
            }
            if let crate::components::ConditionChange::Died(complaint) =
                condition.time_passing(delta)
            {
                deaths.push((entity, complaint));
            }
        }
        for (person, complaint) in deaths {
            log::info!("worker died of {}", complaint.descriptor().name);
            self.cancel_task(person);
            self.medical.purge_person(person);
            self.medical
                .record_death(DeathInfo::new(person, self.sim_time, complaint));
        }
    }

    /// Drop treatment-queue entries whose problem no longer exists in a
    /// queueable state (resolved, worsened into another complaint, or the
    /// sufferer died). Resting entries are left alone: a body on a bed is
    /// legitimate exam state.
    fn prune_stale_queue_entries(&mut self) {
        let world = &self.world;
        for index in 0..self.medical.station_count() {
            let station = self.medical.station_mut(crate::medical::StationId(index));
            let stale: Vec<_> = station
                .awaiting()
                .iter()
                .chain(station.treating().iter())
                .copied()
                .filter(|p| {
                    world
                        .get::<&PhysicalCondition>(p.person)
                        .map(|c| {
                            !c.alive
                                || c.problem(p.complaint).map_or(true, |hp| {
                                    !matches!(
                                        hp.state,
                                        ProblemState::AwaitingTreatment
                                            | ProblemState::BeingTreated
                                    )
                                })
                        })
                        .unwrap_or(true)
                })
                .collect();
            for problem in stale {
                log::debug!("pruning stale queue entry");
                station.stop_treatment(problem);
                station.withdraw_request(problem);
            }
        }
    }

    /// Advance one worker, reusing leftover time for phase falls-through and
    /// fresh task assignments within the same tick.
    fn advance_worker(&mut self, worker: Entity, delta: f64) {
        let alive = self
            .world
            .get::<&PhysicalCondition>(worker)
            .map(|c| c.alive)
            .unwrap_or(true);
        if !alive {
            self.cancel_task(worker);
            return;
        }

        let mut budget = delta;
        let mut rounds = 0;
        while budget > 0.0 && rounds < MAX_ROUNDS_PER_TICK {
            rounds += 1;
            let mut task = match self.tasks.remove(&worker) {
                Some(task) => task,
                None => match self.select_task(worker) {
                    Some(task) => task,
                    None => break,
                },
            };

            let before = budget;
            let leftover = {
                let mut ctx = TaskContext {
                    world: &mut self.world,
                    medical: &mut self.medical,
                    mover: self.mover.as_mut(),
                    hooks: &mut self.hooks,
                    rng: &mut self.rng,
                    now: self.sim_time,
                };
                task.advance(&mut ctx, before)
            };

            if task.is_done() {
                // Hand any overflow back to the scheduler for a fresh
                // assignment this tick.
                budget = leftover.clamp(0.0, before);
                if leftover >= before {
                    break;
                }
                continue;
            }

            self.tasks.insert(worker, task);
            if leftover <= 0.0 || leftover >= before {
                break;
            }
            budget = leftover;
        }
    }

    /// Score every meta-task's candidates and instantiate the best one.
    fn select_task(&mut self, worker: Entity) -> Option<Box<dyn Task>> {
        let mut best: Option<(usize, Candidate, f64)> = None;
        {
            let ctx = SchedulerContext {
                world: &self.world,
                medical: &self.medical,
                now: self.sim_time,
            };
            for (index, meta) in self.metas.iter().enumerate() {
                for scored in meta.candidates(&ctx, worker) {
                    let value = scored.score.score();
                    if value > 0.0 && best.map_or(true, |(_, _, b)| value > b) {
                        best = Some((index, scored.candidate, value));
                    }
                }
            }
        }
        let (index, candidate, value) = best?;

        let mut ctx = TaskContext {
            world: &mut self.world,
            medical: &mut self.medical,
            mover: self.mover.as_mut(),
            hooks: &mut self.hooks,
            rng: &mut self.rng,
            now: self.sim_time,
        };
        let task = self.metas[index].instantiate(&mut ctx, worker, &candidate);
        if let Some(task) = &task {
            log::debug!("assigned task {} (score {:.0})", task.name(), value);
        }
        task
    }

    /// Cancel a worker's task, running its cleanup.
    pub fn cancel_task(&mut self, worker: Entity) {
        if let Some(mut task) = self.tasks.remove(&worker) {
            let mut ctx = TaskContext {
                world: &mut self.world,
                medical: &mut self.medical,
                mover: self.mover.as_mut(),
                hooks: &mut self.hooks,
                rng: &mut self.rng,
                now: self.sim_time,
            };
            task.cancel(&mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Location, Person};
    use crate::medical::{ComplaintType, MedicalStation, StationId, StationKind};

    fn engine_with_station() -> SettlementEngine {
        let mut engine = SettlementEngine::new(42);
        engine.medical.add_station(MedicalStation::new(
            StationKind::Building { building_id: 1 },
            3,
            2,
        ));
        engine
    }

    fn spawn_doctor(engine: &mut SettlementEngine, medicine: u32) -> Entity {
        engine.world.spawn((
            Person,
            Location::Settlement,
            Skills {
                medicine,
                ..Default::default()
            },
            crate::components::NaturalAttributes::default(),
            PhysicalCondition::default(),
        ))
    }

    /// A medical robot: tireless, so long scenarios don't stall on the
    /// duty-fitness gate (sleep and meals belong to the simulation shell).
    fn spawn_medibot(engine: &mut SettlementEngine, medicine: u32) -> Entity {
        engine.world.spawn((
            crate::components::Robot,
            Location::Settlement,
            Skills {
                medicine,
                ..Default::default()
            },
        ))
    }

    #[test]
    fn test_idle_settlement_advances_cleanly() {
        let mut engine = engine_with_station();
        spawn_doctor(&mut engine, 3);
        for _ in 0..10 {
            engine.advance(50.0);
        }
        assert!((engine.sim_time() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_sick_person_gets_treated_end_to_end() {
        let mut engine = engine_with_station();
        let doctor = spawn_doctor(&mut engine, 3);
        let patient = spawn_doctor(&mut engine, 0);
        engine
            .world
            .get::<&mut PhysicalCondition>(patient)
            .unwrap()
            .add_problem(ComplaintType::BrokenBone);

        // Patient requests, doctor treats, patient recovers in bed.
        let mut treated = false;
        for _ in 0..100 {
            engine.advance(25.0);
            let condition = engine.world.get::<&PhysicalCondition>(patient).unwrap();
            match condition.problem(ComplaintType::BrokenBone) {
                None => {
                    treated = true;
                    break;
                }
                Some(p) => {
                    assert_ne!(p.state, ProblemState::Degrading, "request never queued");
                }
            }
        }
        assert!(treated, "broken bone never resolved");
        // The doctor earned medicine experience along the way
        assert!(
            engine
                .hooks
                .experience_for(doctor, crate::components::SkillType::Medicine)
                > 0.0
        );
        // Queues all drained
        let station = engine.medical.station(StationId(0));
        assert!(station.awaiting().is_empty());
        assert!(station.treating().is_empty());
        assert_eq!(station.patient_num(), 0);
    }

    #[test]
    fn test_queues_stay_disjoint_under_load() {
        let mut engine = engine_with_station();
        spawn_medibot(&mut engine, 4);
        spawn_medibot(&mut engine, 2);
        for complaint in [
            ComplaintType::BrokenBone,
            ComplaintType::Appendicitis,
            ComplaintType::Laceration,
            ComplaintType::FoodPoisoning,
        ] {
            let patient = spawn_doctor(&mut engine, 0);
            engine
                .world
                .get::<&mut PhysicalCondition>(patient)
                .unwrap()
                .add_problem(complaint);
        }

        for _ in 0..200 {
            engine.advance(20.0);
            for (_, station) in engine.medical.stations() {
                for p in station.awaiting() {
                    assert!(
                        !station.treating().contains(p),
                        "queue disjointness violated"
                    );
                }
                assert!(station.treating().len() + station.resting().len() <= station.sick_beds());
            }
        }
    }

    #[test]
    fn test_death_creates_exam_work_and_burial() {
        let mut engine = engine_with_station();
        spawn_medibot(&mut engine, 4);
        let doomed = spawn_doctor(&mut engine, 0);
        engine
            .world
            .get::<&mut PhysicalCondition>(doomed)
            .unwrap()
            .add_problem(ComplaintType::RupturedAppendix);
        // Make sure nobody can treat it in time
        engine.medical.station_mut(StationId(0)).set_malfunction(true);

        // Run past the fatal degrade window
        for _ in 0..50 {
            engine.advance(25.0);
        }
        assert!(!engine
            .world
            .get::<&PhysicalCondition>(doomed)
            .unwrap()
            .alive);
        assert_eq!(engine.medical.deaths().count(), 1);

        // Bring the station back and let the doctor finish the exam
        engine
            .medical
            .station_mut(StationId(0))
            .set_malfunction(false);
        for _ in 0..200 {
            engine.advance(25.0);
            if engine.medical.deaths().next().unwrap().1.exam_done {
                break;
            }
        }
        let death = engine.medical.deaths().next().unwrap().1;
        assert!(death.exam_done, "exam never completed");
        assert!(death.cause.contains("Ruptured Appendix"));
        assert_eq!(
            engine
                .hooks
                .count(|e| matches!(e, crate::hooks::HookEvent::Buried { .. })),
            1
        );
    }

    #[test]
    fn test_cancel_task_runs_cleanup() {
        let mut engine = engine_with_station();
        let patient = spawn_doctor(&mut engine, 0);
        {
            let mut condition = engine
                .world
                .get::<&mut PhysicalCondition>(patient)
                .unwrap();
            condition.add_problem(ComplaintType::BrokenBone);
            condition
                .problem_mut(ComplaintType::BrokenBone)
                .unwrap()
                .start_recovery();
        }
        engine.advance(50.0); // picks up bed rest and joins the resting set
        assert!(engine.medical.station(StationId(0)).is_resting(patient));
        engine.cancel_task(patient);
        assert!(!engine.medical.station(StationId(0)).is_resting(patient));
    }
}
