//! External collaborators the behavior engine delegates to.
//!
//! Movement, accident resolution, experience bookkeeping, event registries,
//! and resource deposits are all owned by the wider simulation. The engine
//! only needs success/failure answers and fire-and-forget notifications, so
//! they are modeled as traits with permissive defaults. Tests swap in
//! recording or failing implementations.

use hecs::Entity;

use crate::components::SkillType;
use crate::medical::StationId;

/// Resources the engine can deposit into settlement stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ToxicWaste,
}

/// Moves workers to activity spots. Pathfinding and interior geometry are
/// out of scope; implementations report only success or failure.
pub trait WorkerMover {
    /// Walk a worker to an activity spot at a medical station.
    fn walk_to_station(&mut self, worker: Entity, station: StationId, allow_failure: bool) -> bool;

    /// Walk a worker to a sick bay activity spot aboard a vehicle.
    fn walk_to_sick_bay(&mut self, worker: Entity, vehicle_id: u32, allow_failure: bool) -> bool;

    /// Reuse the worker's current spot if it is valid for medical work.
    fn dispatch_to_existing_spot(&mut self, worker: Entity) -> bool;
}

/// Movement stub that always arrives. The default for headless runs.
#[derive(Debug, Default)]
pub struct AlwaysArrive;

impl WorkerMover for AlwaysArrive {
    fn walk_to_station(&mut self, _: Entity, _: StationId, _: bool) -> bool {
        true
    }
    fn walk_to_sick_bay(&mut self, _: Entity, _: u32, _: bool) -> bool {
        true
    }
    fn dispatch_to_existing_spot(&mut self, _: Entity) -> bool {
        true
    }
}

/// Movement stub that never arrives, for exercising abandonment paths.
#[derive(Debug, Default)]
pub struct NeverArrive;

impl WorkerMover for NeverArrive {
    fn walk_to_station(&mut self, _: Entity, _: StationId, _: bool) -> bool {
        false
    }
    fn walk_to_sick_bay(&mut self, _: Entity, _: u32, _: bool) -> bool {
        false
    }
    fn dispatch_to_existing_spot(&mut self, _: Entity) -> bool {
        false
    }
}

/// One notification delivered to the simulation shell.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    AccidentCheck {
        station: StationId,
        elapsed: f64,
        base_chance: f64,
    },
    Experience {
        worker: Entity,
        skill: SkillType,
        elapsed: f64,
    },
    Event {
        tag: &'static str,
        actor: Entity,
    },
    DeathRegistered {
        person: Entity,
    },
    Buried {
        person: Entity,
    },
    ResourceStored {
        worker: Entity,
        resource: ResourceKind,
        amount: f64,
    },
}

/// Sink for accident checks, experience awards, events, and deposits.
pub trait SimulationHooks {
    fn check_for_accident(&mut self, station: StationId, elapsed: f64, base_chance: f64);
    fn add_experience(&mut self, worker: Entity, skill: SkillType, elapsed: f64);
    fn register_event(&mut self, tag: &'static str, actor: Entity);
    fn add_death_registry(&mut self, person: Entity);
    fn bury_body(&mut self, person: Entity);
    fn store_resource(&mut self, worker: Entity, resource: ResourceKind, amount: f64);
}

/// Hook sink that records every call. Doubles as the engine default (the
/// shell can drain the log each tick) and as the assertion surface in tests.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<HookEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count events matching a predicate.
    pub fn count(&self, pred: impl Fn(&HookEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Total experience awarded to a worker for a skill.
    pub fn experience_for(&self, worker: Entity, skill: SkillType) -> f64 {
        self.events
            .iter()
            .filter_map(|e| match e {
                HookEvent::Experience {
                    worker: w,
                    skill: s,
                    elapsed,
                } if *w == worker && *s == skill => Some(*elapsed),
                _ => None,
            })
            .sum()
    }

    pub fn drain(&mut self) -> Vec<HookEvent> {
        std::mem::take(&mut self.events)
    }
}

impl SimulationHooks for EventLog {
    fn check_for_accident(&mut self, station: StationId, elapsed: f64, base_chance: f64) {
        self.events.push(HookEvent::AccidentCheck {
            station,
            elapsed,
            base_chance,
        });
    }

    fn add_experience(&mut self, worker: Entity, skill: SkillType, elapsed: f64) {
        self.events.push(HookEvent::Experience {
            worker,
            skill,
            elapsed,
        });
    }

    fn register_event(&mut self, tag: &'static str, actor: Entity) {
        self.events.push(HookEvent::Event { tag, actor });
    }

    fn add_death_registry(&mut self, person: Entity) {
        self.events.push(HookEvent::DeathRegistered { person });
    }

    fn bury_body(&mut self, person: Entity) {
        self.events.push(HookEvent::Buried { person });
    }

    fn store_resource(&mut self, worker: Entity, resource: ResourceKind, amount: f64) {
        self.events.push(HookEvent::ResourceStored {
            worker,
            resource,
            amount,
        });
    }
}
