//! Prescribing medication to whoever in the settlement needs it.
//!
//! Single MEDICATING phase with a fixed nominal duration. The patient is
//! chosen once at construction: the first person indoors who is stressed out
//! without anxiety medication, or radiation sick without a radioprotective
//! agent. Self-prescription is allowed. If the patient already holds the
//! medication by completion time the task ends without effect.

use hecs::Entity;

use outpost_logic::constants::{durations, resources};

use crate::components::{Location, Person, PhysicalCondition, SkillType};
use crate::hooks::ResourceKind;
use crate::medical::Medication;
use crate::task::{location_of, Task, TaskContext};

/// Prescribe and administer one medication dose.
pub struct PrescribeMedication {
    worker: Entity,
    patient: Entity,
    accumulated: f64,
    done: bool,
}

impl PrescribeMedication {
    pub fn new(ctx: &mut TaskContext, worker: Entity) -> Self {
        let mut task = Self {
            worker,
            patient: worker,
            accumulated: 0.0,
            done: false,
        };

        if location_of(ctx.world, worker) != Location::Settlement {
            task.done = true;
            return task;
        }

        match find_patient(ctx.world) {
            Some(patient) => task.patient = patient,
            None => task.done = true,
        }
        task
    }

    pub fn patient(&self) -> Entity {
        self.patient
    }

    fn end(&mut self) {
        self.done = true;
    }
}

/// The first person indoors who needs a medication, in entity order so the
/// choice is deterministic.
pub(crate) fn find_patient(world: &hecs::World) -> Option<Entity> {
    let mut candidates: Vec<Entity> = world
        .query::<(&Person, &Location, &PhysicalCondition)>()
        .iter()
        .filter(|(_, (_, location, condition))| {
            **location == Location::Settlement
                && condition.alive
                && condition.needed_medication().is_some()
        })
        .map(|(entity, _)| entity)
        .collect();
    candidates.sort_by_key(|e| e.to_bits());
    candidates.into_iter().next()
}

impl Task for PrescribeMedication {
    fn name(&self) -> &'static str {
        "Prescribing Medication"
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

        ctx.hooks
            .add_experience(self.worker, SkillType::Medicine, time);
        self.accumulated += time;
        if self.accumulated < durations::PRESCRIPTION {
            return 0.0;
        }
        let leftover = (self.accumulated - durations::PRESCRIPTION).min(time);

        // Re-derive the medication from the patient's condition at
        // completion; a dose administered in the meantime means we quietly
        // do nothing.
        let needed = ctx
            .world
            .get::<&PhysicalCondition>(self.patient)
            .ok()
            .and_then(|c| if c.alive { c.needed_medication() } else { None });
        let Some(kind) = needed else {
            log::debug!("patient already medicated, nothing to administer");
            self.end();
            return leftover;
        };

        if let Ok(mut condition) = ctx.world.get::<&mut PhysicalCondition>(self.patient) {
            condition.add_medication(Medication::new(kind));
        }
        ctx.hooks.register_event("medication prescribed", self.worker);
        if location_of(ctx.world, self.worker) != Location::Outside {
            ctx.hooks.store_resource(
                self.worker,
                ResourceKind::ToxicWaste,
                resources::TOXIC_WASTE_PER_PRESCRIPTION,
            );
        }
        log::info!("medication administered");
        self.end();
        leftover
    }

    fn cancel(&mut self, _ctx: &mut TaskContext) {
        // No queue membership to release.
        self.end();
    }
}
