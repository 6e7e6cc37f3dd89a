//! Bed rest at a medical station while recovering.
//!
//! Single RESTING phase with a fixed session budget. Bed-rest time feeds
//! every recovering problem that requires it; fatigue drops for the whole
//! session either way. Ends early once nothing left needs the bed.

use hecs::Entity;

use outpost_logic::condition::CARE_SEEKING_FITNESS;
use outpost_logic::constants::durations;
use outpost_logic::medical::bed_rest_fatigue_relief;

use crate::components::{Location, PhysicalCondition};
use crate::medical::StationId;
use crate::task::{fit_for, location_of, Task, TaskContext};

/// One bed-rest session for one recovering person.
pub struct RestingMedicalRecovery {
    worker: Entity,
    station: StationId,
    remaining: f64,
    done: bool,
}

impl RestingMedicalRecovery {
    pub fn new(ctx: &mut TaskContext, worker: Entity) -> Self {
        let mut task = Self {
            worker,
            station: StationId(0),
            remaining: durations::BED_REST_SESSION,
            done: false,
        };

        if location_of(ctx.world, worker) == Location::Outside
            || !fit_for(ctx.world, worker, &CARE_SEEKING_FITNESS)
        {
            task.done = true;
            return task;
        }

        let needs_bed = ctx
            .world
            .get::<&PhysicalCondition>(worker)
            .map(|c| c.alive && c.problems.iter().any(|p| p.needs_bed_rest()))
            .unwrap_or(false);
        if !needs_bed {
            task.done = true;
            return task;
        }

        let station = ctx
            .medical
            .stations()
            .find(|(_, s)| s.patient_num() < s.sick_beds() || s.is_resting(worker))
            .map(|(id, _)| id);
        let Some(station) = station else {
            task.done = true;
            return task;
        };
        task.station = station;

        if !ctx.mover.walk_to_station(worker, station, false) {
            task.done = true;
        }
        task
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    fn end(&mut self, ctx: &mut TaskContext) {
        if self.done {
            return;
        }
        self.done = true;
        ctx.medical
            .station_mut(self.station)
            .stop_resting(self.worker);
    }
}

impl Task for RestingMedicalRecovery {
    fn name(&self) -> &'static str {
        "Resting during Medical Recovery"
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

        let consumed = time.min(self.remaining);

        {
            let station = ctx.medical.station_mut(self.station);
            if !station.is_resting(self.worker) {
                station.start_resting(self.worker);
            }
        }

        let mut still_recovering = false;
        if let Ok(mut condition) = ctx.world.get::<&mut PhysicalCondition>(self.worker) {
            for problem in &mut condition.problems {
                if problem.needs_bed_rest() {
                    problem.add_bed_rest(consumed);
                }
            }
            condition.problems.retain(|p| !p.is_resolved());
            still_recovering = condition.problems.iter().any(|p| p.needs_bed_rest());
            condition.reduce_fatigue(bed_rest_fatigue_relief(consumed));
        }

        self.remaining -= consumed;
        let leftover = time - consumed;

        if !still_recovering {
            log::info!("bed rest complete, patient recovered");
            self.end(ctx);
            return leftover;
        }
        if self.remaining <= 0.0 {
            self.end(ctx);
            return leftover;
        }
        leftover
    }

    fn cancel(&mut self, ctx: &mut TaskContext) {
        self.end(ctx);
    }
}
