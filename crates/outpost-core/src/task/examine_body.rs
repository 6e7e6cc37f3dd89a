//! Postmortem examination of a deceased person.
//!
//! Phases: PREPARING (transport the body to a bed) → EXAMINING (shared
//! progress toward a write-once estimate) → RECORDING (certificate, burial,
//! registry) → done.
//!
//! Several doctors may work the same body. The retrieval lock decides who
//! moves it onto a bed; the certificate lock decides whose tick completes
//! the exam. Losers end gracefully rather than erroring.

use hecs::Entity;

use outpost_logic::condition::DUTY_FITNESS;
use outpost_logic::constants::{chances, durations};
use outpost_logic::medical::{estimated_exam_time, exam_leftover, exam_work_multiplier};

use crate::components::{Location, NaturalAttributes, SkillType};
use crate::medical::{DeathId, StationId};
use crate::task::{fit_for, location_of, skill_level, Task, TaskContext};

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExaminePhase {
    Preparing,
    Examining,
    Recording,
}

/// Examine a body and certify the death.
pub struct ExamineBody {
    worker: Entity,
    death: DeathId,
    station: StationId,
    phase: ExaminePhase,
    /// The very first advance call only arms the task, so the first tick
    /// after construction is spent walking, never examining.
    armed: bool,
    transport_remaining: f64,
    done: bool,
}

impl ExamineBody {
    /// Bind a doctor to a pending death record. The returned task is already
    /// ended if preconditions fail; no resource claims are held either way.
    pub fn new(ctx: &mut TaskContext, worker: Entity, death: DeathId) -> Self {
        let mut task = Self {
            worker,
            death,
            station: StationId(0),
            phase: ExaminePhase::Preparing,
            armed: false,
            transport_remaining: durations::BODY_TRANSPORT,
            done: false,
        };

        if location_of(ctx.world, worker) != Location::Settlement
            || !fit_for(ctx.world, worker, &DUTY_FITNESS)
            || ctx.medical.death(death).exam_done
        {
            task.done = true;
            return task;
        }

        // Prefer the station already hosting the body (a resumed exam),
        // otherwise any station with a free bed.
        let body = ctx.medical.death(death).person;
        let station = ctx
            .medical
            .stations()
            .find(|(_, s)| s.is_resting(body))
            .or_else(|| {
                ctx.medical
                    .stations()
                    .find(|(_, s)| s.patient_num() < s.sick_beds())
            })
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

    fn preparing(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        if !self.armed {
            self.armed = true;
            return 0.0;
        }

        self.transport_remaining -= time;
        if self.transport_remaining > 0.0 {
            return 0.0;
        }
        let leftover = (-self.transport_remaining).min(time);
        self.transport_remaining = 0.0;

        let won = ctx.medical.death_mut(self.death).claim_retrieval(self.worker);
        if !won {
            log::debug!("body already being retrieved, standing down");
            self.end(ctx);
            return 0.0;
        }

        let person = ctx.medical.death(self.death).person;
        if !ctx.medical.station_mut(self.station).try_claim_bed(person) {
            // Hand the claim back so a later doctor can retry.
            ctx.medical
                .death_mut(self.death)
                .release_retrieval(self.worker);
            log::debug!("no free medical bed for the body");
            self.end(ctx);
            return 0.0;
        }

        // The first doctor to get the body onto a bed fixes the estimate;
        // everyone after works against the same number.
        let skill = skill_level(ctx.world, self.worker, SkillType::Medicine);
        let attributes = ctx
            .world
            .get::<&NaturalAttributes>(self.worker)
            .map(|a| *a)
            .unwrap_or_default();
        let jitter: f64 = ctx.rng.gen();
        let estimate = estimated_exam_time(
            skill,
            attributes.emotional_stability,
            attributes.stress_resilience,
            jitter,
        );
        ctx.medical
            .death_mut(self.death)
            .set_estimated_exam_time(estimate);

        self.phase = ExaminePhase::Examining;
        leftover
    }

    fn examining(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        if ctx.medical.station(self.station).has_malfunction() {
            self.end(ctx);
            return 0.0;
        }

        {
            // Someone else already finished this exam; nothing left to add.
            let death = ctx.medical.death(self.death);
            if death.exam_done && death.certificate_doctor() != Some(self.worker) {
                self.end(ctx);
                return 0.0;
            }
        }

        let skill = skill_level(ctx.world, self.worker, SkillType::Medicine);
        let work = time * exam_work_multiplier(skill);

        let completed = {
            let death = ctx.medical.death_mut(self.death);
            if death.exam_complete() && death.claim_certificate(self.worker) {
                death.exam_done = true;
                true
            } else {
                death.add_exam_time(work);
                false
            }
        };

        if completed {
            let elapsed = ctx.medical.death(self.death).exam_time_spent;
            ctx.hooks
                .check_for_accident(self.station, elapsed, chances::EXAM_ACCIDENT);
            ctx.hooks
                .add_experience(self.worker, SkillType::Medicine, elapsed);
            self.phase = ExaminePhase::Recording;
        }

        exam_leftover(work, time)
    }

    fn recording(&mut self, ctx: &mut TaskContext, time: f64) -> f64 {
        let person = {
            let death = ctx.medical.death_mut(self.death);
            let complaint_name = death.complaint.descriptor().name;
            death.append_cause(complaint_name);
            death.person
        };

        ctx.hooks
            .check_for_accident(self.station, time, chances::EXAM_ACCIDENT);
        ctx.hooks
            .add_experience(self.worker, SkillType::Medicine, time);
        ctx.hooks.register_event("postmortem exam", self.worker);
        ctx.hooks.bury_body(person);
        ctx.hooks.add_death_registry(person);

        // The body leaves its bed for burial.
        ctx.medical.station_mut(self.station).stop_resting(person);

        log::info!(
            "postmortem exam complete: {}",
            ctx.medical.death(self.death).cause
        );
        self.end(ctx);
        0.0
    }

    fn end(&mut self, ctx: &mut TaskContext) {
        if self.done {
            return;
        }
        self.done = true;
        // An abandoned exam hands the retrieval claim back so another
        // doctor can pick the body up. A finished exam keeps its record.
        let death = ctx.medical.death_mut(self.death);
        if !death.exam_done {
            death.release_retrieval(self.worker);
        }
    }
}

impl Task for ExamineBody {
    fn name(&self) -> &'static str {
        "Examining Body"
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
            ExaminePhase::Preparing => self.preparing(ctx, time),
            ExaminePhase::Examining => self.examining(ctx, time),
            ExaminePhase::Recording => self.recording(ctx, time),
        }
    }

    fn cancel(&mut self, ctx: &mut TaskContext) {
        self.end(ctx);
    }
}
