//! The concrete medical meta-tasks.
//!
//! One settlement-scoped scorer (body examination) and five worker-scoped
//! ones. Worker-scoped metas emit at most one candidate per scheduling pass.

use hecs::{Entity, World};

use outpost_logic::condition::{CARE_SEEKING_FITNESS, DUTY_FITNESS};
use outpost_logic::constants::{scores, thresholds};
use outpost_logic::medical::{body_exam_score, skill_score_factor};
use outpost_logic::rating::RatingScore;

use crate::components::{Location, Person, PhysicalCondition, SkillType};
use crate::medical::{ProblemRef, StationId};
use crate::task::{
    fit_for, location_of, skill_level, ExamineBody, PrescribeMedication,
    RequestMedicalTreatment, RestingMedicalRecovery, Task, TaskContext, TreatHealthProblem,
};

use super::{live, Candidate, MetaTask, SchedulerContext, ScoredCandidate};

use rand::Rng;

fn is_person(world: &World, worker: Entity) -> bool {
    world.get::<&Person>(worker).is_ok()
}

/// Performance modifier; workers without a condition (robots) rate 1.0.
fn performance_of(world: &World, worker: Entity) -> f64 {
    world
        .get::<&PhysicalCondition>(worker)
        .map(|c| c.performance())
        .unwrap_or(1.0)
}

// ── Examine Body ────────────────────────────────────────────────────────

/// Settlement-scoped: one candidate per unexamined death. The score grows
/// with how long the body has waited, so no body starves forever.
pub struct ExamineBodyMeta;

impl MetaTask for ExamineBodyMeta {
    fn name(&self) -> &'static str {
        "Examine Body"
    }

    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate> {
        if location_of(ctx.world, worker) != Location::Settlement
            || !fit_for(ctx.world, worker, &DUTY_FITNESS)
        {
            return Vec::new();
        }
        ctx.medical
            .deaths()
            .filter(|(_, d)| !d.exam_done)
            .map(|(id, d)| {
                let elapsed = (ctx.now - d.time_of_death).max(0.0);
                ScoredCandidate {
                    candidate: Candidate::ExamineBody(id),
                    score: RatingScore::new("body exam", body_exam_score(elapsed)),
                }
            })
            .collect()
    }

    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>> {
        let Candidate::ExamineBody(death) = candidate else {
            return None;
        };
        live(ExamineBody::new(ctx, worker, *death))
    }
}

// ── Treat Medical Patient ───────────────────────────────────────────────

/// Problems this doctor could treat right now, across every working station.
fn treatable_by_doctor(
    world: &World,
    medical: &crate::medical::MedicalManager,
    doctor: Entity,
) -> Vec<(ProblemRef, StationId)> {
    let skill = skill_level(world, doctor, SkillType::Medicine);
    let mut jobs = Vec::new();
    for (id, station) in medical.stations() {
        if station.has_malfunction() {
            continue;
        }
        for &problem in station.awaiting() {
            let Some(treatment) = problem.complaint.descriptor().treatment else {
                continue;
            };
            if !treatment.self_admin && skill >= treatment.required_skill {
                jobs.push((problem, id));
            }
        }
    }
    jobs
}

/// Worker-scoped: treat some waiting patient whose treatment needs a doctor.
/// The concrete patient is drawn uniformly at instantiation; assignment is
/// deliberately not urgency-ordered.
pub struct TreatMedicalPatientMeta;

impl MetaTask for TreatMedicalPatientMeta {
    fn name(&self) -> &'static str {
        "Treat Medical Patient"
    }

    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate> {
        if location_of(ctx.world, worker) != Location::Settlement
            || !fit_for(ctx.world, worker, &DUTY_FITNESS)
        {
            return Vec::new();
        }
        let jobs = treatable_by_doctor(ctx.world, ctx.medical, worker);
        if jobs.is_empty() {
            return Vec::new();
        }
        let skill = skill_level(ctx.world, worker, SkillType::Medicine);
        let score = RatingScore::new("treat patient", scores::TREAT_PATIENT_BASE)
            .multiply("patients waiting", jobs.len() as f64)
            .multiply("skill", skill_score_factor(skill))
            .multiply("performance", performance_of(ctx.world, worker));
        vec![ScoredCandidate {
            candidate: Candidate::TreatPatient,
            score,
        }]
    }

    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>> {
        if *candidate != Candidate::TreatPatient {
            return None;
        }
        let jobs = treatable_by_doctor(ctx.world, ctx.medical, worker);
        if jobs.is_empty() {
            return None;
        }
        let (problem, station) = jobs[ctx.rng.gen_range(0..jobs.len())];
        live(TreatHealthProblem::treat_patient(ctx, worker, problem, station))
    }
}

// ── Self Treat Health Problem ───────────────────────────────────────────

/// The single most serious self-treatable problem, or none. Iterates the
/// problem list in insertion order and replaces only on strictly greater
/// seriousness, so the choice is deterministic under ties.
pub fn most_serious_self_treatable(
    condition: &PhysicalCondition,
    medical: &crate::medical::MedicalManager,
) -> Option<(crate::medical::ComplaintType, StationId)> {
    let person_problems = condition
        .active_problems()
        .filter(|p| p.needs_treatment());
    let mut best: Option<(u32, crate::medical::ComplaintType, StationId)> = None;
    for problem in person_problems {
        let descriptor = problem.complaint.descriptor();
        let Some(treatment) = descriptor.treatment else {
            continue;
        };
        if !treatment.self_admin {
            continue;
        }
        let Some(station) = medical
            .stations()
            .find(|(_, s)| !s.has_malfunction() && s.can_treat(problem.complaint))
            .map(|(id, _)| id)
        else {
            continue;
        };
        if best.map_or(true, |(s, _, _)| descriptor.seriousness > s) {
            best = Some((descriptor.seriousness, problem.complaint, station));
        }
    }
    best.map(|(_, complaint, station)| (complaint, station))
}

/// Worker-scoped: treat one's own worst self-treatable problem.
/// Urgency-ordered, unlike doctor-to-patient assignment.
pub struct SelfTreatHealthProblemMeta;

impl SelfTreatHealthProblemMeta {
    fn job_for(
        ctx_world: &World,
        medical: &crate::medical::MedicalManager,
        worker: Entity,
    ) -> Option<(ProblemRef, StationId)> {
        let condition = ctx_world.get::<&PhysicalCondition>(worker).ok()?;
        if !condition.alive {
            return None;
        }
        most_serious_self_treatable(&condition, medical).map(|(complaint, station)| {
            (
                ProblemRef {
                    person: worker,
                    complaint,
                },
                station,
            )
        })
    }
}

impl MetaTask for SelfTreatHealthProblemMeta {
    fn name(&self) -> &'static str {
        "Self Treat Health Problem"
    }

    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate> {
        if !is_person(ctx.world, worker)
            || location_of(ctx.world, worker) == Location::Outside
            || !fit_for(ctx.world, worker, &CARE_SEEKING_FITNESS)
        {
            return Vec::new();
        }
        let Some((problem, station)) = Self::job_for(ctx.world, ctx.medical, worker) else {
            return Vec::new();
        };
        let skill = skill_level(ctx.world, worker, SkillType::Medicine);
        vec![ScoredCandidate {
            candidate: Candidate::SelfTreat { problem, station },
            score: RatingScore::new("self treatment", scores::SELF_TREAT_BASE)
                .multiply("skill", skill_score_factor(skill)),
        }]
    }

    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>> {
        let Candidate::SelfTreat { problem, station } = candidate else {
            return None;
        };
        live(TreatHealthProblem::self_treat(ctx, worker, *problem, *station))
    }
}

// ── Request Medical Treatment ───────────────────────────────────────────

/// Problems the worker cannot handle alone: the treatment needs a doctor.
/// Self-administerable problems go through self-treatment instead, whatever
/// the sufferer's skill.
fn needs_doctor_count(world: &World, worker: Entity) -> usize {
    world
        .get::<&PhysicalCondition>(worker)
        .map(|c| {
            if !c.alive {
                return 0;
            }
            c.active_problems()
                .filter(|p| p.needs_treatment())
                .filter(|p| {
                    p.complaint
                        .descriptor()
                        .treatment
                        .map_or(false, |t| !t.self_admin)
                })
                .count()
        })
        .unwrap_or(0)
}

/// Worker-scoped: go to a station and wait for a doctor.
pub struct RequestMedicalTreatmentMeta;

impl MetaTask for RequestMedicalTreatmentMeta {
    fn name(&self) -> &'static str {
        "Request Medical Treatment"
    }

    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate> {
        if !is_person(ctx.world, worker)
            || location_of(ctx.world, worker) == Location::Outside
            || !fit_for(ctx.world, worker, &CARE_SEEKING_FITNESS)
        {
            return Vec::new();
        }
        let count = needs_doctor_count(ctx.world, worker);
        if count == 0 {
            return Vec::new();
        }
        // At least one station must be able to take the request.
        let treatable_somewhere = ctx
            .world
            .get::<&PhysicalCondition>(worker)
            .map(|c| {
                c.active_problems().any(|p| {
                    p.needs_treatment()
                        && ctx.medical.station_for(p.complaint).is_some()
                })
            })
            .unwrap_or(false);
        if !treatable_somewhere {
            return Vec::new();
        }
        vec![ScoredCandidate {
            candidate: Candidate::RequestTreatment,
            score: RatingScore::new("request treatment", scores::REQUEST_TREATMENT_BASE)
                .multiply("problems", count as f64),
        }]
    }

    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>> {
        if *candidate != Candidate::RequestTreatment {
            return None;
        }
        live(RequestMedicalTreatment::new(ctx, worker))
    }
}

// ── Resting Medical Recovery ────────────────────────────────────────────

/// Worker-scoped: bed rest for problems that only heal in a medical bed.
pub struct RestingMedicalRecoveryMeta;

impl MetaTask for RestingMedicalRecoveryMeta {
    fn name(&self) -> &'static str {
        "Resting Medical Recovery"
    }

    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate> {
        if !is_person(ctx.world, worker)
            || location_of(ctx.world, worker) == Location::Outside
            || !fit_for(ctx.world, worker, &CARE_SEEKING_FITNESS)
        {
            return Vec::new();
        }
        let Ok(condition) = ctx.world.get::<&PhysicalCondition>(worker) else {
            return Vec::new();
        };
        if !condition.alive || !condition.problems.iter().any(|p| p.needs_bed_rest()) {
            return Vec::new();
        }
        let bed_available = ctx
            .medical
            .stations()
            .any(|(_, s)| s.patient_num() < s.sick_beds() || s.is_resting(worker));
        if !bed_available {
            return Vec::new();
        }
        let hunger_penalty =
            (1.0 - condition.hunger / thresholds::HUNGER_CEILING).clamp(0.1, 1.0);
        vec![ScoredCandidate {
            candidate: Candidate::BedRest,
            score: RatingScore::new("bed rest", scores::BED_REST_BASE)
                .multiply("hunger penalty", hunger_penalty),
        }]
    }

    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>> {
        if *candidate != Candidate::BedRest {
            return None;
        }
        live(RestingMedicalRecovery::new(ctx, worker))
    }
}

// ── Prescribe Medication ────────────────────────────────────────────────

/// Worker-scoped: prescribe for the first person indoors who needs a dose.
pub struct PrescribeMedicationMeta;

impl MetaTask for PrescribeMedicationMeta {
    fn name(&self) -> &'static str {
        "Prescribe Medication"
    }

    fn candidates(&self, ctx: &SchedulerContext, worker: Entity) -> Vec<ScoredCandidate> {
        if location_of(ctx.world, worker) != Location::Settlement
            || !fit_for(ctx.world, worker, &DUTY_FITNESS)
        {
            return Vec::new();
        }
        if crate::task::find_patient(ctx.world).is_none() {
            return Vec::new();
        }
        let skill = skill_level(ctx.world, worker, SkillType::Medicine);
        vec![ScoredCandidate {
            candidate: Candidate::Prescribe,
            score: RatingScore::new("prescribe", scores::PRESCRIBE_BASE)
                .multiply("skill", skill_score_factor(skill))
                .multiply("performance", performance_of(ctx.world, worker)),
        }]
    }

    fn instantiate(
        &self,
        ctx: &mut TaskContext,
        worker: Entity,
        candidate: &Candidate,
    ) -> Option<Box<dyn Task>> {
        if *candidate != Candidate::Prescribe {
            return None;
        }
        live(PrescribeMedication::new(ctx, worker))
    }
}
