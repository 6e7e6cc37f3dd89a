//! Per-deceased record coordinating the postmortem examination.
//!
//! Two single-claim locks live here: who retrieves the body onto a bed, and
//! who signs the death certificate. Claims are "set if empty" against an
//! `Option<Entity>`, so at most one worker ever wins each.

use hecs::Entity;

use super::complaint::ComplaintType;

/// Death record for one person. Created when the person dies, finalized by
/// the postmortem exam, never reused.
#[derive(Debug, Clone)]
pub struct DeathInfo {
    pub person: Entity,
    /// Sim time of death, in millisols.
    pub time_of_death: f64,
    /// The complaint that killed the person.
    pub complaint: ComplaintType,
    /// Append-only cause-of-death description.
    pub cause: String,
    /// Estimated exam length; written once by the first doctor to reach the
    /// body and authoritative for everyone after.
    pub estimated_exam_time: Option<f64>,
    /// Exam progress, shared across all examiners. Monotonically increasing.
    pub exam_time_spent: f64,
    pub exam_done: bool,
    retrieval_doctor: Option<Entity>,
    certificate_doctor: Option<Entity>,
}

impl DeathInfo {
    pub fn new(person: Entity, time_of_death: f64, complaint: ComplaintType) -> Self {
        Self {
            person,
            time_of_death,
            complaint,
            cause: String::from("unexamined"),
            estimated_exam_time: None,
            exam_time_spent: 0.0,
            exam_done: false,
            retrieval_doctor: None,
            certificate_doctor: None,
        }
    }

    /// Claim the body-retrieval lock. Wins if the lock is empty or already
    /// held by this doctor.
    pub fn claim_retrieval(&mut self, doctor: Entity) -> bool {
        match self.retrieval_doctor {
            None => {
                self.retrieval_doctor = Some(doctor);
                true
            }
            Some(holder) => holder == doctor,
        }
    }

    /// Release the retrieval lock, but only if this doctor holds it.
    pub fn release_retrieval(&mut self, doctor: Entity) {
        if self.retrieval_doctor == Some(doctor) {
            self.retrieval_doctor = None;
        }
    }

    pub fn retrieval_doctor(&self) -> Option<Entity> {
        self.retrieval_doctor
    }

    /// Claim the certificate-signing lock. Same winner semantics as
    /// [`claim_retrieval`](Self::claim_retrieval).
    pub fn claim_certificate(&mut self, doctor: Entity) -> bool {
        match self.certificate_doctor {
            None => {
                self.certificate_doctor = Some(doctor);
                true
            }
            Some(holder) => holder == doctor,
        }
    }

    pub fn certificate_doctor(&self) -> Option<Entity> {
        self.certificate_doctor
    }

    /// Record the exam estimate. Write-once: later calls are ignored.
    pub fn set_estimated_exam_time(&mut self, estimate: f64) {
        if self.estimated_exam_time.is_none() {
            self.estimated_exam_time = Some(estimate);
        }
    }

    /// Accrue shared exam progress.
    pub fn add_exam_time(&mut self, time: f64) {
        self.exam_time_spent += time.max(0.0);
    }

    /// Whether accumulated progress has reached the estimate.
    pub fn exam_complete(&self) -> bool {
        match self.estimated_exam_time {
            Some(estimate) => self.exam_time_spent >= estimate,
            None => false,
        }
    }

    /// Append to the cause-of-death string, skipping text already present.
    pub fn append_cause(&mut self, text: &str) {
        if !self.cause.contains(text) {
            if !self.cause.is_empty() {
                self.cause.push_str("; ");
            }
            self.cause.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctors() -> (Entity, Entity) {
        let mut world = hecs::World::new();
        (world.spawn(()), world.spawn(()))
    }

    fn dead_person() -> Entity {
        hecs::World::new().spawn(())
    }

    #[test]
    fn test_retrieval_lock_single_winner() {
        let (a, b) = doctors();
        let mut death = DeathInfo::new(dead_person(), 100.0, ComplaintType::RupturedAppendix);
        assert!(death.claim_retrieval(a));
        assert!(!death.claim_retrieval(b));
        // Re-claim by the holder is a no-op success
        assert!(death.claim_retrieval(a));
        assert_eq!(death.retrieval_doctor(), Some(a));
    }

    #[test]
    fn test_release_only_by_holder() {
        let (a, b) = doctors();
        let mut death = DeathInfo::new(dead_person(), 100.0, ComplaintType::RupturedAppendix);
        assert!(death.claim_retrieval(a));
        death.release_retrieval(b);
        assert_eq!(death.retrieval_doctor(), Some(a));
        death.release_retrieval(a);
        assert!(death.retrieval_doctor().is_none());
        // After release, another doctor can win
        assert!(death.claim_retrieval(b));
    }

    #[test]
    fn test_estimate_write_once() {
        let mut death = DeathInfo::new(dead_person(), 0.0, ComplaintType::RupturedAppendix);
        death.set_estimated_exam_time(150.0);
        death.set_estimated_exam_time(999.0);
        assert_eq!(death.estimated_exam_time, Some(150.0));
    }

    #[test]
    fn test_exam_complete_requires_estimate() {
        let mut death = DeathInfo::new(dead_person(), 0.0, ComplaintType::RupturedAppendix);
        death.add_exam_time(1000.0);
        assert!(!death.exam_complete());
        death.set_estimated_exam_time(150.0);
        assert!(death.exam_complete());
    }

    #[test]
    fn test_append_cause_idempotent() {
        let mut death = DeathInfo::new(dead_person(), 0.0, ComplaintType::RupturedAppendix);
        death.append_cause("Ruptured Appendix");
        let once = death.cause.clone();
        death.append_cause("Ruptured Appendix");
        assert_eq!(death.cause, once);
        assert!(death.cause.contains("Ruptured Appendix"));
    }
}
