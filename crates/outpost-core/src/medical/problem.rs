//! One affliction instance on one sufferer, with its lifecycle state.

use serde::{Deserialize, Serialize};

use super::complaint::ComplaintType;

/// Lifecycle state of a health problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemState {
    /// Untreated and potentially worsening.
    Degrading,
    /// Queued at a station, waiting for a doctor.
    AwaitingTreatment,
    /// A doctor is actively treating it.
    BeingTreated,
    /// Treatment finished; healing over time (possibly only in a bed).
    Recovering,
    /// Fully healed.
    Resolved,
}

/// What a degradation/recovery tick did to a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemChange {
    None,
    /// Worsened into a more serious complaint.
    Worsened(ComplaintType),
    /// The degrade window expired with nothing to worsen into.
    Fatal,
    Recovered,
}

/// One affliction on one person. The sufferer is implied by which
/// `PhysicalCondition` holds the problem; station queues refer to it by
/// `(person, complaint)` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProblem {
    pub complaint: ComplaintType,
    pub state: ProblemState,
    /// Time spent in `Degrading` since onset (or since the last worsening).
    pub time_degrading: f64,
    /// Recovery time accrued outside a bed (for complaints that allow it).
    pub time_recovering: f64,
    /// Bed-rest time accrued toward recovery.
    pub bed_rest_time: f64,
    /// Remaining treatment time recorded when a doctor starts work.
    pub treatment_remaining: f64,
}

impl HealthProblem {
    pub fn new(complaint: ComplaintType) -> Self {
        Self {
            complaint,
            state: ProblemState::Degrading,
            time_degrading: 0.0,
            time_recovering: 0.0,
            bed_rest_time: 0.0,
            treatment_remaining: 0.0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ProblemState::Resolved
    }

    /// Whether the problem still needs a doctor (not yet treated or healed).
    pub fn needs_treatment(&self) -> bool {
        matches!(
            self.state,
            ProblemState::Degrading | ProblemState::AwaitingTreatment
        )
    }

    /// Whether this problem is recovering and only heals in a medical bed.
    pub fn needs_bed_rest(&self) -> bool {
        self.state == ProblemState::Recovering && self.complaint.descriptor().requires_bed_rest
    }

    /// Mark the problem as queued for treatment.
    pub fn await_treatment(&mut self) {
        self.state = ProblemState::AwaitingTreatment;
    }

    /// A doctor has started work; record the expected duration.
    pub fn start_treatment(&mut self, duration: f64) {
        self.state = ProblemState::BeingTreated;
        self.treatment_remaining = duration;
    }

    /// Treatment was interrupted before completion.
    pub fn stop_treatment(&mut self) {
        if self.state == ProblemState::BeingTreated {
            self.state = ProblemState::AwaitingTreatment;
            self.treatment_remaining = 0.0;
        }
    }

    /// Treatment completed; begin recovery.
    pub fn start_recovery(&mut self) {
        self.state = ProblemState::Recovering;
        self.treatment_remaining = 0.0;
    }

    pub fn resolve(&mut self) {
        self.state = ProblemState::Resolved;
    }

    /// Apply bed rest toward recovery. Returns true if the problem resolved.
    pub fn add_bed_rest(&mut self, delta: f64) -> bool {
        if !self.needs_bed_rest() {
            return false;
        }
        self.bed_rest_time += delta;
        if self.bed_rest_time >= self.complaint.descriptor().recovery_period {
            self.resolve();
            true
        } else {
            false
        }
    }

    /// Advance degradation and unassisted recovery clocks.
    pub fn time_passing(&mut self, delta: f64) -> ProblemChange {
        let descriptor = self.complaint.descriptor();
        match self.state {
            ProblemState::Degrading if descriptor.degrade_period > 0.0 => {
                self.time_degrading += delta;
                if self.time_degrading >= descriptor.degrade_period {
                    match descriptor.next_phase {
                        Some(next) => ProblemChange::Worsened(next),
                        None => ProblemChange::Fatal,
                    }
                } else {
                    ProblemChange::None
                }
            }
            // Complaints without a procedure (and treated ones that do not
            // need a bed) heal with time.
            ProblemState::Recovering if !descriptor.requires_bed_rest => {
                self.time_recovering += delta;
                if self.time_recovering >= descriptor.recovery_period {
                    self.resolve();
                    ProblemChange::Recovered
                } else {
                    ProblemChange::None
                }
            }
            ProblemState::Degrading if descriptor.treatment.is_none() => {
                // No procedure exists: the problem rides out on its own clock.
                self.time_recovering += delta;
                if self.time_recovering >= descriptor.recovery_period {
                    self.resolve();
                    ProblemChange::Recovered
                } else {
                    ProblemChange::None
                }
            }
            _ => ProblemChange::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_problem_degrading() {
        let p = HealthProblem::new(ComplaintType::Laceration);
        assert_eq!(p.state, ProblemState::Degrading);
        assert!(p.needs_treatment());
    }

    #[test]
    fn test_treatment_lifecycle() {
        let mut p = HealthProblem::new(ComplaintType::BrokenBone);
        p.await_treatment();
        assert_eq!(p.state, ProblemState::AwaitingTreatment);
        p.start_treatment(80.0);
        assert_eq!(p.state, ProblemState::BeingTreated);
        assert!((p.treatment_remaining - 80.0).abs() < f64::EPSILON);
        p.start_recovery();
        assert_eq!(p.state, ProblemState::Recovering);
        assert!(p.needs_bed_rest());
    }

    #[test]
    fn test_stop_treatment_returns_to_queue_state() {
        let mut p = HealthProblem::new(ComplaintType::BrokenBone);
        p.await_treatment();
        p.start_treatment(80.0);
        p.stop_treatment();
        assert_eq!(p.state, ProblemState::AwaitingTreatment);
    }

    #[test]
    fn test_bed_rest_resolves_at_recovery_period() {
        let mut p = HealthProblem::new(ComplaintType::BrokenBone);
        p.start_recovery();
        assert!(!p.add_bed_rest(700.0));
        assert!(p.add_bed_rest(100.0)); // 800 total
        assert!(p.is_resolved());
    }

    #[test]
    fn test_bed_rest_ignored_when_not_recovering() {
        let mut p = HealthProblem::new(ComplaintType::BrokenBone);
        assert!(!p.add_bed_rest(10_000.0));
        assert_eq!(p.state, ProblemState::Degrading);
    }

    #[test]
    fn test_degradation_worsens() {
        let mut p = HealthProblem::new(ComplaintType::Appendicitis);
        assert_eq!(p.time_passing(1000.0), ProblemChange::None);
        assert_eq!(
            p.time_passing(500.0),
            ProblemChange::Worsened(ComplaintType::RupturedAppendix)
        );
    }

    #[test]
    fn test_terminal_degradation_fatal() {
        let mut p = HealthProblem::new(ComplaintType::RupturedAppendix);
        assert_eq!(p.time_passing(800.0), ProblemChange::Fatal);
    }

    #[test]
    fn test_untreatable_complaint_self_recovers() {
        let mut p = HealthProblem::new(ComplaintType::PanicAttack);
        assert_eq!(p.time_passing(150.0), ProblemChange::None);
        assert_eq!(p.time_passing(100.0), ProblemChange::Recovered);
        assert!(p.is_resolved());
    }

    #[test]
    fn test_bed_rest_complaint_does_not_self_recover() {
        let mut p = HealthProblem::new(ComplaintType::FoodPoisoning);
        p.start_recovery();
        assert_eq!(p.time_passing(10_000.0), ProblemChange::None);
        assert!(!p.is_resolved());
    }
}
