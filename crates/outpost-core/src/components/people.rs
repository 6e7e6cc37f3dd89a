//! Worker components: Person, Robot, Skills, NaturalAttributes, PhysicalCondition.

use serde::{Deserialize, Serialize};

use outpost_logic::condition::performance_factor;
use outpost_logic::constants::{rates, thresholds};

use crate::medical::{ComplaintType, HealthProblem, Medication, MedicationKind, ProblemChange};

/// Marker component identifying an entity as a person.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Person;

/// Marker component identifying an entity as a robot worker. Robots take
/// tasks but have no physical condition and never become patients.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Robot;

/// Display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name(pub String);

/// Where a worker currently is, at the granularity the medical engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// Inside a settlement building.
    Settlement,
    /// Aboard a vehicle.
    Vehicle,
    /// Out on the surface.
    Outside,
}

/// Skill categories used by the behavior engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillType {
    Medicine,
    Engineering,
    Science,
}

/// Integer skill levels. Level 0 means untrained, not ineligible.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Skills {
    pub medicine: u32,
    pub engineering: u32,
    pub science: u32,
}

impl Skills {
    pub fn level(&self, skill: SkillType) -> u32 {
        match skill {
            SkillType::Medicine => self.medicine,
            SkillType::Engineering => self.engineering,
            SkillType::Science => self.science,
        }
    }

    /// Generate random skills, optionally biased toward a specialty.
    pub fn random(rng: &mut impl rand::Rng, specialty: Option<SkillType>) -> Self {
        let mut skills = Self {
            medicine: rng.gen_range(0..3),
            engineering: rng.gen_range(0..3),
            science: rng.gen_range(0..3),
        };
        if let Some(spec) = specialty {
            let boosted = rng.gen_range(3..=5);
            match spec {
                SkillType::Medicine => skills.medicine = boosted,
                SkillType::Engineering => skills.engineering = boosted,
                SkillType::Science => skills.science = boosted,
            }
        }
        skills
    }
}

/// Natural attributes on a 0–100 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NaturalAttributes {
    pub emotional_stability: u32,
    pub stress_resilience: u32,
}

impl Default for NaturalAttributes {
    fn default() -> Self {
        Self {
            emotional_stability: 50,
            stress_resilience: 50,
        }
    }
}

impl NaturalAttributes {
    pub fn random(rng: &mut impl rand::Rng) -> Self {
        Self {
            emotional_stability: rng.gen_range(20..=80),
            stress_resilience: rng.gen_range(20..=80),
        }
    }
}

/// What one condition tick did to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionChange {
    None,
    /// The person died of the given complaint this tick.
    Died(ComplaintType),
}

/// Mutable health state of a person: load levels, afflictions, medications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalCondition {
    /// 0–100.
    pub stress: f64,
    /// Millisols of accumulated wakefulness.
    pub fatigue: f64,
    /// Millisols since the last meal.
    pub hunger: f64,
    pub alive: bool,
    pub problems: Vec<HealthProblem>,
    pub medications: Vec<Medication>,
}

impl Default for PhysicalCondition {
    fn default() -> Self {
        Self {
            stress: 0.0,
            fatigue: 0.0,
            hunger: 0.0,
            alive: true,
            problems: Vec::new(),
            medications: Vec::new(),
        }
    }
}

impl PhysicalCondition {
    pub fn problem(&self, complaint: ComplaintType) -> Option<&HealthProblem> {
        self.problems.iter().find(|p| p.complaint == complaint)
    }

    pub fn problem_mut(&mut self, complaint: ComplaintType) -> Option<&mut HealthProblem> {
        self.problems.iter_mut().find(|p| p.complaint == complaint)
    }

    /// Add a new affliction. A complaint the person already has is left
    /// untouched; one problem per complaint per person.
    pub fn add_problem(&mut self, complaint: ComplaintType) {
        if self.problem(complaint).is_none() {
            self.problems.push(HealthProblem::new(complaint));
        }
    }

    /// Unresolved problems.
    pub fn active_problems(&self) -> impl Iterator<Item = &HealthProblem> {
        self.problems.iter().filter(|p| !p.is_resolved())
    }

    pub fn has_medication(&self, kind: MedicationKind) -> bool {
        self.medications.iter().any(|m| m.kind == kind)
    }

    pub fn add_medication(&mut self, medication: Medication) {
        self.medications.push(medication);
    }

    pub fn is_stressed_out(&self) -> bool {
        self.stress >= thresholds::STRESSED_OUT
    }

    pub fn is_radiation_sick(&self) -> bool {
        self.problem(ComplaintType::RadiationSickness)
            .map_or(false, |p| !p.is_resolved())
    }

    /// Which medication, if any, this person currently needs.
    pub fn needed_medication(&self) -> Option<MedicationKind> {
        if self.is_stressed_out() && !self.has_medication(MedicationKind::Anxiety) {
            Some(MedicationKind::Anxiety)
        } else if self.is_radiation_sick() && !self.has_medication(MedicationKind::Radioprotective)
        {
            Some(MedicationKind::Radioprotective)
        } else {
            None
        }
    }

    /// Overall performance rating in `[0.1, 1.0]`.
    pub fn performance(&self) -> f64 {
        performance_factor(self.stress, self.fatigue, self.hunger)
    }

    pub fn reduce_fatigue(&mut self, amount: f64) {
        self.fatigue = (self.fatigue - amount).max(0.0);
    }

    /// Advance load levels, medications, and problem clocks by one tick.
    pub fn time_passing(&mut self, delta: f64) -> ConditionChange {
        if !self.alive {
            return ConditionChange::None;
        }
        self.hunger += rates::HUNGER_GAIN * delta;
        self.fatigue += rates::FATIGUE_GAIN * delta;
        self.medications.retain_mut(|m| m.time_passing(delta));

        let mut worsened = Vec::new();
        let mut fatal = None;
        for problem in &mut self.problems {
            match problem.time_passing(delta) {
                ProblemChange::Worsened(next) => {
                    problem.resolve();
                    worsened.push(next);
                }
                ProblemChange::Fatal => {
                    fatal = Some(problem.complaint);
                }
                ProblemChange::None | ProblemChange::Recovered => {}
            }
        }
        for next in worsened {
            self.add_problem(next);
        }
        self.problems.retain(|p| !p.is_resolved());

        if let Some(complaint) = fatal {
            self.alive = false;
            return ConditionChange::Died(complaint);
        }
        ConditionChange::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_accumulates_load() {
        let mut c = PhysicalCondition::default();
        c.time_passing(100.0);
        assert!((c.hunger - 100.0).abs() < f64::EPSILON);
        assert!((c.fatigue - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_problem_per_complaint() {
        let mut c = PhysicalCondition::default();
        c.add_problem(ComplaintType::Laceration);
        c.add_problem(ComplaintType::Laceration);
        assert_eq!(c.problems.len(), 1);
    }

    #[test]
    fn test_degradation_replaces_complaint() {
        let mut c = PhysicalCondition::default();
        c.add_problem(ComplaintType::Appendicitis);
        assert_eq!(c.time_passing(1500.0), ConditionChange::None);
        assert!(c.problem(ComplaintType::Appendicitis).is_none());
        assert!(c.problem(ComplaintType::RupturedAppendix).is_some());
    }

    #[test]
    fn test_terminal_degradation_kills() {
        let mut c = PhysicalCondition::default();
        c.add_problem(ComplaintType::RupturedAppendix);
        match c.time_passing(800.0) {
            ConditionChange::Died(complaint) => {
                assert_eq!(complaint, ComplaintType::RupturedAppendix)
            }
            other => panic!("expected death, got {:?}", other),
        }
        assert!(!c.alive);
    }

    #[test]
    fn test_medication_expiry() {
        let mut c = PhysicalCondition::default();
        c.add_medication(Medication::new(MedicationKind::Anxiety));
        assert!(c.has_medication(MedicationKind::Anxiety));
        c.time_passing(2000.0);
        assert!(!c.has_medication(MedicationKind::Anxiety));
    }

    #[test]
    fn test_needed_medication_priority() {
        let mut c = PhysicalCondition::default();
        assert_eq!(c.needed_medication(), None);
        c.stress = 80.0;
        assert_eq!(c.needed_medication(), Some(MedicationKind::Anxiety));
        c.add_medication(Medication::new(MedicationKind::Anxiety));
        assert_eq!(c.needed_medication(), None);
        c.add_problem(ComplaintType::RadiationSickness);
        assert_eq!(c.needed_medication(), Some(MedicationKind::Radioprotective));
    }

    #[test]
    fn test_reduce_fatigue_floor() {
        let mut c = PhysicalCondition::default();
        c.fatigue = 100.0;
        c.reduce_fatigue(900.0);
        assert!((c.fatigue - 0.0).abs() < f64::EPSILON);
    }
}
