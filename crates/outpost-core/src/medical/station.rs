//! A capacity-bounded medical station — building sick bay or vehicle sick bay.
//!
//! The three queues are deliberately separate collections rather than one set
//! with a status field: each task only ever membership-tests one or two of
//! them, and the split keeps "waiting vs. treated vs. resting" structurally
//! disjoint. Queue mutation is check-then-act; callers are responsible for
//! membership tests before enqueueing.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::complaint::ComplaintType;

/// Identifies one health problem across the settlement: the sufferer plus
/// which complaint. A person has at most one problem per complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProblemRef {
    pub person: Entity,
    pub complaint: ComplaintType,
}

/// Where a station physically lives, and what a worker walks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    /// Medical care function inside a settlement building.
    Building { building_id: u32 },
    /// Sick bay aboard a vehicle.
    Vehicle { vehicle_id: u32 },
}

/// One medical station: beds, capability level, and the three problem queues.
#[derive(Debug, Clone)]
pub struct MedicalStation {
    pub kind: StationKind,
    /// Highest treatment facility level this station supports.
    pub facility_level: u32,
    sick_beds: usize,
    malfunction_active: bool,
    awaiting: Vec<ProblemRef>,
    treating: Vec<ProblemRef>,
    resting: Vec<Entity>,
}

impl MedicalStation {
    pub fn new(kind: StationKind, facility_level: u32, sick_beds: usize) -> Self {
        Self {
            kind,
            facility_level,
            sick_beds,
            malfunction_active: false,
            awaiting: Vec::new(),
            treating: Vec::new(),
            resting: Vec::new(),
        }
    }

    /// Bed capacity.
    pub fn sick_beds(&self) -> usize {
        self.sick_beds
    }

    /// Current bed occupancy: patients under treatment plus people resting.
    pub fn patient_num(&self) -> usize {
        self.treating.len() + self.resting.len()
    }

    /// Whether this station's capability set covers the complaint's required
    /// treatment. Bed capacity is evaluated separately by callers.
    pub fn can_treat(&self, complaint: ComplaintType) -> bool {
        complaint
            .descriptor()
            .treatment
            .map_or(false, |t| t.facility_level <= self.facility_level)
    }

    pub fn has_malfunction(&self) -> bool {
        self.malfunction_active
    }

    pub fn set_malfunction(&mut self, active: bool) {
        self.malfunction_active = active;
    }

    /// Whether a problem sits in any of this station's queues.
    pub fn is_queued(&self, problem: ProblemRef) -> bool {
        self.awaiting.contains(&problem) || self.treating.contains(&problem)
    }

    pub fn awaiting(&self) -> &[ProblemRef] {
        &self.awaiting
    }

    pub fn treating(&self) -> &[ProblemRef] {
        &self.treating
    }

    pub fn resting(&self) -> &[Entity] {
        &self.resting
    }

    /// Queue a problem for treatment. Callers must check [`is_queued`]
    /// first; the queues stay disjoint by that contract, not by an
    /// internal guard.
    ///
    /// [`is_queued`]: Self::is_queued
    pub fn request_treatment(&mut self, problem: ProblemRef) {
        debug_assert!(!self.is_queued(problem));
        self.awaiting.push(problem);
    }

    /// Move a problem from the waiting queue to active treatment.
    pub fn start_treatment(&mut self, problem: ProblemRef) {
        self.awaiting.retain(|p| *p != problem);
        if !self.treating.contains(&problem) {
            self.treating.push(problem);
        }
    }

    /// Remove a problem from active treatment. Idempotent.
    pub fn stop_treatment(&mut self, problem: ProblemRef) {
        self.treating.retain(|p| *p != problem);
    }

    /// Remove a problem from the waiting queue. Idempotent.
    pub fn withdraw_request(&mut self, problem: ProblemRef) {
        self.awaiting.retain(|p| *p != problem);
    }

    /// Add a person to the resting set. Callers membership-test first.
    pub fn start_resting(&mut self, person: Entity) {
        if !self.resting.contains(&person) {
            self.resting.push(person);
        }
    }

    /// Remove a person from the resting set. Idempotent.
    pub fn stop_resting(&mut self, person: Entity) {
        self.resting.retain(|p| *p != person);
    }

    pub fn is_resting(&self, person: Entity) -> bool {
        self.resting.contains(&person)
    }

    /// Claim a bed for a person (patient or body). Succeeds if the person
    /// already holds one, fails when the station is full.
    pub fn try_claim_bed(&mut self, person: Entity) -> bool {
        if self.resting.contains(&person) {
            return true;
        }
        if self.patient_num() >= self.sick_beds {
            return false;
        }
        self.resting.push(person);
        true
    }

    /// Drop every queue entry belonging to a person. Used when the person
    /// dies or leaves the settlement.
    pub fn purge_person(&mut self, person: Entity) {
        self.awaiting.retain(|p| p.person != person);
        self.treating.retain(|p| p.person != person);
        self.resting.retain(|p| *p != person);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> MedicalStation {
        MedicalStation::new(StationKind::Building { building_id: 1 }, 3, 2)
    }

    fn problem(world: &mut hecs::World, complaint: ComplaintType) -> ProblemRef {
        ProblemRef {
            person: world.spawn(()),
            complaint,
        }
    }

    #[test]
    fn test_can_treat_by_facility_level() {
        let s = station();
        assert!(s.can_treat(ComplaintType::Laceration)); // level 1
        assert!(s.can_treat(ComplaintType::Appendicitis)); // level 3
        let clinic = MedicalStation::new(StationKind::Vehicle { vehicle_id: 7 }, 1, 1);
        assert!(!clinic.can_treat(ComplaintType::Appendicitis));
    }

    #[test]
    fn test_cannot_treat_complaint_without_procedure() {
        let s = station();
        assert!(!s.can_treat(ComplaintType::PanicAttack));
    }

    #[test]
    fn test_request_then_start_moves_queues() {
        let mut world = hecs::World::new();
        let mut s = station();
        let p = problem(&mut world, ComplaintType::BrokenBone);
        s.request_treatment(p);
        assert!(s.awaiting().contains(&p));
        s.start_treatment(p);
        assert!(!s.awaiting().contains(&p));
        assert!(s.treating().contains(&p));
        assert_eq!(s.patient_num(), 1);
    }

    #[test]
    fn test_stop_treatment_idempotent() {
        let mut world = hecs::World::new();
        let mut s = station();
        let p = problem(&mut world, ComplaintType::BrokenBone);
        s.start_treatment(p);
        s.stop_treatment(p);
        s.stop_treatment(p);
        assert_eq!(s.patient_num(), 0);
    }

    #[test]
    fn test_bed_claim_respects_capacity() {
        let mut world = hecs::World::new();
        let mut s = station();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());
        assert!(s.try_claim_bed(a));
        assert!(s.try_claim_bed(b));
        assert!(!s.try_claim_bed(c)); // 2 beds
        assert!(s.try_claim_bed(a)); // already holds one
        assert_eq!(s.patient_num(), 2);
    }

    #[test]
    fn test_treatment_counts_against_beds() {
        let mut world = hecs::World::new();
        let mut s = station();
        let p = problem(&mut world, ComplaintType::BrokenBone);
        s.start_treatment(p);
        let rester = world.spawn(());
        assert!(s.try_claim_bed(rester));
        let third = world.spawn(());
        assert!(!s.try_claim_bed(third));
    }

    #[test]
    fn test_purge_person_clears_all_queues() {
        let mut world = hecs::World::new();
        let mut s = station();
        let person = world.spawn(());
        s.request_treatment(ProblemRef {
            person,
            complaint: ComplaintType::Laceration,
        });
        s.start_treatment(ProblemRef {
            person,
            complaint: ComplaintType::BrokenBone,
        });
        s.start_resting(person);
        s.purge_person(person);
        assert_eq!(s.patient_num(), 0);
        assert!(s.awaiting().is_empty());
    }
}
