//! Registry of medical stations and death records for one settlement.
//!
//! Passed explicitly into scheduling and task contexts — there is no global
//! instance.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::complaint::ComplaintType;
use super::death::DeathInfo;
use super::station::{MedicalStation, ProblemRef};

/// Index of a station in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationId(pub usize);

/// Index of a death record in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeathId(pub usize);

/// All shared medical state for a settlement.
#[derive(Debug, Default)]
pub struct MedicalManager {
    stations: Vec<MedicalStation>,
    deaths: Vec<DeathInfo>,
}

impl MedicalManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_station(&mut self, station: MedicalStation) -> StationId {
        self.stations.push(station);
        StationId(self.stations.len() - 1)
    }

    pub fn station(&self, id: StationId) -> &MedicalStation {
        &self.stations[id.0]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut MedicalStation {
        &mut self.stations[id.0]
    }

    pub fn stations(&self) -> impl Iterator<Item = (StationId, &MedicalStation)> {
        self.stations
            .iter()
            .enumerate()
            .map(|(i, s)| (StationId(i), s))
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// First station whose capability covers the complaint. Capacity is the
    /// caller's concern.
    pub fn station_for(&self, complaint: ComplaintType) -> Option<StationId> {
        self.stations()
            .find(|(_, s)| s.can_treat(complaint))
            .map(|(id, _)| id)
    }

    /// First station that can treat the complaint and has a free bed.
    pub fn station_with_bed_for(&self, complaint: ComplaintType) -> Option<StationId> {
        self.stations()
            .find(|(_, s)| s.can_treat(complaint) && s.patient_num() < s.sick_beds())
            .map(|(id, _)| id)
    }

    /// The station currently treating any of this person's problems.
    pub fn station_treating(&self, person: Entity) -> Option<StationId> {
        self.stations()
            .find(|(_, s)| s.treating().iter().any(|p| p.person == person))
            .map(|(id, _)| id)
    }

    /// Whether a specific problem is anywhere in a treatment queue.
    pub fn is_problem_queued(&self, problem: ProblemRef) -> bool {
        self.stations.iter().any(|s| s.is_queued(problem))
    }

    /// Drop a person from every queue of every station.
    pub fn purge_person(&mut self, person: Entity) {
        for station in &mut self.stations {
            station.purge_person(person);
        }
    }

    pub fn record_death(&mut self, death: DeathInfo) -> DeathId {
        log::info!("death recorded at {:.1} millisols", death.time_of_death);
        self.deaths.push(death);
        DeathId(self.deaths.len() - 1)
    }

    pub fn death(&self, id: DeathId) -> &DeathInfo {
        &self.deaths[id.0]
    }

    pub fn death_mut(&mut self, id: DeathId) -> &mut DeathInfo {
        &mut self.deaths[id.0]
    }

    pub fn deaths(&self) -> impl Iterator<Item = (DeathId, &DeathInfo)> {
        self.deaths
            .iter()
            .enumerate()
            .map(|(i, d)| (DeathId(i), d))
    }

    /// Death records whose postmortem exam has not finished.
    pub fn pending_exams(&self) -> Vec<DeathId> {
        self.deaths()
            .filter(|(_, d)| !d.exam_done)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medical::station::StationKind;

    fn manager_with_stations() -> MedicalManager {
        let mut m = MedicalManager::new();
        m.add_station(MedicalStation::new(
            StationKind::Building { building_id: 1 },
            1,
            1,
        ));
        m.add_station(MedicalStation::new(
            StationKind::Building { building_id: 2 },
            3,
            2,
        ));
        m
    }

    #[test]
    fn test_station_for_picks_capable() {
        let m = manager_with_stations();
        // Appendectomy needs level 3 — only the second station qualifies
        assert_eq!(
            m.station_for(ComplaintType::Appendicitis),
            Some(StationId(1))
        );
        // Suturing fits the first
        assert_eq!(m.station_for(ComplaintType::Laceration), Some(StationId(0)));
    }

    #[test]
    fn test_station_with_bed_skips_full() {
        let mut world = hecs::World::new();
        let mut m = manager_with_stations();
        let occupant = world.spawn(());
        assert!(m.station_mut(StationId(0)).try_claim_bed(occupant));
        // Level-1 station is now full; fall through to the level-3 one
        assert_eq!(
            m.station_with_bed_for(ComplaintType::Laceration),
            Some(StationId(1))
        );
    }

    #[test]
    fn test_pending_exams_excludes_done() {
        let mut world = hecs::World::new();
        let mut m = MedicalManager::new();
        let p1 = world.spawn(());
        let p2 = world.spawn(());
        let d1 = m.record_death(DeathInfo::new(p1, 10.0, ComplaintType::RupturedAppendix));
        m.record_death(DeathInfo::new(p2, 20.0, ComplaintType::RupturedAppendix));
        m.death_mut(d1).exam_done = true;
        let pending = m.pending_exams();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0], DeathId(1));
    }
}
