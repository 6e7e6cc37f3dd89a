//! Settlement population and station generation.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    Location, Name, NaturalAttributes, Person, PhysicalCondition, Robot, Skills, SkillType,
};
use crate::medical::{ComplaintType, MedicalManager, MedicalStation, StationId, StationKind};

/// Settlement generation parameters.
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub doctors: usize,
    pub patients: usize,
    pub medical_robots: usize,
    pub stations: usize,
    pub beds_per_station: usize,
    pub facility_level: u32,
    /// Chance that a generated patient starts with an affliction.
    pub affliction_chance: f64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            doctors: 2,
            patients: 6,
            medical_robots: 1,
            stations: 1,
            beds_per_station: 3,
            facility_level: 3,
            affliction_chance: 0.5,
        }
    }
}

/// Entities created by generation, for callers that need direct handles.
#[derive(Debug, Default)]
pub struct GeneratedSettlement {
    pub doctors: Vec<Entity>,
    pub patients: Vec<Entity>,
    pub robots: Vec<Entity>,
    pub stations: Vec<StationId>,
}

const FIRST_NAMES: [&str; 12] = [
    "Asha", "Bruno", "Chen", "Daria", "Elias", "Farah", "Goro", "Hana", "Imran", "Jun", "Katya",
    "Lars",
];

fn pick_name(rng: &mut impl Rng, index: usize) -> Name {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    Name(format!("{} {}", first, index))
}

/// Afflictions generation hands out to starting patients. Deliberately the
/// treatable subset; degradation chains come into play on their own.
const STARTER_COMPLAINTS: [ComplaintType; 5] = [
    ComplaintType::MinorBurns,
    ComplaintType::Laceration,
    ComplaintType::FoodPoisoning,
    ComplaintType::BrokenBone,
    ComplaintType::Appendicitis,
];

/// Populate a settlement: stations first, then staff and residents.
pub fn generate_settlement(
    world: &mut World,
    medical: &mut MedicalManager,
    config: &SettlementConfig,
    rng: &mut impl Rng,
) -> GeneratedSettlement {
    let mut generated = GeneratedSettlement::default();

    for i in 0..config.stations {
        let station = MedicalStation::new(
            StationKind::Building {
                building_id: i as u32,
            },
            config.facility_level,
            config.beds_per_station,
        );
        generated.stations.push(medical.add_station(station));
    }

    for i in 0..config.doctors {
        let entity = world.spawn((
            Person,
            pick_name(rng, i),
            Location::Settlement,
            Skills::random(rng, Some(SkillType::Medicine)),
            NaturalAttributes::random(rng),
            PhysicalCondition::default(),
        ));
        generated.doctors.push(entity);
    }

    for i in 0..config.patients {
        let mut condition = PhysicalCondition::default();
        if rng.gen_bool(config.affliction_chance.clamp(0.0, 1.0)) {
            let complaint = STARTER_COMPLAINTS[rng.gen_range(0..STARTER_COMPLAINTS.len())];
            condition.add_problem(complaint);
        }
        let entity = world.spawn((
            Person,
            pick_name(rng, config.doctors + i),
            Location::Settlement,
            Skills::random(rng, None),
            NaturalAttributes::random(rng),
            condition,
        ));
        generated.patients.push(entity);
    }

    for i in 0..config.medical_robots {
        let entity = world.spawn((
            Robot,
            Name(format!("Medibot {}", i)),
            Location::Settlement,
            Skills::random(rng, Some(SkillType::Medicine)),
        ));
        generated.robots.push(entity);
    }

    generated
}
