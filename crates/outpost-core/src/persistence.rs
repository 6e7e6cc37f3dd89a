//! Save/Load functionality for persisting settlement state.
//!
//! Uses bincode for binary serialization. Components are extracted
//! individually and rebuilt on load; cross-entity references (queue entries,
//! death records) are stored as indices into the serialized entity list so
//! they survive the fresh entity ids a rebuilt world hands out. Live tasks
//! are deliberately not persisted: they are transient, and the scheduler
//! re-selects work on the first tick after load.

use std::collections::HashMap;
use std::io::{Read, Write};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::{
    Location, Name, NaturalAttributes, Person, PhysicalCondition, Robot, Skills,
};
use crate::engine::SettlementEngine;
use crate::medical::{
    ComplaintType, DeathInfo, MedicalManager, MedicalStation, ProblemRef, StationKind,
};

/// Version number for the save format (increment when the format changes).
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the settlement state.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Simulation time in millisols.
    pub sim_time: f64,
    pub entities: Vec<SerializableEntity>,
    pub stations: Vec<SerializableStation>,
    pub deaths: Vec<SerializableDeath>,
}

/// All possible components for an entity, serialized as optionals.
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    pub person: Option<Person>,
    pub robot: Option<Robot>,
    pub name: Option<Name>,
    pub location: Option<Location>,
    pub skills: Option<Skills>,
    pub attributes: Option<NaturalAttributes>,
    pub condition: Option<PhysicalCondition>,
}

/// A station with queue entries flattened to entity indices.
#[derive(Serialize, Deserialize)]
pub struct SerializableStation {
    pub kind: StationKind,
    pub facility_level: u32,
    pub sick_beds: usize,
    pub malfunction: bool,
    pub awaiting: Vec<(usize, ComplaintType)>,
    pub treating: Vec<(usize, ComplaintType)>,
    pub resting: Vec<usize>,
}

/// A death record with doctors flattened to entity indices.
#[derive(Serialize, Deserialize)]
pub struct SerializableDeath {
    pub person: usize,
    pub time_of_death: f64,
    pub complaint: ComplaintType,
    pub cause: String,
    pub estimated_exam_time: Option<f64>,
    pub exam_time_spent: f64,
    pub exam_done: bool,
    pub retrieval_doctor: Option<usize>,
    pub certificate_doctor: Option<usize>,
}

/// Errors that can occur during save/load.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    /// A queue or death record referenced an entity missing from the save.
    DanglingReference,
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            SaveError::DanglingReference => write!(f, "Save references a missing entity"),
        }
    }
}

impl std::error::Error for SaveError {}

/// Extract all entities from a world into serializable form, returning the
/// entity-to-index map used to flatten references.
fn serialize_entities(world: &World) -> (Vec<SerializableEntity>, HashMap<Entity, usize>) {
    let mut entities = Vec::new();
    let mut index_of = HashMap::new();

    for entity_ref in world.iter() {
        let entity = entity_ref.entity();
        let mut se = SerializableEntity::default();
        if let Some(c) = entity_ref.get::<&Person>() {
            se.person = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Robot>() {
            se.robot = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Name>() {
            se.name = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Location>() {
            se.location = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Skills>() {
            se.skills = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&NaturalAttributes>() {
            se.attributes = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PhysicalCondition>() {
            se.condition = Some((*c).clone());
        }
        index_of.insert(entity, entities.len());
        entities.push(se);
    }

    (entities, index_of)
}

/// Spawn an entity with all its components.
fn spawn_entity(world: &mut World, se: SerializableEntity) -> Entity {
    let entity = world.spawn(());
    if let Some(c) = se.person {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.robot {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.name {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.location {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.skills {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.attributes {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.condition {
        let _ = world.insert_one(entity, c);
    }
    entity
}

fn serialize_stations(
    medical: &MedicalManager,
    index_of: &HashMap<Entity, usize>,
) -> Result<Vec<SerializableStation>, SaveError> {
    let lookup = |e: Entity| index_of.get(&e).copied().ok_or(SaveError::DanglingReference);
    let mut out = Vec::new();
    for (_, station) in medical.stations() {
        let mut awaiting = Vec::new();
        for p in station.awaiting() {
            awaiting.push((lookup(p.person)?, p.complaint));
        }
        let mut treating = Vec::new();
        for p in station.treating() {
            treating.push((lookup(p.person)?, p.complaint));
        }
        let mut resting = Vec::new();
        for &person in station.resting() {
            resting.push(lookup(person)?);
        }
        out.push(SerializableStation {
            kind: station.kind,
            facility_level: station.facility_level,
            sick_beds: station.sick_beds(),
            malfunction: station.has_malfunction(),
            awaiting,
            treating,
            resting,
        });
    }
    Ok(out)
}

fn serialize_deaths(
    medical: &MedicalManager,
    index_of: &HashMap<Entity, usize>,
) -> Result<Vec<SerializableDeath>, SaveError> {
    let lookup = |e: Entity| index_of.get(&e).copied().ok_or(SaveError::DanglingReference);
    let mut out = Vec::new();
    for (_, death) in medical.deaths() {
        out.push(SerializableDeath {
            person: lookup(death.person)?,
            time_of_death: death.time_of_death,
            complaint: death.complaint,
            cause: death.cause.clone(),
            estimated_exam_time: death.estimated_exam_time,
            exam_time_spent: death.exam_time_spent,
            exam_done: death.exam_done,
            retrieval_doctor: death.retrieval_doctor().map(&lookup).transpose()?,
            certificate_doctor: death.certificate_doctor().map(&lookup).transpose()?,
        });
    }
    Ok(out)
}

/// Save the settlement to a writer.
pub fn save_settlement<W: Write>(writer: W, engine: &SettlementEngine) -> Result<(), SaveError> {
    let (entities, index_of) = serialize_entities(&engine.world);
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time: engine.sim_time(),
        stations: serialize_stations(&engine.medical, &index_of)?,
        deaths: serialize_deaths(&engine.medical, &index_of)?,
        entities,
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a settlement from a reader into a fresh engine seeded with `seed`.
pub fn load_settlement<R: Read>(reader: R, seed: u64) -> Result<SettlementEngine, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;
    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut engine = SettlementEngine::new(seed);
    let mut spawned = Vec::with_capacity(save_data.entities.len());
    for se in save_data.entities {
        spawned.push(spawn_entity(&mut engine.world, se));
    }
    let entity_at = |index: usize| -> Result<Entity, SaveError> {
        spawned.get(index).copied().ok_or(SaveError::DanglingReference)
    };

    for ss in save_data.stations {
        let mut station = MedicalStation::new(ss.kind, ss.facility_level, ss.sick_beds);
        station.set_malfunction(ss.malfunction);
        for (index, complaint) in ss.awaiting {
            station.request_treatment(ProblemRef {
                person: entity_at(index)?,
                complaint,
            });
        }
        for (index, complaint) in ss.treating {
            station.start_treatment(ProblemRef {
                person: entity_at(index)?,
                complaint,
            });
        }
        for index in ss.resting {
            station.start_resting(entity_at(index)?);
        }
        engine.medical.add_station(station);
    }

    for sd in save_data.deaths {
        let mut death = DeathInfo::new(entity_at(sd.person)?, sd.time_of_death, sd.complaint);
        death.cause = sd.cause;
        death.exam_time_spent = sd.exam_time_spent;
        death.exam_done = sd.exam_done;
        if let Some(estimate) = sd.estimated_exam_time {
            death.set_estimated_exam_time(estimate);
        }
        if let Some(index) = sd.retrieval_doctor {
            death.claim_retrieval(entity_at(index)?);
        }
        if let Some(index) = sd.certificate_doctor {
            death.claim_certificate(entity_at(index)?);
        }
        engine.medical.record_death(death);
    }

    engine.set_sim_time(save_data.sim_time);
    Ok(engine)
}
