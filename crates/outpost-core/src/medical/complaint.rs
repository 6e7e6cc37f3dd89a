//! Static medical knowledge: complaints, their treatments, and medications.

use serde::{Deserialize, Serialize};

/// Every affliction the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintType {
    MinorBurns,
    Laceration,
    FoodPoisoning,
    PanicAttack,
    BrokenBone,
    Appendicitis,
    RupturedAppendix,
    RadiationSickness,
}

impl ComplaintType {
    /// All complaint types, in seriousness order.
    pub const ALL: [ComplaintType; 8] = [
        ComplaintType::MinorBurns,
        ComplaintType::Laceration,
        ComplaintType::FoodPoisoning,
        ComplaintType::PanicAttack,
        ComplaintType::BrokenBone,
        ComplaintType::RadiationSickness,
        ComplaintType::Appendicitis,
        ComplaintType::RupturedAppendix,
    ];

    /// The static descriptor for this complaint.
    pub fn descriptor(self) -> Complaint {
        match self {
            ComplaintType::MinorBurns => Complaint {
                kind: self,
                name: "Minor Burns",
                seriousness: 10,
                degrade_period: 0.0,
                next_phase: None,
                recovery_period: 200.0,
                requires_bed_rest: false,
                treatment: Some(Treatment {
                    name: "Dressing Change",
                    required_skill: 1,
                    self_admin: true,
                    duration: 30.0,
                    facility_level: 1,
                }),
            },
            ComplaintType::Laceration => Complaint {
                kind: self,
                name: "Laceration",
                seriousness: 15,
                degrade_period: 0.0,
                next_phase: None,
                recovery_period: 300.0,
                requires_bed_rest: false,
                treatment: Some(Treatment {
                    name: "Suturing",
                    required_skill: 1,
                    self_admin: true,
                    duration: 40.0,
                    facility_level: 1,
                }),
            },
            ComplaintType::FoodPoisoning => Complaint {
                kind: self,
                name: "Food Poisoning",
                seriousness: 20,
                degrade_period: 0.0,
                next_phase: None,
                recovery_period: 400.0,
                requires_bed_rest: true,
                treatment: Some(Treatment {
                    name: "Stomach Pumping",
                    required_skill: 1,
                    self_admin: true,
                    duration: 50.0,
                    facility_level: 1,
                }),
            },
            // Resolves on its own or through anxiety medication; there is no
            // station procedure for it.
            ComplaintType::PanicAttack => Complaint {
                kind: self,
                name: "Panic Attack",
                seriousness: 30,
                degrade_period: 0.0,
                next_phase: None,
                recovery_period: 200.0,
                requires_bed_rest: false,
                treatment: None,
            },
            ComplaintType::BrokenBone => Complaint {
                kind: self,
                name: "Broken Bone",
                seriousness: 40,
                degrade_period: 0.0,
                next_phase: None,
                recovery_period: 800.0,
                requires_bed_rest: true,
                treatment: Some(Treatment {
                    name: "Setting Bone",
                    required_skill: 2,
                    self_admin: false,
                    duration: 80.0,
                    facility_level: 2,
                }),
            },
            ComplaintType::Appendicitis => Complaint {
                kind: self,
                name: "Appendicitis",
                seriousness: 60,
                degrade_period: 1400.0,
                next_phase: Some(ComplaintType::RupturedAppendix),
                recovery_period: 500.0,
                requires_bed_rest: true,
                treatment: Some(Treatment {
                    name: "Appendectomy",
                    required_skill: 3,
                    self_admin: false,
                    duration: 120.0,
                    facility_level: 3,
                }),
            },
            // Fatal if the degrade window passes untreated.
            ComplaintType::RupturedAppendix => Complaint {
                kind: self,
                name: "Ruptured Appendix",
                seriousness: 100,
                degrade_period: 700.0,
                next_phase: None,
                recovery_period: 1000.0,
                requires_bed_rest: true,
                treatment: Some(Treatment {
                    name: "Emergency Surgery",
                    required_skill: 4,
                    self_admin: false,
                    duration: 180.0,
                    facility_level: 3,
                }),
            },
            // Managed with a radioprotective agent rather than a procedure.
            ComplaintType::RadiationSickness => Complaint {
                kind: self,
                name: "Radiation Sickness",
                seriousness: 50,
                degrade_period: 0.0,
                next_phase: None,
                recovery_period: 600.0,
                requires_bed_rest: false,
                treatment: None,
            },
        }
    }
}

/// Static descriptor for one complaint.
#[derive(Debug, Clone, Copy)]
pub struct Complaint {
    pub kind: ComplaintType,
    pub name: &'static str,
    /// 1–100; 100 is life-threatening.
    pub seriousness: u32,
    /// Millisols before an untreated problem worsens. 0 = stable.
    pub degrade_period: f64,
    /// What the problem worsens into. `None` with a nonzero degrade period
    /// means degradation is fatal.
    pub next_phase: Option<ComplaintType>,
    /// Millisols of recovery after treatment before the problem resolves.
    pub recovery_period: f64,
    /// Whether recovery time only accrues while resting in a medical bed.
    pub requires_bed_rest: bool,
    pub treatment: Option<Treatment>,
}

/// Per-complaint treatment requirements.
#[derive(Debug, Clone, Copy)]
pub struct Treatment {
    pub name: &'static str,
    /// Minimum medicine skill to administer at full effect.
    pub required_skill: u32,
    /// Whether the sufferer can administer this to themselves.
    pub self_admin: bool,
    /// Base duration in millisols, before skill adjustment.
    pub duration: f64,
    /// Minimum station facility level that supports this procedure.
    pub facility_level: u32,
}

/// Medication kinds a doctor can prescribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MedicationKind {
    Anxiety,
    Radioprotective,
}

impl MedicationKind {
    /// How long one dose stays effective, in millisols.
    pub fn effective_duration(self) -> f64 {
        use outpost_logic::constants::durations;
        match self {
            MedicationKind::Anxiety => durations::ANXIETY_MEDICATION,
            MedicationKind::Radioprotective => durations::RADIOPROTECTIVE_AGENT,
        }
    }
}

/// One administered dose working through a person's system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Medication {
    pub kind: MedicationKind,
    pub remaining: f64,
}

impl Medication {
    pub fn new(kind: MedicationKind) -> Self {
        Self {
            kind,
            remaining: kind.effective_duration(),
        }
    }

    /// Decay one tick; returns false once spent.
    pub fn time_passing(&mut self, delta: f64) -> bool {
        self.remaining -= delta;
        self.remaining > 0.0
    }
}
