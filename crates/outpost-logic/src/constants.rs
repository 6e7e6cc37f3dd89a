//! Engine constants — millisol durations, rates, score bases, and thresholds.
//!
//! All times are in millisols (1/1000 of a sol). Both the core engine and
//! the native simtest harness use these.

pub mod time {
    /// Millisols in one sol.
    pub const SOL: f64 = 1000.0;
}

pub mod durations {
    /// Time to move a body from where it lies onto a medical bed.
    pub const BODY_TRANSPORT: f64 = 20.0;
    /// Base postmortem examination time, before skill/attribute adjustment.
    pub const BASE_POSTMORTEM_EXAM: f64 = 120.0;
    /// How long a patient waits for a doctor before giving up. The budget is
    /// per waiting episode, not cumulative over the whole request.
    pub const TREATMENT_WAIT_TIMEOUT: f64 = 200.0;
    /// Length of one bed-rest session.
    pub const BED_REST_SESSION: f64 = 300.0;
    /// Time to prescribe and administer a medication.
    pub const PRESCRIPTION: f64 = 10.0;
    /// How long one dose of anxiety medication stays effective.
    pub const ANXIETY_MEDICATION: f64 = 1000.0;
    /// How long one dose of radioprotective agent stays effective.
    pub const RADIOPROTECTIVE_AGENT: f64 = 1000.0;
}

pub mod rates {
    /// Fatigue relieved per millisol of bed rest.
    pub const BED_REST_FATIGUE_RELIEF: f64 = 3.0;
    /// Examination speed bonus per medicine skill level.
    pub const EXAM_SKILL_BONUS: f64 = 0.25;
    /// Damping applied to leftover time when an exam tick overshoots.
    pub const EXAM_LEFTOVER_DAMPING: f64 = 0.5;
    /// Hunger accumulated per millisol awake.
    pub const HUNGER_GAIN: f64 = 1.0;
    /// Fatigue accumulated per millisol awake.
    pub const FATIGUE_GAIN: f64 = 1.0;
}

pub mod chances {
    /// Base accident probability per millisol while examining a body.
    pub const EXAM_ACCIDENT: f64 = 0.005;
    /// Base accident probability per millisol while treating a patient.
    pub const TREATMENT_ACCIDENT: f64 = 0.005;
}

pub mod scores {
    /// Base utility of examining an unattended body. Large enough to
    /// dominate routine work.
    pub const BODY_EXAM_BASE: f64 = 300.0;
    /// Additional utility per millisol the body has been waiting. An
    /// unattended body grows steadily more attractive to any idle doctor.
    pub const BODY_EXAM_AGING: f64 = 0.5;
    /// Base utility of treating a waiting patient.
    pub const TREAT_PATIENT_BASE: f64 = 600.0;
    /// Base utility of treating one's own affliction.
    pub const SELF_TREAT_BASE: f64 = 800.0;
    /// Base utility of seeking treatment from a medical station.
    pub const REQUEST_TREATMENT_BASE: f64 = 500.0;
    /// Base utility of bed rest while recovering.
    pub const BED_REST_BASE: f64 = 500.0;
    /// Base utility of prescribing medication to someone who needs it.
    pub const PRESCRIBE_BASE: f64 = 150.0;
}

pub mod thresholds {
    /// Stress level at which a person counts as stressed out and becomes a
    /// candidate for anxiety medication.
    pub const STRESSED_OUT: f64 = 75.0;
    /// Hunger value treated as the practical maximum when scaling modifiers.
    pub const HUNGER_CEILING: f64 = 2000.0;
    /// Fatigue value treated as the practical maximum when scaling modifiers.
    pub const FATIGUE_CEILING: f64 = 2000.0;
}

pub mod resources {
    /// Toxic waste produced as a byproduct of one prescription.
    pub const TOXIC_WASTE_PER_PRESCRIPTION: f64 = 0.1;
}
