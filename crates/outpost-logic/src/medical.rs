//! Medical timing math — exam estimates, treatment durations, bed rest.
//!
//! All functions are pure; randomness (the exam jitter) is supplied by the
//! caller as a plain value so results stay reproducible.

use crate::constants::{durations, rates, scores};

/// Work produced per millisol of examination for a given medicine skill.
/// A skill-0 examiner still makes progress at the base rate.
pub fn exam_work_multiplier(skill: u32) -> f64 {
    1.0 + f64::from(skill) * rates::EXAM_SKILL_BONUS
}

/// Estimated total time to complete a postmortem exam.
///
/// - `skill`: the examiner's medicine skill; floored at 0.5 so an unskilled
///   examiner gets a long but finite estimate.
/// - `stability`, `resilience`: natural attributes on a 0–100 scale. Strong
///   attributes shorten the estimate, weak ones stretch it up to 1.5x.
/// - `jitter01`: caller-supplied random value in `[0, 1)`, scaled to at most
///   a quarter of the base time.
pub fn estimated_exam_time(skill: u32, stability: u32, resilience: u32, jitter01: f64) -> f64 {
    let skill = f64::from(skill).max(0.5);
    let attribute_factor = 1.5 - f64::from(stability + resilience) / 400.0;
    let jitter = jitter01.clamp(0.0, 1.0) * durations::BASE_POSTMORTEM_EXAM * 0.25;
    durations::BASE_POSTMORTEM_EXAM / skill * attribute_factor + jitter
}

/// Leftover time returned by one examination tick.
///
/// The overshoot is clamped to the tick and then halved, so a tick that
/// finishes a phase early re-enters the next phase slowly instead of
/// cascading a full fresh phase into the same tick.
pub fn exam_leftover(work_time: f64, delta: f64) -> f64 {
    (work_time - delta).clamp(0.0, delta) * rates::EXAM_LEFTOVER_DAMPING
}

/// Treatment duration adjusted for the administering worker's skill.
///
/// At or below the required skill the base duration applies unchanged;
/// above it the duration shrinks proportionally.
pub fn adjusted_treatment_duration(base: f64, required_skill: u32, skill: u32) -> f64 {
    let required = required_skill.max(1);
    if skill <= required {
        base
    } else {
        base * f64::from(required) / f64::from(skill)
    }
}

/// Fatigue relieved by a stretch of bed rest.
pub fn bed_rest_fatigue_relief(delta: f64) -> f64 {
    rates::BED_REST_FATIGUE_RELIEF * delta
}

/// Skill multiplier for utility scoring. Skill 0 is a small positive floor,
/// never a hard zero, so an unskilled worker can still be assigned at low
/// priority rather than being permanently ineligible.
pub fn skill_score_factor(skill: u32) -> f64 {
    if skill == 0 {
        0.5
    } else {
        f64::from(skill)
    }
}

/// Utility of examining a body that has waited `elapsed` millisols.
pub fn body_exam_score(elapsed: f64) -> f64 {
    scores::BODY_EXAM_BASE + scores::BODY_EXAM_AGING * elapsed.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_work_multiplier() {
        assert!((exam_work_multiplier(0) - 1.0).abs() < f64::EPSILON);
        assert!((exam_work_multiplier(4) - 2.0).abs() < f64::EPSILON);
        assert!(exam_work_multiplier(8) > exam_work_multiplier(4));
    }

    #[test]
    fn test_exam_estimate_skill_floor() {
        // Skill 0 floors at 0.5, giving twice the base-at-skill-1 estimate
        let unskilled = estimated_exam_time(0, 50, 50, 0.0);
        let novice = estimated_exam_time(1, 50, 50, 0.0);
        assert!((unskilled - novice * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_exam_estimate_attributes_shorten() {
        let weak = estimated_exam_time(2, 0, 0, 0.0);
        let strong = estimated_exam_time(2, 100, 100, 0.0);
        assert!(strong < weak);
        // Both extremes stay positive and finite
        assert!(strong > 0.0);
        assert!(weak.is_finite());
    }

    #[test]
    fn test_exam_estimate_jitter_bounded() {
        let base = estimated_exam_time(2, 50, 50, 0.0);
        let jittered = estimated_exam_time(2, 50, 50, 0.999);
        assert!(jittered > base);
        assert!(jittered - base <= durations::BASE_POSTMORTEM_EXAM * 0.25);
    }

    #[test]
    fn test_exam_leftover_clamped_and_damped() {
        // Overshoot larger than the tick clamps to the tick, then halves
        assert!((exam_leftover(30.0, 10.0) - 5.0).abs() < f64::EPSILON);
        // Small overshoot halves directly
        assert!((exam_leftover(12.0, 10.0) - 1.0).abs() < f64::EPSILON);
        // No overshoot, no leftover
        assert!((exam_leftover(8.0, 10.0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exam_leftover_never_exceeds_half_tick() {
        for work in [0.0, 5.0, 10.0, 50.0, 500.0] {
            assert!(exam_leftover(work, 10.0) <= 5.0);
        }
    }

    #[test]
    fn test_treatment_duration_unskilled_full() {
        assert!((adjusted_treatment_duration(100.0, 3, 0) - 100.0).abs() < f64::EPSILON);
        assert!((adjusted_treatment_duration(100.0, 3, 3) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_treatment_duration_skilled_faster() {
        let d = adjusted_treatment_duration(100.0, 3, 6);
        assert!((d - 50.0).abs() < f64::EPSILON);
        // More skill, shorter still — monotonic
        assert!(adjusted_treatment_duration(100.0, 3, 9) < d);
    }

    #[test]
    fn test_treatment_duration_zero_required_guarded() {
        // Required skill 0 behaves like 1 instead of zeroing the duration
        let d = adjusted_treatment_duration(60.0, 0, 4);
        assert!((d - 15.0).abs() < f64::EPSILON);
        assert!(adjusted_treatment_duration(60.0, 0, 0) > 0.0);
    }

    #[test]
    fn test_bed_rest_fatigue_relief() {
        assert!((bed_rest_fatigue_relief(300.0) - 900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skill_score_factor_floor() {
        assert!(skill_score_factor(0) > 0.0);
        assert!(skill_score_factor(0) < 1.0);
        assert!((skill_score_factor(3) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_body_exam_score_ages() {
        let fresh = body_exam_score(0.0);
        let stale = body_exam_score(500.0);
        assert!((fresh - scores::BODY_EXAM_BASE).abs() < f64::EPSILON);
        assert!(stale > fresh);
    }
}
