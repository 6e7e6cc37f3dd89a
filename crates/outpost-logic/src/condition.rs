//! Fitness gating and performance from stress, fatigue, and hunger.
//!
//! Medical work is offered only to workers below per-task condition bounds;
//! workers over the bounds are excluded before scoring, not scored to zero.

use serde::{Deserialize, Serialize};

use crate::constants::thresholds;

/// Per-task condition bounds. A worker at or beyond any bound is unfit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessBounds {
    pub max_stress: f64,
    pub max_fatigue: f64,
    pub max_hunger: f64,
}

/// Bounds for ordinary medical duty (examining, treating, prescribing).
pub const DUTY_FITNESS: FitnessBounds = FitnessBounds {
    max_stress: 75.0,
    max_fatigue: 1250.0,
    max_hunger: 1500.0,
};

/// Looser bounds for care-seeking tasks — being sick is the point, so only
/// extreme exhaustion disqualifies.
pub const CARE_SEEKING_FITNESS: FitnessBounds = FitnessBounds {
    max_stress: 100.0,
    max_fatigue: 3000.0,
    max_hunger: 3000.0,
};

/// Whether a worker's condition is within the given bounds.
pub fn is_fit(stress: f64, fatigue: f64, hunger: f64, bounds: &FitnessBounds) -> bool {
    stress < bounds.max_stress && fatigue < bounds.max_fatigue && hunger < bounds.max_hunger
}

/// Overall performance rating in `[0.1, 1.0]`, used as a score modifier.
pub fn performance_factor(stress: f64, fatigue: f64, hunger: f64) -> f64 {
    let stress_load = (stress / 100.0).clamp(0.0, 1.0);
    let fatigue_load = (fatigue / thresholds::FATIGUE_CEILING).clamp(0.0, 1.0);
    let hunger_load = (hunger / thresholds::HUNGER_CEILING).clamp(0.0, 1.0);
    (1.0 - 0.4 * stress_load - 0.3 * fatigue_load - 0.3 * hunger_load).clamp(0.1, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rested_worker_is_fit() {
        assert!(is_fit(10.0, 100.0, 200.0, &DUTY_FITNESS));
    }

    #[test]
    fn test_stressed_worker_unfit_for_duty() {
        assert!(!is_fit(80.0, 100.0, 200.0, &DUTY_FITNESS));
    }

    #[test]
    fn test_sick_worker_can_still_seek_care() {
        // Over duty bounds but under care-seeking bounds
        assert!(!is_fit(80.0, 2000.0, 200.0, &DUTY_FITNESS));
        assert!(is_fit(80.0, 2000.0, 200.0, &CARE_SEEKING_FITNESS));
    }

    #[test]
    fn test_performance_factor_range() {
        assert!((performance_factor(0.0, 0.0, 0.0) - 1.0).abs() < f64::EPSILON);
        let floor = performance_factor(100.0, 5000.0, 5000.0);
        assert!((floor - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_performance_factor_monotonic() {
        let fresh = performance_factor(10.0, 100.0, 100.0);
        let tired = performance_factor(10.0, 1500.0, 100.0);
        assert!(tired < fresh);
    }
}
