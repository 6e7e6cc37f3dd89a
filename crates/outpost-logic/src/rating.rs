//! Utility scores with named modifiers, used to rank candidate activities.
//!
//! A [`RatingScore`] starts from a named base value and applies additive or
//! multiplicative modifiers in call order, keeping a record of each so the
//! final number can be explained. Scores are used purely for ranking and are
//! never persisted. A final score of zero means "not offered as a candidate".

use serde::{Deserialize, Serialize};

/// How a modifier combines with the running score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    Additive,
    Multiplicative,
}

/// One named adjustment applied to a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingModifier {
    pub name: String,
    pub value: f64,
    pub kind: ModifierKind,
}

/// A utility value plus the named modifiers that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingScore {
    score: f64,
    modifiers: Vec<RatingModifier>,
}

impl RatingScore {
    /// Start a score from a named base value.
    pub fn new(name: &str, base: f64) -> Self {
        Self {
            score: base,
            modifiers: vec![RatingModifier {
                name: name.to_string(),
                value: base,
                kind: ModifierKind::Additive,
            }],
        }
    }

    /// A score that will never be offered as a candidate.
    pub fn unfit() -> Self {
        Self {
            score: 0.0,
            modifiers: Vec::new(),
        }
    }

    /// Add a named amount to the score.
    pub fn add(mut self, name: &str, amount: f64) -> Self {
        self.score += amount;
        self.modifiers.push(RatingModifier {
            name: name.to_string(),
            value: amount,
            kind: ModifierKind::Additive,
        });
        self
    }

    /// Scale the score by a named factor.
    pub fn multiply(mut self, name: &str, factor: f64) -> Self {
        self.score *= factor;
        self.modifiers.push(RatingModifier {
            name: name.to_string(),
            value: factor,
            kind: ModifierKind::Multiplicative,
        });
        self
    }

    /// The final utility value. Never negative.
    pub fn score(&self) -> f64 {
        self.score.max(0.0)
    }

    /// Whether this score qualifies as a candidate at all.
    pub fn is_candidate(&self) -> bool {
        self.score > 0.0
    }

    /// The modifiers applied so far, in application order.
    pub fn modifiers(&self) -> &[RatingModifier] {
        &self.modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_score() {
        let score = RatingScore::new("base", 100.0);
        assert!((score.score() - 100.0).abs() < f64::EPSILON);
        assert!(score.is_candidate());
        assert_eq!(score.modifiers().len(), 1);
    }

    #[test]
    fn test_unfit_is_not_candidate() {
        let score = RatingScore::unfit();
        assert!(!score.is_candidate());
        assert!((score.score() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_modifiers_apply_in_order() {
        // (100 + 50) * 2 = 300, not 100 * 2 + 50 = 250
        let score = RatingScore::new("base", 100.0)
            .add("bonus", 50.0)
            .multiply("skill", 2.0);
        assert!((score.score() - 300.0).abs() < f64::EPSILON);
        assert_eq!(score.modifiers().len(), 3);
    }

    #[test]
    fn test_zeroing_multiplier_disqualifies() {
        let score = RatingScore::new("base", 500.0).multiply("ineligible", 0.0);
        assert!(!score.is_candidate());
    }

    #[test]
    fn test_score_never_negative() {
        let score = RatingScore::new("base", 10.0).add("penalty", -50.0);
        assert!((score.score() - 0.0).abs() < f64::EPSILON);
        assert!(!score.is_candidate());
    }

    #[test]
    fn test_monotonic_in_base() {
        let low = RatingScore::new("base", 100.0).multiply("skill", 1.5);
        let high = RatingScore::new("base", 200.0).multiply("skill", 1.5);
        assert!(high.score() > low.score());
    }
}
