//! Pure behavioral math for the outpost simulation.
//!
//! This crate contains the formulas and constants that drive the medical
//! behavior engine, independent of any entity storage or runtime. Functions
//! take plain data and return results, making them unit-testable and
//! portable between the core engine and native validation tools.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`condition`] | Fitness gating and performance from stress/fatigue/hunger |
//! | [`constants`] | Millisol durations, rates, score bases, thresholds |
//! | [`medical`] | Exam estimates, treatment durations, bed-rest math |
//! | [`rating`] | Utility scores with named modifiers, for ranking work |

pub mod condition;
pub mod constants;
pub mod medical;
pub mod rating;
