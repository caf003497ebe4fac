//! The periodization engine.
//!
//! A pure, deterministic mapping from a [`PlanRequest`] to a structured
//! multi-week [`GeneratedPlan`]. No I/O, no clock, no randomness: two calls
//! with the same request produce structurally identical output.

mod generate;
mod types;

pub use generate::{PhaseSplit, build_sessions, build_weeks, generate, split_phases};
pub use types::{
    EngineError, GeneratedPlan, GeneratedSession, GeneratedWeek, Level, Objective, PlanRequest,
    TrainingStatus,
};
