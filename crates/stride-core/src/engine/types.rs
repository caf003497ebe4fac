//! Input and output types for the periodization engine.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stride_db::models::{Phase, SessionType};

/// Race objective the plan builds toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    #[serde(rename = "5k")]
    FiveK,
    #[serde(rename = "10k")]
    TenK,
    #[serde(rename = "half-marathon")]
    HalfMarathon,
    #[serde(rename = "marathon")]
    Marathon,
}

impl Objective {
    /// Wire-format name, as accepted on submission.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FiveK => "5k",
            Self::TenK => "10k",
            Self::HalfMarathon => "half-marathon",
            Self::Marathon => "marathon",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runner experience level. Determines the starting weekly volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Starting weekly distance in km-equivalent units.
    pub fn starting_volume(self) -> f64 {
        match self {
            Self::Beginner => 20.0,
            Self::Intermediate => 35.0,
            Self::Advanced => 50.0,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The immutable parameters of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub objective: Objective,
    pub level: Level,
    pub duration_weeks: i32,
    pub sessions_per_week: i32,
    pub start_date: NaiveDate,
}

/// Status of the training schedule itself, as produced by the engine.
///
/// Deliberately a separate type from the persisted plan's lifecycle status
/// (pending/generated/failed): "active" describes the schedule, not the
/// generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Active,
    Completed,
    Archived,
}

/// A single planned session within a generated week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSession {
    /// 1 = Monday .. 7 = Sunday.
    pub day_of_week: i32,
    pub session_type: SessionType,
    pub target_distance: Option<i32>,
    /// Minutes.
    pub target_duration: Option<i32>,
    pub description: String,
}

/// A generated week: phase, recorded volume, and its sessions sorted by day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWeek {
    pub week_number: i32,
    pub phase: Phase,
    pub volume_distance: i32,
    pub volume_duration: i32,
    pub sessions: Vec<GeneratedSession>,
}

/// The engine's output: a complete plan structure, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub duration_weeks: i32,
    pub status: TrainingStatus,
    pub weeks: Vec<GeneratedWeek>,
}

/// Failure inside the periodization engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("minimum plan duration is 4 weeks (got {0})")]
    DurationTooShort(i32),
}
