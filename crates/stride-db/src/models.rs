use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of a training plan.
///
/// A plan is created in `pending`, moved exactly once by the worker to a
/// terminal state (`generated` or `failed`), and never leaves a terminal
/// state. This is distinct from the engine's own output status
/// (active/completed/archived), which describes the training schedule, not
/// the generation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Generated,
    Failed,
}

impl PlanStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Generated | Self::Failed)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Generated => "generated",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "generated" => Ok(Self::Generated),
            "failed" => Ok(Self::Failed),
            other => Err(PlanStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanStatus`] string.
#[derive(Debug, Clone)]
pub struct PlanStatusParseError(pub String);

impl fmt::Display for PlanStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan status: {:?}", self.0)
    }
}

impl std::error::Error for PlanStatusParseError {}

// ---------------------------------------------------------------------------

/// Periodization phase of a planned week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Phase {
    Base,
    Build,
    Peak,
    Taper,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Base => "Base",
            Self::Build => "Build",
            Self::Peak => "Peak",
            Self::Taper => "Taper",
        };
        f.write_str(s)
    }
}

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Base" => Ok(Self::Base),
            "Build" => Ok(Self::Build),
            "Peak" => Ok(Self::Peak),
            "Taper" => Ok(Self::Taper),
            other => Err(PhaseParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Phase`] string.
#[derive(Debug, Clone)]
pub struct PhaseParseError(pub String);

impl fmt::Display for PhaseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid phase: {:?}", self.0)
    }
}

impl std::error::Error for PhaseParseError {}

// ---------------------------------------------------------------------------

/// Kind of a planned session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Run,
    Strength,
    Rest,
    CrossTraining,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Run => "run",
            Self::Strength => "strength",
            Self::Rest => "rest",
            Self::CrossTraining => "cross_training",
        };
        f.write_str(s)
    }
}

impl FromStr for SessionType {
    type Err = SessionTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(Self::Run),
            "strength" => Ok(Self::Strength),
            "rest" => Ok(Self::Rest),
            "cross_training" => Ok(Self::CrossTraining),
            other => Err(SessionTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`SessionType`] string.
#[derive(Debug, Clone)]
pub struct SessionTypeParseError(pub String);

impl fmt::Display for SessionTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid session type: {:?}", self.0)
    }
}

impl std::error::Error for SessionTypeParseError {}

// ---------------------------------------------------------------------------

/// State of a generation job within the queue's own storage.
///
/// `queued` rows are claimable, `active` rows are held by a worker, and
/// `failed` rows are retained for a bounded diagnostic window before the
/// sweep deletes them. Successful jobs are deleted on completion and have
/// no state of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Active,
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for JobState {
    type Err = JobStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "active" => Ok(Self::Active),
            "failed" => Ok(Self::Failed),
            other => Err(JobStateParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`JobState`] string.
#[derive(Debug, Clone)]
pub struct JobStateParseError(pub String);

impl fmt::Display for JobStateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid job state: {:?}", self.0)
    }
}

impl std::error::Error for JobStateParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A training plan -- the top-level unit of work.
///
/// Row structs serialize camelCase: they are the wire shape of the plan
/// read endpoints, and the API is camelCase throughout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub duration_weeks: i32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A planned week within a plan.
///
/// Written only as a batch during persistence of a successful generation,
/// never updated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlannedWeek {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub week_number: i32,
    pub phase: Phase,
    pub volume_distance: i32,
    pub volume_duration: i32,
}

/// A planned session within a week.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSession {
    pub id: Uuid,
    pub week_id: Uuid,
    pub day_of_week: i32,
    pub session_type: SessionType,
    pub target_distance: Option<i32>,
    pub target_duration: Option<i32>,
    pub description: Option<String>,
}

/// A queued generation job.
///
/// The `request` column carries the original submission parameters as JSON;
/// the row is keyed by `plan_id`, which doubles as the queue's
/// deduplication key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub request: serde_json::Value,
    pub state: JobState,
    pub attempt: i32,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
