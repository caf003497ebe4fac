//! Offline plan preview: run the engine and print the result as JSON,
//! without touching the database or the queue.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use stride_core::engine::{self, Level, Objective, PlanRequest};

pub fn run_generate(
    objective: &str,
    level: &str,
    duration_weeks: i32,
    sessions_per_week: i32,
    start_date: &str,
) -> Result<()> {
    let objective = parse_objective(objective)?;
    let level = parse_level(level)?;
    let start_date = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .context("start date must be YYYY-MM-DD")?;

    let request = PlanRequest {
        objective,
        level,
        duration_weeks,
        sessions_per_week,
        start_date,
    };

    let plan = engine::generate(&request)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn parse_objective(s: &str) -> Result<Objective> {
    Ok(match s {
        "5k" => Objective::FiveK,
        "10k" => Objective::TenK,
        "half-marathon" => Objective::HalfMarathon,
        "marathon" => Objective::Marathon,
        other => bail!("unknown objective {other:?} (expected 5k, 10k, half-marathon, marathon)"),
    })
}

fn parse_level(s: &str) -> Result<Level> {
    Ok(match s {
        "beginner" => Level::Beginner,
        "intermediate" => Level::Intermediate,
        "advanced" => Level::Advanced,
        other => bail!("unknown level {other:?} (expected beginner, intermediate, advanced)"),
    })
}
