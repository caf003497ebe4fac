//! Query functions, grouped by table.

pub mod jobs;
pub mod plans;
pub mod sessions;
pub mod weeks;
