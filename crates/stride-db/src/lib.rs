//! PostgreSQL storage layer for stride.
//!
//! Row models, connection pool management, embedded migrations, and query
//! functions grouped by table.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
