//! Core domain and coordination logic for stride.
//!
//! The periodization engine is pure and synchronous; everything else
//! (queue, worker, persistence) coordinates it against PostgreSQL.

pub mod engine;
pub mod error;
pub mod persist;
pub mod queue;
pub mod submit;
pub mod worker;
