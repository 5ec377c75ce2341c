//! Persistence layer: Postgres repositories for the proximity engine.

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
