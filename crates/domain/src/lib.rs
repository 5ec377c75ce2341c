//! Domain layer for the vendor proximity notification engine.
//!
//! This crate contains:
//! - Domain models (Position, Subscriber, VendorTarget, ProximityRecord, Notification)
//! - The pure transition evaluator (enter/exit edge detection)
//! - Service traits at the I/O seams (push, live locations, state/notification stores)

pub mod evaluator;
pub mod geo;
pub mod models;
pub mod services;
