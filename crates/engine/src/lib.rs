//! Proximity notification engine.
//!
//! Watches live vendor positions, detects subscribers crossing the alert
//! radius, and fans out push notifications with a persisted in/out state per
//! (user, vendor, alert kind) pair so each crossing notifies exactly once.

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod services;
pub mod triggers;
