//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is up.
//!
//! # Tasks
//! - TTL Sweep: Purges expired documents at configured intervals

mod sweep;

pub use sweep::spawn_expiry_task;
