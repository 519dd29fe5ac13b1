//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the caches.
//!
//! # Tasks
//! - TTL maintenance: Removes expired result-cache entries at a fixed interval

mod maintenance;

pub use maintenance::spawn_maintenance_task;
