//! # Utilities Module
//!
//! ## Role
//! Cross-cutting helpers that don't belong in domain-specific modules.
//!
//! ## Sub-modules
//! - `threading`: rayon thread pool configuration
//! - `workspace`: pre-allocated buffers for zero-allocation hot paths
//! - `telemetry`: atomic progress counters with an optional heartbeat

pub mod telemetry;
pub mod threading;
pub mod workspace;

pub use telemetry::{Stage, TelemetryBlackboard};
pub use workspace::Workspace;
