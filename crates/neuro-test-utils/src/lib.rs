//! Shared test fixtures and utilities for neuro-robotics crates.
//!
//! Provides a recording simulation backend, deterministic RNG setup and
//! scene configs built from the bundled assets.

pub mod mocks;
pub mod rng;
pub mod scene;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{BackendCall, FailPoint, RecordingBackend};
pub use rng::{deterministic_action, seeded_rng};
