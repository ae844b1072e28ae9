//! Integration tests for Lookout
//!
//! These tests drive the live-view engine through its public handle the way
//! the platform's API layer does: push configuration and selection changes,
//! let deferred metadata arrive, and observe the resolved per-camera states.

#[path = "integration/fetch_behavior.rs"]
mod fetch_behavior;

#[path = "integration/live_mode_engine.rs"]
mod live_mode_engine;

#[path = "integration/relay_payload.rs"]
mod relay_payload;
