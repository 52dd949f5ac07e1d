//! State module for tracking per-item progress
//!
//! Each work item moves through a small state machine owned by the worker
//! processing it. Terminal states map one-to-one onto recorded outcomes.

mod item_state;

pub use item_state::ItemState;
