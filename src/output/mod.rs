//! Output module for presenting run results
//!
//! Progress is streamed through [`crate::engine::ProgressSink`]; this module
//! only renders the final summary for terminal users.

mod summary;

pub use summary::{format_summary, print_summary};
