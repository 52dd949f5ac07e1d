//! Configuration module for Wayback-Archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional; [`Config::default`] carries the stock
//! timings and endpoints.
//!
//! # Example
//!
//! ```no_run
//! use wayback_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Media workers: {}", config.media.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, EngineConfig, HttpConfig, OutputConfig, WaybackConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
