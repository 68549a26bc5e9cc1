//! Configuration module for the book narrator.
//!
//! Provides CLI argument parsing, validation and the Kokoro voice table.

#[allow(clippy::module_inception)]
mod config;
mod voices;

pub use config::{AppConfig, KOKORO_BUNDLE, Provider};
