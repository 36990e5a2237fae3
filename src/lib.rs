//! Radiohost Core Library
//!
//! Turns a topic into a two-host spoken dialogue: content lookup, script
//! generation and normalization, critic scoring, per-line prosody, sequential
//! speech synthesis, and a pollable job runtime with projected progress.

pub mod job;
pub mod orchestrator;
pub mod progress;
pub mod prosody;
#[cfg(feature = "remote")]
pub mod remote;
pub mod scoring;
pub mod script;
pub mod synthesis;
pub mod telemetry;
