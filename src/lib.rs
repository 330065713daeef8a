//! CrySense - baby cry analysis CLI
//!
//! This crate records a short clip from the microphone, sends it to a remote
//! cry classifier and turns the label into an emotion breakdown with a care
//! recommendation. Results are kept in a bounded local history.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Emotion mapping, records, history log and insights
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, FFmpeg, HTTP classifier, JSON files)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
