//! AudioPrint - song identification from a short microphone sample
//!
//! This crate records up to ten seconds of audio from the default input
//! device, uploads it to a fingerprinting service and reports the matched song.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects (duration, encoding, sample, match result),
//!   the identification session state machine and domain errors
//! - **Application**: The workflow controller, recording session, encoding
//!   negotiation and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal capture, HTTP client,
//!   desktop notifications, config file)
//! - **CLI**: Argument parsing, presenter, logging and the interactive runner

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
