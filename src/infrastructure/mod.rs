//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio host, the identification service,
//! desktop notifications and the config file.

pub mod capture;
pub mod config;
pub mod identification;
pub mod notification;

// Re-export adapters
pub use capture::CpalDevice;
pub use config::XdgConfigStore;
pub use identification::HttpIdentifier;
pub use notification::{create_notifier, NoOpNotifier, NotifyRustNotifier};
