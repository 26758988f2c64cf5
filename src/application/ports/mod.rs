//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod device;
pub mod identifier;
pub mod notifier;

// Re-export common types
pub use config::ConfigStore;
pub use device::{AudioDevice, CaptureStream, DeviceError, RecorderEvent, RecorderEvents};
pub use identifier::{IdentificationError, Identifier};
pub use notifier::{NotificationError, NotificationIcon, Notifier};
