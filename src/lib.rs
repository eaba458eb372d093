pub mod assistant;
pub mod audio;
pub mod config;
pub mod domain;
pub mod error;
pub mod kernel;
pub mod services;

// Re-export specific items if needed for convenient access
pub use config::AssistantConfig;
pub use error::{AssistantError, TransportError};
pub use kernel::controller::{DialogueController, TurnOutput};
