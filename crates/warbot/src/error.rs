//! Unified error type for the war bot.

use warbot_engine::{EngineError, InvalidConfig};
use warbot_model::ModelError;
use warbot_ports::PortError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// Code built on the `warbot` facade deals with this single error type
/// instead of importing errors from each layer. The `#[from]` attribute
/// on each variant lets `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WarBotError {
    /// A war operation was rejected or could not be committed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A store or chat port failed outside of a war operation.
    #[error(transparent)]
    Port(#[from] PortError),

    /// A domain value could not be constructed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The engine rejected the configured rules.
    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfig),
}
