//! Engine-level errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::scene::ComponentKind;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// No project is loaded in the runtime context
    #[error("No active project")]
    NoActiveProject,

    /// The project has no active scene
    #[error("No active scene")]
    NoActiveScene,

    /// No enabled camera in the scene
    #[error("No enabled camera in scene '{0}'")]
    NoActiveCamera(String),

    /// `start` called twice
    #[error("Engine is already running")]
    AlreadyRunning,

    /// Frame requested before `start`
    #[error("Engine is not running")]
    NotRunning,

    /// Entity handle does not resolve
    #[error("Unknown entity")]
    UnknownEntity,

    /// Component handle does not resolve
    #[error("Unknown component")]
    UnknownComponent,

    /// Entity already carries a component of a kind that allows only one
    #[error("Entity already has a {0} component")]
    ComponentAlreadyAttached(ComponentKind),

    /// Static entities cannot change shape while the engine runs
    #[error("Static entity '{0}' cannot be modified while running")]
    StaticEntityLocked(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
