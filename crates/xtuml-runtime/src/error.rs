//! Runtime error type.

use thiserror::Error;

use crate::instance::InstanceId;

/// Misuse of the runtime API. Failures inside actions, bridges and
/// functions are reported through `tracing` instead and never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("instance {0} is not in the object store")]
    UnknownInstance(InstanceId),

    #[error("instance {0} has no state machine")]
    NoStateMachine(InstanceId),

    #[error("no bridge registered for '{0}'")]
    UnknownBridge(String),

    #[error("bridge '{entity}' has no operation '{operation}'")]
    UnknownBridgeOperation { entity: String, operation: String },

    #[error("function '{0}' is not defined")]
    UnknownFunction(String),

    #[error("action failed: {0}")]
    Action(String),

    #[error("failed to start timer thread: {0}")]
    TimerSpawn(String),
}

/// Result alias used throughout the runtime.
pub type Result<T> = std::result::Result<T, RuntimeError>;
