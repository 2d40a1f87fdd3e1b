use thiserror::Error;

use std::fmt::Debug;

/// Misuse reported by the index, the registry or the manager
///
/// Every failing operation leaves the state it was called on untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InteractionError<ID>
where
    ID: Debug
{
    /// The handle is already registered
    #[error("handle {0:?} is already registered")]
    DuplicateHandle(ID),
    /// The handle was never registered, or has been removed
    #[error("handle {0:?} is not registered")]
    UnknownHandle(ID),
    /// Rejected construction parameters
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Non-finite position, negative extent, or a position outside the representable grid
    #[error("shape for handle {0:?} cannot be placed on the grid")]
    InvalidShape(ID),
}
