use core::result;

use thiserror::Error;

use crate::car::Floor;

pub type Result<T> = result::Result<T, Error>;

/// An Error that can occur in this crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Elevator is already running")]
    AlreadyRunning,

    #[error("Invalid floor range: min floor {min} must be below max floor {max}")]
    InvalidFloorRange { min: Floor, max: Floor },

    #[error("Floor {floor} is outside {min}..={max}")]
    FloorOutOfRange { floor: Floor, min: Floor, max: Floor },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Move task error: {0}")]
    MoveTaskError(String),

    #[error("{0}")]
    ServerError(#[from] warp::Error),

    #[error("{0}")]
    SignalError(#[from] ctrlc::Error),
}
