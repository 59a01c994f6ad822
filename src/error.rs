use thiserror::Error;

use crate::types::{PieceId, Position, VehicleId};

/// Why a vehicle stopped before running out of work.
#[derive(Debug, Error)]
pub enum VehicleError {
    /// The next move could not be paid for; any load on board is lost.
    #[error("vehicle {vehicle} ran out of battery at {position}")]
    BatteryDepleted {
        vehicle: VehicleId,
        position: Position,
        lost: Option<PieceId>,
    },

    #[error("vehicle {vehicle} found no storage at {position} for piece {piece}")]
    NoStorageAt {
        vehicle: VehicleId,
        position: Position,
        piece: PieceId,
    },

    #[error("failed to spawn thread for vehicle {vehicle}: {source}")]
    Spawn {
        vehicle: VehicleId,
        #[source]
        source: std::io::Error,
    },

    #[error("vehicle {0} thread panicked")]
    Panicked(VehicleId),
}

impl VehicleError {
    /// Piece that left the system with this failure, if any.
    pub fn lost_piece(&self) -> Option<PieceId> {
        match self {
            VehicleError::BatteryDepleted { lost, .. } => *lost,
            VehicleError::NoStorageAt { piece, .. } => Some(*piece),
            VehicleError::Spawn { .. } | VehicleError::Panicked(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("supply line closed, piece {0} rejected")]
    LineClosed(PieceId),

    #[error("storage at {0} is empty")]
    StorageEmpty(Position),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;
