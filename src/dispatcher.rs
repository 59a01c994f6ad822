//! Runs every vehicle on its own thread against one shared warehouse.

use std::sync::Arc;
use std::thread;

use crate::error::VehicleError;
use crate::log_dev;
use crate::types::{Piece, PieceId, Position, VehicleId};
use crate::vehicle::{Agvs, Battery};
use crate::warehouse::Warehouse;

/// Final state of a vehicle whose thread returned.
#[derive(Clone, Debug)]
pub struct VehicleSummary {
    pub id: VehicleId,
    pub position: Position,
    pub battery: Battery,
    pub delivered: usize,
    /// Piece still on board, only possible after a failure.
    pub load: Option<PieceId>,
}

/// A vehicle that stopped before running out of work.
#[derive(Debug)]
pub struct VehicleFailure {
    pub vehicle: VehicleId,
    pub reason: VehicleError,
}

/// Outcome of a dispatch; failures are collected, never propagated.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub vehicles: Vec<VehicleSummary>,
    pub failures: Vec<VehicleFailure>,
}

impl DispatchReport {
    /// Pieces that were on board of a failed vehicle.
    pub fn lost_pieces(&self) -> Vec<PieceId> {
        self.failures
            .iter()
            .filter_map(|failure| failure.reason.lost_piece())
            .collect()
    }

    pub fn delivered(&self) -> usize {
        self.vehicles.iter().map(|vehicle| vehicle.delivered).sum()
    }

    pub fn failed(&self, vehicle: VehicleId) -> bool {
        self.failures.iter().any(|failure| failure.vehicle == vehicle)
    }
}

/// Start one thread per vehicle and wait for all of them to stop.
pub fn dispatch(warehouse: &Arc<Warehouse>, vehicles: Vec<Agvs>) -> DispatchReport {
    let mut report = DispatchReport::default();
    let mut handles = Vec::with_capacity(vehicles.len());

    for mut vehicle in vehicles {
        let id = vehicle.id();
        let warehouse = Arc::clone(warehouse);
        let spawned = thread::Builder::new()
            .name(format!("agvs-{id}"))
            .spawn(move || {
                let result = vehicle.consume(&warehouse);
                (vehicle, result)
            });
        match spawned {
            Ok(handle) => {
                log_dev!("[DISPATCH] started agvs-{id}");
                handles.push((id, handle));
            }
            Err(source) => {
                log_dev!("[DISPATCH] could not start agvs-{id}: {source}");
                report.failures.push(VehicleFailure {
                    vehicle: id,
                    reason: VehicleError::Spawn { vehicle: id, source },
                });
            }
        }
    }

    for (id, handle) in handles {
        match handle.join() {
            Ok((vehicle, result)) => {
                report.vehicles.push(VehicleSummary {
                    id,
                    position: vehicle.position(),
                    battery: vehicle.battery(),
                    delivered: vehicle.delivered(),
                    load: vehicle.load().map(Piece::id),
                });
                if let Err(reason) = result {
                    log_dev!("[DISPATCH] agvs-{id} failed: {reason}");
                    report.failures.push(VehicleFailure { vehicle: id, reason });
                } else {
                    log_dev!("[DISPATCH] agvs-{id} finished");
                }
            }
            Err(_) => {
                report.failures.push(VehicleFailure {
                    vehicle: id,
                    reason: VehicleError::Panicked(id),
                });
            }
        }
    }

    report
}
