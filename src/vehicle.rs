//! Battery-powered vehicles that shuttle pieces from the picking point to their storages.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::error::VehicleError;
use crate::events::LineEvent;
use crate::types::{Piece, Position, VehicleId};
use crate::warehouse::{DrainPolicy, Warehouse};

/// Battery capacity and per-move cost of a vehicle model.
#[derive(Clone, Copy, Debug)]
pub struct VehicleSpec {
    pub max_battery: u32,
    pub move_cost: u32,
    /// Time spent travelling one cell.
    pub move_time: Duration,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            max_battery: 5000,
            move_cost: 100,
            move_time: Duration::ZERO,
        }
    }
}

/// Charge left in a vehicle; never increases once the vehicle is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Battery {
    max: u32,
    current: u32,
}

impl Battery {
    /// A fully charged battery.
    pub fn new(max: u32) -> Self {
        Self { max, current: max }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Charge left as a whole percentage of capacity.
    pub fn remaining_percent(&self) -> u32 {
        if self.max == 0 {
            return 0;
        }
        (u64::from(self.current) * 100 / u64::from(self.max)) as u32
    }

    pub fn has_enough(&self, consumption: u32) -> bool {
        consumption <= self.current
    }

    fn drain(&mut self, consumption: u32) {
        debug_assert!(self.has_enough(consumption), "battery drained below zero");
        self.current = self.current.saturating_sub(consumption);
    }

    fn deplete(&mut self) {
        self.current = 0;
    }
}

/// Next cell on the L-shaped path from `from` to `target`.
///
/// The vertical axis is resolved before the horizontal one; returns `from`
/// unchanged once the target is reached.
pub fn next_step(from: Position, target: Position) -> Position {
    if from.y < target.y {
        Position::new(from.x, from.y + 1)
    } else if from.y > target.y {
        Position::new(from.x, from.y - 1)
    } else if from.x < target.x {
        Position::new(from.x + 1, from.y)
    } else if from.x > target.x {
        Position::new(from.x - 1, from.y)
    } else {
        from
    }
}

/// Automated guided vehicle carrying at most one piece at a time.
#[derive(Debug)]
pub struct Agvs {
    id: VehicleId,
    position: Position,
    load: Option<Piece>,
    battery: Battery,
    move_cost: u32,
    move_time: Duration,
    delivered: usize,
}

impl Agvs {
    pub fn new(id: VehicleId, position: Position, spec: VehicleSpec) -> Self {
        Self {
            id,
            position,
            load: None,
            battery: Battery::new(spec.max_battery),
            move_cost: spec.move_cost,
            move_time: spec.move_time,
            delivered: 0,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn battery(&self) -> Battery {
        self.battery
    }

    /// Piece on board, if any.
    pub fn load(&self) -> Option<&Piece> {
        self.load.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.load.is_none()
    }

    /// Pieces this vehicle handed to a storage.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Run the pick-and-deliver loop until there is no more work for this vehicle.
    ///
    /// Stops early with [`VehicleError::BatteryDepleted`] when a move cannot
    /// be paid for; a piece on board at that point stays with the vehicle and
    /// never reaches a storage.
    pub fn consume(&mut self, warehouse: &Warehouse) -> Result<(), VehicleError> {
        let picking_point = warehouse.line().picking_point_position();
        while self.should_move(warehouse, picking_point) {
            match self.load.as_ref().map(Piece::destination) {
                None => {
                    self.move_towards(picking_point, warehouse)?;
                    if self.position == picking_point {
                        self.pick(warehouse);
                    }
                }
                Some(destination) => {
                    self.move_towards(destination, warehouse)?;
                    if self.position == destination {
                        if let Some(piece) = self.load.take() {
                            self.deliver(piece, warehouse)?;
                        }
                    }
                }
            }
        }
        warehouse.emit(LineEvent::VehicleFinished {
            vehicle: self.id,
            position: self.position,
            delivered: self.delivered,
        });
        Ok(())
    }

    fn should_move(&self, warehouse: &Warehouse, picking_point: Position) -> bool {
        if !self.is_empty() || self.position != picking_point {
            return true;
        }
        match warehouse.policy() {
            DrainPolicy::BestEffort => !warehouse.line().picking_point_is_empty(),
            DrainPolicy::UntilClosed => !warehouse.line().is_drained(),
        }
    }

    fn pick(&mut self, warehouse: &Warehouse) {
        match warehouse.claim() {
            Some(claim) => {
                warehouse.emit(LineEvent::PieceLoaded {
                    vehicle: self.id,
                    piece: claim.piece.clone(),
                });
                self.load = Some(claim.piece);
            }
            None => {
                // Nothing to take; park on the line instead of spinning.
                if warehouse.policy() == DrainPolicy::UntilClosed {
                    warehouse.line().wait_for_piece_or_closed();
                }
            }
        }
    }

    fn deliver(&mut self, piece: Piece, warehouse: &Warehouse) -> Result<(), VehicleError> {
        let stored = piece.clone();
        if let Err(piece) = warehouse.store(piece) {
            return Err(VehicleError::NoStorageAt {
                vehicle: self.id,
                position: self.position,
                piece: piece.id(),
            });
        }
        self.delivered += 1;
        warehouse.emit(LineEvent::PieceStored {
            vehicle: self.id,
            piece: stored,
            storage: self.position,
        });
        Ok(())
    }

    fn move_towards(&mut self, target: Position, warehouse: &Warehouse) -> Result<(), VehicleError> {
        let next = next_step(self.position, target);
        if next == self.position {
            warehouse.emit(LineEvent::VehicleWaiting {
                vehicle: self.id,
                position: self.position,
                battery_percent: self.battery.remaining_percent(),
            });
            return Ok(());
        }
        if !self.battery.has_enough(self.move_cost) {
            self.battery.deplete();
            let lost = self.load.as_ref().map(Piece::id);
            warehouse.emit(LineEvent::BatteryDepleted {
                vehicle: self.id,
                position: self.position,
                lost,
            });
            return Err(VehicleError::BatteryDepleted {
                vehicle: self.id,
                position: self.position,
                lost,
            });
        }
        debug_assert_eq!(next.manhattan(self.position), 1);
        self.battery.drain(self.move_cost);
        self.position = next;
        warehouse.emit(LineEvent::VehicleMoved {
            vehicle: self.id,
            position: self.position,
            battery_percent: self.battery.remaining_percent(),
        });
        if !self.move_time.is_zero() {
            thread::sleep(self.move_time);
        }
        Ok(())
    }
}

impl fmt::Display for Agvs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AGVS {} ({}%)", self.id, self.battery.remaining_percent())
    }
}
