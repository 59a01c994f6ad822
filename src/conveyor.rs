//! Picking point, conveyor backlog, and the synchronized supply line shared by vehicles.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::types::{Piece, PieceId, Position};

/// Single-slot hand-off point at the head of the conveyor.
///
/// Not synchronized; the owning [`SupplyLine`] serializes access.
#[derive(Debug)]
pub struct PickingPoint {
    position: Position,
    slot: Option<Piece>,
}

impl PickingPoint {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            slot: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Presence sensor.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Place a piece in the slot; returns the piece back if the slot is occupied.
    pub fn load(&mut self, piece: Piece) -> Result<(), Piece> {
        if self.slot.is_some() {
            return Err(piece);
        }
        self.slot = Some(piece);
        Ok(())
    }

    /// Take the piece out of the slot, leaving it empty.
    pub fn unload(&mut self) -> Option<Piece> {
        self.slot.take()
    }
}

/// FIFO backlog feeding a picking point.
///
/// The conveyor moves forward only when the picking point reports empty, so
/// the oldest piece is always the one waiting in the slot.
#[derive(Debug)]
pub struct Conveyor {
    picking_point: PickingPoint,
    pieces: VecDeque<Piece>,
}

impl Conveyor {
    pub fn new(picking_point: Position) -> Self {
        Self {
            picking_point: PickingPoint::new(picking_point),
            pieces: VecDeque::new(),
        }
    }

    /// Append a piece; returns the id of the piece moved into the picking point, if any.
    pub fn add(&mut self, piece: Piece) -> Option<PieceId> {
        self.pieces.push_back(piece);
        if self.picking_point.is_empty() {
            self.move_forward()
        } else {
            None
        }
    }

    /// Take the piece at the picking point and refill the slot from the backlog.
    ///
    /// The second element is the id of the piece that moved into the slot.
    pub fn unload_picking_point(&mut self) -> Option<(Piece, Option<PieceId>)> {
        let piece = self.picking_point.unload()?;
        let advanced = self.move_forward();
        Some((piece, advanced))
    }

    pub fn picking_point_position(&self) -> Position {
        self.picking_point.position()
    }

    pub fn picking_point_is_empty(&self) -> bool {
        self.picking_point.is_empty()
    }

    /// Pieces still on the line, including the one at the picking point.
    pub fn remaining(&self) -> usize {
        self.pieces.len() + usize::from(!self.picking_point.is_empty())
    }

    fn move_forward(&mut self) -> Option<PieceId> {
        let piece = self.pieces.pop_front()?;
        let id = piece.id();
        match self.picking_point.load(piece) {
            Ok(()) => Some(id),
            Err(piece) => {
                // Slot was occupied; keep the piece at the head of the backlog.
                self.pieces.push_front(piece);
                None
            }
        }
    }
}

/// Result of a successful claim at the picking point.
#[derive(Debug)]
pub struct Claim {
    pub piece: Piece,
    /// Piece that the conveyor moved into the emptied slot.
    pub advanced: Option<PieceId>,
}

/// Conveyor shared by all vehicles, guarded by a single mutex.
pub struct SupplyLine {
    inner: Mutex<SupplyLineState>,
    available: Condvar,
}

struct SupplyLineState {
    conveyor: Conveyor,
    closed: bool,
}

impl SupplyLine {
    /// Create an empty, open supply line ending at `picking_point`.
    pub fn new(picking_point: Position) -> Self {
        Self {
            inner: Mutex::new(SupplyLineState {
                conveyor: Conveyor::new(picking_point),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Add a piece; returns the piece back if the line is closed.
    ///
    /// `on_added` runs under the line's lock with the id of the piece that
    /// moved into the picking point (if any) and the picking point position,
    /// so nobody can claim that piece before the callback returns.
    pub fn add<F>(&self, piece: Piece, on_added: F) -> Result<Option<PieceId>, Piece>
    where
        F: FnOnce(Option<PieceId>, Position),
    {
        let mut guard = self.inner.lock().expect("supply line mutex poisoned");
        if guard.closed {
            return Err(piece);
        }
        let advanced = guard.conveyor.add(piece);
        on_added(advanced, guard.conveyor.picking_point_position());
        if advanced.is_some() {
            self.available.notify_all();
        }
        Ok(advanced)
    }

    /// Check, unload, and refill the picking point as one critical section.
    ///
    /// `on_advanced` runs under the lock for the piece that refilled the slot.
    pub fn claim<F>(&self, on_advanced: F) -> Option<Claim>
    where
        F: FnOnce(PieceId, Position),
    {
        let mut guard = self.inner.lock().expect("supply line mutex poisoned");
        if guard.conveyor.picking_point_is_empty() {
            return None;
        }
        let (piece, advanced) = guard.conveyor.unload_picking_point()?;
        if let Some(id) = advanced {
            on_advanced(id, guard.conveyor.picking_point_position());
            self.available.notify_all();
        }
        Some(Claim { piece, advanced })
    }

    /// Block until a piece sits at the picking point or the line is closed.
    ///
    /// Returns `true` if a piece is available.
    pub fn wait_for_piece_or_closed(&self) -> bool {
        let mut guard = self.inner.lock().expect("supply line mutex poisoned");
        loop {
            if !guard.conveyor.picking_point_is_empty() {
                return true;
            }
            if guard.closed {
                return false;
            }
            guard = self.available.wait(guard).expect("condvar wait failed");
        }
    }

    /// Stop accepting pieces and wake every waiting vehicle.
    pub fn close(&self) {
        let mut guard = self.inner.lock().expect("supply line mutex poisoned");
        guard.closed = true;
        self.available.notify_all();
    }

    /// Closed with nothing left at the picking point, read under one lock.
    ///
    /// A claim refills the slot before releasing the lock, so a drained line
    /// has an empty backlog too.
    pub fn is_drained(&self) -> bool {
        let guard = self.inner.lock().expect("supply line mutex poisoned");
        guard.closed && guard.conveyor.picking_point_is_empty()
    }

    pub fn picking_point_position(&self) -> Position {
        let guard = self.inner.lock().expect("supply line mutex poisoned");
        guard.conveyor.picking_point_position()
    }

    pub fn picking_point_is_empty(&self) -> bool {
        let guard = self.inner.lock().expect("supply line mutex poisoned");
        guard.conveyor.picking_point_is_empty()
    }

    /// Pieces not yet claimed by any vehicle.
    pub fn remaining(&self) -> usize {
        let guard = self.inner.lock().expect("supply line mutex poisoned");
        guard.conveyor.remaining()
    }
}
