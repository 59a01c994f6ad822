//! Floor state shared by all vehicles: supply line, destination storages, and event sink.

use std::sync::{Arc, Mutex};

use crate::conveyor::{Claim, SupplyLine};
use crate::events::{LineEvent, LineObserver};
use crate::storage::PieceStorage;
use crate::types::{Piece, Position};

/// When a vehicle with nothing left to do may leave the line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Leave as soon as the vehicle is idle at an empty picking point.
    BestEffort,
    /// Additionally wait at the picking point until the supply line is closed.
    #[default]
    UntilClosed,
}

pub struct Warehouse {
    line: SupplyLine,
    storages: Vec<(Position, Mutex<PieceStorage>)>,
    observer: Arc<dyn LineObserver>,
    policy: DrainPolicy,
}

impl Warehouse {
    pub fn new(
        picking_point: Position,
        policy: DrainPolicy,
        observer: Arc<dyn LineObserver>,
    ) -> Self {
        Self {
            line: SupplyLine::new(picking_point),
            storages: Vec::new(),
            observer,
            policy,
        }
    }

    /// Register a destination storage; positions are expected to be distinct.
    pub fn with_storage(mut self, name: impl Into<String>, position: Position) -> Self {
        debug_assert!(
            self.storage_at(position).is_none(),
            "duplicate storage at {position}"
        );
        self.storages
            .push((position, Mutex::new(PieceStorage::new(name, position))));
        self
    }

    pub fn line(&self) -> &SupplyLine {
        &self.line
    }

    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }

    pub fn emit(&self, event: LineEvent) {
        self.observer.on_event(&event);
    }

    /// Put a piece on the conveyor; returns it back if the line is closed.
    ///
    /// Events are emitted while the line is locked, so a piece's arrival at
    /// the picking point is always reported before any vehicle loads it.
    pub fn add_piece(&self, piece: Piece) -> Result<(), Piece> {
        let added = piece.clone();
        self.line.add(piece, |advanced, position| {
            self.emit(LineEvent::PieceAdded { piece: added });
            if let Some(piece) = advanced {
                self.emit(LineEvent::PieceAtPickingPoint { piece, position });
            }
        })?;
        Ok(())
    }

    /// Claim the piece at the picking point, if any.
    pub fn claim(&self) -> Option<Claim> {
        self.line.claim(|piece, position| {
            self.emit(LineEvent::PieceAtPickingPoint { piece, position });
        })
    }

    /// Stop accepting pieces; vehicles waiting for work are released.
    pub fn close(&self) {
        self.line.close();
    }

    /// Hand a piece to the storage at its destination; returns it back if none exists.
    pub fn store(&self, piece: Piece) -> Result<(), Piece> {
        let Some(storage) = self.storage_at(piece.destination()) else {
            return Err(piece);
        };
        storage.lock().expect("storage mutex poisoned").store(piece);
        Ok(())
    }

    /// Copy of every storage in registration order.
    pub fn storages(&self) -> Vec<PieceStorage> {
        self.storages
            .iter()
            .map(|(_, storage)| storage.lock().expect("storage mutex poisoned").clone())
            .collect()
    }

    /// Total pieces delivered across all storages.
    pub fn delivered(&self) -> usize {
        self.storages
            .iter()
            .map(|(_, storage)| storage.lock().expect("storage mutex poisoned").len())
            .sum()
    }

    fn storage_at(&self, position: Position) -> Option<&Mutex<PieceStorage>> {
        self.storages
            .iter()
            .find(|(at, _)| *at == position)
            .map(|(_, storage)| storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;
    use crate::types::Shape;

    const PICKING: Position = Position::new(3, 2);

    fn empty_floor(policy: DrainPolicy, observer: Arc<RecordingObserver>) -> Warehouse {
        Warehouse::new(PICKING, policy, observer)
    }

    #[test]
    fn store_routes_by_destination() {
        let warehouse = empty_floor(DrainPolicy::default(), Arc::new(RecordingObserver::new()))
            .with_storage("SQUARE", Position::new(0, 2))
            .with_storage("ROUND", Position::new(0, 3));
        assert!(warehouse.store(Piece::new(1, Shape::Round, Position::new(0, 3))).is_ok());
        let stray = warehouse
            .store(Piece::new(2, Shape::Round, Position::new(9, 9)))
            .expect_err("no storage at (9, 9)");
        assert_eq!(stray.id(), 2);

        let storages = warehouse.storages();
        assert_eq!(storages[0].len(), 0);
        assert_eq!(storages[1].pieces()[0].id(), 1);
        assert_eq!(warehouse.delivered(), 1);
    }

    #[test]
    fn add_piece_reports_picking_point_arrivals() {
        let observer = Arc::new(RecordingObserver::new());
        let warehouse = empty_floor(DrainPolicy::BestEffort, observer.clone());
        for id in 1..=3 {
            warehouse
                .add_piece(Piece::new(id, Shape::Square, Position::new(0, 2)))
                .expect("supply line closed");
        }
        while warehouse.claim().is_some() {}

        let arrivals: Vec<_> = observer
            .events()
            .into_iter()
            .filter_map(|event| match event {
                LineEvent::PieceAtPickingPoint { piece, .. } => Some(piece),
                _ => None,
            })
            .collect();
        assert_eq!(arrivals, vec![1, 2, 3]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "duplicate storage")]
    fn duplicate_storage_position_panics() {
        let _ = empty_floor(DrainPolicy::default(), Arc::new(RecordingObserver::new()))
            .with_storage("SQUARE", Position::new(0, 2))
            .with_storage("ROUND", Position::new(0, 2));
    }

    #[test]
    fn closed_warehouse_rejects_pieces() {
        let warehouse = empty_floor(DrainPolicy::UntilClosed, Arc::new(RecordingObserver::new()));
        warehouse.close();
        assert!(warehouse.add_piece(Piece::new(1, Shape::Round, Position::new(0, 3))).is_err());
    }
}
