//! Append-only storages: piece destinations and the vehicle depot.

use std::fmt;

use crate::error::{WarehouseError, WarehouseResult};
use crate::types::{Piece, Position};

/// Objects kept at a fixed floor position, in arrival order.
#[derive(Clone, Debug)]
pub struct Storage<T> {
    position: Position,
    objects: Vec<T>,
}

impl<T> Storage<T> {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            objects: Vec::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn store(&mut self, object: T) {
        self.objects.push(object);
    }

    /// Remove the oldest object; callers are expected to check `is_empty` first.
    pub fn remove(&mut self) -> WarehouseResult<T> {
        if self.objects.is_empty() {
            return Err(WarehouseError::StorageEmpty(self.position));
        }
        Ok(self.objects.remove(0))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.objects
    }
}

impl<T: fmt::Display> fmt::Display for Storage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) [", self.objects.len())?;
        for (index, object) in self.objects.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{object}")?;
        }
        f.write_str("]")
    }
}

/// Named destination bin for delivered pieces.
#[derive(Clone, Debug)]
pub struct PieceStorage {
    name: String,
    storage: Storage<Piece>,
}

impl PieceStorage {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            storage: Storage::new(position),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.storage.position()
    }

    pub fn store(&mut self, piece: Piece) {
        self.storage.store(piece);
    }

    pub fn pieces(&self) -> &[Piece] {
        self.storage.items()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn total_price(&self) -> u32 {
        self.storage.items().iter().map(Piece::price).sum()
    }
}

impl fmt::Display for PieceStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} STORAGE", self.name)?;
        writeln!(f, "{}", self.storage)?;
        write!(f, "Total price of pieces in this storage: {}", self.total_price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Shape};

    #[test]
    fn remove_from_empty_storage_is_an_error() {
        let mut depot: Storage<u64> = Storage::new(Position::new(3, 3));
        let err = depot.remove().expect_err("empty storage returned an object");
        assert!(matches!(err, WarehouseError::StorageEmpty(p) if p == Position::new(3, 3)));
    }

    #[test]
    fn remove_returns_oldest_first() {
        let mut depot = Storage::new(Position::new(3, 3));
        depot.store(1);
        depot.store(2);
        assert_eq!(depot.remove().expect("stored object"), 1);
        assert_eq!(depot.remove().expect("stored object"), 2);
        assert!(depot.is_empty());
    }

    #[test]
    fn piece_storage_sums_prices() {
        let position = Position::new(0, 3);
        let mut bin = PieceStorage::new("ROUND", position);
        bin.store(Piece::new(1, Shape::Round, position));
        bin.store(Piece::new(2, Shape::Round, position).paint(Color::Gold));
        assert_eq!(bin.len(), 2);
        assert_eq!(bin.total_price(), 10 + 20);
        let rendered = bin.to_string();
        assert!(rendered.starts_with("ROUND STORAGE\n(2) [Round #1, Round #2 (GOLD)]"));
        assert!(rendered.ends_with("Total price of pieces in this storage: 30"));
    }
}
