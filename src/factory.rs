//! Piece producers feeding the conveyor.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{WarehouseError, WarehouseResult};
use crate::types::{Color, Piece, PieceId, Position, Shape};

pub trait PieceFactory {
    fn create(&mut self) -> Piece;
}

/// Builds unpainted pieces of one shape, all bound for the same storage.
#[derive(Clone, Copy, Debug)]
pub struct ShapeFactory {
    shape: Shape,
    destination: Position,
}

impl ShapeFactory {
    pub fn new(shape: Shape, destination: Position) -> Self {
        Self { shape, destination }
    }

    /// Unpainted piece with the given id.
    pub fn build(&self, id: PieceId) -> Piece {
        Piece::new(id, self.shape, self.destination)
    }
}

/// Picks a shape at random and paints a random subset of colours on it.
///
/// The chosen [`ShapeFactory`] builds the piece. Ids come from one counter
/// shared by every shape, so they are unique across the whole run.
pub struct RandomPieceFactory {
    shapes: Vec<ShapeFactory>,
    rng: SmallRng,
    next_id: PieceId,
}

impl RandomPieceFactory {
    pub fn new(shapes: Vec<ShapeFactory>, seed: u64) -> WarehouseResult<Self> {
        if shapes.is_empty() {
            return Err(WarehouseError::Config(
                "random piece factory needs at least one shape".to_string(),
            ));
        }
        Ok(Self {
            shapes,
            rng: SmallRng::seed_from_u64(seed),
            next_id: 1,
        })
    }

    fn paint_randomly(&mut self, mut piece: Piece) -> Piece {
        let mut palette = Color::ALL.to_vec();
        for _ in 0..Color::ALL.len() {
            if palette.is_empty() || !self.rng.gen_bool(0.5) {
                continue;
            }
            let index = self.rng.gen_range(0..palette.len());
            piece = piece.paint(palette.remove(index));
        }
        piece
    }
}

impl PieceFactory for RandomPieceFactory {
    fn create(&mut self) -> Piece {
        let factory = self.shapes[self.rng.gen_range(0..self.shapes.len())];
        let id = self.next_id;
        self.next_id += 1;
        self.paint_randomly(factory.build(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn shapes() -> Vec<ShapeFactory> {
        vec![
            ShapeFactory::new(Shape::Cylindrical, Position::new(0, 1)),
            ShapeFactory::new(Shape::Square, Position::new(0, 2)),
            ShapeFactory::new(Shape::Round, Position::new(0, 3)),
        ]
    }

    fn destination_of(shape: Shape) -> Position {
        match shape {
            Shape::Cylindrical => Position::new(0, 1),
            Shape::Square => Position::new(0, 2),
            Shape::Round => Position::new(0, 3),
        }
    }

    #[test]
    fn shape_factory_builds_unpainted_pieces() {
        let factory = ShapeFactory::new(Shape::Round, Position::new(0, 3));
        let piece = factory.build(9);
        assert_eq!(piece.id(), 9);
        assert_eq!(piece.shape(), Shape::Round);
        assert_eq!(piece.destination(), Position::new(0, 3));
        assert!(piece.colors().is_empty());
    }

    #[test]
    fn random_ids_count_up_across_shapes() {
        let mut factory = RandomPieceFactory::new(shapes(), 3).expect("shapes given");
        let ids: Vec<_> = (0..30).map(|_| factory.create().id()).collect();
        assert_eq!(ids, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn random_pieces_match_their_shape_storage() {
        let mut factory = RandomPieceFactory::new(shapes(), 7).expect("shapes given");
        let mut ids = HashSet::new();
        for _ in 0..200 {
            let piece = factory.create();
            assert!(ids.insert(piece.id()));
            assert_eq!(piece.destination(), destination_of(piece.shape()));
            let colors: HashSet<_> = piece.colors().iter().collect();
            assert_eq!(colors.len(), piece.colors().len());
        }
    }

    #[test]
    fn random_factory_needs_shapes() {
        assert!(matches!(
            RandomPieceFactory::new(Vec::new(), 1),
            Err(WarehouseError::Config(_))
        ));
    }

    #[test]
    fn same_seed_same_pieces() {
        let mut a = RandomPieceFactory::new(shapes(), 42).expect("shapes given");
        let mut b = RandomPieceFactory::new(shapes(), 42).expect("shapes given");
        for _ in 0..50 {
            assert_eq!(a.create(), b.create());
        }
    }
}
