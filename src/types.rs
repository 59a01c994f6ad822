//! Shared identifiers, coordinates, and the piece model used across the line.

use std::fmt;

/// Unique identifier for a piece travelling through the line.
pub type PieceId = u64;
/// Unique identifier for a vehicle thread.
pub type VehicleId = u64;

/// Grid coordinate on the warehouse floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Number of single-cell moves needed to reach `other`.
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Physical shape of a piece; decides its base price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Round,
    Square,
    Cylindrical,
}

impl Shape {
    pub fn price(self) -> u32 {
        match self {
            Shape::Round => 10,
            Shape::Square => 5,
            Shape::Cylindrical => 20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Round => "Round",
            Shape::Square => "Square",
            Shape::Cylindrical => "Cylindrical",
        }
    }
}

/// Paint applied on top of a piece; each colour adds a surcharge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Gold,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Gold];

    pub fn price(self) -> u32 {
        match self {
            Color::Red | Color::Green | Color::Blue => 5,
            Color::Gold => 10,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
            Color::Gold => "GOLD",
        };
        f.write_str(name)
    }
}

/// Unit of work carried by vehicles from the picking point to a storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    id: PieceId,
    shape: Shape,
    /// Paint layers in application order, without repeats.
    colors: Vec<Color>,
    destination: Position,
}

impl Piece {
    /// Construct an unpainted piece bound for `destination`.
    pub fn new(id: PieceId, shape: Shape, destination: Position) -> Self {
        Self {
            id,
            shape,
            colors: Vec::new(),
            destination,
        }
    }

    /// Add a paint layer; painting an already-used colour is a no-op.
    pub fn paint(mut self, color: Color) -> Self {
        if !self.colors.contains(&color) {
            self.colors.push(color);
        }
        self
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Position of the storage this piece must end up in.
    pub fn destination(&self) -> Position {
        self.destination
    }

    /// Base shape price plus every colour surcharge.
    pub fn price(&self) -> u32 {
        self.shape.price() + self.colors.iter().map(|c| c.price()).sum::<u32>()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.shape.name(), self.id)?;
        for color in &self.colors {
            write!(f, " ({color})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_compare_structurally() {
        assert_eq!(Position::new(3, 2), Position::new(3, 2));
        assert_ne!(Position::new(3, 2), Position::new(2, 3));
        assert_eq!(Position::new(3, 2).manhattan(Position::new(0, 1)), 4);
    }

    #[test]
    fn price_adds_color_surcharges() {
        let piece = Piece::new(1, Shape::Round, Position::new(0, 3))
            .paint(Color::Red)
            .paint(Color::Gold);
        assert_eq!(piece.price(), 10 + 5 + 10);
        assert_eq!(Piece::new(2, Shape::Cylindrical, Position::new(0, 1)).price(), 20);
    }

    #[test]
    fn repeated_paint_is_ignored() {
        let piece = Piece::new(4, Shape::Square, Position::new(0, 2))
            .paint(Color::Blue)
            .paint(Color::Blue);
        assert_eq!(piece.colors(), &[Color::Blue]);
        assert_eq!(piece.price(), 10);
    }

    #[test]
    fn display_lists_paint_in_order() {
        let piece = Piece::new(3, Shape::Round, Position::new(0, 3))
            .paint(Color::Green)
            .paint(Color::Red);
        assert_eq!(piece.to_string(), "Round #3 (GREEN) (RED)");
    }
}
