//! Core type definitions for the grid.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based grid coordinate. `x` indexes columns, `y` indexes rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The neighbouring point one step in `direction`
    pub fn towards(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// Manhattan distance to another point
    pub fn manhattan_distance(&self, other: &Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Direction for movement.
///
/// `Up` increases `y`, `Right` increases `x`. The order of [`Direction::all`]
/// is the order in which valid moves are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ]
    }
}

/// An impassable cell. Static for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Obstacle(pub Point);

impl Obstacle {
    pub fn new(x: i32, y: i32) -> Self {
        Self(Point::new(x, y))
    }

    pub fn position(&self) -> Point {
        self.0
    }
}

/// Axis-aligned rectangle whose border cells carry a traversal surcharge.
///
/// The corners may be given in any order; only the border (corners included)
/// is costed, the interior keeps the default cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialZone {
    pub cost: u32,
    pub from: Point,
    pub to: Point,
}

impl SpecialZone {
    pub fn new(cost: u32, from: Point, to: Point) -> Self {
        Self { cost, from, to }
    }

    /// `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (
            self.from.x.min(self.to.x),
            self.from.y.min(self.to.y),
            self.from.x.max(self.to.x),
            self.from.y.max(self.to.y),
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        (min_x..=max_x).contains(&point.x) && (min_y..=max_y).contains(&point.y)
    }

    pub fn on_border(&self, point: Point) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        self.contains(point)
            && (point.x == min_x || point.x == max_x || point.y == min_y || point.y == max_y)
    }
}

impl fmt::Display for SpecialZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cost: {}; from: {}; to: {}", self.cost, self.from, self.to)
    }
}

/// Formats a path as `{(1,1),(1,2),...}`.
pub struct PathDisplay<'a>(pub &'a [Point]);

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, point) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", point)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let p1 = Point::new(1, 1);
        let p2 = Point::new(4, 5);
        assert_eq!(p1.manhattan_distance(&p2), 7);
        assert_eq!(p2.manhattan_distance(&p1), 7);
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.to_delta(), (0, 1));
        assert_eq!(Direction::Right.to_delta(), (1, 0));
        assert_eq!(Direction::Down.to_delta(), (0, -1));
        assert_eq!(Direction::Left.to_delta(), (-1, 0));
        assert_eq!(Point::new(2, 2).towards(Direction::Up), Point::new(2, 3));
    }

    #[test]
    fn test_zone_border() {
        // Corners deliberately reversed
        let zone = SpecialZone::new(4, Point::new(4, 4), Point::new(2, 2));

        assert!(zone.on_border(Point::new(2, 2)));
        assert!(zone.on_border(Point::new(3, 4)));
        assert!(zone.on_border(Point::new(4, 3)));
        assert!(!zone.on_border(Point::new(3, 3)));
        assert!(zone.contains(Point::new(3, 3)));
        assert!(!zone.on_border(Point::new(5, 3)));
    }

    #[test]
    fn test_path_display() {
        let path = [Point::new(1, 1), Point::new(1, 2), Point::new(2, 2)];
        assert_eq!(PathDisplay(&path).to_string(), "{(1,1),(1,2),(2,2)}");
        assert_eq!(PathDisplay(&[]).to_string(), "{}");
    }

    #[test]
    fn test_obstacle_serialization() {
        let obstacle = Obstacle::new(3, 2);
        let json = serde_json::to_string(&obstacle).unwrap();
        assert_eq!(json, r#"{"x":3,"y":2}"#);
        let back: Obstacle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.position(), Point::new(3, 2));
    }
}
