//! Grid positions and headings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell on the host's grid. `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Coords { x, y }
    }

    /// Parse a coordinate group such as `[3,12]`, `(3, 12)` or `[-1 4]`.
    pub fn parse_group(group: &str) -> Option<Coords> {
        let inner = group
            .strip_prefix('[')
            .and_then(|g| g.strip_suffix(']'))
            .or_else(|| group.strip_prefix('(').and_then(|g| g.strip_suffix(')')))?;
        let mut parts = inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Coords { x, y })
    }

    /// Saturates at the edge of the `i32` plane.
    pub fn shifted(self, heading: Heading, distance: i32) -> Coords {
        let (dx, dy) = heading.delta();
        Coords {
            x: self.x.saturating_add(dx.saturating_mul(distance)),
            y: self.y.saturating_add(dy.saturating_mul(distance)),
        }
    }

    /// Chebyshev distance: diagonal neighbours are one step away.
    pub fn distance(self, other: Coords) -> i32 {
        let dx = self.x.saturating_sub(other.x).saturating_abs();
        let dy = self.y.saturating_sub(other.y).saturating_abs();
        dx.max(dy)
    }

    pub fn is_near(self, other: Coords) -> bool {
        self.distance(other) <= 1
    }

    /// The heading that best approaches `other`, or `None` when already there.
    pub fn heading_to(self, other: Coords) -> Option<Heading> {
        Heading::from_delta(
            other.x.saturating_sub(self.x).signum(),
            other.y.saturating_sub(self.y).signum(),
        )
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// One of the eight compass headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Heading {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading::North,
        Heading::NorthEast,
        Heading::East,
        Heading::SouthEast,
        Heading::South,
        Heading::SouthWest,
        Heading::West,
        Heading::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::North => (0, -1),
            Heading::NorthEast => (1, -1),
            Heading::East => (1, 0),
            Heading::SouthEast => (1, 1),
            Heading::South => (0, 1),
            Heading::SouthWest => (-1, 1),
            Heading::West => (-1, 0),
            Heading::NorthWest => (-1, -1),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Heading> {
        Heading::ALL
            .into_iter()
            .find(|h| h.delta() == (dx.signum(), dy.signum()))
    }

    pub fn opposite(self) -> Heading {
        self.rotated(4)
    }

    /// Rotate clockwise by `eighths` of a turn (negative turns counter-clockwise).
    pub fn rotated(self, eighths: i32) -> Heading {
        let idx = Heading::ALL.iter().position(|h| *h == self).unwrap_or(0) as i32;
        Heading::ALL[(idx + eighths).rem_euclid(8) as usize]
    }

    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    /// The two orthogonal components of a diagonal heading.
    pub fn components(self) -> Option<(Heading, Heading)> {
        let (dx, dy) = self.delta();
        if !self.is_diagonal() {
            return None;
        }
        Some((Heading::from_delta(dx, 0)?, Heading::from_delta(0, dy)?))
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Heading::North => "NORTH",
            Heading::NorthEast => "NORTHEAST",
            Heading::East => "EAST",
            Heading::SouthEast => "SOUTHEAST",
            Heading::South => "SOUTH",
            Heading::SouthWest => "SOUTHWEST",
            Heading::West => "WEST",
            Heading::NorthWest => "NORTHWEST",
        };
        f.write_str(name)
    }
}
