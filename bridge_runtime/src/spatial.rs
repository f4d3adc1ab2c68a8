use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Position) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Eight-way compass direction, clockwise from north. Screen coordinates:
/// north is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

const CLOCKWISE: [Direction; 8] = [
    Direction::North,
    Direction::Northeast,
    Direction::East,
    Direction::Southeast,
    Direction::South,
    Direction::Southwest,
    Direction::West,
    Direction::Northwest,
];

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::Northeast => "northeast",
            Direction::East => "east",
            Direction::Southeast => "southeast",
            Direction::South => "south",
            Direction::Southwest => "southwest",
            Direction::West => "west",
            Direction::Northwest => "northwest",
        }
    }

    fn index(&self) -> usize {
        CLOCKWISE
            .iter()
            .position(|candidate| candidate == self)
            .unwrap_or(0)
    }

    /// Turn by eighths; positive is clockwise.
    pub fn turned(&self, eighths: i32) -> Direction {
        let index = (self.index() as i32 + eighths).rem_euclid(8) as usize;
        CLOCKWISE[index]
    }

    /// Unit step vector for this heading.
    pub fn unit_vector(&self) -> (f64, f64) {
        const D: f64 = std::f64::consts::FRAC_1_SQRT_2;
        match self {
            Direction::North => (0.0, -1.0),
            Direction::Northeast => (D, -D),
            Direction::East => (1.0, 0.0),
            Direction::Southeast => (D, D),
            Direction::South => (0.0, 1.0),
            Direction::Southwest => (-D, D),
            Direction::West => (-1.0, 0.0),
            Direction::Northwest => (-D, -D),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "north" | "n" | "up" => Ok(Direction::North),
            "northeast" | "ne" => Ok(Direction::Northeast),
            "east" | "e" | "right" => Ok(Direction::East),
            "southeast" | "se" => Ok(Direction::Southeast),
            "south" | "s" | "down" => Ok(Direction::South),
            "southwest" | "sw" => Ok(Direction::Southwest),
            "west" | "w" | "left" => Ok(Direction::West),
            "northwest" | "nw" => Ok(Direction::Northwest),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_abbreviations() {
        assert_eq!("North".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("sw".parse::<Direction>(), Ok(Direction::Southwest));
        assert_eq!("sideways".parse::<Direction>(), Err("sideways".into()));
    }

    #[test]
    fn turning_wraps_around() {
        assert_eq!(Direction::North.turned(2), Direction::East);
        assert_eq!(Direction::North.turned(-2), Direction::West);
        assert_eq!(Direction::West.turned(4), Direction::East);
    }

    #[test]
    fn serializes_lowercase() {
        let text = serde_json::to_string(&Direction::Northeast).unwrap();
        assert_eq!(text, "\"northeast\"");
    }
}
