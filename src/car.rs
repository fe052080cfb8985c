use std::fmt::{Display, Formatter};
use std::str::FromStr;

use Direction::*;

use crate::Error;

pub type Floor = i32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Floor offset of one step of travel.
    pub fn delta(self) -> Floor {
        match self {
            Up => 1,
            Down => -1,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Up => f.write_str("up"),
            Down => f.write_str("down"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Up),
            "down" | "d" => Ok(Down),
            unsupported => Err(Error::InvalidCommand(format!(
                "{} is not a direction",
                unsupported
            ))),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => f.write_str("idle"),
            Status::Running => f.write_str("running"),
        }
    }
}

/// Snapshot of the car as observed at one instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Car {
    pub status: Status,
    pub direction: Direction,
    pub floor: Floor,
}

impl Car {
    pub fn parked(floor: Floor) -> Self {
        Self {
            status: Status::Idle,
            direction: Up,
            floor,
        }
    }
}

impl Display for Car {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "floor {} {} {}", self.floor, self.direction, self.status)
    }
}
