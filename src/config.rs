use std::time::Duration;

use crate::car::Floor;
use crate::cli::Opts;
use crate::dispatch::RemovalPolicy;
use crate::Error::InvalidFloorRange;
use crate::Result;

/// Validated settings for one simulated car.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub min_floor: Floor,
    pub max_floor: Floor,
    /// Time to travel a single floor.
    pub travel_time: Duration,
    pub removal: RemovalPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_floor: 0,
            max_floor: 20,
            travel_time: Duration::from_secs(1),
            removal: RemovalPolicy::Front,
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self> {
        if self.min_floor >= self.max_floor {
            return Err(InvalidFloorRange {
                min: self.min_floor,
                max: self.max_floor,
            });
        }
        Ok(self)
    }
}

impl TryFrom<&Opts> for Config {
    type Error = crate::Error;

    fn try_from(opts: &Opts) -> Result<Self> {
        Config {
            min_floor: opts.min_floor,
            max_floor: opts.max_floor,
            travel_time: Duration::from_millis(opts.travel_time),
            removal: opts.removal,
        }
        .validate()
    }
}
