use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::{debug, info, warn};

use crate::api::{Command, Reply};
use crate::car::{Direction, Floor, Status};
use crate::config::Config;
use crate::controller::{Controller, StopHooks};
use crate::queue::{Request, RequestQueue};
use crate::Error::FloorOutOfRange;
use crate::Result;

/// Which queued request is consumed when the car stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Drop the front of the queue, whatever floor it names.
    Front,
    /// Drop the first request for the floor and direction just served.
    Matching,
}

impl FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "front" => Ok(RemovalPolicy::Front),
            "matching" => Ok(RemovalPolicy::Matching),
            unsupported => Err(format!("{} is not a removal policy", unsupported)),
        }
    }
}

/// Stops wherever a queued request matches the next floor and direction.
pub struct DispatchHooks {
    removal: RemovalPolicy,
}

impl DispatchHooks {
    pub fn new(removal: RemovalPolicy) -> Self {
        Self { removal }
    }
}

impl StopHooks for DispatchHooks {
    fn should_stop_at_floor(&self, floor: Floor, direction: Direction, requests: &[Request]) -> bool {
        let stop = requests.iter().any(|r| r.matches(floor, direction));
        if stop {
            info!("elevator should stop at floor {}", floor);
        }
        stop
    }

    fn on_stop(&self, floor: Floor, direction: Direction, requests: &RequestQueue) {
        let removed = match self.removal {
            RemovalPolicy::Front => requests.remove_first(),
            RemovalPolicy::Matching => requests.remove_matching(floor, direction),
        };
        match removed {
            Some(r) if r.matches(floor, direction) => debug!("fulfilled request {}", r),
            Some(r) => warn!(
                "removed request {} while stopped at {} {}",
                r, floor, direction
            ),
            None => debug!("no request to remove at floor {}", floor),
        }
    }
}

/// What happened to a call handed to the [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The car was idle and a move was started.
    Started(Direction),
    /// The car is busy; the request waits in the queue.
    Queued,
    /// The car was idle but the request does not lie in its own direction
    /// from the current floor, so it waits in the queue until another call
    /// moves the car past it.
    Undispatched,
    /// Floor selection for the floor the car is already at.
    AlreadyThere,
}

impl Display for Dispatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Started(direction) => write!(f, "started {}", direction),
            Dispatch::Queued => f.write_str("queued"),
            Dispatch::Undispatched => f.write_str("undispatched"),
            Dispatch::AlreadyThere => f.write_str("already there"),
        }
    }
}

/// Hall calls and car-panel selections for one controller.
#[derive(Clone)]
pub struct Dispatcher {
    controller: Controller,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Self> {
        let controller = Controller::new(
            config.min_floor,
            config.max_floor,
            config.travel_time,
            DispatchHooks::new(config.removal),
        )?;
        Ok(Self { controller })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Queues a call and starts the car if it is idle and the call lies
    /// in the requested direction.
    pub fn call_elevator(&self, floor: Floor, direction: Direction) -> Dispatch {
        let car = self.controller.car();

        self.controller.add_request(floor, direction);

        if car.status == Status::Running {
            info!("elevator is running, request queued for floor {}", floor);
            return Dispatch::Queued;
        }

        info!("elevator is idle, starting to move");
        let started = match direction {
            Direction::Up if floor > car.floor => self.controller.start_move_up(),
            Direction::Down if floor < car.floor => self.controller.start_move_down(),
            _ => {
                warn!(
                    "request for floor {} {} left queued, car is at floor {}",
                    floor, direction, car.floor
                );
                return Dispatch::Undispatched;
            }
        };

        match started {
            Ok(_) => Dispatch::Started(direction),
            Err(e) => {
                info!("{}, request queued for floor {}", e, floor);
                Dispatch::Queued
            }
        }
    }

    /// Selection from the car panel.
    pub fn select_floor(&self, floor: Floor) -> Dispatch {
        let current = self.controller.floor();

        if floor > current {
            info!("user requested floor {}, moving up", floor);
            self.call_elevator(floor, Direction::Up)
        } else if floor < current {
            info!("user requested floor {}, moving down", floor);
            self.call_elevator(floor, Direction::Down)
        } else {
            info!("elevator is already at floor {}", floor);
            Dispatch::AlreadyThere
        }
    }

    pub fn handle(&self, cmd: Command) -> Reply {
        match cmd {
            Command::Call { floor, direction } => match self.check_floor(floor) {
                Ok(()) => Reply::Dispatched(self.call_elevator(floor, direction)),
                Err(e) => Reply::Rejected(e.to_string()),
            },
            Command::Select(floor) => match self.check_floor(floor) {
                Ok(()) => Reply::Dispatched(self.select_floor(floor)),
                Err(e) => Reply::Rejected(e.to_string()),
            },
            Command::Status => Reply::Car(self.controller.car()),
            Command::Requests => Reply::Requests(self.controller.requests()),
        }
    }

    fn check_floor(&self, floor: Floor) -> Result<()> {
        let (min, max) = (self.controller.min_floor(), self.controller.max_floor());
        if (min..=max).contains(&floor) {
            Ok(())
        } else {
            Err(FloorOutOfRange { floor, min, max })
        }
    }
}
