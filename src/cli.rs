use std::net::SocketAddr;
use std::str::FromStr;

use clap::Parser;
use git_version::git_version;

use crate::car::Floor;
use crate::dispatch::RemovalPolicy;

const GIT_VERSION: &str = git_version!(fallback = "unknown");

/// Websocket controller for a simulated elevator car.
#[derive(Parser)]
#[clap(name = "Liftman", version = GIT_VERSION)]
pub struct Opts {
    #[clap(long, default_value = "127.0.0.1")]
    pub address: NetInterface,

    #[clap(long, default_value = "9000")]
    pub port: u16,

    #[clap(long, default_value = "0", allow_hyphen_values = true)]
    pub min_floor: Floor,

    #[clap(long, default_value = "20", allow_hyphen_values = true)]
    pub max_floor: Floor,

    /// Milliseconds to travel one floor
    #[clap(short, long, default_value = "1000")]
    pub travel_time: u64,

    /// Which request to drop when the car stops: front or matching
    #[clap(long, default_value = "front")]
    pub removal: RemovalPolicy,

    #[clap(long, default_value = "info")]
    pub log_level: log::LevelFilter,
}

impl Opts {
    pub fn socket_addr(&self) -> SocketAddr {
        let ip: [u8; 4] = self.address.into();
        SocketAddr::from((ip, self.port))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NetInterface {
    Loopback,
    OOOO,
}

impl FromStr for NetInterface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "127.0.0.1" => Ok(NetInterface::Loopback),
            "0.0.0.0" => Ok(NetInterface::OOOO),
            unsupported => Err(format!("{} is not a valid interface", unsupported)),
        }
    }
}

impl From<NetInterface> for [u8; 4] {
    fn from(i: NetInterface) -> Self {
        match i {
            NetInterface::Loopback => [127, 0, 0, 1],
            NetInterface::OOOO => [0, 0, 0, 0],
        }
    }
}
