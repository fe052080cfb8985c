use std::time::Duration;

use clap::Parser;
use log::info;

use liftman::config::Config;
use liftman::dispatch::{Dispatcher, RemovalPolicy};
use liftman::{Floor, Result};

use git_version::git_version;
const GIT_VERSION: &str = git_version!(fallback = "unknown");

/// Example: ride the car through a list of floor selections without the
/// websocket service
#[derive(Parser)]
#[clap(name = "Liftman scenario", version = GIT_VERSION)]
struct Opts {
    #[clap(long, default_value = "0", allow_hyphen_values = true)]
    min_floor: Floor,

    #[clap(long, default_value = "20", allow_hyphen_values = true)]
    max_floor: Floor,

    /// Milliseconds to travel one floor
    #[clap(short, long, default_value = "200")]
    travel_time: u64,

    #[clap(long, default_value = "front")]
    removal: RemovalPolicy,

    /// the floors to select, in order
    #[clap(allow_hyphen_values = true, required = true)]
    floors: Vec<Floor>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let config = Config {
        min_floor: opts.min_floor,
        max_floor: opts.max_floor,
        travel_time: Duration::from_millis(opts.travel_time),
        removal: opts.removal,
    }
    .validate()?;
    let dispatcher = Dispatcher::new(&config)?;

    ctrlc::set_handler(|| {
        println!("received Ctrl+C!");
        std::process::exit(130);
    })?;

    for floor in opts.floors {
        let outcome = dispatcher.select_floor(floor);
        info!("select {} => {}", floor, outcome);
        dispatcher.controller().idle().await;
    }

    info!(
        "finished at {}, pending: {:?}",
        dispatcher.controller().car(),
        dispatcher.controller().requests()
    );

    Ok(())
}
