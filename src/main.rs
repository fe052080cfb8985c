use clap::Parser;
use log::info;
use tokio::sync::mpsc;

use liftman::cli::Opts;
use liftman::config::Config;
use liftman::dispatch::Dispatcher;
use liftman::{server, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    env_logger::Builder::new()
        .filter_level(opts.log_level)
        .init();

    let config = Config::try_from(&opts)?;
    let dispatcher = Dispatcher::new(&config)?;
    info!(
        "car parked at floor {}, serving floors {}..={}",
        dispatcher.controller().floor(),
        config.min_floor,
        config.max_floor
    );

    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        info!("received Ctrl+C");
        let _ = stop_tx.send(());
    })?;

    let (addr, server) = server::bind(opts.socket_addr(), dispatcher, async move {
        stop_rx.recv().await;
    })?;

    info!("websocket ready at ws://{}/elevator", addr);
    server.await;
    info!("shutting down");

    Ok(())
}
