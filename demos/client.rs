use clap::Parser;

use futures_util::{future, pin_mut, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use futures::SinkExt;
use futures_channel::mpsc;
use git_version::git_version;
use std::error::Error;
use url::Url;

const GIT_VERSION: &str = git_version!(fallback = "unknown");

/// Example: type commands such as `call 5 up` or `select 3`, one per line
#[derive(Parser)]
#[clap(name = "Example Liftman client", version = GIT_VERSION)]
struct Opts {
    #[clap(default_value = "ws://127.0.0.1:9000/elevator")]
    pub url: Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opts: Opts = Opts::parse();

    let (ws_stream, _) = connect_async(opts.url).await?;
    println!("websocket connected");

    let (stdin_tx, stdin_rx) = mpsc::unbounded();
    let (mut ws_tx, ws_rx) = ws_stream.split();

    tokio::spawn(read_stdin(stdin_tx));

    let stdin_to_ws = async move {
        let mut stdin_rx = stdin_rx;
        while let Some(m) = stdin_rx.next().await {
            if let Err(e) = ws_tx.send(m).await {
                eprintln!("send failed: {}", e);
                break;
            }
        }
    };
    let ws_to_stdout = {
        ws_rx.for_each(|message| async move {
            let mut data = match message {
                Ok(m) => m.into_data(),
                Err(e) => format!("receive failed: {}", e).into_bytes(),
            };
            data.push(b'\n');
            tokio::io::stdout()
                .write_all(&data)
                .await
                .expect("failed to write stdout");
        })
    };

    pin_mut!(stdin_to_ws, ws_to_stdout);
    future::select(stdin_to_ws, ws_to_stdout).await;

    Ok(())
}

async fn read_stdin(tx: mpsc::UnboundedSender<Message>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        if tx.unbounded_send(Message::text(line)).is_err() {
            break;
        }
    }
}
