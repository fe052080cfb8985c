use std::future::Future;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt, TryFutureExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use warp::filters::ws::{Message, WebSocket};
use warp::Filter;

use crate::api::{Command, Reply};
use crate::dispatch::Dispatcher;
use crate::Result;

/// # Liftman Webservice
/// Websocket based service that provides remote elevator control.
///
/// Each connection
/// 1. Receives text commands and answers each with one line
/// 2. Is sent a car snapshot on connect and whenever the car changes
pub fn routes(
    dispatcher: Dispatcher,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let dispatcher = warp::any().map(move || dispatcher.clone());

    warp::path("elevator")
        .and(warp::ws())
        .and(dispatcher)
        .map(|ws: warp::ws::Ws, dispatcher| {
            ws.on_upgrade(|websocket| connection(websocket, dispatcher))
        })
}

/// Binds the service and returns the bound address along with the server
/// future, which completes after `shutdown` resolves.
pub fn bind(
    addr: impl Into<SocketAddr> + 'static,
    dispatcher: Dispatcher,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>)> {
    let bound = warp::serve(routes(dispatcher)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    Ok(bound)
}

fn respond(dispatcher: &Dispatcher, text: &str) -> Reply {
    match text.parse::<Command>() {
        Ok(cmd) => dispatcher.handle(cmd),
        Err(e) => Reply::Rejected(e.to_string()),
    }
}

async fn connection(websocket: WebSocket, dispatcher: Dispatcher) {
    let (mut ws_tx, mut from_client) = websocket.split();
    let (to_client, rx) = mpsc::unbounded_channel();

    info!("client connected");

    let mut rx = UnboundedReceiverStream::new(rx);
    tokio::task::spawn(async move {
        while let Some(message) = rx.next().await {
            ws_tx
                .send(message)
                .unwrap_or_else(|e| {
                    error!("websocket send error: {}", e);
                })
                .await;
        }
    });

    let mut car = dispatcher.controller().subscribe();
    let initial = Message::text(car.borrow_and_update().to_string());
    if to_client.send(initial).is_err() {
        return;
    }

    let updates = to_client.clone();
    let watcher = tokio::task::spawn(async move {
        while car.changed().await.is_ok() {
            let snapshot = *car.borrow_and_update();
            if updates.send(Message::text(snapshot.to_string())).is_err() {
                break;
            }
        }
    });

    while let Some(result) = from_client.next().await {
        match result {
            Ok(msg) if msg.is_text() => {
                let text = msg.to_str().unwrap_or_default();
                let reply = respond(&dispatcher, text);
                debug!("{:?} => {}", text, reply);
                if to_client.send(Message::text(reply.to_string())).is_err() {
                    break;
                }
            }
            Ok(msg) if msg.is_close() => break,
            Err(e) => {
                warn!("websocket receive error: {}", e);
                break;
            }
            _ => debug!("unsupported message type"),
        };
    }

    watcher.abort();
    info!("client disconnected");
}
