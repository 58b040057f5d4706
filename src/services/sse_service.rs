//! Bridges per-game broadcast channels into SSE responses.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{dto::events::ServerEvent, state::SharedState};

/// Subscribe to a game's general events channel.
pub fn subscribe_events(state: &SharedState, game_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.fanout().channels(game_id).events().subscribe()
}

/// Subscribe to a game's TV-only answer-progress channel.
pub fn subscribe_tv(state: &SharedState, game_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.fanout().channels(game_id).tv().subscribe()
}

/// Identifies the stream for disconnect logging.
#[derive(Clone, Copy)]
pub enum StreamKind {
    /// General game-events stream.
    Events(Uuid),
    /// TV answer-progress stream.
    Tv(Uuid),
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects or the game's channels are dropped.
///
/// A lagged receiver skips what it missed and stays subscribed; the client is
/// expected to re-baseline from the snapshot endpoint, not to replay events.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Events(game_id) => {
                tracing::info!(%game_id, "game events SSE stream disconnected")
            }
            StreamKind::Tv(game_id) => {
                tracing::info!(%game_id, "TV SSE stream disconnected")
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
