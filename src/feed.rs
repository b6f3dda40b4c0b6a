//! Per-subscription WebSocket client: connect, keepalive, reconnect.
//!
//! One `FeedConnection` owns one streaming connection to one named search
//! subscription. It translates incoming frames into alerts and pushes them to
//! the shared queue. A connection that stays silent past its keepalive
//! timeout is treated as dead, force-closed, and reopened; failures are never
//! allowed to escape to sibling connections.

use crate::queue::AlertQueue;
use crate::translate;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Duration};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Lifecycle states of one feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Connecting,
    Live,
    Stale,
    Reconnecting,
    Closed,
}

/// Why a read loop over one socket ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketOutcome {
    /// The shutdown signal fired.
    Shutdown,
    /// No frame arrived within the keepalive timeout; the socket is presumed
    /// dead even if it is technically still open.
    Stale,
    /// The server closed the connection or the read errored.
    Disconnected,
}

/// Trait seam over the socket read side so tests can substitute fakes.
#[async_trait]
pub trait FeedSocket: Send {
    /// Reads the next frame, or `None` once the connection is closed.
    async fn read_message(&mut self) -> Option<Result<Message, WsError>>;
}

/// Produces one socket per connection attempt. The seam over the connect
/// side, so tests can drive the reconnect loop without a network.
#[async_trait]
pub trait FeedConnector: Send {
    async fn connect(&mut self, ws_uri: &str) -> Result<Box<dyn FeedSocket>>;
}

struct TungsteniteSocket {
    read: futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[async_trait]
impl FeedSocket for TungsteniteSocket {
    async fn read_message(&mut self) -> Option<Result<Message, WsError>> {
        self.read.next().await
    }
}

struct TungsteniteConnector;

#[async_trait]
impl FeedConnector for TungsteniteConnector {
    async fn connect(&mut self, ws_uri: &str) -> Result<Box<dyn FeedSocket>> {
        let (ws_stream, _) = connect_async(ws_uri).await?;
        let (_, read) = ws_stream.split();
        Ok(Box::new(TungsteniteSocket { read }))
    }
}

/// One streaming connection to one named search subscription.
pub struct FeedConnection {
    name: String,
    ws_uri: String,
    keepalive: Duration,
    retry: Duration,
    queue: Arc<AlertQueue>,
    status_tx: watch::Sender<FeedStatus>,
}

impl FeedConnection {
    pub fn new(
        name: String,
        ws_uri: String,
        keepalive: Duration,
        retry: Duration,
        queue: Arc<AlertQueue>,
    ) -> Self {
        let (status_tx, _) = watch::channel(FeedStatus::Connecting);
        Self {
            name,
            ws_uri,
            keepalive,
            retry,
            queue,
            status_tx,
        }
    }

    /// A watch on this connection's lifecycle state, so callers and tests
    /// can observe every transition.
    pub fn status_watch(&self) -> watch::Receiver<FeedStatus> {
        self.status_tx.subscribe()
    }

    /// Runs the connection until shutdown, reopening it forever on failure.
    ///
    /// Each failed or stale connection waits exactly the retry timeout before
    /// the next attempt; there is no maximum attempt count. Once this returns
    /// the connection is `Closed` and pushes nothing further.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) {
        self.run_with_connector(Box::new(TungsteniteConnector), shutdown_rx)
            .await
    }

    /// Same reconnect loop as [`run`](Self::run), with an injectable connect
    /// path so tests can script connection failures and silences.
    pub async fn run_with_connector(
        mut self,
        mut connector: Box<dyn FeedConnector>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            self.transition(FeedStatus::Connecting);

            let connected = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    self.transition(FeedStatus::Closed);
                    return;
                }
                res = connector.connect(&self.ws_uri) => res,
            };

            match connected {
                Ok(socket) => {
                    self.transition(FeedStatus::Live);
                    match self.read_until_dead(socket, &mut shutdown_rx).await {
                        SocketOutcome::Shutdown => {
                            self.transition(FeedStatus::Closed);
                            return;
                        }
                        SocketOutcome::Stale => {
                            // Never trust a silent socket: dropping the stream
                            // force-closes it before we reconnect.
                            self.transition(FeedStatus::Stale);
                            warn!(
                                feed = %self.name,
                                silence_secs = self.keepalive.as_secs_f64(),
                                "No frame within keepalive window, closing connection"
                            );
                        }
                        SocketOutcome::Disconnected => {}
                    }
                }
                Err(e) => {
                    warn!(feed = %self.name, error = %e, "Connection attempt failed");
                }
            }

            self.transition(FeedStatus::Reconnecting);
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    self.transition(FeedStatus::Closed);
                    return;
                }
                _ = sleep(self.retry) => {}
            }
        }
    }

    /// Processes frames from one socket until it dies, goes silent, or
    /// shutdown fires. Public so tests can drive the connection with a fake
    /// socket; no reconnection happens at this level.
    pub async fn read_until_dead(
        &mut self,
        mut socket: Box<dyn FeedSocket>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> SocketOutcome {
        loop {
            let frame = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => return SocketOutcome::Shutdown,
                res = timeout(self.keepalive, socket.read_message()) => res,
            };

            // Any frame counts as liveness; the timeout re-arms per read.
            match frame {
                Err(_elapsed) => return SocketOutcome::Stale,
                Ok(Some(Ok(Message::Text(text)))) => self.handle_text(&text),
                Ok(Some(Ok(Message::Binary(_)))) => {
                    debug!(feed = %self.name, "Received binary frame, ignoring");
                }
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {
                    debug!(feed = %self.name, "Received ping/pong frame");
                }
                Ok(Some(Ok(Message::Close(_)))) => {
                    info!(feed = %self.name, "Server closed the connection");
                    return SocketOutcome::Disconnected;
                }
                Ok(Some(Ok(Message::Frame(_)))) => {
                    debug!(feed = %self.name, "Received raw frame, ignoring");
                }
                Ok(Some(Err(e))) => {
                    warn!(feed = %self.name, error = %e, "WebSocket read error");
                    return SocketOutcome::Disconnected;
                }
                Ok(None) => {
                    info!(feed = %self.name, "WebSocket stream ended");
                    return SocketOutcome::Disconnected;
                }
            }
        }
    }

    /// A malformed frame is dropped with a warning; it never tears down the
    /// connection.
    fn handle_text(&self, text: &str) {
        match translate::translate(&self.name, text) {
            Ok(Some(alert)) => {
                debug!(feed = %self.name, category = %alert.category, "Queued alert");
                self.queue.push(alert);
            }
            Ok(None) => {
                debug!(feed = %self.name, "Control frame, nothing to queue");
            }
            Err(e) => {
                warn!(feed = %self.name, error = %e, "Failed to translate feed frame, dropping");
            }
        }
    }

    fn transition(&mut self, next: FeedStatus) {
        let current = *self.status_tx.borrow();
        if current != next {
            info!(feed = %self.name, from = ?current, to = ?next, "Feed state transition");
            self.status_tx.send_replace(next);
        }
    }
}
