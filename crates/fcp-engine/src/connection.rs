//! Connection ownership and message demultiplexing.
//!
//! An [`FcpConnection`] owns exactly one socket to one node. A single
//! background task is the sole reader: it decodes one message at a time
//! (payloads are drained into a spool before dispatch, so framing never
//! depends on observer behavior) and fans each message out to every
//! registered listener in registration order.

use crate::counters::MessageCounters;
use crate::error::{CloseReason, Error};
use crate::listener::{FcpListener, ListenerRegistry};
use fcp_proto::{codec, FcpMessage, FcpReply};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};

/// A client connection to a node's FCP port.
///
/// At most one socket is live per instance: [`connect`](Self::connect)
/// fails when already connected, [`close`](Self::close) is idempotent and
/// safe from any task. A closed connection may be connected again; callers
/// wanting retry semantics usually open a fresh connection per attempt.
pub struct FcpConnection {
    host: String,
    port: u16,
    state: Arc<Mutex<ConnState>>,
    registry: Arc<ListenerRegistry>,
    counters: MessageCounters,
}

#[derive(Default)]
struct ConnState {
    writer: Option<OwnedWriteHalf>,
    close_tx: Option<oneshot::Sender<()>>,
}

impl FcpConnection {
    /// Create an unconnected connection to `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_counters(host, port, MessageCounters::new())
    }

    /// Create an unconnected connection recording receipts into an
    /// externally supplied counter set.
    pub fn with_counters(host: impl Into<String>, port: u16, counters: MessageCounters) -> Self {
        Self {
            host: host.into(),
            port,
            state: Arc::new(Mutex::new(ConnState::default())),
            registry: Arc::new(ListenerRegistry::default()),
            counters,
        }
    }

    /// The node's hostname.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The node's FCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The receipt counters this connection records into.
    pub fn counters(&self) -> &MessageCounters {
        &self.counters
    }

    /// Open the socket and start the receive loop.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyConnected`] if a socket is already live, or the
    /// connect-time I/O error.
    pub async fn connect(&self) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if state.writer.is_some() {
            return Err(Error::AlreadyConnected);
        }
        tracing::info!(host = %self.host, port = self.port, "connecting");
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let (read_half, write_half) = stream.into_split();
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(receive_loop(
            read_half,
            self.state.clone(),
            self.registry.clone(),
            self.counters.clone(),
            close_rx,
        ));
        state.writer = Some(write_half);
        state.close_tx = Some(close_tx);
        Ok(())
    }

    /// Whether no socket is currently live.
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.writer.is_none()
    }

    /// Serialize and write one message.
    ///
    /// Writes are atomic with respect to concurrent senders: the full
    /// encoding goes out under one lock, so two messages' bytes never
    /// interleave.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] when no socket is live, or the write error.
    pub async fn send_message(&self, message: &FcpMessage) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let writer = state.writer.as_mut().ok_or(Error::NotConnected)?;
        tracing::debug!(name = %message.name(), "sending message");
        writer.write_all(&codec::encode(message)).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Register a listener. It sees every message received after this call
    /// returns.
    pub fn add_listener(&self, listener: Arc<dyn FcpListener>) {
        self.registry.add(listener);
    }

    /// Unregister a listener; idempotent.
    pub fn remove_listener(&self, listener: &Arc<dyn FcpListener>) {
        self.registry.remove(listener);
    }

    pub(crate) fn remove_listener_addr(&self, addr: usize) {
        self.registry.remove_addr(addr);
    }

    /// Close the connection.
    ///
    /// Signals the receive loop (whose exit is what raises
    /// connection-closed to the listeners, exactly once) and shuts the
    /// socket down. Idempotent; a no-op when not connected.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let Some(close_tx) = state.close_tx.take() {
            let _ = close_tx.send(());
        }
        if let Some(mut writer) = state.writer.take() {
            tracing::info!(host = %self.host, port = self.port, "closing connection");
            let _ = writer.shutdown().await;
        }
    }
}

impl Drop for FcpConnection {
    fn drop(&mut self) {
        // Best effort: the writer half drops with the state, which closes
        // the socket; the loop then observes EOF or the close signal.
        if let Ok(mut state) = self.state.try_lock() {
            if let Some(close_tx) = state.close_tx.take() {
                let _ = close_tx.send(());
            }
            state.writer.take();
        }
    }
}

/// The single background reader of one socket.
///
/// Decodes one message at a time, counts it, classifies it, and dispatches
/// it to a stable snapshot of the listener set in registration order. Exits
/// on the close signal or the first transport/decode error. On the way out
/// it first tears the connection state down (so `is_closed` reports closed
/// and further sends fail with `NotConnected`), then notifies every
/// listener's connection-closed hook exactly once.
async fn receive_loop(
    read_half: OwnedReadHalf,
    state: Arc<Mutex<ConnState>>,
    registry: Arc<ListenerRegistry>,
    counters: MessageCounters,
    mut close_rx: oneshot::Receiver<()>,
) {
    let mut reader = BufReader::new(read_half);
    let reason = loop {
        tokio::select! {
            _ = &mut close_rx => break CloseReason::Local,
            decoded = codec::read_message(&mut reader) => match decoded {
                Ok(received) => {
                    counters.record(received.message.name());
                    tracing::debug!(name = %received.message.name(), "message received");
                    let reply = FcpReply::classify(received);
                    for listener in registry.snapshot() {
                        listener.message_received(&reply).await;
                    }
                }
                Err(cause) => {
                    tracing::warn!(error = %cause, "receive loop terminating");
                    break CloseReason::Error(Arc::new(Error::Codec(cause)));
                }
            }
        }
    };
    // State teardown precedes notification: a listener registered after the
    // closed-notification snapshot can no longer send into the dead socket,
    // so it always observes either the notification or a NotConnected send.
    {
        let mut state = state.lock().await;
        state.close_tx.take();
        if let Some(mut writer) = state.writer.take() {
            let _ = writer.shutdown().await;
        }
    }
    for listener in registry.snapshot() {
        listener.connection_closed(&reason).await;
    }
    tracing::debug!("receive loop exited");
}
