//! The reply correlator.
//!
//! A dialog bridges the connection's push/broadcast observer model to a
//! single-result asynchronous completion: it sends one request, observes
//! every message the connection receives, routes each to a per-kind hook on
//! its handler, and resolves its result handle exactly once: when the
//! handler's completion predicate becomes true, or when the connection
//! closes.
//!
//! State machine: `created → sent → (observing)* → resolved`, with no
//! transition out of `resolved`.

use crate::connection::FcpConnection;
use crate::error::{CloseReason, DialogError, Error};
use crate::listener::FcpListener;
use async_trait::async_trait;
use fcp_proto::messages::{
    AllData, CloseConnectionDuplicateClientName, ConfigData, DataFound, EndListPeerNotes,
    EndListPeers, GetFailed, IdentifierCollision, NodeData, NodeHello, Peer, PeerNote,
    PeerRemoved, ProtocolError, PutFailed, PutFetchable, PutSuccessful, SimpleProgress,
    SskKeypair, TestDdaComplete, TestDdaReply, UnknownNodeIdentifier, UriGenerated,
};
use fcp_proto::{FcpMessage, FcpReply};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Messages a hook queues for transmission.
///
/// Hooks run synchronously on the receive task; anything they queue here is
/// written to the connection by the engine right after the hook returns.
/// This is how the direct-disk-access handshake answers challenges from
/// inside a hook.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<FcpMessage>,
}

impl Outbox {
    /// Queue a message for sending.
    pub fn send(&mut self, message: FcpMessage) {
        self.queued.push(message);
    }
}

/// Per-operation logic plugged into an [`FcpDialog`].
///
/// Override only the hooks relevant to the operation; the rest default to
/// no-ops. After every hook the engine re-evaluates
/// [`is_finished`](Self::is_finished) and, once true, captures
/// [`result`](Self::result) and resolves the dialog's handle.
///
/// Identifier isolation is this trait's contract, not the engine's: every
/// listener sees every message, so hooks must ignore messages bearing an
/// identifier the operation did not issue.
#[allow(unused_variables)]
pub trait DialogHandler: Send + 'static {
    /// The value the dialog resolves with.
    type Output: Send + 'static;

    /// The completion predicate.
    fn is_finished(&self) -> bool;

    /// The result captured when the predicate becomes true.
    fn result(&mut self) -> Self::Output;

    /// `NodeHello` hook.
    fn on_node_hello(&mut self, message: &NodeHello, out: &mut Outbox) {}
    /// `CloseConnectionDuplicateClientName` hook.
    fn on_close_connection_duplicate_client_name(
        &mut self,
        message: &CloseConnectionDuplicateClientName,
        out: &mut Outbox,
    ) {
    }
    /// `SSKKeypair` hook.
    fn on_ssk_keypair(&mut self, message: &SskKeypair, out: &mut Outbox) {}
    /// `ProtocolError` hook.
    fn on_protocol_error(&mut self, message: &ProtocolError, out: &mut Outbox) {}
    /// `IdentifierCollision` hook.
    fn on_identifier_collision(&mut self, message: &IdentifierCollision, out: &mut Outbox) {}
    /// `UnknownNodeIdentifier` hook.
    fn on_unknown_node_identifier(&mut self, message: &UnknownNodeIdentifier, out: &mut Outbox) {}
    /// `Peer` hook.
    fn on_peer(&mut self, message: &Peer, out: &mut Outbox) {}
    /// `EndListPeers` hook.
    fn on_end_list_peers(&mut self, message: &EndListPeers, out: &mut Outbox) {}
    /// `PeerNote` hook.
    fn on_peer_note(&mut self, message: &PeerNote, out: &mut Outbox) {}
    /// `EndListPeerNotes` hook.
    fn on_end_list_peer_notes(&mut self, message: &EndListPeerNotes, out: &mut Outbox) {}
    /// `PeerRemoved` hook.
    fn on_peer_removed(&mut self, message: &PeerRemoved, out: &mut Outbox) {}
    /// `NodeData` hook.
    fn on_node_data(&mut self, message: &NodeData, out: &mut Outbox) {}
    /// `ConfigData` hook.
    fn on_config_data(&mut self, message: &ConfigData, out: &mut Outbox) {}
    /// `TestDDAReply` hook.
    fn on_test_dda_reply(&mut self, message: &TestDdaReply, out: &mut Outbox) {}
    /// `TestDDAComplete` hook.
    fn on_test_dda_complete(&mut self, message: &TestDdaComplete, out: &mut Outbox) {}
    /// `URIGenerated` hook.
    fn on_uri_generated(&mut self, message: &UriGenerated, out: &mut Outbox) {}
    /// `DataFound` hook.
    fn on_data_found(&mut self, message: &DataFound, out: &mut Outbox) {}
    /// `AllData` hook.
    fn on_all_data(&mut self, message: &AllData, out: &mut Outbox) {}
    /// `GetFailed` hook.
    fn on_get_failed(&mut self, message: &GetFailed, out: &mut Outbox) {}
    /// `PutFailed` hook.
    fn on_put_failed(&mut self, message: &PutFailed, out: &mut Outbox) {}
    /// `PutSuccessful` hook.
    fn on_put_successful(&mut self, message: &PutSuccessful, out: &mut Outbox) {}
    /// `PutFetchable` hook.
    fn on_put_fetchable(&mut self, message: &PutFetchable, out: &mut Outbox) {}
    /// `SimpleProgress` hook.
    fn on_simple_progress(&mut self, message: &SimpleProgress, out: &mut Outbox) {}
    /// Catch-all for message kinds without a dedicated hook.
    fn on_unrecognized(&mut self, message: &FcpMessage, out: &mut Outbox) {}
}

/// A reply correlator scoped to one logical operation.
pub struct FcpDialog<H: DialogHandler> {
    inner: Arc<DialogInner<H>>,
}

struct DialogInner<H: DialogHandler> {
    connection: Arc<FcpConnection>,
    handler: Mutex<H>,
    result_tx: Mutex<Option<oneshot::Sender<Result<H::Output, DialogError>>>>,
    finished: AtomicBool,
}

/// The single-resolution result handle returned by
/// [`FcpDialog::send`].
///
/// Resolves with the handler's result, or with a [`DialogError`] when the
/// connection closes or the dialog is abandoned; it never hangs past
/// connection teardown.
#[derive(Debug)]
pub struct DialogHandle<T> {
    result_rx: oneshot::Receiver<Result<T, DialogError>>,
}

impl<T> DialogHandle<T> {
    /// Wait for the dialog to resolve.
    pub async fn wait(self) -> Result<T, DialogError> {
        match self.result_rx.await {
            Ok(result) => result,
            Err(_) => Err(DialogError::Abandoned),
        }
    }
}

impl<H: DialogHandler> FcpDialog<H> {
    /// Create a dialog over the given connection.
    pub fn new(connection: Arc<FcpConnection>, handler: H) -> Self {
        Self {
            inner: Arc::new(DialogInner {
                connection,
                handler: Mutex::new(handler),
                result_tx: Mutex::new(None),
                finished: AtomicBool::new(false),
            }),
        }
    }

    /// Register this dialog as an observer, then send the request.
    ///
    /// Registration happens before the write completes, so a reply arriving
    /// immediately after the node receives the request cannot be missed.
    ///
    /// # Errors
    ///
    /// The synchronous send failure, e.g. [`Error::NotConnected`]. The
    /// dialog unregisters itself on failure.
    pub async fn send(&self, message: FcpMessage) -> Result<DialogHandle<H::Output>, Error> {
        let (result_tx, result_rx) = oneshot::channel();
        *self.inner.result_tx.lock().unwrap() = Some(result_tx);
        let listener: Arc<dyn FcpListener> = self.inner.clone();
        self.inner.connection.add_listener(listener);
        if let Err(send_error) = self.inner.connection.send_message(&message).await {
            self.inner.unregister();
            return Err(send_error);
        }
        Ok(DialogHandle { result_rx })
    }

    /// Abandon the dialog.
    ///
    /// Unregisters it so it stops consuming resources; an unresolved handle
    /// resolves with [`DialogError::Abandoned`]. The node-side request is
    /// not aborted. Safe after resolution and safe to call repeatedly.
    pub fn close(&self) {
        self.inner.abandon();
    }
}

impl<H: DialogHandler> DialogInner<H> {
    /// Resolve exactly once. Later calls are no-ops.
    fn finish(&self, result: Result<H::Output, DialogError>) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(result_tx) = self.result_tx.lock().unwrap().take() {
            let _ = result_tx.send(result);
        }
        self.unregister();
    }

    fn abandon(&self) {
        if self.finished.swap(true, Ordering::SeqCst) {
            self.unregister();
            return;
        }
        if let Some(result_tx) = self.result_tx.lock().unwrap().take() {
            let _ = result_tx.send(Err(DialogError::Abandoned));
        }
        self.unregister();
    }

    fn unregister(&self) {
        let addr = self as *const Self as *const () as usize;
        self.connection.remove_listener_addr(addr);
    }
}

#[async_trait]
impl<H: DialogHandler> FcpListener for DialogInner<H> {
    async fn message_received(&self, reply: &FcpReply) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        let mut out = Outbox::default();
        let finished = {
            let mut handler = self.handler.lock().unwrap();
            dispatch(&mut *handler, reply, &mut out);
            handler.is_finished()
        };
        for message in out.queued {
            if let Err(send_error) = self.connection.send_message(&message).await {
                tracing::warn!(error = %send_error, "queued dialog message not sent");
            }
        }
        if finished {
            let result = self.handler.lock().unwrap().result();
            self.finish(Ok(result));
        }
    }

    async fn connection_closed(&self, reason: &CloseReason) {
        self.finish(Err(DialogError::ConnectionClosed(reason.clone())));
    }
}

/// Route a classified reply to its hook.
fn dispatch<H: DialogHandler>(handler: &mut H, reply: &FcpReply, out: &mut Outbox) {
    match reply {
        FcpReply::NodeHello(m) => handler.on_node_hello(m, out),
        FcpReply::CloseConnectionDuplicateClientName(m) => {
            handler.on_close_connection_duplicate_client_name(m, out)
        }
        FcpReply::SskKeypair(m) => handler.on_ssk_keypair(m, out),
        FcpReply::ProtocolError(m) => handler.on_protocol_error(m, out),
        FcpReply::IdentifierCollision(m) => handler.on_identifier_collision(m, out),
        FcpReply::UnknownNodeIdentifier(m) => handler.on_unknown_node_identifier(m, out),
        FcpReply::Peer(m) => handler.on_peer(m, out),
        FcpReply::EndListPeers(m) => handler.on_end_list_peers(m, out),
        FcpReply::PeerNote(m) => handler.on_peer_note(m, out),
        FcpReply::EndListPeerNotes(m) => handler.on_end_list_peer_notes(m, out),
        FcpReply::PeerRemoved(m) => handler.on_peer_removed(m, out),
        FcpReply::NodeData(m) => handler.on_node_data(m, out),
        FcpReply::ConfigData(m) => handler.on_config_data(m, out),
        FcpReply::TestDdaReply(m) => handler.on_test_dda_reply(m, out),
        FcpReply::TestDdaComplete(m) => handler.on_test_dda_complete(m, out),
        FcpReply::UriGenerated(m) => handler.on_uri_generated(m, out),
        FcpReply::DataFound(m) => handler.on_data_found(m, out),
        FcpReply::AllData(m) => handler.on_all_data(m, out),
        FcpReply::GetFailed(m) => handler.on_get_failed(m, out),
        FcpReply::PutFailed(m) => handler.on_put_failed(m, out),
        FcpReply::PutSuccessful(m) => handler.on_put_successful(m, out),
        FcpReply::PutFetchable(m) => handler.on_put_fetchable(m, out),
        FcpReply::SimpleProgress(m) => handler.on_simple_progress(m, out),
        FcpReply::Unrecognized(m) => handler.on_unrecognized(m, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcp_proto::ReceivedMessage;

    fn classify(message: FcpMessage) -> FcpReply {
        FcpReply::classify(ReceivedMessage {
            message,
            payload: None,
        })
    }

    /// Finishes when a message with the expected name has been observed.
    struct ExpectName {
        expected: &'static str,
        seen: Option<String>,
    }

    impl DialogHandler for ExpectName {
        type Output = Option<String>;

        fn is_finished(&self) -> bool {
            self.seen.as_deref() == Some(self.expected)
        }

        fn result(&mut self) -> Self::Output {
            self.seen.take()
        }

        fn on_ssk_keypair(&mut self, message: &SskKeypair, _out: &mut Outbox) {
            self.seen = Some(message.get("Name").unwrap_or("SSKKeypair").to_string());
        }

        fn on_unrecognized(&mut self, message: &FcpMessage, _out: &mut Outbox) {
            self.seen = Some(message.name().to_string());
        }
    }

    fn unconnected_dialog(expected: &'static str) -> FcpDialog<ExpectName> {
        let connection = Arc::new(FcpConnection::new("localhost", fcp_proto::DEFAULT_PORT));
        FcpDialog::new(
            connection,
            ExpectName {
                expected,
                seen: None,
            },
        )
    }

    #[tokio::test]
    async fn test_send_fails_synchronously_when_not_connected() {
        let dialog = unconnected_dialog("SSKKeypair");
        let err = dialog.send(FcpMessage::new("GenerateSSK")).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_hook_dispatch_reaches_matching_hook() {
        let dialog = unconnected_dialog("SSKKeypair");
        dialog
            .inner
            .message_received(&classify(FcpMessage::new("SSKKeypair")))
            .await;
        assert!(dialog.inner.handler.lock().unwrap().is_finished());
    }

    #[tokio::test]
    async fn test_unrecognized_hook_is_the_catch_all() {
        let dialog = unconnected_dialog("SomeFutureMessage");
        dialog
            .inner
            .message_received(&classify(FcpMessage::new("SomeFutureMessage")))
            .await;
        assert!(dialog.inner.handler.lock().unwrap().is_finished());
    }

    #[tokio::test]
    async fn test_resolution_is_at_most_once() {
        let dialog = unconnected_dialog("SSKKeypair");
        let (result_tx, result_rx) = oneshot::channel();
        *dialog.inner.result_tx.lock().unwrap() = Some(result_tx);
        dialog
            .inner
            .message_received(&classify(FcpMessage::new("SSKKeypair")))
            .await;
        // A second matching message after resolution is not delivered.
        dialog
            .inner
            .message_received(&classify(FcpMessage::new("SSKKeypair")))
            .await;
        let handle = DialogHandle { result_rx };
        assert_eq!(handle.wait().await.unwrap(), Some("SSKKeypair".to_string()));
        assert!(dialog.inner.finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connection_closed_resolves_with_failure() {
        let dialog = unconnected_dialog("SSKKeypair");
        let (result_tx, result_rx) = oneshot::channel();
        *dialog.inner.result_tx.lock().unwrap() = Some(result_tx);
        dialog.inner.connection_closed(&CloseReason::Local).await;
        let handle = DialogHandle { result_rx };
        assert!(matches!(
            handle.wait().await,
            Err(DialogError::ConnectionClosed(CloseReason::Local))
        ));
    }

    #[tokio::test]
    async fn test_close_resolves_unfinished_dialog_as_abandoned() {
        let dialog = unconnected_dialog("SSKKeypair");
        let (result_tx, result_rx) = oneshot::channel();
        *dialog.inner.result_tx.lock().unwrap() = Some(result_tx);
        dialog.close();
        dialog.close();
        let handle = DialogHandle { result_rx };
        assert!(matches!(handle.wait().await, Err(DialogError::Abandoned)));
    }
}
