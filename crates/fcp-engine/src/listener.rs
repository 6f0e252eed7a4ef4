//! Connection observers and their registry.

use crate::error::CloseReason;
use async_trait::async_trait;
use fcp_proto::FcpReply;
use std::sync::{Arc, Mutex};

/// An observer registered on a connection.
///
/// Every listener sees every incoming message and the connection-closed
/// event; correlation by identifier is the listener's own job. Hook
/// invocations for one connection are serialized on its receive task, so a
/// listener never observes two calls concurrently.
#[async_trait]
pub trait FcpListener: Send + Sync {
    /// Called for every message the connection receives, in arrival order.
    async fn message_received(&self, reply: &FcpReply);

    /// Called exactly once when the connection's receive loop exits.
    async fn connection_closed(&self, reason: &CloseReason);
}

/// The observer set of one connection.
///
/// Listeners are identified by `Arc` pointer identity so removal is
/// idempotent. Dispatch iterates over a snapshot, so a listener removing
/// itself (or adding others) from inside a callback never disturbs the pass
/// in progress.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn FcpListener>>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&self, listener: Arc<dyn FcpListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    pub(crate) fn remove(&self, listener: &Arc<dyn FcpListener>) {
        self.remove_addr(Arc::as_ptr(listener) as *const () as usize);
    }

    /// Remove by allocation address. Lets a listener unregister itself from
    /// a context where only `&self` is available.
    pub(crate) fn remove_addr(&self, addr: usize) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|l| Arc::as_ptr(l) as *const () as usize != addr);
    }

    /// A stable snapshot for one dispatch pass, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn FcpListener>> {
        self.listeners.lock().unwrap().clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopListener;

    #[async_trait]
    impl FcpListener for NoopListener {
        async fn message_received(&self, _reply: &FcpReply) {}
        async fn connection_closed(&self, _reason: &CloseReason) {}
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = ListenerRegistry::default();
        let listener: Arc<dyn FcpListener> = Arc::new(NoopListener);
        registry.add(listener.clone());
        assert_eq!(registry.len(), 1);
        registry.remove(&listener);
        registry.remove(&listener);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_snapshot_is_stable_across_removal() {
        let registry = ListenerRegistry::default();
        let first: Arc<dyn FcpListener> = Arc::new(NoopListener);
        let second: Arc<dyn FcpListener> = Arc::new(NoopListener);
        registry.add(first.clone());
        registry.add(second.clone());
        let snapshot = registry.snapshot();
        registry.remove(&first);
        // The in-progress pass still sees both listeners.
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_instances_have_distinct_identity() {
        let registry = ListenerRegistry::default();
        let first: Arc<dyn FcpListener> = Arc::new(NoopListener);
        let second: Arc<dyn FcpListener> = Arc::new(NoopListener);
        registry.add(first.clone());
        registry.add(second);
        registry.remove(&first);
        assert_eq!(registry.len(), 1);
    }
}
