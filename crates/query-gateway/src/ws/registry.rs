//! Registry of live push connections.

use crate::domain::correlation::CorrelationId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("connection limit reached ({max})")]
    Full { max: usize },
}

/// `connection id -> outbound sender`.
pub struct ConnectionRegistry {
    connections: DashMap<CorrelationId, mpsc::Sender<String>>,
    /// Slots taken, reserved before the insert so the cap holds under races.
    active: AtomicUsize,
    max_connections: usize,
    buffer_size: usize,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize, buffer_size: usize) -> Self {
        Self {
            connections: DashMap::new(),
            active: AtomicUsize::new(0),
            max_connections,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Add a connection and hand back the receiving end of its queue.
    pub fn register(&self) -> Result<(CorrelationId, mpsc::Receiver<String>), RegistryError> {
        let max = self.max_connections;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .map_err(|_| RegistryError::Full { max })?;

        let id = CorrelationId::new();
        let (tx, rx) = mpsc::channel(self.buffer_size);
        self.connections.insert(id, tx);
        Ok((id, rx))
    }

    pub fn remove(&self, id: &CorrelationId) -> bool {
        let removed = self.connections.remove(id).is_some();
        if removed {
            self.active.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Queue `message` on every connection; returns how many accepted it.
    ///
    /// Connections whose receiver is gone are dropped. A connection with a
    /// full queue misses this message but stays registered.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.connections.iter() {
            match entry.value().try_send(message.to_owned()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(connection_id = %entry.key(), "Push queue full, message skipped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // Removing while iterating would deadlock the shard.
        for id in closed {
            self.remove(&id);
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_every_connection() {
        let registry = ConnectionRegistry::new(8, 4);
        let (_, mut a) = registry.register().unwrap();
        let (_, mut b) = registry.register().unwrap();

        assert_eq!(registry.broadcast("tip"), 2);
        assert_eq!(a.recv().await.as_deref(), Some("tip"));
        assert_eq!(b.recv().await.as_deref(), Some("tip"));
    }

    #[test]
    fn test_closed_receiver_is_removed() {
        let registry = ConnectionRegistry::new(8, 4);
        let (_, rx) = registry.register().unwrap();
        let (_, _kept) = registry.register().unwrap();
        drop(rx);

        assert_eq!(registry.broadcast("tip"), 1);
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let registry = ConnectionRegistry::new(1, 4);
        let (id, _rx) = registry.register().unwrap();
        assert_eq!(registry.register().unwrap_err(), RegistryError::Full { max: 1 });

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.register().is_ok());
    }

    #[test]
    fn test_concurrent_registration_respects_cap() {
        let registry = std::sync::Arc::new(ConnectionRegistry::new(4, 1));
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                let barrier = std::sync::Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.register().map(|(_, rx)| rx)
                })
            })
            .collect();

        let accepted: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap().ok())
            .collect();

        assert_eq!(accepted.len(), 4);
        assert_eq!(registry.connection_count(), 4);
    }

    #[test]
    fn test_pruned_connection_frees_slot() {
        let registry = ConnectionRegistry::new(1, 1);
        let (_, rx) = registry.register().unwrap();
        drop(rx);
        assert_eq!(registry.broadcast("tip"), 0);
        assert!(registry.register().is_ok());
    }

    #[test]
    fn test_full_queue_keeps_connection() {
        let registry = ConnectionRegistry::new(4, 1);
        let (_, _rx) = registry.register().unwrap();
        assert_eq!(registry.broadcast("one"), 1);
        assert_eq!(registry.broadcast("two"), 0);
        assert_eq!(registry.connection_count(), 1);
    }
}
