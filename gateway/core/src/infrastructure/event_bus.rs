// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Access Events
//
// In-memory fan-out of access decisions using tokio broadcast channels.
// Audit sinks subscribe; publishing never blocks a request and events are
// dropped when nobody listens.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::AccessEvent;

/// Event bus for publishing and subscribing to access events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AccessEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish(&self, event: AccessEvent) {
        debug!("Publishing access event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to access event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Receiver for all access events
pub struct EventReceiver {
    receiver: broadcast::Receiver<AccessEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<AccessEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
