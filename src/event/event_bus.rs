// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast bus for assistant events.

use tokio::sync::broadcast::{self, error::RecvError};

use super::AssistantEvent;

/// Fan-out of [`AssistantEvent`]s to front-ends.
///
/// Clones publish into the same channel. Publishing never blocks; a
/// subscriber more than [`EventBus::DEFAULT_CAPACITY`] events behind skips
/// the oldest ones (see [`next_event`]).
///
/// # Examples
///
/// ```
/// use relaylink::event::{AssistantEvent, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(AssistantEvent::Spoke { text: "Hi".to_string() });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AssistantEvent>,
}

impl EventBus {
    /// Events buffered per subscriber.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a bus buffering [`Self::DEFAULT_CAPACITY`] events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a bus buffering `capacity` events (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.tx.subscribe()
    }

    /// Returns how many receivers are listening.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publishes `event`. With nobody listening it is dropped.
    pub fn publish(&self, event: AssistantEvent) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            tracing::trace!(?event, "No subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives the next event, skipping over a lag.
///
/// Returns `None` once every [`EventBus`] clone is gone.
pub async fn next_event(rx: &mut broadcast::Receiver<AssistantEvent>) -> Option<AssistantEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Event subscriber fell behind");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
