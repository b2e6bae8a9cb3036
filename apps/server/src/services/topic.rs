// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The shared mesh topic.
//!
//! Every push for every mesh goes through one broadcast channel and every
//! subscriber sees all of it; sessions filter by uuid on their side.

use futures::{future, StreamExt};
use mesh_stream_core::Message;
use mesh_stream_session::{MessageTransport, Subscription, SubscriptionId};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

pub struct Topic {
    sender: broadcast::Sender<Message>,
    next_id: AtomicU64,
    active: Mutex<FxHashSet<u64>>,
}

impl Topic {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_id: AtomicU64::new(1),
            active: Mutex::new(FxHashSet::default()),
        }
    }

    /// Returns the number of receivers the message reached.
    pub fn publish(&self, message: Message) -> usize {
        // No receivers is not an error for a topic
        self.sender.send(message).unwrap_or(0)
    }

    pub fn receiver(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Subscriptions handed out through [`MessageTransport`] and not yet
    /// released.
    pub fn active_subscriptions(&self) -> usize {
        self.active.lock().len()
    }
}

impl MessageTransport for Topic {
    fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.active.lock().insert(id);

        let messages = BroadcastStream::new(self.receiver()).filter_map(move |item| {
            future::ready(match item {
                Ok(message) => Some(message),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(subscription = id, skipped, "Subscriber lagged, messages dropped");
                    None
                }
            })
        });

        Subscription {
            id: SubscriptionId(id),
            messages: messages.boxed(),
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.active.lock().remove(&id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_stream_core::{Attachment, ConnectivityMessage, SessionId};

    fn closing(uuid: &str) -> Message {
        Message::Connectivity(ConnectivityMessage {
            uuid: SessionId::from(uuid),
            verts: Attachment::default(),
            lines: Attachment::default(),
            strips: Attachment::default(),
            polys: None,
        })
    }

    #[test]
    fn test_publish_without_subscribers() {
        let topic = Topic::new(4);
        assert_eq!(topic.publish(closing("a")), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_every_message() {
        let topic = Topic::new(8);
        let mut first = topic.subscribe();
        let mut second = topic.subscribe();
        assert_ne!(first.id, second.id);
        assert_eq!(topic.active_subscriptions(), 2);

        assert_eq!(topic.publish(closing("a")), 2);
        assert_eq!(topic.publish(closing("b")), 2);

        for subscription in [&mut first, &mut second] {
            let a = subscription.messages.next().await.unwrap();
            let b = subscription.messages.next().await.unwrap();
            assert_eq!(a.session_id().as_str(), "a");
            assert_eq!(b.session_id().as_str(), "b");
        }

        topic.unsubscribe(first.id);
        assert_eq!(topic.active_subscriptions(), 1);
        topic.unsubscribe(first.id);
        assert_eq!(topic.active_subscriptions(), 1);
        topic.unsubscribe(second.id);
        assert_eq!(topic.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_dropped_messages() {
        let topic = Topic::new(2);
        let mut subscription = topic.subscribe();
        for uuid in ["a", "b", "c", "d"] {
            topic.publish(closing(uuid));
        }

        let next = subscription.messages.next().await.unwrap();
        assert_eq!(next.session_id().as_str(), "c");
    }
}
