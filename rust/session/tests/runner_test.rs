// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use common::*;
use futures::channel::mpsc;
use futures::StreamExt;
use mesh_stream_core::{Message, MessageKind};
use mesh_stream_session::{
    Error, MeshAssemblySession, MessageTransport, RunOutcome, SessionConfig, SessionRunner,
    SessionState, Subscription, SubscriptionId, Teardown,
};
use std::sync::{Arc, Mutex};

/// In-memory topic: every subscriber receives every published message
#[derive(Default)]
struct ChannelTransport {
    inner: Mutex<Topic>,
}

#[derive(Default)]
struct Topic {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, mpsc::UnboundedSender<Message>)>,
    unsubscribed: Vec<SubscriptionId>,
    /// Published before anyone subscribed
    backlog: Vec<Message>,
    closed: bool,
}

impl ChannelTransport {
    fn publish(&self, message: Message) {
        let mut topic = self.inner.lock().unwrap();
        if topic.subscribers.is_empty() {
            topic.backlog.push(message);
            return;
        }
        for (_, sender) in &topic.subscribers {
            let _ = sender.unbounded_send(message.clone());
        }
    }

    /// End every current and future subscription stream once drained
    fn close(&self) {
        let mut topic = self.inner.lock().unwrap();
        topic.closed = true;
        topic.subscribers.iter().for_each(|(_, s)| s.close_channel());
    }

    fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.inner.lock().unwrap().unsubscribed.clone()
    }

    fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

impl MessageTransport for ChannelTransport {
    fn subscribe(&self) -> Subscription {
        let mut topic = self.inner.lock().unwrap();
        topic.next_id += 1;
        let id = SubscriptionId(topic.next_id);
        let (sender, receiver) = mpsc::unbounded();
        for message in topic.backlog.drain(..).collect::<Vec<_>>() {
            let _ = sender.unbounded_send(message);
        }
        if topic.closed {
            sender.close_channel();
        }
        topic.subscribers.push((id, sender));
        Subscription {
            id,
            messages: receiver.boxed(),
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut topic = self.inner.lock().unwrap();
        topic.subscribers.retain(|(sub, _)| *sub != id);
        topic.unsubscribed.push(id);
    }
}

fn full_stream(uuid: &str) -> Vec<Message> {
    vec![
        metadata(uuid, 100, 30, CUBE_10),
        octree(uuid, [0.0; 3], 5.0, [3, 3, 3], vec![0xFF; 8]),
        chunk(uuid, four_points(), Some(vec![3, 0, 1, 2])),
        connectivity(uuid, Some(vec![3, 1, 2, 3])),
    ]
}

#[tokio::test]
async fn runner_drives_session_to_finalized_and_unsubscribes() {
    let transport = Arc::new(ChannelTransport::default());
    for message in full_stream("A") {
        transport.publish(message);
    }

    let mut session = MeshAssemblySession::new("A", RecordingScene::default(), SessionConfig::default());
    let (_teardown, signal) = Teardown::new(session.liveness());
    let runner = SessionRunner::new(Arc::clone(&transport));

    let report = runner.run(&mut session, signal).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Finalized);
    assert_eq!(report.applied, 4);
    assert_eq!(session.state(), SessionState::Finalized);
    assert_eq!(session.scene().redraws, 4);
    assert!(session.scene().previews.is_empty());

    assert_eq!(transport.unsubscribed(), vec![SubscriptionId(1)]);
    assert_eq!(transport.subscriber_count(), 0);
}

#[tokio::test]
async fn runner_skips_other_sessions_on_shared_topic() {
    let transport = Arc::new(ChannelTransport::default());
    let (a, b) = (full_stream("A"), full_stream("B"));
    for (ma, mb) in a.into_iter().zip(b) {
        transport.publish(mb);
        transport.publish(ma);
    }

    let mut session = MeshAssemblySession::new("A", RecordingScene::default(), SessionConfig::default());
    let (_teardown, signal) = Teardown::new(session.liveness());
    let report = SessionRunner::new(Arc::clone(&transport))
        .run(&mut session, signal)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Finalized);
    assert_eq!(report.applied, 4);
    assert_eq!(report.ignored, 4);
    assert_eq!(session.scene().redraws, 4);
}

#[tokio::test]
async fn runner_stops_when_stream_ends() {
    let transport = Arc::new(ChannelTransport::default());
    transport.publish(metadata("A", 10, 0, CUBE_10));
    transport.close();

    let mut session = MeshAssemblySession::new("A", RecordingScene::default(), SessionConfig::default());
    let (_teardown, signal) = Teardown::new(session.liveness());
    let report = SessionRunner::new(Arc::clone(&transport))
        .run(&mut session, signal)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::StreamEnded);
    assert_eq!(report.applied, 1);
    assert_eq!(session.state(), SessionState::MetadataReady);
    assert_eq!(transport.unsubscribed().len(), 1);
}

#[tokio::test]
async fn runner_returns_first_error_and_unsubscribes() {
    let transport = Arc::new(ChannelTransport::default());
    transport.publish(chunk("A", four_points(), None));
    transport.publish(metadata("A", 10, 0, CUBE_10));

    let mut session = MeshAssemblySession::new("A", RecordingScene::default(), SessionConfig::default());
    let (_teardown, signal) = Teardown::new(session.liveness());
    let err = SessionRunner::new(Arc::clone(&transport))
        .run(&mut session, signal)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::OutOfOrderMessage {
            kind: MessageKind::XyzChunk,
            state: SessionState::Idle
        }
    );
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(transport.unsubscribed().len(), 1);
}

#[tokio::test]
async fn teardown_stops_runner_and_releases_session() {
    let transport = Arc::new(ChannelTransport::default());
    transport.publish(metadata("A", 100, 30, CUBE_10));
    transport.publish(chunk("A", four_points(), None));

    let mut session = MeshAssemblySession::new("A", RecordingScene::default(), SessionConfig::default());
    let (teardown, signal) = Teardown::new(session.liveness());
    teardown.fire();

    let report = SessionRunner::new(Arc::clone(&transport))
        .run(&mut session, signal)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::TornDown);
    assert_eq!(report.applied, 0);
    assert!(session.mesh().is_none());
    assert!(session.scene().previews.is_empty());
    assert_eq!(session.scene().redraws, 0);
    assert_eq!(transport.unsubscribed().len(), 1);
}

#[tokio::test]
async fn dropped_teardown_trigger_does_not_stop_runner() {
    let transport = Arc::new(ChannelTransport::default());
    for message in full_stream("A") {
        transport.publish(message);
    }

    let mut session = MeshAssemblySession::new("A", RecordingScene::default(), SessionConfig::default());
    let (teardown, signal) = Teardown::new(session.liveness());
    drop(teardown);

    let report = SessionRunner::new(Arc::clone(&transport))
        .run(&mut session, signal)
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Finalized);
}
