// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feeding a session from a pub/sub transport
//!
//! The runner is the single consumer of a subscription: it hands messages to
//! one session in arrival order and always unsubscribes on the way out,
//! whether the mesh was finalized, the owner tore the session down, the
//! stream ended or a message was rejected.

use crate::decoder::PayloadDecoder;
use crate::error::Result;
use crate::liveness::Liveness;
use crate::scene::SceneSink;
use crate::session::{Dispatch, MeshAssemblySession, SessionState};
use futures::channel::oneshot;
use futures::stream::BoxStream;
use futures::{select, FutureExt, StreamExt};
use mesh_stream_core::Message;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Live subscription to the mesh topic
pub struct Subscription {
    pub id: SubscriptionId,
    pub messages: BoxStream<'static, Message>,
}

/// The pub/sub side of a host
pub trait MessageTransport: Send + Sync {
    fn subscribe(&self) -> Subscription;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Owner-side teardown trigger
///
/// Firing it stops the runner at the next message boundary and releases the
/// session's liveness flag, so a decode already in flight finishes without
/// touching the session.
#[derive(Debug)]
pub struct Teardown {
    signal: oneshot::Sender<()>,
    liveness: Liveness,
}

impl Teardown {
    pub fn new(liveness: Liveness) -> (Self, oneshot::Receiver<()>) {
        let (signal, receiver) = oneshot::channel();
        (Self { signal, liveness }, receiver)
    }

    pub fn fire(self) {
        self.liveness.release();
        // Runner already gone is fine
        let _ = self.signal.send(());
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finalized,
    TornDown,
    StreamEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Messages applied to the session
    pub applied: usize,
    /// Messages addressed to other sessions
    pub ignored: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Counters {
    applied: usize,
    ignored: usize,
    skipped: usize,
}

impl Counters {
    fn finish(self, outcome: RunOutcome) -> RunReport {
        RunReport {
            outcome,
            applied: self.applied,
            ignored: self.ignored,
            skipped: self.skipped,
        }
    }
}

pub struct SessionRunner<T> {
    transport: Arc<T>,
}

impl<T: MessageTransport> SessionRunner<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Drive `session` until it is finalized, torn down, or the stream ends
    ///
    /// The first rejected message stops the run and its error is returned.
    /// On teardown the session's buffers and previews are released.
    pub async fn run<S, D>(
        &self,
        session: &mut MeshAssemblySession<S, D>,
        teardown: oneshot::Receiver<()>,
    ) -> Result<RunReport>
    where
        S: SceneSink,
        D: PayloadDecoder,
    {
        let Subscription { id, messages } = self.transport.subscribe();
        debug!(session = %session.id(), subscription = id.0, "Subscribed");

        let result = drive(session, messages, teardown).await;
        self.transport.unsubscribe(id);

        if let Ok(report) = &result {
            if report.outcome == RunOutcome::TornDown {
                session.teardown();
            }
            info!(
                session = %session.id(),
                outcome = ?report.outcome,
                applied = report.applied,
                ignored = report.ignored,
                "Session run finished"
            );
        }
        result
    }
}

async fn drive<S, D>(
    session: &mut MeshAssemblySession<S, D>,
    messages: BoxStream<'static, Message>,
    teardown: oneshot::Receiver<()>,
) -> Result<RunReport>
where
    S: SceneSink,
    D: PayloadDecoder,
{
    let mut messages = messages.fuse();
    let mut teardown = teardown.fuse();
    let mut counters = Counters::default();

    loop {
        let message = select! {
            signal = teardown => match signal {
                Ok(()) => return Ok(counters.finish(RunOutcome::TornDown)),
                // Trigger dropped without firing
                Err(_) => continue,
            },
            next = messages.next() => match next {
                Some(message) => message,
                None => return Ok(counters.finish(RunOutcome::StreamEnded)),
            },
        };

        match session.handle(&message).await? {
            Dispatch::Ignored => counters.ignored += 1,
            Dispatch::Skipped => counters.skipped += 1,
            Dispatch::Applied(SessionState::Finalized) => {
                counters.applied += 1;
                return Ok(counters.finish(RunOutcome::Finalized));
            }
            Dispatch::Applied(_) => counters.applied += 1,
            Dispatch::Abandoned => return Ok(counters.finish(RunOutcome::TornDown)),
        }
    }
}
