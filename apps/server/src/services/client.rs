// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process demo client.
//!
//! Subscribes to the topic like a remote viewer would, asks for a push of
//! one mesh and assembles it with a [`MeshAssemblySession`] whose scene only
//! logs what a renderer would be asked to do.

use super::streamer::{MeshSource, MeshStreamer};
use super::topic::Topic;
use futures::future::{self, BoxFuture, FutureExt};
use mesh_stream_core::{Attachment, CameraPose, ElementType, TypedBuffer};
use mesh_stream_geometry::PolyData;
use mesh_stream_session::{
    MeshAssemblySession, MessageTransport, Preview, PreviewHandle, RunReport, SceneSink,
    SessionConfig, SessionRunner, Subscription, SubscriptionId, Teardown,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Payloads at or above this size are decoded on the blocking pool.
pub const BLOCKING_DECODE_THRESHOLD: usize = 1 << 20;

/// Scene that records nothing and logs every request.
#[derive(Debug, Default)]
pub struct LoggingScene {
    next_handle: u64,
    live_previews: usize,
    redraws: usize,
}

impl LoggingScene {
    pub fn live_previews(&self) -> usize {
        self.live_previews
    }

    pub fn redraws(&self) -> usize {
        self.redraws
    }
}

impl SceneSink for LoggingScene {
    fn push_mesh(&mut self, mesh: &PolyData) {
        tracing::debug!(
            points = mesh.point_count(),
            polys = mesh.polys.len(),
            lines = mesh.lines.len(),
            "Mesh pushed to scene"
        );
    }

    fn add_preview(&mut self, preview: Preview<'_>) -> PreviewHandle {
        self.next_handle += 1;
        self.live_previews += 1;
        let handle = PreviewHandle(self.next_handle);
        tracing::debug!(%handle, points = preview.point_count(), "Preview added");
        handle
    }

    fn update_preview(&mut self, handle: PreviewHandle, preview: Preview<'_>) {
        tracing::trace!(%handle, points = preview.point_count(), "Preview updated");
    }

    fn remove_preview(&mut self, handle: PreviewHandle) {
        self.live_previews = self.live_previews.saturating_sub(1);
        tracing::trace!(%handle, "Preview removed");
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn apply_camera(&mut self, camera: &CameraPose) {
        tracing::debug!(position = ?camera.position, focal_point = ?camera.focal_point, "Camera hint");
    }
}

/// Moves large decodes off the runtime's worker threads.
#[derive(Debug, Clone, Copy)]
pub struct BlockingDecoder {
    threshold: usize,
}

impl BlockingDecoder {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for BlockingDecoder {
    fn default() -> Self {
        Self::new(BLOCKING_DECODE_THRESHOLD)
    }
}

impl mesh_stream_session::PayloadDecoder for BlockingDecoder {
    fn decode<'a>(
        &'a self,
        element_type: ElementType,
        payload: &'a Attachment,
    ) -> BoxFuture<'a, mesh_stream_core::Result<TypedBuffer>> {
        if payload.len() < self.threshold {
            return future::ready(TypedBuffer::decode(element_type, payload.bytes())).boxed();
        }

        let bytes = payload.bytes().clone();
        async move {
            match tokio::task::spawn_blocking(move || TypedBuffer::decode(element_type, &bytes)).await {
                Ok(decoded) => decoded,
                Err(e) => Err(mesh_stream_core::Error::Codec(format!("decode task failed: {e}"))),
            }
        }
        .boxed()
    }
}

/// Topic subscription that requests a push of one mesh once subscribed.
struct PushOnSubscribe {
    topic: Arc<Topic>,
    streamer: Arc<MeshStreamer>,
    source: MeshSource,
}

impl MessageTransport for PushOnSubscribe {
    fn subscribe(&self) -> Subscription {
        let subscription = self.topic.subscribe();

        let topic = Arc::clone(&self.topic);
        let streamer = Arc::clone(&self.streamer);
        let source = self.source.clone();
        tokio::spawn(async move { streamer.publish(&topic, source).await });

        subscription
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.topic.unsubscribe(id);
    }
}

pub type DemoSession = MeshAssemblySession<LoggingScene, BlockingDecoder>;

/// Assemble `source` from the topic and hand back the finished session.
pub async fn run_demo_client(
    topic: Arc<Topic>,
    streamer: Arc<MeshStreamer>,
    source: MeshSource,
    teardown: futures::channel::oneshot::Receiver<()>,
    mut session: DemoSession,
) -> mesh_stream_session::Result<(RunReport, DemoSession)> {
    let transport = Arc::new(PushOnSubscribe {
        topic,
        streamer,
        source,
    });
    tracing::info!(
        uuid = %session.id(),
        skip_octree = session.config().skip_octree_preview,
        "Demo client subscribing"
    );
    let report = SessionRunner::new(transport).run(&mut session, teardown).await?;
    Ok((report, session))
}

/// Build a demo session for `source`.
pub fn demo_session(source: &MeshSource, config: SessionConfig) -> DemoSession {
    let cache = Arc::new(mesh_stream_geometry::ConnectivityCache::with_limit(
        config.connectivity_cache_limit,
    ));
    MeshAssemblySession::with_parts(
        source.id.clone(),
        LoggingScene::default(),
        BlockingDecoder::default(),
        cache,
        config,
    )
}

/// Run the demo client in the background.
///
/// Firing the returned [`Teardown`] stops it at the next message.
pub fn spawn_demo_client(
    topic: Arc<Topic>,
    streamer: Arc<MeshStreamer>,
    source: MeshSource,
    config: SessionConfig,
) -> (JoinHandle<()>, Teardown) {
    let session = demo_session(&source, config);
    let (teardown, signal) = Teardown::new(session.liveness());

    let handle = tokio::spawn(async move {
        match run_demo_client(topic, streamer, source, signal, session).await {
            Ok((report, session)) => tracing::info!(
                uuid = %session.id(),
                outcome = ?report.outcome,
                applied = report.applied,
                skipped = report.skipped,
                redraws = session.scene().redraws(),
                points = session.mesh().map_or(0, |mesh| mesh.point_count()),
                "Demo client finished"
            ),
            Err(e) => tracing::error!(error = %e, "Demo client failed"),
        }
    });

    (handle, teardown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_stream_core::SessionId;
    use mesh_stream_geometry::Point3;
    use mesh_stream_session::{PayloadDecoder, RunOutcome, SessionState};
    use std::time::Duration;

    fn sphere(point_type: ElementType) -> MeshSource {
        MeshSource {
            id: SessionId::from("demo"),
            mesh: Arc::new(PolyData::uv_sphere(Point3::new(1.0, 2.0, 3.0), 2.0, 12, point_type)),
            camera: None,
        }
    }

    async fn assemble(source: MeshSource, config: SessionConfig) -> (RunReport, DemoSession) {
        let topic = Arc::new(Topic::new(1024));
        let streamer = Arc::new(MeshStreamer::new(400, 8, Duration::ZERO));
        let session = demo_session(&source, config);
        let (_teardown, signal) = Teardown::new(session.liveness());
        run_demo_client(topic, streamer, source, signal, session)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_demo_client_rebuilds_source_mesh() {
        let source = sphere(ElementType::Float32);
        let (report, session) = assemble(source.clone(), SessionConfig::default()).await;

        assert_eq!(report.outcome, RunOutcome::Finalized);
        assert_eq!(session.state(), SessionState::Finalized);
        assert_eq!(session.scene().live_previews(), 0);

        let mesh = session.mesh().unwrap();
        assert_eq!(mesh.points, source.mesh.points);
        assert_eq!(mesh.polys.to_f64_vec(), source.mesh.polys.to_f64_vec());
        assert!(mesh.lines.is_empty());
    }

    #[tokio::test]
    async fn test_demo_client_skips_octree() {
        let source = sphere(ElementType::Float64);
        let config = SessionConfig::default().with_skip_octree_preview(true);
        let (report, session) = assemble(source.clone(), config).await;

        assert_eq!(report.outcome, RunOutcome::Finalized);
        assert_eq!(report.skipped, 1);
        assert_eq!(session.mesh().unwrap().points, source.mesh.points);
    }

    #[tokio::test]
    async fn test_blocking_decoder_large_payload() {
        let decoder = BlockingDecoder::new(8);
        let payload = Attachment::from(vec![0u8; 16]);
        let buffer = decoder.decode(ElementType::Float32, &payload).await.unwrap();
        assert_eq!(buffer, TypedBuffer::Float32(vec![0.0; 4]));

        let partial = Attachment::from(vec![0u8; 10]);
        assert!(decoder.decode(ElementType::Float32, &partial).await.is_err());
    }
}
