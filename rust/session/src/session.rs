// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh assembly state machine
//!
//! One session assembles one mesh. It consumes the messages addressed to its
//! id, strictly in order:
//!
//! ```text
//! Idle --metadata--> MetadataReady --xyz-chunk--> Streaming --connectivity--> Finalized
//!                          |  ^                      |  ^
//!                          octree                    xyz-chunk / octree
//! ```
//!
//! Every accepted message ends with exactly one redraw request. A rejected
//! message leaves buffers, previews and state untouched: payloads are
//! decoded and every capacity checked before the first write.

use crate::config::SessionConfig;
use crate::decoder::{InlineDecoder, PayloadDecoder};
use crate::error::{Error, Result};
use crate::liveness::Liveness;
use crate::scene::{Preview, PreviewHandle, SceneSink};
use mesh_stream_core::{
    Bounds, CameraPose, ConnectivityMessage, ElementType, Message, MessageKind, MetadataMessage,
    OctreeMessage, SessionId, TypedBuffer, XyzChunkMessage,
};
use mesh_stream_geometry::{ConnectivityCache, OctreeGrid, Point3, PolyData, ProgressPatch};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    MetadataReady,
    Streaming,
    Finalized,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::MetadataReady => "metadata-ready",
            SessionState::Streaming => "streaming",
            SessionState::Finalized => "finalized",
        }
    }

    /// Whether octree, chunk and connectivity messages are accepted
    #[inline]
    fn accepts_stream_data(self) -> bool {
        matches!(self, SessionState::MetadataReady | SessionState::Streaming)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session did with one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Addressed to another session
    Ignored,
    /// Accepted but intentionally not shown (octree with previews disabled)
    Skipped,
    /// Applied; carries the state after the message
    Applied(SessionState),
    /// The session was torn down while the message was in flight
    Abandoned,
}

/// Element types declared by a metadata message, resolved once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeTypes {
    pub points: ElementType,
    pub verts: ElementType,
    pub lines: ElementType,
    pub polys: ElementType,
    pub strips: ElementType,
}

impl AttributeTypes {
    pub fn resolve(msg: &MetadataMessage) -> Result<Self> {
        Ok(Self {
            points: ElementType::from_name(&msg.points_type)?,
            verts: ElementType::from_name(&msg.verts_type)?,
            lines: ElementType::from_name(&msg.lines_type)?,
            polys: ElementType::from_name(&msg.polys_type)?,
            strips: ElementType::from_name(&msg.strips_type)?,
        })
    }
}

/// Buffers allocated from metadata
#[derive(Debug)]
struct Assembly {
    types: AttributeTypes,
    bounds: Bounds,
    /// Its points buffer is the point accumulation buffer
    mesh: PolyData,
    /// Poly indices received so far; moved into `mesh` at finalization
    polys: TypedBuffer,
    point_offset: usize,
    poly_offset: usize,
}

/// Assembles one progressively streamed mesh into a scene
pub struct MeshAssemblySession<S, D = InlineDecoder> {
    id: SessionId,
    config: SessionConfig,
    scene: S,
    decoder: D,
    cache: Arc<ConnectivityCache>,
    liveness: Liveness,
    state: SessionState,
    assembly: Option<Assembly>,
    camera: Option<CameraPose>,
    octree: Option<(OctreeGrid, PreviewHandle)>,
    patches: Vec<(ProgressPatch, PreviewHandle)>,
}

impl<S: SceneSink> MeshAssemblySession<S, InlineDecoder> {
    /// Session with inline decoding and its own connectivity cache
    pub fn new(id: impl Into<SessionId>, scene: S, config: SessionConfig) -> Self {
        let cache = Arc::new(ConnectivityCache::with_limit(config.connectivity_cache_limit));
        Self::with_parts(id, scene, InlineDecoder, cache, config)
    }
}

impl<S: SceneSink, D: PayloadDecoder> MeshAssemblySession<S, D> {
    /// Session sharing `cache` with other sessions on the same host
    pub fn with_parts(
        id: impl Into<SessionId>,
        scene: S,
        decoder: D,
        cache: Arc<ConnectivityCache>,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            scene,
            decoder,
            cache,
            liveness: Liveness::new(),
            state: SessionState::Idle,
            assembly: None,
            camera: None,
            octree: None,
            patches: Vec::new(),
        }
    }

    /// Process one message from the topic
    ///
    /// Messages for other sessions are ignored without touching the scene.
    /// Errors are returned to the caller; the session stays usable.
    pub async fn handle(&mut self, message: &Message) -> Result<Dispatch> {
        if message.session_id() != &self.id {
            trace!(
                session = %self.id,
                addressed_to = %message.session_id(),
                kind = %message.kind(),
                "Ignoring message for another session"
            );
            return Ok(Dispatch::Ignored);
        }
        if !self.liveness.is_alive() {
            return Ok(Dispatch::Abandoned);
        }

        let result = match message {
            Message::Metadata(msg) => self.on_metadata(msg),
            Message::Octree(msg) => self.on_octree(msg).await,
            Message::XyzChunk(msg) => self.on_xyz_chunk(msg).await,
            Message::Connectivity(msg) => self.on_connectivity(msg).await,
        };

        if let Err(err) = &result {
            warn!(
                session = %self.id,
                kind = %message.kind(),
                state = %self.state,
                error = %err,
                "Rejected message"
            );
        }
        result
    }

    fn on_metadata(&mut self, msg: &MetadataMessage) -> Result<Dispatch> {
        if self.state == SessionState::Finalized {
            return Err(self.out_of_order(MessageKind::Metadata));
        }

        let types = AttributeTypes::resolve(msg)?;
        self.check_allocation(msg, &types)?;
        let bounds = msg.bounds();
        let mesh = PolyData::bounding_box_placeholder(&bounds, msg.points, types.points)?;
        let polys = TypedBuffer::try_zeroed(types.polys, msg.polys)?;

        if self.state != SessionState::Idle {
            info!(session = %self.id, state = %self.state, "Metadata re-sent, restarting assembly");
            self.release_previews();
        }

        if let Some(camera) = &msg.camera {
            self.scene.apply_camera(camera);
        }
        self.camera = msg.camera;
        self.scene.push_mesh(&mesh);

        info!(
            session = %self.id,
            points = msg.points,
            polys = msg.polys,
            points_type = %types.points,
            "Allocated mesh buffers"
        );

        self.assembly = Some(Assembly {
            types,
            bounds,
            mesh,
            polys,
            point_offset: 0,
            poly_offset: 0,
        });
        self.state = SessionState::MetadataReady;
        self.scene.request_redraw();
        Ok(Dispatch::Applied(self.state))
    }

    /// Reject declared counts whose buffers would exceed the configured cap
    fn check_allocation(&self, msg: &MetadataMessage, types: &AttributeTypes) -> Result<()> {
        let points = msg
            .points
            .checked_mul(3)
            .and_then(|n| n.checked_mul(types.points.size()));
        let polys = msg.polys.checked_mul(types.polys.size());
        let total = points.zip(polys).and_then(|(p, q)| p.checked_add(q));

        match total {
            Some(bytes) if bytes <= self.config.max_buffer_bytes => Ok(()),
            _ => {
                warn!(
                    session = %self.id,
                    points = msg.points,
                    polys = msg.polys,
                    limit = self.config.max_buffer_bytes,
                    "Metadata exceeds buffer limit"
                );
                Err(Error::MalformedPayload(format!(
                    "{} points and {} poly indices exceed the {}-byte buffer limit",
                    msg.points, msg.polys, self.config.max_buffer_bytes
                )))
            }
        }
    }

    async fn on_octree(&mut self, msg: &OctreeMessage) -> Result<Dispatch> {
        self.stream_types(MessageKind::Octree)?;
        if self.config.skip_octree_preview {
            debug!(session = %self.id, "Octree preview disabled, skipping");
            return Ok(Dispatch::Skipped);
        }

        let decoded = self.decoder.decode(ElementType::UInt8, &msg.octree).await?;
        if !self.liveness.is_alive() {
            return Ok(Dispatch::Abandoned);
        }

        let mask = match decoded {
            TypedBuffer::UInt8(mask) => mask,
            other => {
                return Err(Error::MalformedPayload(format!(
                    "octree mask decoded as {}",
                    other.element_type()
                )))
            }
        };
        let mut grid = OctreeGrid::new(Point3::from(msg.origin), msg.spacing, msg.dimensions, mask)?;

        // Regions already covered by received chunks stay clear
        for (patch, _) in &self.patches {
            grid.clear_region(patch.bounds());
        }

        if let Some((_, previous)) = self.octree.take() {
            self.scene.remove_preview(previous);
        }
        let handle = self.scene.add_preview(Preview::Anchors {
            points: grid.anchor_points(),
            radius: grid.anchor_radius(),
        });

        info!(
            session = %self.id,
            cells = grid.cell_count(),
            anchors = grid.anchor_count(),
            "Octree preview ready"
        );

        self.octree = Some((grid, handle));
        self.scene.request_redraw();
        Ok(Dispatch::Applied(self.state))
    }

    async fn on_xyz_chunk(&mut self, msg: &XyzChunkMessage) -> Result<Dispatch> {
        let types = self.stream_types(MessageKind::XyzChunk)?;
        let point_type = match &msg.array_type {
            Some(name) => ElementType::from_name(name)?,
            None => types.points,
        };

        let points = self.decoder.decode(point_type, &msg.xyz).await?;
        let polys = match &msg.polys {
            Some(payload) => Some(self.decoder.decode(types.polys, payload).await?),
            None => None,
        };
        if !self.liveness.is_alive() {
            return Ok(Dispatch::Abandoned);
        }

        if points.len() % 3 != 0 {
            return Err(Error::MalformedPayload(format!(
                "{} point coordinates is not a whole number of xyz triplets",
                points.len()
            )));
        }

        let state = self.state;
        let assembly = self.assembly.as_mut().ok_or(Error::OutOfOrderMessage {
            kind: MessageKind::XyzChunk,
            state,
        })?;
        check_capacity(assembly.point_offset, points.len(), assembly.mesh.points.len())?;
        if let Some(polys) = &polys {
            check_capacity(assembly.poly_offset, polys.len(), assembly.polys.len())?;
        }

        assembly.point_offset = assembly.mesh.points.write_at(assembly.point_offset, &points)?;
        if let Some(polys) = &polys {
            assembly.poly_offset = assembly.polys.write_at(assembly.poly_offset, polys)?;
        }
        let (point_offset, poly_offset) = (assembly.point_offset, assembly.poly_offset);

        let patch = ProgressPatch::new(points, &self.cache);
        let handle = self.scene.add_preview(Preview::Patch(&patch));

        if let Some((grid, octree_handle)) = self.octree.as_mut() {
            let cleared = grid.clear_region(patch.bounds());
            if cleared > 0 {
                self.scene.update_preview(
                    *octree_handle,
                    Preview::Anchors {
                        points: grid.anchor_points(),
                        radius: grid.anchor_radius(),
                    },
                );
            }
        }

        debug!(
            session = %self.id,
            chunk_points = patch.point_count(),
            point_offset,
            poly_offset,
            "Chunk appended"
        );

        self.patches.push((patch, handle));
        self.state = SessionState::Streaming;
        self.scene.request_redraw();
        Ok(Dispatch::Applied(self.state))
    }

    async fn on_connectivity(&mut self, msg: &ConnectivityMessage) -> Result<Dispatch> {
        let types = self.stream_types(MessageKind::Connectivity)?;

        let verts = self.decoder.decode(types.verts, &msg.verts).await?;
        let lines = self.decoder.decode(types.lines, &msg.lines).await?;
        let strips = self.decoder.decode(types.strips, &msg.strips).await?;
        let polys = match &msg.polys {
            Some(payload) => Some(self.decoder.decode(types.polys, payload).await?),
            None => None,
        };
        if !self.liveness.is_alive() {
            return Ok(Dispatch::Abandoned);
        }

        let state = self.state;
        let assembly = self.assembly.as_mut().ok_or(Error::OutOfOrderMessage {
            kind: MessageKind::Connectivity,
            state,
        })?;
        if let Some(polys) = &polys {
            check_capacity(assembly.poly_offset, polys.len(), assembly.polys.len())?;
            assembly.poly_offset = assembly.polys.write_at(assembly.poly_offset, polys)?;
        }

        let Assembly {
            mesh,
            polys: received,
            ..
        } = assembly;
        mesh.verts = verts;
        mesh.lines = lines;
        mesh.strips = strips;
        mesh.polys = std::mem::replace(received, TypedBuffer::zeroed(types.polys, 0));
        mesh.modified();
        self.scene.push_mesh(mesh);

        info!(
            session = %self.id,
            points = mesh.point_count(),
            patches = self.patches.len(),
            "Mesh finalized"
        );

        self.release_previews();
        self.state = SessionState::Finalized;
        self.scene.request_redraw();
        Ok(Dispatch::Applied(self.state))
    }

    /// Release previews and buffers and abandon any handler in flight
    ///
    /// A torn-down session answers every later message with
    /// [`Dispatch::Abandoned`].
    pub fn teardown(&mut self) {
        self.liveness.release();
        self.release_previews();
        self.assembly = None;
        debug!(session = %self.id, "Session torn down");
    }

    /// Return to `Idle` so the mesh can be streamed again
    pub fn reset(&mut self) {
        self.release_previews();
        self.assembly = None;
        self.camera = None;
        self.state = SessionState::Idle;
    }

    fn release_previews(&mut self) {
        if let Some((_, handle)) = self.octree.take() {
            self.scene.remove_preview(handle);
        }
        for (_, handle) in self.patches.drain(..) {
            self.scene.remove_preview(handle);
        }
    }

    /// Declared types, provided stream data is acceptable in this state
    fn stream_types(&self, kind: MessageKind) -> Result<AttributeTypes> {
        match &self.assembly {
            Some(assembly) if self.state.accepts_stream_data() => Ok(assembly.types),
            _ => Err(self.out_of_order(kind)),
        }
    }

    fn out_of_order(&self, kind: MessageKind) -> Error {
        Error::OutOfOrderMessage {
            kind,
            state: self.state,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The mesh being assembled, present from metadata until teardown
    pub fn mesh(&self) -> Option<&PolyData> {
        self.assembly.as_ref().map(|a| &a.mesh)
    }

    /// Element types resolved from metadata
    pub fn attribute_types(&self) -> Option<AttributeTypes> {
        self.assembly.as_ref().map(|a| a.types)
    }

    /// World bounds declared by metadata
    pub fn bounds(&self) -> Option<Bounds> {
        self.assembly.as_ref().map(|a| a.bounds)
    }

    /// Scalars written into the point buffer (three per point)
    pub fn point_offset(&self) -> usize {
        self.assembly.as_ref().map_or(0, |a| a.point_offset)
    }

    pub fn poly_offset(&self) -> usize {
        self.assembly.as_ref().map_or(0, |a| a.poly_offset)
    }

    /// Poly indices accumulated before finalization
    pub fn pending_polys(&self) -> Option<&TypedBuffer> {
        match self.state {
            SessionState::Finalized => None,
            _ => self.assembly.as_ref().map(|a| &a.polys),
        }
    }

    pub fn camera(&self) -> Option<&CameraPose> {
        self.camera.as_ref()
    }

    pub fn octree(&self) -> Option<&OctreeGrid> {
        self.octree.as_ref().map(|(grid, _)| grid)
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Handle for abandoning in-flight work from another task
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn connectivity_cache(&self) -> &Arc<ConnectivityCache> {
        &self.cache
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
}

fn check_capacity(offset: usize, incoming: usize, capacity: usize) -> Result<()> {
    match offset.checked_add(incoming) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::BufferOverflow {
            offset,
            incoming,
            capacity,
        }),
    }
}
