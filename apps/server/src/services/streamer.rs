// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turning a finished mesh into the progressive message sequence.
//!
//! Order per push: `metadata`, `octree` (when the mesh has points), one
//! `xyz-chunk` per [`StreamPlan`] step, then `connectivity` carrying the
//! cells and any poly indices the chunks did not.

use super::plan::StreamPlan;
use super::topic::Topic;
use async_stream::stream;
use futures::{pin_mut, Stream, StreamExt};
use mesh_stream_core::{
    Attachment, CameraPose, ConnectivityMessage, ElementType, Message, MetadataMessage,
    OctreeMessage, SessionId, TypedBuffer, XyzChunkMessage,
};
use mesh_stream_geometry::{OctreeGrid, PolyData};
use std::sync::Arc;
use std::time::Duration;

/// A mesh published under one session id.
#[derive(Debug, Clone)]
pub struct MeshSource {
    pub id: SessionId,
    pub mesh: Arc<PolyData>,
    pub camera: Option<CameraPose>,
}

/// Producer-side settings.
#[derive(Debug, Clone)]
pub struct MeshStreamer {
    pub chunk_size: usize,
    pub points_per_bucket: usize,
    pub delay: Duration,
}

impl MeshStreamer {
    pub fn new(chunk_size: usize, points_per_bucket: usize, delay: Duration) -> Self {
        Self {
            chunk_size,
            points_per_bucket,
            delay,
        }
    }

    pub fn plan(&self, mesh: &PolyData) -> StreamPlan {
        StreamPlan::new(
            mesh.point_count(),
            mesh.polys.len(),
            self.chunk_size,
            mesh.points.element_type(),
        )
    }

    pub fn metadata(&self, source: &MeshSource) -> Message {
        let mesh = &source.mesh;
        let bounds = mesh.bounds();
        let index_type = ElementType::UInt32.vtk_name().to_string();
        Message::Metadata(MetadataMessage {
            uuid: source.id.clone(),
            points: mesh.point_count(),
            polys: mesh.polys.len(),
            points_type: mesh.points.element_type().vtk_name().to_string(),
            verts_type: index_type.clone(),
            lines_type: index_type.clone(),
            polys_type: index_type.clone(),
            strips_type: index_type,
            bounds: if bounds.is_valid() { bounds.to_array() } else { [0.0; 6] },
            camera: source.camera,
        })
    }

    /// Occupancy summary, or `None` for a mesh without points.
    pub fn octree(&self, source: &MeshSource) -> Option<Message> {
        let mesh = &source.mesh;
        let grid = match OctreeGrid::summarize(&mesh.points, &mesh.bounds(), self.points_per_bucket) {
            Ok(grid) => grid,
            Err(e) => {
                tracing::debug!(uuid = %source.id, error = %e, "No occupancy summary");
                return None;
            }
        };
        let origin = grid.origin();
        Some(Message::Octree(OctreeMessage {
            uuid: source.id.clone(),
            octree: Attachment::from(grid.mask().to_vec()),
            origin: [origin.x, origin.y, origin.z],
            spacing: grid.spacing(),
            dimensions: grid.dimensions(),
        }))
    }

    pub fn chunks(&self, source: &MeshSource) -> ChunkCursor {
        ChunkCursor {
            id: source.id.clone(),
            mesh: Arc::clone(&source.mesh),
            plan: self.plan(&source.mesh),
            point_offset: 0,
            poly_offset: 0,
        }
    }

    /// Every message of one push, without delays.
    pub fn messages(&self, source: &MeshSource) -> Vec<Message> {
        let mut messages = vec![self.metadata(source)];
        messages.extend(self.octree(source));
        let mut cursor = self.chunks(source);
        messages.extend(cursor.by_ref());
        messages.push(cursor.connectivity());
        messages
    }

    /// One push, pausing before the first chunk and after every chunk.
    pub fn stream(&self, source: MeshSource) -> impl Stream<Item = Message> + Send + 'static {
        let head: Vec<Message> = std::iter::once(self.metadata(&source))
            .chain(self.octree(&source))
            .collect();
        let mut cursor = self.chunks(&source);
        let delay = self.delay;

        stream! {
            for message in head {
                yield message;
            }
            tokio::time::sleep(delay).await;
            while let Some(chunk) = cursor.next() {
                yield chunk;
                tokio::time::sleep(delay).await;
            }
            yield cursor.connectivity();
        }
    }

    /// Publish one push on `topic`.
    pub async fn publish(&self, topic: &Topic, source: MeshSource) {
        let id = source.id.clone();
        let started = std::time::Instant::now();
        let stream = self.stream(source);
        pin_mut!(stream);

        let mut sent = 0usize;
        while let Some(message) = stream.next().await {
            topic.publish(message);
            sent += 1;
        }

        tracing::info!(
            uuid = %id,
            messages = sent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Mesh push complete"
        );
    }
}

/// Yields the `xyz-chunk` messages of one push.
#[derive(Debug)]
pub struct ChunkCursor {
    id: SessionId,
    mesh: Arc<PolyData>,
    plan: StreamPlan,
    point_offset: usize,
    poly_offset: usize,
}

impl ChunkCursor {
    /// Closing message; poly indices not yet sent ride along.
    pub fn connectivity(&self) -> Message {
        let mesh = &self.mesh;
        let remaining = mesh.polys.len().saturating_sub(self.poly_offset);
        let polys = (remaining > 0).then(|| {
            index_attachment(&mesh.polys.slice(self.poly_offset..mesh.polys.len()))
        });

        Message::Connectivity(ConnectivityMessage {
            uuid: self.id.clone(),
            verts: index_attachment(&mesh.verts),
            lines: index_attachment(&mesh.lines),
            strips: index_attachment(&mesh.strips),
            polys,
        })
    }
}

impl Iterator for ChunkCursor {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        let point_count = self.mesh.point_count();
        if self.point_offset >= point_count {
            return None;
        }

        let end = (self.point_offset + self.plan.points_per_chunk).min(point_count);
        let points = self.mesh.points.slice(self.point_offset * 3..end * 3);
        self.point_offset = end;

        let polys = if self.plan.polys_per_chunk > 0 && self.poly_offset < self.mesh.polys.len() {
            let end = (self.poly_offset + self.plan.polys_per_chunk).min(self.mesh.polys.len());
            let slice = self.mesh.polys.slice(self.poly_offset..end);
            self.poly_offset = end;
            Some(index_attachment(&slice))
        } else {
            None
        };

        let array_type = match points.element_type() {
            ElementType::Float64 => Some("Float64Array".to_string()),
            ElementType::Float32 => Some("Float32Array".to_string()),
            _ => None,
        };

        Some(Message::XyzChunk(XyzChunkMessage {
            uuid: self.id.clone(),
            xyz: Attachment::from(points.to_bytes()),
            polys,
            array_type,
        }))
    }
}

/// Cell arrays always travel as u32.
fn index_attachment(buffer: &TypedBuffer) -> Attachment {
    if buffer.element_type() == ElementType::UInt32 {
        return Attachment::from(buffer.to_bytes());
    }
    Attachment::from(TypedBuffer::from_f64_slice(ElementType::UInt32, &buffer.to_f64_vec()).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_stream_core::Bounds;
    use mesh_stream_geometry::Point3;

    fn sphere_source(point_type: ElementType) -> MeshSource {
        MeshSource {
            id: SessionId::from("sphere"),
            mesh: Arc::new(PolyData::uv_sphere(Point3::origin(), 1.0, 16, point_type)),
            camera: None,
        }
    }

    #[test]
    fn test_message_order() {
        let streamer = MeshStreamer::new(600, 8, Duration::ZERO);
        let source = sphere_source(ElementType::Float32);
        let messages = streamer.messages(&source);

        assert!(matches!(messages[0], Message::Metadata(_)));
        assert!(matches!(messages[1], Message::Octree(_)));
        assert!(matches!(messages.last(), Some(Message::Connectivity(_))));

        let chunks = messages.iter().filter(|m| matches!(m, Message::XyzChunk(_))).count();
        let plan = streamer.plan(&source.mesh);
        assert_eq!(chunks, plan.chunk_count(source.mesh.point_count()));
        assert!(messages.iter().all(|m| m.session_id() == &source.id));
    }

    #[test]
    fn test_chunks_cover_every_point_and_index_once() {
        let streamer = MeshStreamer::new(500, 8, Duration::ZERO);
        let source = sphere_source(ElementType::Float64);
        let messages = streamer.messages(&source);

        let mut points = 0;
        let mut indices = 0;
        for message in &messages {
            match message {
                Message::XyzChunk(chunk) => {
                    assert_eq!(chunk.array_type.as_deref(), Some("Float64Array"));
                    points += chunk.xyz.len() / 24;
                    indices += chunk.polys.as_ref().map_or(0, |p| p.len() / 4);
                }
                Message::Connectivity(closing) => {
                    indices += closing.polys.as_ref().map_or(0, |p| p.len() / 4);
                }
                _ => {}
            }
        }
        assert_eq!(points, source.mesh.point_count());
        assert_eq!(indices, source.mesh.polys.len());
    }

    #[test]
    fn test_metadata_describes_mesh() {
        let streamer = MeshStreamer::new(5_000_000, 8, Duration::ZERO);
        let source = sphere_source(ElementType::Float32);
        let Message::Metadata(meta) = streamer.metadata(&source) else {
            panic!("expected metadata");
        };
        assert_eq!(meta.points, source.mesh.point_count());
        assert_eq!(meta.polys, source.mesh.polys.len());
        assert_eq!(meta.points_type, "vtkFloatArray");
        assert_eq!(meta.polys_type, "vtkUnsignedIntArray");
        assert_eq!(Bounds::from_array(meta.bounds), source.mesh.bounds());
    }

    #[test]
    fn test_empty_mesh_has_no_octree_or_chunks() {
        let streamer = MeshStreamer::new(1000, 8, Duration::ZERO);
        let source = MeshSource {
            id: SessionId::from("empty"),
            mesh: Arc::new(PolyData::new()),
            camera: None,
        };
        let messages = streamer.messages(&source);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], Message::Connectivity(_)));
    }

    #[test]
    fn test_lines_are_widened_to_u32() {
        let attachment = index_attachment(&TypedBuffer::UInt8(vec![2, 0, 1]));
        assert_eq!(attachment.len(), 12);
    }

    #[tokio::test]
    async fn test_stream_matches_messages() {
        let streamer = MeshStreamer::new(800, 8, Duration::ZERO);
        let source = sphere_source(ElementType::Float32);
        let streamed: Vec<Message> = streamer.stream(source.clone()).collect().await;
        assert_eq!(streamed, streamer.messages(&source));
    }
}
