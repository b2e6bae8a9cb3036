// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![allow(dead_code)]

use mesh_stream_core::{
    Attachment, CameraPose, ConnectivityMessage, Message, MetadataMessage, OctreeMessage,
    SessionId, TypedBuffer, XyzChunkMessage,
};
use mesh_stream_geometry::PolyData;
use mesh_stream_session::{Preview, PreviewHandle, SceneSink};
use std::collections::BTreeMap;

/// Scene that records every mutation
#[derive(Debug, Default)]
pub struct RecordingScene {
    next_handle: u64,
    /// Live previews and their point counts
    pub previews: BTreeMap<u64, usize>,
    pub mesh_pushes: usize,
    pub last_mesh_mtime: u64,
    pub preview_updates: usize,
    pub redraws: usize,
    pub cameras: Vec<CameraPose>,
}

impl SceneSink for RecordingScene {
    fn push_mesh(&mut self, mesh: &PolyData) {
        self.mesh_pushes += 1;
        self.last_mesh_mtime = mesh.mtime();
    }

    fn add_preview(&mut self, preview: Preview<'_>) -> PreviewHandle {
        self.next_handle += 1;
        self.previews.insert(self.next_handle, preview.point_count());
        PreviewHandle(self.next_handle)
    }

    fn update_preview(&mut self, handle: PreviewHandle, preview: Preview<'_>) {
        assert!(self.previews.contains_key(&handle.0), "update of unknown preview {}", handle);
        self.previews.insert(handle.0, preview.point_count());
        self.preview_updates += 1;
    }

    fn remove_preview(&mut self, handle: PreviewHandle) {
        assert!(self.previews.remove(&handle.0).is_some(), "double removal of {}", handle);
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn apply_camera(&mut self, camera: &CameraPose) {
        self.cameras.push(*camera);
    }
}

pub fn attachment<T>(values: Vec<T>) -> Attachment
where
    TypedBuffer: From<Vec<T>>,
{
    Attachment::from(TypedBuffer::from(values).to_bytes())
}

pub fn metadata(uuid: &str, points: usize, polys: usize, bounds: [f64; 6]) -> Message {
    Message::Metadata(MetadataMessage {
        uuid: SessionId::from(uuid),
        points,
        polys,
        points_type: "vtkFloatArray".to_string(),
        verts_type: "vtkUnsignedIntArray".to_string(),
        lines_type: "vtkUnsignedIntArray".to_string(),
        polys_type: "vtkUnsignedIntArray".to_string(),
        strips_type: "vtkUnsignedIntArray".to_string(),
        bounds,
        camera: None,
    })
}

pub fn octree(uuid: &str, origin: [f64; 3], spacing: f64, dimensions: [usize; 3], mask: Vec<u8>) -> Message {
    Message::Octree(OctreeMessage {
        uuid: SessionId::from(uuid),
        octree: Attachment::from(mask),
        origin,
        spacing,
        dimensions,
    })
}

pub fn chunk(uuid: &str, xyz: Vec<f32>, polys: Option<Vec<u32>>) -> Message {
    Message::XyzChunk(XyzChunkMessage {
        uuid: SessionId::from(uuid),
        xyz: attachment(xyz),
        polys: polys.map(attachment),
        array_type: None,
    })
}

pub fn connectivity(uuid: &str, polys: Option<Vec<u32>>) -> Message {
    Message::Connectivity(ConnectivityMessage {
        uuid: SessionId::from(uuid),
        verts: attachment(Vec::<u32>::new()),
        lines: attachment(Vec::<u32>::new()),
        strips: attachment(Vec::<u32>::new()),
        polys: polys.map(attachment),
    })
}

/// Four points inside [6, 9]^3
pub fn four_points() -> Vec<f32> {
    vec![
        6.0, 6.0, 6.0, //
        9.0, 6.0, 6.0, //
        9.0, 9.0, 6.0, //
        6.0, 9.0, 9.0, //
    ]
}

pub const CUBE_10: [f64; 6] = [0.0, 10.0, 0.0, 10.0, 0.0, 10.0];
