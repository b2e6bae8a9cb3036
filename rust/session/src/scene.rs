// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rendering collaborator interface
//!
//! The session never owns render objects. It hands geometry to a
//! [`SceneSink`] and keeps only the opaque handles it must release later.

use mesh_stream_core::CameraPose;
use mesh_stream_geometry::{PolyData, ProgressPatch};
use std::fmt;

/// Opaque reference to a preview owned by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(pub u64);

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interim geometry shown before the final mesh is complete
#[derive(Debug, Clone, Copy)]
pub enum Preview<'a> {
    /// Octree anchors, drawn as spheres of `radius`
    Anchors { points: &'a [f64], radius: f64 },
    /// One received chunk drawn as a point cloud
    Patch(&'a ProgressPatch),
}

impl Preview<'_> {
    pub fn point_count(&self) -> usize {
        match self {
            Preview::Anchors { points, .. } => points.len() / 3,
            Preview::Patch(patch) => patch.point_count(),
        }
    }
}

/// Scene mutations requested by a session
pub trait SceneSink {
    /// Install (or refresh) the session's main mesh
    fn push_mesh(&mut self, mesh: &PolyData);

    fn add_preview(&mut self, preview: Preview<'_>) -> PreviewHandle;

    /// Replace the geometry behind an existing preview
    fn update_preview(&mut self, handle: PreviewHandle, preview: Preview<'_>);

    fn remove_preview(&mut self, handle: PreviewHandle);

    fn request_redraw(&mut self);

    /// Camera hint sent with metadata; ignored by default
    fn apply_camera(&mut self, _camera: &CameraPose) {}
}

impl<S: SceneSink + ?Sized> SceneSink for &mut S {
    fn push_mesh(&mut self, mesh: &PolyData) {
        (**self).push_mesh(mesh)
    }

    fn add_preview(&mut self, preview: Preview<'_>) -> PreviewHandle {
        (**self).add_preview(preview)
    }

    fn update_preview(&mut self, handle: PreviewHandle, preview: Preview<'_>) {
        (**self).update_preview(handle, preview)
    }

    fn remove_preview(&mut self, handle: PreviewHandle) {
        (**self).remove_preview(handle)
    }

    fn request_redraw(&mut self) {
        (**self).request_redraw()
    }

    fn apply_camera(&mut self, camera: &CameraPose) {
        (**self).apply_camera(camera)
    }
}
