// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interim point cloud for one received chunk

use crate::connectivity::ConnectivityCache;
use mesh_stream_core::{Bounds, TypedBuffer};
use std::sync::Arc;

/// Points of one chunk, shown until the final connectivity arrives
///
/// Immutable once built. Its bounds double as the region query that clears
/// the coarse occupancy preview.
#[derive(Debug, Clone)]
pub struct ProgressPatch {
    points: TypedBuffer,
    verts: Arc<[u32]>,
    bounds: Bounds,
}

impl ProgressPatch {
    pub fn new(points: TypedBuffer, cache: &ConnectivityCache) -> Self {
        let verts = cache.get_verts(points.len() / 3);
        let bounds = Bounds::from_points(&points);
        Self {
            points,
            verts,
            bounds,
        }
    }

    /// Flat xyz triplets
    pub fn points(&self) -> &TypedBuffer {
        &self.points
    }

    /// Shared `[n, 0, .., n-1]` vertex cells
    pub fn verts(&self) -> &Arc<[u32]> {
        &self.verts
    }

    /// Invalid when the chunk held no complete point
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn point_count(&self) -> usize {
        self.points.len() / 3
    }
}
