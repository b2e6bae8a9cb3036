// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygonal mesh in VTK cell-array layout
//!
//! Connectivity arrays use the flat `[n, id0, .., idn-1, n, ...]` encoding
//! for verts, lines, polys and strips alike.

use crate::error::Result;
use mesh_stream_core::{Bounds, ElementType, Error as CoreError, TypedBuffer};
use nalgebra::Point3;
use std::f64::consts::PI;

/// 12-edge box outline over the placeholder corners: the two face loops
/// followed by the four vertical edges
pub const BOX_OUTLINE: [u8; 24] = [
    5, 0, 1, 2, 3, 0, //
    5, 4, 5, 6, 7, 4, //
    2, 0, 4, //
    2, 1, 5, //
    2, 2, 6, //
    2, 3, 7, //
];

/// Number of corners written by [`PolyData::bounding_box_placeholder`]
pub const BOX_CORNERS: usize = 8;

/// Points plus the four VTK cell arrays
#[derive(Debug, Clone)]
pub struct PolyData {
    /// Flat xyz triplets
    pub points: TypedBuffer,
    pub verts: TypedBuffer,
    pub lines: TypedBuffer,
    pub polys: TypedBuffer,
    pub strips: TypedBuffer,
    mtime: u64,
}

impl PolyData {
    /// Create a new empty mesh with f32 points
    pub fn new() -> Self {
        Self::with_points(TypedBuffer::Float32(Vec::new()))
    }

    /// Mesh over `points` with no cells
    pub fn with_points(points: TypedBuffer) -> Self {
        Self {
            points,
            verts: TypedBuffer::UInt32(Vec::new()),
            lines: TypedBuffer::UInt32(Vec::new()),
            polys: TypedBuffer::UInt32(Vec::new()),
            strips: TypedBuffer::UInt32(Vec::new()),
            mtime: 0,
        }
    }

    /// Stand-in mesh shown while the real points stream in
    ///
    /// Allocates `point_count * 3` values of `point_type`, writes the eight
    /// corners of `bounds` (see [`Bounds::corner`]) and pads every remaining
    /// slot with corner 0, then installs [`BOX_OUTLINE`] as line cells. When
    /// fewer than eight points are expected only the corners that fit are
    /// written and no outline is installed. Fails without allocating when
    /// `point_count * 3` overflows, and fails if the allocation is refused.
    pub fn bounding_box_placeholder(
        bounds: &Bounds,
        point_count: usize,
        point_type: ElementType,
    ) -> Result<Self> {
        let len = point_count
            .checked_mul(3)
            .ok_or_else(|| CoreError::MalformedPayload(format!("point count {point_count} is too large")))?;
        let mut points = TypedBuffer::try_zeroed(point_type, len)?;
        for index in 0..point_count {
            let corner = bounds.corner(if index < BOX_CORNERS { index } else { 0 });
            for (axis, value) in corner.into_iter().enumerate() {
                points.set_f64(index * 3 + axis, value);
            }
        }

        let mut mesh = Self::with_points(points);
        if point_count >= BOX_CORNERS {
            mesh.lines = TypedBuffer::UInt8(BOX_OUTLINE.to_vec());
        }
        Ok(mesh)
    }

    /// Triangulated UV sphere
    ///
    /// `resolution` is the number of segments around the equator and the
    /// number of latitude steps from pole to pole; values below 3 are raised
    /// to 3. Triangles are emitted as poly cells.
    pub fn uv_sphere(
        center: Point3<f64>,
        radius: f64,
        resolution: usize,
        point_type: ElementType,
    ) -> Self {
        let segments = resolution.max(3);
        let rings = resolution.max(3) - 1;

        // Poles first, then each interior ring
        let mut coords = Vec::with_capacity((2 + (rings - 1) * segments) * 3);
        coords.extend_from_slice(&[center.x, center.y, center.z + radius]);
        coords.extend_from_slice(&[center.x, center.y, center.z - radius]);
        for ring in 1..rings {
            let phi = PI * ring as f64 / rings as f64;
            for segment in 0..segments {
                let theta = 2.0 * PI * segment as f64 / segments as f64;
                coords.push(center.x + radius * phi.sin() * theta.cos());
                coords.push(center.y + radius * phi.sin() * theta.sin());
                coords.push(center.z + radius * phi.cos());
            }
        }

        let ring_start = |ring: usize| (2 + (ring - 1) * segments) as u32;
        let mut polys: Vec<u32> = Vec::new();
        for segment in 0..segments {
            let a = segment as u32;
            let b = ((segment + 1) % segments) as u32;

            let top = ring_start(1);
            polys.extend_from_slice(&[3, 0, top + a, top + b]);

            for ring in 1..rings - 1 {
                let upper = ring_start(ring);
                let lower = ring_start(ring + 1);
                polys.extend_from_slice(&[3, upper + a, lower + a, lower + b]);
                polys.extend_from_slice(&[3, upper + a, lower + b, upper + b]);
            }

            let bottom = ring_start(rings - 1);
            polys.extend_from_slice(&[3, 1, bottom + b, bottom + a]);
        }

        let mut mesh = Self::with_points(TypedBuffer::from_f64_slice(point_type, &coords));
        mesh.polys = TypedBuffer::UInt32(polys);
        mesh
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len() / 3
    }

    /// Bounds of all points
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points)
    }

    /// Bump the modification counter so downstream consumers re-read buffers
    #[inline]
    pub fn modified(&mut self) {
        self.mtime += 1;
    }

    #[inline]
    pub fn mtime(&self) -> u64 {
        self.mtime
    }
}

impl Default for PolyData {
    fn default() -> Self {
        Self::new()
    }
}
