// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chunk sizing.
//!
//! A chunk carries a slice of points and, for polygonal meshes, a slice of
//! poly indices. The byte budget is split between the two in proportion to
//! their totals so both streams run out at about the same chunk. Indices the
//! chunks did not carry travel with the closing `connectivity` message.

use mesh_stream_core::ElementType;

/// Poly indices travel as u32.
const INDEX_BYTES: f64 = 4.0;

/// Elements per `xyz-chunk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPlan {
    /// Points (not scalars) per chunk, at least 1.
    pub points_per_chunk: usize,
    /// Poly indices per chunk; 0 for point clouds.
    pub polys_per_chunk: usize,
}

impl StreamPlan {
    pub fn new(point_count: usize, poly_count: usize, chunk_bytes: usize, point_type: ElementType) -> Self {
        let bytes_per_point = (point_type.size() * 3) as f64;
        let budget = chunk_bytes as f64;

        if poly_count == 0 || point_count == 0 {
            return Self {
                points_per_chunk: ((budget / bytes_per_point) as usize).max(1),
                polys_per_chunk: 0,
            };
        }

        let indices_per_point = poly_count as f64 / point_count as f64;
        let unit = bytes_per_point + indices_per_point * INDEX_BYTES;
        let points = ((budget / unit) as usize).max(1);
        let polys = ((indices_per_point * points as f64) as usize).max(1);

        Self {
            points_per_chunk: points,
            polys_per_chunk: polys,
        }
    }

    /// Number of `xyz-chunk` messages for `point_count` points.
    pub fn chunk_count(&self, point_count: usize) -> usize {
        point_count.div_ceil(self.points_per_chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_cloud_spends_budget_on_points() {
        let plan = StreamPlan::new(1_000_000, 0, 1200, ElementType::Float32);
        assert_eq!(plan.points_per_chunk, 100);
        assert_eq!(plan.polys_per_chunk, 0);
        assert_eq!(plan.chunk_count(1_000_000), 10_000);
    }

    #[test]
    fn test_poly_heavy_mesh_splits_proportionally() {
        // 6 indices per f32 point: 12 + 24 bytes per unit
        let plan = StreamPlan::new(100, 600, 360, ElementType::Float32);
        assert_eq!(plan.points_per_chunk, 10);
        assert_eq!(plan.polys_per_chunk, 60);
        assert_eq!(plan.chunk_count(100) * plan.polys_per_chunk, 600);
    }

    #[test]
    fn test_point_heavy_mesh_splits_proportionally() {
        // Half an index per f64 point: 24 + 2 bytes per unit
        let plan = StreamPlan::new(100, 50, 280, ElementType::Float64);
        assert_eq!(plan.points_per_chunk, 10);
        assert_eq!(plan.polys_per_chunk, 5);
    }

    #[test]
    fn test_tiny_budget_makes_progress() {
        let plan = StreamPlan::new(100, 300, 1, ElementType::Float64);
        assert_eq!(plan.points_per_chunk, 1);
        assert_eq!(plan.polys_per_chunk, 3);
    }
}
