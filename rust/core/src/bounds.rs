// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounds in f64 precision
//!
//! On the wire bounds travel as six scalars in `[xmin, xmax, ymin, ymax,
//! zmin, zmax]` order.

use crate::buffer::TypedBuffer;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Bounds {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
            min_z: f64::MAX,
            max_z: f64::MIN,
        }
    }

    /// From `[xmin, xmax, ymin, ymax, zmin, zmax]`
    #[inline]
    pub fn from_array(b: [f64; 6]) -> Self {
        Self {
            min_x: b[0],
            max_x: b[1],
            min_y: b[2],
            max_y: b[3],
            min_z: b[4],
            max_z: b[5],
        }
    }

    /// As `[xmin, xmax, ymin, ymax, zmin, zmax]`
    #[inline]
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min_x, self.max_x, self.min_y, self.max_y, self.min_z, self.max_z,
        ]
    }

    /// Bounds of a flat xyz triplet buffer; invalid when it holds no point
    pub fn from_points(points: &TypedBuffer) -> Self {
        let mut bounds = Self::new();
        let values = points.to_f64_vec();
        values.chunks_exact(3).for_each(|p| bounds.expand(p[0], p[1], p[2]));
        bounds
    }

    /// Check if bounds are valid (min <= max on every axis)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y && self.min_z <= self.max_z
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.min_z = self.min_z.min(z);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.max_z = self.max_z.max(z);
    }

    /// Get centroid (center of bounding box)
    #[inline]
    pub fn centroid(&self) -> [f64; 3] {
        if !self.is_valid() {
            return [0.0; 3];
        }
        [
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        ]
    }

    /// Edge lengths per axis
    #[inline]
    pub fn extent(&self) -> [f64; 3] {
        if !self.is_valid() {
            return [0.0; 3];
        }
        [
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        ]
    }

    /// Box corner `index` (0..8)
    ///
    /// Corners 0-3 walk the min-Z face and 4-7 the max-Z face, each face in
    /// the order (min,min), (max,min), (max,max), (min,max) so consecutive
    /// corners share an edge.
    #[inline]
    pub fn corner(&self, index: usize) -> [f64; 3] {
        let face = index % 4;
        let x = if face == 1 || face == 2 { self.max_x } else { self.min_x };
        let y = if face >= 2 { self.max_y } else { self.min_y };
        let z = if index >= 4 { self.max_z } else { self.min_z };
        [x, y, z]
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f64; 6]> for Bounds {
    fn from(b: [f64; 6]) -> Self {
        Self::from_array(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bounds_invalid() {
        let bounds = Bounds::new();
        assert!(!bounds.is_valid());
        assert_eq!(bounds.centroid(), [0.0; 3]);
    }

    #[test]
    fn test_from_points() {
        let points = TypedBuffer::Float32(vec![1.0, 5.0, -1.0, 3.0, 2.0, 4.0]);
        let bounds = Bounds::from_points(&points);
        assert_eq!(bounds.to_array(), [1.0, 3.0, 2.0, 5.0, -1.0, 4.0]);
        assert_eq!(bounds.centroid(), [2.0, 3.5, 1.5]);
        assert_eq!(bounds.extent(), [2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_corners_cover_all_combinations() {
        let bounds = Bounds::from_array([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let corners: Vec<[f64; 3]> = (0..8).map(|i| bounds.corner(i)).collect();
        assert_eq!(corners[0], [0.0, 2.0, 4.0]);
        assert_eq!(corners[1], [1.0, 2.0, 4.0]);
        assert_eq!(corners[2], [1.0, 3.0, 4.0]);
        assert_eq!(corners[3], [0.0, 3.0, 4.0]);
        assert_eq!(corners[6], [1.0, 3.0, 5.0]);

        for x in [0.0, 1.0] {
            for y in [2.0, 3.0] {
                for z in [4.0, 5.0] {
                    assert!(corners.contains(&[x, y, z]));
                }
            }
        }
    }
}
