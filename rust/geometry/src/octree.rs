// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Octree Occupancy Grid
//!
//! Coarse summary of where the final mesh will have points. The grid is a
//! uniform lattice of cubic cells; each cell stores one byte whose 8 bits
//! mark which octants of the cell are occupied. Every set bit becomes one
//! anchor point in the preview, placed a quarter spacing from the cell centre
//! towards its octant.
//!
//! As authoritative chunks arrive, the region they cover is cleared so the
//! coarse preview never overlaps the real geometry.
//!
//! Bit `k` maps to the octant whose x/y/z sign is given by bits 0/1/2 of `k`
//! (set = positive):
//!
//! | bit | x | y | z |
//! |-----|---|---|---|
//! | 0   | - | - | - |
//! | 1   | + | - | - |
//! | 2   | - | + | - |
//! | 3   | + | + | - |
//! | 4   | - | - | + |
//! | 5   | + | - | + |
//! | 6   | - | + | + |
//! | 7   | + | + | + |

use crate::error::{Error, Result};
use mesh_stream_core::{Bounds, TypedBuffer};
use nalgebra::{Point3, Vector3};

/// Unit offsets of the 8 octants, indexed by bit position
const OCTANT_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Largest grid `summarize` builds, as a multiple of the cells the bucket
/// size asks for
const MAX_CELL_FACTOR: f64 = 8.0;

/// Uniform occupancy grid with derived anchor points
#[derive(Debug, Clone)]
pub struct OctreeGrid {
    origin: Point3<f64>,
    spacing: f64,
    /// Grid point counts per axis
    dimensions: [usize; 3],
    /// One byte per cell, x fastest
    mask: Vec<u8>,
    /// Flat xyz anchor coordinates, one per set bit
    anchors: Vec<f64>,
}

impl OctreeGrid {
    /// Create a grid and compute its anchor points
    ///
    /// # Arguments
    /// * `origin` - World position of grid point (0, 0, 0)
    /// * `spacing` - Edge length of a cell
    /// * `dimensions` - Grid point counts per axis; cell counts are one less
    /// * `mask` - One occupancy byte per cell
    pub fn new(
        origin: Point3<f64>,
        spacing: f64,
        dimensions: [usize; 3],
        mask: Vec<u8>,
    ) -> Result<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(Error::InvalidGrid(format!("spacing must be positive, got {}", spacing)));
        }
        if !origin.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidGrid("origin is not finite".to_string()));
        }
        if dimensions.contains(&0) {
            return Err(Error::InvalidGrid(format!(
                "dimensions must be at least 1, got {:?}",
                dimensions
            )));
        }

        let expected = dimensions
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d - 1))
            .ok_or_else(|| Error::InvalidGrid(format!("dimensions {:?} overflow", dimensions)))?;
        if mask.len() != expected {
            return Err(Error::MaskLengthMismatch {
                expected,
                actual: mask.len(),
            });
        }

        let mut grid = Self {
            origin,
            spacing,
            dimensions,
            mask,
            anchors: Vec::new(),
        };
        grid.rebuild_anchor_points();
        Ok(grid)
    }

    /// Summarize a point set into an occupancy grid
    ///
    /// The cubic spacing is chosen so that a cell holds about
    /// `points_per_bucket` points on average. Flat axes get a single cell.
    /// Each point sets the bit of the octant it falls into.
    pub fn summarize(points: &TypedBuffer, bounds: &Bounds, points_per_bucket: usize) -> Result<Self> {
        if !bounds.is_valid() {
            return Err(Error::InvalidGrid("cannot summarize empty bounds".to_string()));
        }
        let values = points.to_f64_vec();
        let point_count = values.len() / 3;
        let target_cells = (point_count / points_per_bucket.max(1)).max(1) as f64;

        let extent = bounds.extent();
        let (measure, axes) = extent
            .iter()
            .filter(|&&e| e > 0.0)
            .fold((1.0, 0i32), |(m, n), &e| (m * e, n + 1));
        let mut spacing = if axes == 0 {
            1.0
        } else {
            (measure / target_cells).powf(1.0 / axes as f64)
        };

        // A near-flat axis shrinks the spacing and blows up the other axes
        let limit = target_cells * MAX_CELL_FACTOR;
        let mut cells = cells_for(&extent, spacing);
        loop {
            let total: f64 = cells.iter().map(|&c| c as f64).product();
            if total <= limit {
                break;
            }
            let spread = cells.iter().filter(|&&c| c > 1).count().max(1);
            spacing *= (total / limit).powf(1.0 / spread as f64).max(1.0 + 1e-6);
            cells = cells_for(&extent, spacing);
        }

        let origin = Point3::new(bounds.min_x, bounds.min_y, bounds.min_z);
        let mut mask = vec![0u8; cells[0] * cells[1] * cells[2]];

        for p in values.chunks_exact(3) {
            let mut cell = [0usize; 3];
            let mut octant = 0u8;
            for axis in 0..3 {
                let local = (p[axis] - origin[axis]) / spacing;
                let index = (local.floor().max(0.0) as usize).min(cells[axis] - 1);
                if local - index as f64 >= 0.5 {
                    octant |= 1 << axis;
                }
                cell[axis] = index;
            }
            let idx = cell[0] + cell[1] * cells[0] + cell[2] * cells[0] * cells[1];
            mask[idx] |= 1 << octant;
        }

        Self::new(origin, spacing, cells.map(|c| c + 1), mask)
    }

    /// Recompute anchor points from the occupancy mask
    ///
    /// O(cell count). Each set bit produces one point at the cell centre
    /// offset by a quarter spacing along every axis.
    pub fn rebuild_anchor_points(&mut self) {
        let [ci, cj, ck] = self.cell_dimensions();
        let quarter = self.spacing / 4.0;
        let total_bits: usize = self.mask.iter().map(|v| v.count_ones() as usize).sum();

        let mut anchors = Vec::with_capacity(total_bits * 3);
        for k in 0..ck {
            for j in 0..cj {
                for i in 0..ci {
                    let v = self.mask[i + j * ci + k * ci * cj];
                    if v == 0 {
                        continue;
                    }
                    let center = self.cell_center(i, j, k);
                    for (bit, signs) in OCTANT_SIGNS.iter().enumerate() {
                        if v & (1 << bit) != 0 {
                            let p = center + Vector3::from(*signs) * quarter;
                            anchors.extend_from_slice(&[p.x, p.y, p.z]);
                        }
                    }
                }
            }
        }
        self.anchors = anchors;
    }

    /// Zero every cell overlapping `bounds`, then rebuild the anchors
    ///
    /// Minima map to cell indices with `floor` and maxima with `ceil`, so the
    /// cleared range always covers the query and may extend one cell past it.
    /// The range is clamped to the grid on each axis. Returns the number of
    /// occupied cells that were cleared.
    pub fn clear_region(&mut self, bounds: &Bounds) -> usize {
        if !bounds.is_valid() {
            return 0;
        }
        let b = bounds.to_array();
        let cells = self.cell_dimensions();

        let mut range = [(0usize, 0usize); 3];
        for axis in 0..3 {
            if cells[axis] == 0 {
                return 0;
            }
            let lo = ((b[axis * 2] - self.origin[axis]) / self.spacing).floor();
            let hi = ((b[axis * 2 + 1] - self.origin[axis]) / self.spacing).ceil();
            let lo = lo.max(0.0);
            let hi = hi.min((cells[axis] - 1) as f64);
            if !(lo <= hi) {
                return 0;
            }
            range[axis] = (lo as usize, hi as usize);
        }

        let [ci, cj, _] = cells;
        let mut cleared = 0;
        for k in range[2].0..=range[2].1 {
            for j in range[1].0..=range[1].1 {
                for i in range[0].0..=range[0].1 {
                    let cell = &mut self.mask[i + j * ci + k * ci * cj];
                    if *cell != 0 {
                        *cell = 0;
                        cleared += 1;
                    }
                }
            }
        }

        // Untouched mask means identical anchors
        if cleared > 0 {
            self.rebuild_anchor_points();
        }
        cleared
    }

    /// World-space centre of cell (i, j, k)
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> Point3<f64> {
        self.origin + Vector3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5) * self.spacing
    }

    /// Cell counts per axis
    #[inline]
    pub fn cell_dimensions(&self) -> [usize; 3] {
        self.dimensions.map(|d| d.saturating_sub(1))
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.mask.len()
    }

    /// Flat xyz anchor coordinates
    #[inline]
    pub fn anchor_points(&self) -> &[f64] {
        &self.anchors
    }

    #[inline]
    pub fn anchor_count(&self) -> usize {
        self.anchors.len() / 3
    }

    /// Display radius for anchor glyphs
    #[inline]
    pub fn anchor_radius(&self) -> f64 {
        self.spacing / 4.0
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }
}

/// Cell counts covering `extent` at `spacing`, at least one per axis
fn cells_for(extent: &[f64; 3], spacing: f64) -> [usize; 3] {
    // Shave rounding noise so an extent of exactly N cells stays N cells
    extent.map(|e| ((e / spacing * (1.0 - 1e-9)).ceil() as usize).max(1))
}
