// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh-Stream Geometry
//!
//! Preview geometry for progressively streamed meshes: a coarse octree
//! occupancy grid shown before any point arrives, per-chunk point patches
//! sharing cached vertex connectivity, and the VTK-layout poly data that the
//! final mesh is assembled into. Uses nalgebra for positions.

pub mod connectivity;
pub mod error;
pub mod octree;
pub mod patch;
pub mod poly_data;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use connectivity::ConnectivityCache;
pub use error::{Error, Result};
pub use octree::OctreeGrid;
pub use patch::ProgressPatch;
pub use poly_data::{PolyData, BOX_OUTLINE};
