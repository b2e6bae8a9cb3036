// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mesh_stream_core::{ElementType, TypedBuffer};
use mesh_stream_geometry::{ConnectivityCache, OctreeGrid, PolyData, Point3, ProgressPatch};

fn sphere() -> PolyData {
    PolyData::uv_sphere(Point3::new(0.0, 0.0, 0.0), 5.0, 24, ElementType::Float32)
}

#[test]
fn summary_anchors_match_occupied_octants() {
    let mesh = sphere();
    let grid = OctreeGrid::summarize(&mesh.points, &mesh.bounds(), 8).unwrap();

    let bits: usize = grid.mask().iter().map(|v| v.count_ones() as usize).sum();
    assert!(bits > 0);
    assert_eq!(grid.anchor_count(), bits);
    assert!(bits <= mesh.point_count());
}

#[test]
fn chunks_covering_the_mesh_clear_the_whole_preview() {
    let mesh = sphere();
    let mut grid = OctreeGrid::summarize(&mesh.points, &mesh.bounds(), 8).unwrap();
    let cache = ConnectivityCache::new();

    let values = mesh.points.to_f64_vec();
    let chunk_points = 100;
    for chunk in values.chunks(chunk_points * 3) {
        let patch = ProgressPatch::new(TypedBuffer::from_f64_slice(ElementType::Float32, chunk), &cache);
        grid.clear_region(patch.bounds());
    }

    assert_eq!(grid.anchor_count(), 0);
    assert!(grid.mask().iter().all(|&v| v == 0));
}

#[test]
fn equal_sized_chunks_share_connectivity() {
    let mesh = sphere();
    let cache = ConnectivityCache::new();
    let values = mesh.points.to_f64_vec();

    let patches: Vec<ProgressPatch> = values
        .chunks_exact(30 * 3)
        .map(|c| ProgressPatch::new(TypedBuffer::from_f64_slice(ElementType::Float32, c), &cache))
        .collect();

    assert!(patches.len() > 1);
    assert_eq!(cache.len(), 1);
    assert!(patches.windows(2).all(|w| std::sync::Arc::ptr_eq(w[0].verts(), w[1].verts())));
}
