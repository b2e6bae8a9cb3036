// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meshes the server can push, keyed by session id.

use super::streamer::MeshSource;
use mesh_stream_core::SessionId;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MeshRegistry {
    meshes: RwLock<FxHashMap<SessionId, MeshSource>>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any mesh already registered under the same id.
    pub async fn register(&self, source: MeshSource) {
        let mut meshes = self.meshes.write().await;
        tracing::debug!(
            uuid = %source.id,
            points = source.mesh.point_count(),
            polys = source.mesh.polys.len(),
            "Mesh registered"
        );
        meshes.insert(source.id.clone(), source);
    }

    pub async fn get(&self, id: &SessionId) -> Option<MeshSource> {
        self.meshes.read().await.get(id).cloned()
    }

    /// Registered ids, sorted.
    pub async fn list(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.meshes.read().await.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}
