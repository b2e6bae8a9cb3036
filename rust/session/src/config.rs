// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration

use mesh_stream_geometry::connectivity::DEFAULT_MAX_ENTRIES;

/// Default cap on the bytes a `metadata` message may ask a session to
/// allocate for points plus poly indices (2 GiB)
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 1 << 31;

/// Per-session options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Discard `octree` messages instead of showing the occupancy preview
    pub skip_octree_preview: bool,
    /// Entry limit for a connectivity cache created by the session itself
    pub connectivity_cache_limit: usize,
    /// Largest point plus poly-index allocation accepted from `metadata`
    pub max_buffer_bytes: usize,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_octree_preview(mut self, skip: bool) -> Self {
        self.skip_octree_preview = skip;
        self
    }

    pub fn with_connectivity_cache_limit(mut self, limit: usize) -> Self {
        self.connectivity_cache_limit = limit;
        self
    }

    pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            skip_octree_preview: false,
            connectivity_cache_limit: DEFAULT_MAX_ENTRIES,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
        }
    }
}
