// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point-cloud connectivity cache
//!
//! Rendering a bare point buffer needs a vertex cell array of the form
//! `[count, 0, 1, ..., count - 1]`. Chunks tend to repeat the same sizes, so
//! the arrays are built once per size and shared.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Default number of distinct sizes kept before the cache is flushed
pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Shared cache of "one vertex per point" cell arrays, keyed by point count
///
/// Construct one per host (or per group of sessions) and hand it out as an
/// `Arc`. Entries never go stale; once `max_entries` distinct sizes are held
/// the cache is flushed so long-running processes stay bounded. Arrays
/// already handed out remain valid.
#[derive(Debug)]
pub struct ConnectivityCache {
    entries: Mutex<FxHashMap<usize, Arc<[u32]>>>,
    max_entries: usize,
}

impl ConnectivityCache {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_ENTRIES)
    }

    /// Cache holding at most `max_entries` sizes (at least one)
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Vertex cell array for `count` isolated points
    ///
    /// Repeated calls with the same `count` return the same allocation.
    pub fn get_verts(&self, count: usize) -> Arc<[u32]> {
        let mut entries = self.entries.lock();
        if let Some(cached) = entries.get(&count) {
            return Arc::clone(cached);
        }

        if entries.len() >= self.max_entries {
            entries.clear();
        }

        // Point ids are 32-bit on the wire
        let verts: Arc<[u32]> = std::iter::once(count as u32)
            .chain(0..count as u32)
            .collect();
        entries.insert(count, Arc::clone(&verts));
        verts
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ConnectivityCache {
    fn default() -> Self {
        Self::new()
    }
}
