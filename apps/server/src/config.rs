// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use mesh_stream_core::ElementType;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Byte budget for the points and poly indices of one `xyz-chunk`.
    pub chunk_size: usize,
    /// Average number of points summarized by one octree cell.
    pub points_per_bucket: usize,
    /// Pause before the first chunk and after every chunk.
    pub sleep_time_ms: u64,
    /// Demo client discards octree previews.
    pub skip_octree: bool,
    /// Segments of the built-in demo sphere.
    pub sphere_resolution: usize,
    /// Point precision of the demo sphere.
    pub point_type: ElementType,
    /// Messages buffered per topic subscriber before it lags.
    pub topic_capacity: usize,
    /// Run an in-process client that assembles the demo sphere and logs progress.
    pub demo_client: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .unwrap_or(8080),
            chunk_size: std::env::var("CHUNK_SIZE")
                .unwrap_or_else(|_| "5000000".into())
                .parse()
                .unwrap_or(5_000_000),
            points_per_bucket: std::env::var("POINTS_PER_BUCKET")
                .unwrap_or_else(|_| "8".into())
                .parse()
                .unwrap_or(8),
            sleep_time_ms: std::env::var("SLEEP_TIME_MS")
                .unwrap_or_else(|_| "100".into())
                .parse()
                .unwrap_or(100),
            skip_octree: std::env::var("SKIP_OCTREE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            sphere_resolution: std::env::var("SPHERE_RESOLUTION")
                .unwrap_or_else(|_| "256".into())
                .parse()
                .unwrap_or(256),
            point_type: std::env::var("POINT_TYPE")
                .ok()
                .and_then(|name| ElementType::from_name(&name).ok())
                .filter(|ty| ty.is_float())
                .unwrap_or(ElementType::Float32),
            topic_capacity: std::env::var("TOPIC_CAPACITY")
                .unwrap_or_else(|_| "1024".into())
                .parse()
                .unwrap_or(1024),
            demo_client: std::env::var("DEMO_CLIENT")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn sleep_time(&self) -> Duration {
        Duration::from_millis(self.sleep_time_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
