// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    /// Meshes available for push
    pub meshes: usize,
    /// Open topic receivers, SSE clients and the demo client included
    pub subscribers: usize,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "mesh-stream-server",
        meshes: state.registry.list().await.len(),
        subscribers: state.topic.receiver_count(),
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "mesh-stream-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Progressive mesh streaming over Server-Sent Events",
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/api/v1/health",
                description: "Health check endpoint",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/meshes",
                description: "Meshes available for push",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/meshes/:uuid/push",
                description: "Publish a mesh progressively on the topic",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/stream",
                description: "Mesh topic feed (Server-Sent Events), optional ?uuid= filter",
            },
        ],
    })
}
