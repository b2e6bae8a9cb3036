// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh-Stream Server - progressive mesh producer.
//!
//! Holds a registry of finished meshes and, on request, publishes one of
//! them on a shared topic as `metadata`, `octree`, a run of `xyz-chunk`
//! messages and a closing `connectivity` message. Viewers follow the topic
//! over Server-Sent Events and assemble the mesh while it arrives.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/meshes` - Registered meshes
//! - `POST /api/v1/meshes/:uuid/push` - Publish a mesh on the topic
//! - `GET /api/v1/stream` - Topic feed (SSE), optionally filtered by `?uuid=`

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use mesh_stream_core::{CameraPose, SessionId};
use mesh_stream_geometry::{Point3, PolyData};
use mesh_stream_session::SessionConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod config;
mod error;
mod routes;
mod services;

use config::Config;
use services::{MeshRegistry, MeshSource, MeshStreamer, Topic};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub topic: Arc<Topic>,
    pub registry: Arc<MeshRegistry>,
    pub streamer: Arc<MeshStreamer>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        chunk_size = config.chunk_size,
        points_per_bucket = config.points_per_bucket,
        sleep_time_ms = config.sleep_time_ms,
        sphere_resolution = config.sphere_resolution,
        point_type = config.point_type.vtk_name(),
        "Starting Mesh-Stream Server"
    );

    let state = AppState {
        topic: Arc::new(Topic::new(config.topic_capacity)),
        registry: Arc::new(MeshRegistry::new()),
        streamer: Arc::new(MeshStreamer::new(
            config.chunk_size,
            config.points_per_bucket,
            config.sleep_time(),
        )),
        config: Arc::new(config.clone()),
    };

    let demo = demo_sphere(&state.config);
    tracing::info!(
        uuid = %demo.id,
        points = demo.mesh.point_count(),
        polys = demo.mesh.polys.len(),
        "Demo sphere registered"
    );
    state.registry.register(demo.clone()).await;

    let demo_client = state.config.demo_client.then(|| {
        services::spawn_demo_client(
            state.topic.clone(),
            state.streamer.clone(),
            demo,
            SessionConfig::default().with_skip_octree_preview(state.config.skip_octree),
        )
    });

    let app = Router::new()
        .route("/", get(routes::health::info))
        .route("/api/v1/health", get(routes::health::check))
        .route("/api/v1/meshes", get(routes::mesh::list))
        .route("/api/v1/meshes/:uuid/push", post(routes::mesh::push))
        .route("/api/v1/stream", get(routes::mesh::stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some((handle, teardown)) = demo_client {
        teardown.fire();
        let _ = handle.await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug,mesh_stream_server=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }
}

/// Unit sphere at the origin under a fresh id, viewed from +z.
fn demo_sphere(config: &Config) -> MeshSource {
    let mesh = PolyData::uv_sphere(Point3::origin(), 1.0, config.sphere_resolution, config.point_type);
    MeshSource {
        id: SessionId::from(uuid::Uuid::new_v4().to_string()),
        mesh: Arc::new(mesh),
        camera: Some(CameraPose {
            position: [0.0, 0.0, 4.0],
            view_up: [0.0, 1.0, 0.0],
            focal_point: [0.0, 0.0, 0.0],
        }),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
