// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh listing, push trigger and the SSE topic feed.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use mesh_stream_core::{codec, Message, SessionId};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

#[derive(Debug, Serialize)]
pub struct MeshSummary {
    pub uuid: String,
    pub points: usize,
    pub polys: usize,
    pub point_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeshListResponse {
    pub meshes: Vec<MeshSummary>,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub uuid: String,
    /// `xyz-chunk` messages this push will publish
    pub chunks: usize,
    pub points_per_chunk: usize,
    pub polys_per_chunk: usize,
    /// Subscribers connected when the push started
    pub subscribers: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Only forward messages for this mesh
    pub uuid: Option<String>,
}

/// GET /api/v1/meshes - Meshes available for push.
pub async fn list(State(state): State<AppState>) -> Json<MeshListResponse> {
    let mut meshes = Vec::new();
    for id in state.registry.list().await {
        if let Some(source) = state.registry.get(&id).await {
            meshes.push(MeshSummary {
                uuid: id.to_string(),
                points: source.mesh.point_count(),
                polys: source.mesh.polys.len(),
                point_type: source.mesh.points.element_type().vtk_name(),
            });
        }
    }
    Json(MeshListResponse { meshes })
}

/// POST /api/v1/meshes/:uuid/push - Publish one mesh on the topic.
pub async fn push(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<(StatusCode, Json<PushResponse>), ApiError> {
    let id = SessionId::from(uuid);
    let source = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| ApiError::MeshNotFound(id.to_string()))?;

    let plan = state.streamer.plan(&source.mesh);
    let response = PushResponse {
        uuid: id.to_string(),
        chunks: plan.chunk_count(source.mesh.point_count()),
        points_per_chunk: plan.points_per_chunk,
        polys_per_chunk: plan.polys_per_chunk,
        subscribers: state.topic.receiver_count(),
    };

    tracing::info!(
        uuid = %id,
        chunks = response.chunks,
        subscribers = response.subscribers,
        "Starting mesh push"
    );

    let topic = state.topic.clone();
    let streamer = state.streamer.clone();
    tokio::spawn(async move { streamer.publish(&topic, source).await });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /api/v1/stream - Server-Sent Events feed of the mesh topic.
///
/// Each event is named after the message type and carries the JSON
/// encoding of the message.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = query.uuid.map(SessionId::from);
    tracing::debug!(uuid = ?filter.as_ref().map(|id| id.as_str()), "SSE subscriber connected");

    let stream = BroadcastStream::new(state.topic.receiver()).filter_map(move |item| {
        let event = match item {
            Ok(message) if wanted(&message, filter.as_ref()) => to_event(&message),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "SSE subscriber lagged, messages dropped");
                None
            }
        };
        futures::future::ready(event.map(Ok::<_, Infallible>))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn wanted(message: &Message, filter: Option<&SessionId>) -> bool {
    filter.map_or(true, |id| message.session_id() == id)
}

fn to_event(message: &Message) -> Option<Event> {
    match codec::to_json(message) {
        Ok(json) => Some(Event::default().event(message.kind().as_str()).data(json)),
        Err(e) => {
            tracing::error!(uuid = %message.session_id(), error = %e, "Failed to encode message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_stream_core::{Attachment, ConnectivityMessage};

    fn closing(uuid: &str) -> Message {
        Message::Connectivity(ConnectivityMessage {
            uuid: SessionId::from(uuid),
            verts: Attachment::default(),
            lines: Attachment::default(),
            strips: Attachment::default(),
            polys: None,
        })
    }

    #[test]
    fn test_uuid_filter() {
        let a = SessionId::from("a");
        assert!(wanted(&closing("a"), None));
        assert!(wanted(&closing("a"), Some(&a)));
        assert!(!wanted(&closing("b"), Some(&a)));
    }

    #[test]
    fn test_event_encoding() {
        assert!(to_event(&closing("a")).is_some());
    }
}
