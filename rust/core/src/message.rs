// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages published on the mesh topic
//!
//! A producer publishes, per session, one `metadata`, an optional `octree`,
//! any number of `xyz-chunk` and a closing `connectivity` message. Several
//! sessions share one topic and are told apart by `uuid`.

use crate::bounds::Bounds;
use bytes::Bytes;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque session identifier used for message routing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Binary payload attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attachment(pub Bytes);

impl Attachment {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Attachment {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<Bytes> for Attachment {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

/// Camera hint sent with metadata
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct CameraPose {
    pub position: [f64; 3],
    pub view_up: [f64; 3],
    pub focal_point: [f64; 3],
}

/// Sizes, element type names and bounds of the mesh to come
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetadataMessage {
    pub uuid: SessionId,
    /// Number of points
    pub points: usize,
    /// Number of elements in the polygon connectivity array
    pub polys: usize,
    pub points_type: String,
    pub verts_type: String,
    pub lines_type: String,
    pub polys_type: String,
    pub strips_type: String,
    /// `[xmin, xmax, ymin, ymax, zmin, zmax]`
    pub bounds: [f64; 6],
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub camera: Option<CameraPose>,
}

impl MetadataMessage {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_array(self.bounds)
    }
}

/// Coarse occupancy summary of the final point set
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OctreeMessage {
    pub uuid: SessionId,
    /// One byte per cell, one bit per octant
    pub octree: Attachment,
    pub origin: [f64; 3],
    pub spacing: f64,
    /// Grid point counts per axis (cells = dimensions - 1)
    pub dimensions: [usize; 3],
}

/// One incremental slice of points and polygon indices
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XyzChunkMessage {
    pub uuid: SessionId,
    pub xyz: Attachment,
    /// Absent for point clouds
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub polys: Option<Attachment>,
    /// Overrides the declared point type for this chunk only
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub array_type: Option<String>,
}

/// Final cell connectivity, closes the session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectivityMessage {
    pub uuid: SessionId,
    pub verts: Attachment,
    pub lines: Attachment,
    pub strips: Attachment,
    /// Polygon indices not yet sent in any chunk
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub polys: Option<Attachment>,
}

/// Any message on the mesh topic
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "type", rename_all = "kebab-case")
)]
pub enum Message {
    Metadata(MetadataMessage),
    Octree(OctreeMessage),
    XyzChunk(XyzChunkMessage),
    Connectivity(ConnectivityMessage),
}

/// Message discriminant, for logging and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Metadata,
    Octree,
    XyzChunk,
    Connectivity,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Metadata => "metadata",
            MessageKind::Octree => "octree",
            MessageKind::XyzChunk => "xyz-chunk",
            MessageKind::Connectivity => "connectivity",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Message::Metadata(m) => &m.uuid,
            Message::Octree(m) => &m.uuid,
            Message::XyzChunk(m) => &m.uuid,
            Message::Connectivity(m) => &m.uuid,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Metadata(_) => MessageKind::Metadata,
            Message::Octree(_) => MessageKind::Octree,
            Message::XyzChunk(_) => MessageKind::XyzChunk,
            Message::Connectivity(_) => MessageKind::Connectivity,
        }
    }
}
