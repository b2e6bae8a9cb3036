// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Mesh-Stream Core
//!
//! Shared vocabulary for progressive mesh streaming: the messages a producer
//! publishes while it is still computing a mesh, the closed set of numeric
//! element types their binary attachments use, and typed buffers those
//! attachments decode into.
//!
//! ## Overview
//!
//! - **Messages**: `metadata`, `octree`, `xyz-chunk`, `connectivity`, routed
//!   by session id
//! - **Element types**: VTK array class names resolved once into [`ElementType`]
//! - **Typed buffers**: bounds-checked writes into pre-allocated storage
//!
//! ## Quick Start
//!
//! ```rust
//! use mesh_stream_core::{ElementType, TypedBuffer};
//!
//! let mut points = TypedBuffer::zeroed(ElementType::from_name("vtkFloatArray")?, 6);
//! let chunk = TypedBuffer::decode(ElementType::Float32, &[0, 0, 128, 63, 0, 0, 0, 64])?;
//! let offset = points.write_at(0, &chunk)?;
//! assert_eq!(offset, 2);
//! # Ok::<(), mesh_stream_core::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: JSON wire codec with base64 attachments

pub mod bounds;
pub mod buffer;
#[cfg(feature = "serde")]
pub mod codec;
pub mod element_type;
pub mod error;
pub mod message;

pub use bounds::Bounds;
pub use buffer::{Element, TypedBuffer};
pub use element_type::ElementType;
pub use error::{Error, Result};
pub use message::{
    Attachment, CameraPose, ConnectivityMessage, Message, MessageKind, MetadataMessage,
    OctreeMessage, SessionId, XyzChunkMessage,
};
