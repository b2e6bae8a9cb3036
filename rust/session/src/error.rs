// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::session::SessionState;
use mesh_stream_core::MessageKind;
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned to the owner of a session
///
/// A message that fails leaves the session exactly as it was before the
/// message arrived.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown element type: {0:?}")]
    UnknownElementType(String),

    #[error("Buffer overflow: writing {incoming} elements at offset {offset} exceeds capacity {capacity}")]
    BufferOverflow {
        offset: usize,
        incoming: usize,
        capacity: usize,
    },

    #[error("Out of order: {kind} message received while {state}")]
    OutOfOrderMessage {
        kind: MessageKind,
        state: SessionState,
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<mesh_stream_core::Error> for Error {
    fn from(err: mesh_stream_core::Error) -> Self {
        use mesh_stream_core::Error as CoreError;
        match err {
            CoreError::UnknownElementType(name) => Error::UnknownElementType(name),
            CoreError::BufferOverflow {
                offset,
                incoming,
                capacity,
            } => Error::BufferOverflow {
                offset,
                incoming,
                capacity,
            },
            CoreError::MalformedPayload(msg) | CoreError::Codec(msg) => Error::MalformedPayload(msg),
        }
    }
}

impl From<mesh_stream_geometry::Error> for Error {
    fn from(err: mesh_stream_geometry::Error) -> Self {
        match err {
            mesh_stream_geometry::Error::CoreError(inner) => inner.into(),
            other => Error::MalformedPayload(other.to_string()),
        }
    }
}
