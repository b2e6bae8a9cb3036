// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for wire and buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving types, decoding payloads or writing buffers
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

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Wire codec error: {0}")]
    Codec(String),
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
