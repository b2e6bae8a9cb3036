// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload decoding
//!
//! Decoding an attachment is the only point where a session suspends. Hosts
//! that receive large chunks can move the work off the consumer task by
//! supplying their own [`PayloadDecoder`].

use mesh_stream_core::{Attachment, ElementType, TypedBuffer};
use futures::future::{self, BoxFuture, FutureExt};

/// Turns a binary attachment into a typed buffer
pub trait PayloadDecoder: Send + Sync {
    fn decode<'a>(
        &'a self,
        element_type: ElementType,
        payload: &'a Attachment,
    ) -> BoxFuture<'a, mesh_stream_core::Result<TypedBuffer>>;
}

/// Decodes on the calling task
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDecoder;

impl PayloadDecoder for InlineDecoder {
    fn decode<'a>(
        &'a self,
        element_type: ElementType,
        payload: &'a Attachment,
    ) -> BoxFuture<'a, mesh_stream_core::Result<TypedBuffer>> {
        future::ready(TypedBuffer::decode(element_type, payload.bytes())).boxed()
    }
}
