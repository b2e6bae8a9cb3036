// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON wire codec
//!
//! Messages are JSON objects tagged by `"type"`. Binary attachments are
//! embedded as standard base64 strings.

use crate::error::Result;
use crate::message::{Attachment, Message};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

impl Serialize for Attachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Attachment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct Base64Visitor;

        impl Visitor<'_> for Base64Visitor {
            type Value = Attachment;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a base64 encoded attachment")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Attachment, E> {
                STANDARD
                    .decode(v)
                    .map(|raw| Attachment(Bytes::from(raw)))
                    .map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Base64Visitor)
    }
}

/// Encode a message as JSON text
pub fn to_json(message: &Message) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a message from JSON text
pub fn from_json(text: &str) -> Result<Message> {
    Ok(serde_json::from_str(text)?)
}
