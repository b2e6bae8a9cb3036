// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for mesh publishing and the demo client.

pub mod client;
pub mod plan;
pub mod registry;
pub mod streamer;
pub mod topic;

pub use client::spawn_demo_client;
pub use registry::MeshRegistry;
pub use streamer::{MeshSource, MeshStreamer};
pub use topic::Topic;
