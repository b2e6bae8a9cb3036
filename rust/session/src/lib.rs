// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Mesh-Stream Session
//!
//! Client-side assembly of a mesh that a producer publishes while it is
//! still being computed. A [`MeshAssemblySession`] consumes the messages of
//! one stream and keeps a renderable preview current at every step:
//!
//! 1. `metadata` allocates buffers and shows the bounding box
//! 2. `octree` shows coarse occupancy anchors
//! 3. each `xyz-chunk` is appended, shown as a point cloud and clears the
//!    anchors it covers
//! 4. `connectivity` installs the cells and drops every preview
//!
//! Rendering stays behind the [`SceneSink`] trait and transport behind
//! [`MessageTransport`].
//!
//! ```rust,no_run
//! use mesh_stream_session::{MeshAssemblySession, SceneSink, SessionConfig};
//! # async fn example<S: SceneSink>(scene: S, message: mesh_stream_core::Message) -> mesh_stream_session::Result<()> {
//! let mut session = MeshAssemblySession::new("1", scene, SessionConfig::default());
//! session.handle(&message).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod liveness;
pub mod runner;
pub mod scene;
pub mod session;

pub use config::SessionConfig;
pub use decoder::{InlineDecoder, PayloadDecoder};
pub use error::{Error, Result};
pub use liveness::Liveness;
pub use runner::{
    MessageTransport, RunOutcome, RunReport, SessionRunner, Subscription, SubscriptionId, Teardown,
};
pub use scene::{Preview, PreviewHandle, SceneSink};
pub use session::{AttributeTypes, Dispatch, MeshAssemblySession, SessionState};
