//! Core identifier types for the cuegraph engine.
//!
//! This module defines the small, copy-cheap handles the rest of the crate is
//! keyed on: [`NodeKey`] for action nodes inside a graph and [`ActorId`] for
//! stage actors owned by the host application.
//!
//! # Examples
//!
//! ```rust
//! use cuegraph::types::{ActorId, NodeKey};
//!
//! let hero: ActorId = "hero".into();
//! assert_eq!(hero.as_str(), "hero");
//!
//! let key = NodeKey::new(3);
//! assert_eq!(key.to_string(), "n3");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key of a single action node within one [`ActionGraph`](crate::graph::ActionGraph).
///
/// Keys are assigned by the owning graph at insertion time and are never
/// reused within that graph. They are only meaningful relative to the graph
/// that minted them; the flat storage form addresses nodes by array index
/// instead (see [`crate::codec`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(u32);

impl NodeKey {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        NodeKey(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Opaque handle of a stage actor.
///
/// The engine never creates or destroys actors; it only reads and writes
/// their properties through an [`ActorAdapter`](crate::actor::ActorAdapter).
/// The handle is a plain string so hosts can use whatever naming scheme their
/// actor registry already has.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ActorId(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        ActorId(s.to_string())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        ActorId(s)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
