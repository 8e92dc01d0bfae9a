//! Actor adapter: the engine's only window onto the stage.
//!
//! The engine never constructs or destroys actors. Every read of a starting
//! value and every write of an interpolated value goes through the
//! [`ActorAdapter`] trait, which the host implements over its own actor
//! registry (a renderer, a scene tree, a test harness).
//!
//! [`MemoryStage`] is the in-memory reference implementation, used by the
//! crate's own tests and useful for headless playback.
//!
//! # Shared-resource rule
//!
//! Only one node at a time may animate a given actor property within one
//! line; the authoring phase is responsible for not scheduling two concurrent
//! writers. The engine does not detect that race.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::ActorId;

/// 2D vector used for positions and scales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Linear interpolation between `self` and `other` at `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// RGBA colour with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::new(1.0, 1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Colour { r, g, b, a }
    }

    /// Component-wise linear interpolation at `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Colour, t: f32) -> Colour {
        Colour {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Colour::WHITE
    }
}

/// Read/write access to actor properties, implemented by the host.
///
/// Getters return `None` when the actor cannot be resolved; the scheduler
/// treats an unresolvable target as a skipped node (reported, then finished)
/// so a missing actor never deadlocks a graph. Setters on a missing actor are
/// a no-op.
pub trait ActorAdapter {
    /// True if `actor` resolves in the host registry.
    fn contains(&self, actor: &ActorId) -> bool;

    fn position(&self, actor: &ActorId) -> Option<Vec2>;
    fn set_position(&mut self, actor: &ActorId, value: Vec2);

    fn scale(&self, actor: &ActorId) -> Option<Vec2>;
    fn set_scale(&mut self, actor: &ActorId, value: Vec2);

    /// Rotation in degrees.
    fn rotation(&self, actor: &ActorId) -> Option<f32>;
    fn set_rotation(&mut self, actor: &ActorId, value: f32);

    fn colour(&self, actor: &ActorId) -> Option<Colour>;
    fn set_colour(&mut self, actor: &ActorId, value: Colour);

    fn pose(&self, actor: &ActorId) -> Option<String>;
    fn set_pose(&mut self, actor: &ActorId, pose: &str);

    fn flipped(&self, actor: &ActorId) -> Option<bool>;
    fn set_flipped(&mut self, actor: &ActorId, flipped: bool);

    fn visible(&self, actor: &ActorId) -> Option<bool>;
    fn set_visible(&mut self, actor: &ActorId, visible: bool);

    /// Render layer (draw order).
    fn layer(&self, actor: &ActorId) -> Option<i32>;
    fn set_layer(&mut self, actor: &ActorId, layer: i32);

    /// Currently revealed dialogue text.
    fn dialogue(&self, actor: &ActorId) -> Option<String>;
    fn set_dialogue(&mut self, actor: &ActorId, text: &str);
}

/// Mutable property bag for one actor on a [`MemoryStage`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActorState {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub colour: Colour,
    pub pose: String,
    pub flipped: bool,
    pub visible: bool,
    pub layer: i32,
    pub dialogue: String,
}

/// In-memory [`ActorAdapter`] for tests and headless playback.
///
/// # Examples
///
/// ```rust
/// use cuegraph::actor::{ActorAdapter, MemoryStage, Vec2};
///
/// let mut stage = MemoryStage::new().with_actor("hero");
/// stage.set_position(&"hero".into(), Vec2::new(4.0, 2.0));
/// assert_eq!(stage.position(&"hero".into()), Some(Vec2::new(4.0, 2.0)));
/// assert!(stage.position(&"ghost".into()).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStage {
    actors: FxHashMap<ActorId, ActorState>,
}

impl MemoryStage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor with default properties, replacing any existing one.
    #[must_use]
    pub fn with_actor(mut self, id: impl Into<ActorId>) -> Self {
        self.actors.insert(id.into(), ActorState::default());
        self
    }

    /// Register an actor with explicit starting properties.
    #[must_use]
    pub fn with_actor_state(mut self, id: impl Into<ActorId>, state: ActorState) -> Self {
        self.actors.insert(id.into(), state);
        self
    }

    pub fn insert(&mut self, id: impl Into<ActorId>, state: ActorState) {
        self.actors.insert(id.into(), state);
    }

    pub fn remove(&mut self, id: &ActorId) -> Option<ActorState> {
        self.actors.remove(id)
    }

    #[must_use]
    pub fn actor(&self, id: &ActorId) -> Option<&ActorState> {
        self.actors.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl ActorAdapter for MemoryStage {
    fn contains(&self, actor: &ActorId) -> bool {
        self.actors.contains_key(actor)
    }

    fn position(&self, actor: &ActorId) -> Option<Vec2> {
        self.actors.get(actor).map(|a| a.position)
    }

    fn set_position(&mut self, actor: &ActorId, value: Vec2) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.position = value;
        }
    }

    fn scale(&self, actor: &ActorId) -> Option<Vec2> {
        self.actors.get(actor).map(|a| a.scale)
    }

    fn set_scale(&mut self, actor: &ActorId, value: Vec2) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.scale = value;
        }
    }

    fn rotation(&self, actor: &ActorId) -> Option<f32> {
        self.actors.get(actor).map(|a| a.rotation)
    }

    fn set_rotation(&mut self, actor: &ActorId, value: f32) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.rotation = value;
        }
    }

    fn colour(&self, actor: &ActorId) -> Option<Colour> {
        self.actors.get(actor).map(|a| a.colour)
    }

    fn set_colour(&mut self, actor: &ActorId, value: Colour) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.colour = value;
        }
    }

    fn pose(&self, actor: &ActorId) -> Option<String> {
        self.actors.get(actor).map(|a| a.pose.clone())
    }

    fn set_pose(&mut self, actor: &ActorId, pose: &str) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.pose = pose.to_string();
        }
    }

    fn flipped(&self, actor: &ActorId) -> Option<bool> {
        self.actors.get(actor).map(|a| a.flipped)
    }

    fn set_flipped(&mut self, actor: &ActorId, flipped: bool) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.flipped = flipped;
        }
    }

    fn visible(&self, actor: &ActorId) -> Option<bool> {
        self.actors.get(actor).map(|a| a.visible)
    }

    fn set_visible(&mut self, actor: &ActorId, visible: bool) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.visible = visible;
        }
    }

    fn layer(&self, actor: &ActorId) -> Option<i32> {
        self.actors.get(actor).map(|a| a.layer)
    }

    fn set_layer(&mut self, actor: &ActorId, layer: i32) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.layer = layer;
        }
    }

    fn dialogue(&self, actor: &ActorId) -> Option<String> {
        self.actors.get(actor).map(|a| a.dialogue.clone())
    }

    fn set_dialogue(&mut self, actor: &ActorId, text: &str) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.dialogue = text.to_string();
        }
    }
}
