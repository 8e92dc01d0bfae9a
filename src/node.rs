//! Action nodes: the schedulable units of stage direction.
//!
//! An [`ActionNode`] pairs a target actor with a tagged [`ActionKind`]:
//! either an [`InstantEffect`] that applies in the tick it fires, or a timed
//! action with a duration, an [`Easing`] curve, and a [`TimedEffect`] that a
//! [`TimedRunner`](crate::runner::TimedRunner) interpolates tick by tick.
//!
//! The kind is a closed tagged union dispatched by pattern match, so an
//! unknown kind is unrepresentable in a live graph; the open `kind` string
//! only exists in the flat storage form (see [`crate::codec`]).

use crate::actor::{ActorAdapter, Colour, Vec2};
use crate::easing::Easing;
use crate::types::{ActorId, NodeKey};

/// One schedulable unit of stage-direction behavior.
///
/// Nodes are created by [`ActionGraph::add_node`](crate::graph::ActionGraph::add_node)
/// (authoring) or by folding stored records. A node owns the ordered list of
/// its child keys; the number of parents pointing at it is always derived by
/// the graph, never stored here.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionNode {
    key: NodeKey,
    label: String,
    target: ActorId,
    kind: ActionKind,
    pub(crate) children: Vec<NodeKey>,
}

impl ActionNode {
    pub(crate) fn new(key: NodeKey, label: String, target: ActorId, kind: ActionKind) -> Self {
        ActionNode {
            key,
            label,
            target,
            kind,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Human-readable label used in diagnostics and events.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn target(&self) -> &ActorId {
        &self.target
    }

    #[must_use]
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Ordered child keys (outgoing edges).
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// A node with no outgoing edges is a terminal of its graph: its
    /// completion signals that the enclosing line is done.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

/// Tagged action variant: instantaneous or timed.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionKind {
    /// Applies its effect and completes in the same tick it fires.
    Instant(InstantEffect),
    /// Runs through the `Armed -> Running -> Finished` state machine,
    /// interpolating over `duration` seconds.
    Timed {
        /// Duration in seconds. Zero (or negative) durations complete on the
        /// first tick the runner receives, with progress exactly 1.
        duration: f32,
        easing: Easing,
        effect: TimedEffect,
    },
}

impl ActionKind {
    #[must_use]
    pub fn is_instant(&self) -> bool {
        matches!(self, ActionKind::Instant(_))
    }
}

/// Effects that apply in a single tick.
#[derive(Clone, Debug, PartialEq)]
pub enum InstantEffect {
    /// Switch the actor to a named pose.
    Pose(String),
    /// Set horizontal flip.
    Flip(bool),
    /// Show or hide the actor.
    Visible(bool),
    /// Move the actor to a render layer.
    Layer(i32),
}

impl InstantEffect {
    /// Apply the effect to `target` through the adapter.
    ///
    /// Returns `false` when the actor cannot be resolved; the caller reports
    /// the missing actor and treats the node as finished anyway.
    pub(crate) fn apply(&self, target: &ActorId, adapter: &mut dyn ActorAdapter) -> bool {
        if !adapter.contains(target) {
            return false;
        }
        match self {
            InstantEffect::Pose(pose) => adapter.set_pose(target, pose),
            InstantEffect::Flip(flipped) => adapter.set_flipped(target, *flipped),
            InstantEffect::Visible(visible) => adapter.set_visible(target, *visible),
            InstantEffect::Layer(layer) => adapter.set_layer(target, *layer),
        }
        true
    }
}

/// Effects interpolated over a duration.
///
/// Each variant stores the goal value; the starting value is captured from
/// the adapter when the node is armed.
#[derive(Clone, Debug, PartialEq)]
pub enum TimedEffect {
    /// Move the actor's position toward a goal.
    MoveTo(Vec2),
    /// Scale the actor toward a goal.
    ScaleTo(Vec2),
    /// Rotate toward a goal angle in degrees.
    RotateTo(f32),
    /// Blend the actor's colour toward a goal.
    ColourTo(Colour),
    /// Pure wait: consumes time, touches nothing.
    Delay,
    /// Reveal dialogue text character by character.
    RevealText(String),
}

impl TimedEffect {
    /// True when the effect needs a resolvable actor to run.
    ///
    /// A [`Delay`](TimedEffect::Delay) is target-independent; everything else
    /// reads or writes actor state.
    #[must_use]
    pub fn needs_actor(&self) -> bool {
        !matches!(self, TimedEffect::Delay)
    }
}
