#![allow(dead_code)]

//! Shared fixtures for integration tests.

use cuegraph::actor::{MemoryStage, Vec2};
use cuegraph::easing::Easing;
use cuegraph::event_bus::Event;
use cuegraph::graph::ActionGraph;
use cuegraph::node::{ActionKind, InstantEffect, TimedEffect};
use cuegraph::types::NodeKey;

/// Instant pose change.
pub fn pose(name: &str) -> ActionKind {
    ActionKind::Instant(InstantEffect::Pose(name.to_string()))
}

/// Linear timed delay.
pub fn delay(duration: f32) -> ActionKind {
    ActionKind::Timed {
        duration,
        easing: Easing::Linear,
        effect: TimedEffect::Delay,
    }
}

/// Linear timed move.
pub fn move_to(x: f32, y: f32, duration: f32) -> ActionKind {
    ActionKind::Timed {
        duration,
        easing: Easing::Linear,
        effect: TimedEffect::MoveTo(Vec2::new(x, y)),
    }
}

/// A stage with the one actor every fixture targets.
pub fn hero_stage() -> MemoryStage {
    MemoryStage::new().with_actor("hero")
}

/// A sender whose receiver is intentionally dropped; emitted events vanish.
pub fn drop_events() -> flume::Sender<Event> {
    flume::unbounded().0
}

/// Diamond: `root -> {left, right} -> join`, all instant poses.
///
/// Returns the graph plus `[root, left, right, join]`.
pub fn instant_diamond() -> (ActionGraph, [NodeKey; 4]) {
    let mut graph = ActionGraph::new();
    let root = graph.add_node("root", "hero", pose("root"));
    let left = graph.add_node("left", "hero", pose("left"));
    let right = graph.add_node("right", "hero", pose("right"));
    let join = graph.add_node("join", "hero", pose("join"));
    graph.connect(root, left).unwrap();
    graph.connect(root, right).unwrap();
    graph.connect(left, join).unwrap();
    graph.connect(right, join).unwrap();
    (graph, [root, left, right, join])
}

/// Diamond whose arms are delays, so arm completion order is controlled by
/// the durations.
pub fn timed_diamond(left_duration: f32, right_duration: f32) -> (ActionGraph, [NodeKey; 4]) {
    let mut graph = ActionGraph::new();
    let root = graph.add_node("root", "hero", pose("root"));
    let left = graph.add_node("left", "hero", delay(left_duration));
    let right = graph.add_node("right", "hero", delay(right_duration));
    let join = graph.add_node("join", "hero", pose("join"));
    graph.connect(root, left).unwrap();
    graph.connect(root, right).unwrap();
    graph.connect(left, join).unwrap();
    graph.connect(right, join).unwrap();
    (graph, [root, left, right, join])
}
