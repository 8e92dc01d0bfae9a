mod common;
use common::*;

use cuegraph::codec::{fold, unfold, ActionRecord};
use cuegraph::graph::ActionGraph;
use cuegraph::node::{ActionKind, TimedEffect};

#[test]
fn four_node_tree_unfolds_post_order() {
    // root -> {a, b}; a -> c
    let mut graph = ActionGraph::new();
    let root = graph.add_node("root", "hero", pose("r"));
    let a = graph.add_node("a", "hero", pose("a"));
    let b = graph.add_node("b", "hero", pose("b"));
    let c = graph.add_node("c", "hero", pose("c"));
    graph.connect(root, a).unwrap();
    graph.connect(root, b).unwrap();
    graph.connect(a, c).unwrap();

    let records = unfold(&graph).unwrap();
    assert_eq!(records.len(), 4);

    // The root is the last element.
    let last = records.last().unwrap();
    assert_eq!(last.params["label"], "root");

    // Every child index points strictly below its own record.
    for (i, record) in records.iter().enumerate() {
        for &child in &record.child_indices {
            assert!(child < i, "record {i} references child {child}");
        }
    }
}

#[test]
fn shared_child_is_emitted_once() {
    let (graph, _) = instant_diamond();
    let records = unfold(&graph).unwrap();
    assert_eq!(records.len(), 4);

    // The join node appears once even though two parents reference it.
    let join_count = records
        .iter()
        .filter(|r| r.params["label"] == "join")
        .count();
    assert_eq!(join_count, 1);

    // Both arms address the same record index for it.
    let arm_children: Vec<_> = records
        .iter()
        .filter(|r| r.params["label"] == "left" || r.params["label"] == "right")
        .map(|r| r.child_indices.clone())
        .collect();
    assert_eq!(arm_children[0], arm_children[1]);
}

#[test]
fn round_trip_preserves_structure_and_degrees() {
    let mut graph = ActionGraph::new();
    let root = graph.add_node("root", "hero", pose("r"));
    let walk = graph.add_node("walk", "hero", move_to(4.0, 2.0, 1.5));
    let wait = graph.add_node("wait", "hero", delay(0.5));
    let join = graph.add_node("join", "hero", pose("j"));
    graph.connect(root, walk).unwrap();
    graph.connect(root, wait).unwrap();
    graph.connect(walk, join).unwrap();
    graph.connect(wait, join).unwrap();

    let rebuilt = fold(&unfold(&graph).unwrap()).unwrap();
    assert_eq!(rebuilt.len(), graph.len());
    assert_eq!(rebuilt.roots().len(), 1);
    assert_eq!(rebuilt.terminals().len(), 1);

    let rebuilt_join = rebuilt.terminals()[0];
    assert_eq!(rebuilt.in_degree(rebuilt_join), Some(2));
    let node = rebuilt.node(rebuilt_join).unwrap();
    assert_eq!(node.label(), "join");

    // Kind-specific params survive the trip.
    let walk_node = rebuilt
        .nodes()
        .find(|n| n.label() == "walk")
        .expect("walk node");
    match walk_node.kind() {
        ActionKind::Timed {
            duration,
            effect: TimedEffect::MoveTo(goal),
            ..
        } => {
            assert_eq!(*duration, 1.5);
            assert_eq!((goal.x, goal.y), (4.0, 2.0));
        }
        other => panic!("expected timed move, got {other:?}"),
    }
}

#[test]
fn records_survive_json_serialization() {
    let (graph, _) = instant_diamond();
    let records = unfold(&graph).unwrap();

    let text = serde_json::to_string_pretty(&records).unwrap();
    let parsed: Vec<ActionRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, records);

    let rebuilt = fold(&parsed).unwrap();
    assert_eq!(rebuilt.len(), 4);
}

#[test]
fn json_without_optional_fields_still_folds() {
    // Hand-written storage form: missing easing defaults, absent
    // child_indices default to empty.
    let text = r#"[
        { "kind": "pose", "params": { "target": "hero", "pose": "bow" } },
        { "kind": "delay", "params": { "target": "hero", "duration": 1.0 }, "child_indices": [0] }
    ]"#;
    let records: Vec<ActionRecord> = serde_json::from_str(text).unwrap();
    let graph = fold(&records).unwrap();
    assert_eq!(graph.len(), 2);
    let root = graph.node(graph.root().unwrap()).unwrap();
    assert!(matches!(root.kind(), ActionKind::Timed { .. }));
}
