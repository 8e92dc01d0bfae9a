mod common;
use common::*;

use cuegraph::actor::ActorAdapter;
use cuegraph::codec::unfold;
use cuegraph::easing::Easing;
use cuegraph::event_bus::{Event, EventBus, MemorySink};
use cuegraph::graph::ActionGraph;
use cuegraph::node::{ActionKind, TimedEffect};
use cuegraph::sequence::{Act, Line, PlayState, Scene, Script, SequenceController};

fn line_from(graph: &ActionGraph, label: &str) -> Line {
    Line::new(label, unfold(graph).unwrap())
}

/// Two-scene script: a timed entrance line, then an instant curtain line.
fn two_scene_script() -> Script {
    let mut entrance = ActionGraph::new();
    let enter = entrance.add_node("enter", "hero", pose("enter"));
    let walk = entrance.add_node("walk", "hero", move_to(10.0, 0.0, 2.0));
    entrance.connect(enter, walk).unwrap();

    let mut curtain = ActionGraph::new();
    curtain.add_node("curtain", "hero", pose("curtain"));

    Script::new("evening show").with_act(
        Act::new("act one")
            .with_scene(Scene::new("entrance").with_line(line_from(&entrance, "hero enters")))
            .with_scene(Scene::new("curtain").with_line(line_from(&curtain, "curtain call"))),
    )
}

#[test]
fn full_playthrough_crosses_scene_boundary() {
    let sink = MemorySink::new();
    let mut controller =
        SequenceController::with_bus(two_scene_script(), EventBus::with_sink(sink.clone()));
    let mut stage = hero_stage();

    controller.play(&mut stage).unwrap();
    assert_eq!(controller.state(), PlayState::PlayingLine);
    assert!(controller.play_id().is_some());

    controller.tick(1.0, &mut stage); // walk halfway
    assert_eq!(stage.position(&"hero".into()).unwrap().x, 5.0);
    let report = controller.tick(1.0, &mut stage);

    // The walk finished, the scene boundary was crossed, and the instant
    // curtain line completed the script, all within the last tick.
    assert!(report.line_finished());
    assert_eq!(controller.state(), PlayState::Finished);
    assert_eq!(stage.actor(&"hero".into()).unwrap().pose, "curtain");
    assert_eq!(stage.position(&"hero".into()).unwrap().x, 10.0);

    let sequence_scopes: Vec<String> = sink
        .snapshot()
        .iter()
        .filter(|e| matches!(e, Event::Sequence(_)))
        .map(|e| e.scope_label().to_string())
        .collect();
    assert_eq!(
        sequence_scopes,
        vec!["line", "line", "scene", "line", "line", "script"]
    );
}

#[test]
fn dialogue_reveals_character_by_character() {
    let mut graph = ActionGraph::new();
    graph.add_node(
        "speak",
        "hero",
        ActionKind::Timed {
            duration: 1.0,
            easing: Easing::Linear,
            effect: TimedEffect::RevealText("To be".into()),
        },
    );
    let script = Script::new("soliloquy").with_act(
        Act::new("one").with_scene(Scene::new("s").with_line(line_from(&graph, "speak"))),
    );

    let mut controller = SequenceController::with_bus(script, EventBus::discard());
    let mut stage = hero_stage();
    controller.play(&mut stage).unwrap();

    controller.tick(0.5, &mut stage);
    // 5 characters at progress 0.5 -> 2.5 rounds to 3 revealed.
    assert_eq!(stage.dialogue(&"hero".into()).unwrap(), "To ");

    controller.tick(0.5, &mut stage);
    assert_eq!(stage.dialogue(&"hero".into()).unwrap(), "To be");
    assert_eq!(controller.state(), PlayState::Finished);
}

#[test]
fn missing_actor_does_not_stall_the_script() {
    let mut graph = ActionGraph::new();
    let ghost = graph.add_node("ghost walk", "ghost", move_to(5.0, 5.0, 3.0));
    let after = graph.add_node("after", "hero", pose("done"));
    graph.connect(ghost, after).unwrap();

    let script = Script::new("haunting").with_act(
        Act::new("one").with_scene(Scene::new("s").with_line(line_from(&graph, "ghost line"))),
    );

    let mut controller = SequenceController::with_bus(script, EventBus::discard());
    let mut stage = hero_stage(); // no "ghost" actor registered
    let report = controller.play(&mut stage).unwrap();

    // The ghost node is skipped and completion propagates immediately.
    assert!(!report.faults.is_empty());
    assert_eq!(controller.state(), PlayState::Finished);
    assert_eq!(stage.actor(&"hero".into()).unwrap().pose, "done");
}

#[test]
fn scripts_round_trip_through_json() {
    let script = two_scene_script();
    let text = serde_json::to_string(&script).unwrap();
    let parsed: Script = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, script);

    let mut controller = SequenceController::with_bus(parsed, EventBus::discard());
    controller.play(&mut hero_stage()).unwrap();
    assert_eq!(controller.state(), PlayState::PlayingLine);
}
