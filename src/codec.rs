//! Flat (de)serialization of action graphs.
//!
//! [`unfold`] turns a live [`ActionGraph`] into an ordered list of
//! [`ActionRecord`]s via a depth-first post-order traversal: every node is
//! emitted after all of its children, a node with multiple parents is emitted
//! exactly once, and each record addresses its children by their
//! already-assigned indices in the same array. The root is therefore always
//! the last record, and every child index points strictly below its own
//! record — which is also why a cycle is unrepresentable in a well-formed
//! record list.
//!
//! [`fold`] reverses the process: it instantiates one node per record in a
//! single forward pass, re-creates the edges from the child indices, and
//! leaves the graph's derived in-degrees ready for
//! [`JoinScheduler::prime`](crate::scheduler::JoinScheduler::prime).
//!
//! Records serialize through serde; JSON via `serde_json` is the reference
//! storage encoding.
//!
//! # Examples
//!
//! ```rust
//! use cuegraph::codec::{fold, unfold};
//! use cuegraph::graph::ActionGraph;
//! use cuegraph::node::{ActionKind, InstantEffect};
//!
//! let mut graph = ActionGraph::new();
//! let root = graph.add_node("enter", "hero", ActionKind::Instant(InstantEffect::Visible(true)));
//! let bow = graph.add_node("bow", "hero", ActionKind::Instant(InstantEffect::Pose("bow".into())));
//! graph.connect(root, bow).unwrap();
//!
//! let records = unfold(&graph).unwrap();
//! assert_eq!(records.len(), 2);
//! // Post-order: the root is the last record.
//! assert_eq!(records[1].kind, "visibility");
//! assert_eq!(records[1].child_indices, vec![0]);
//!
//! let rebuilt = fold(&records).unwrap();
//! assert_eq!(rebuilt.len(), graph.len());
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::actor::{Colour, Vec2};
use crate::easing::Easing;
use crate::graph::ActionGraph;
use crate::node::{ActionKind, ActionNode, InstantEffect, TimedEffect};
use crate::types::{ActorId, NodeKey};

/// Kind-specific parameters in the flat storage form.
pub type Params = serde_json::Map<String, Value>;

/// One node in the flat storage form.
///
/// `child_indices` address other records in the same array; in a well-formed
/// list every index is strictly below the record's own position (post-order
/// property).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Kind discriminator: `pose`, `flip`, `visibility`, `layer`, `move`,
    /// `scale`, `rotate`, `colour`, `delay`, or `reveal`.
    pub kind: String,
    /// Kind-specific parameters plus the node's `label` and `target`.
    #[serde(default)]
    pub params: Params,
    /// Indices of child records in this same array.
    #[serde(default)]
    pub child_indices: Vec<usize>,
}

/// Structural errors raised while folding or unfolding a graph.
///
/// All of these are fatal to loading the offending graph and are surfaced
/// before any node is armed; a graph is never partially applied.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum StructuralError {
    #[error("graph has no nodes")]
    #[diagnostic(code(cuegraph::codec::empty_graph))]
    EmptyGraph,

    /// The depth-first traversal re-entered a node still on its own path.
    #[error("cycle detected through node '{label}'")]
    #[diagnostic(
        code(cuegraph::codec::cycle),
        help("Action graphs must be acyclic; check the edges around this node.")
    )]
    Cycle { label: String },

    /// Nodes exist that the root cannot reach; they would never fire.
    #[error("{count} node(s) unreachable from the root")]
    #[diagnostic(
        code(cuegraph::codec::unreachable),
        help("Every node must be reachable from the designated root.")
    )]
    UnreachableNodes { count: usize },

    /// A child index points past the end of the record list.
    #[error("record {record}: child index {child} is out of bounds")]
    #[diagnostic(code(cuegraph::codec::dangling_child))]
    DanglingChild { record: usize, child: usize },

    /// A child index points at the record itself or a later record, which is
    /// how a self-loop or cycle appears in flat form.
    #[error("record {record}: child index {child} is not strictly below it")]
    #[diagnostic(
        code(cuegraph::codec::forward_child),
        help("Post-order lists store children before parents; a forward reference encodes a cycle.")
    )]
    ForwardChild { record: usize, child: usize },

    /// The same child index appears twice in one record.
    #[error("record {record}: duplicate child index {child}")]
    #[diagnostic(code(cuegraph::codec::duplicate_child))]
    DuplicateChild { record: usize, child: usize },

    /// A non-root record that no other record references; it could never be
    /// signalled and would deadlock the graph.
    #[error("record {record} ('{label}') is an orphan: no parent references it")]
    #[diagnostic(code(cuegraph::codec::orphan))]
    OrphanRecord { record: usize, label: String },

    #[error("record {record}: unknown kind '{kind}'")]
    #[diagnostic(code(cuegraph::codec::unknown_kind))]
    UnknownKind { record: usize, kind: String },

    #[error("record {record}: missing or malformed parameter '{what}'")]
    #[diagnostic(code(cuegraph::codec::malformed_params))]
    MalformedParams { record: usize, what: String },

    /// Internal integrity failure: a key the graph handed out does not
    /// resolve. Indicates a bug in the graph itself, not in the input.
    #[error("graph integrity failure: node {key} not found")]
    #[diagnostic(code(cuegraph::codec::missing_node))]
    MissingNode { key: NodeKey },
}

enum Mark {
    InProgress,
    Done,
}

/// Serialize a live graph into its flat, index-addressed form.
///
/// Depth-first post-order from the root: children are emitted before their
/// parents, shared children only once. Rejects cyclic graphs and graphs with
/// nodes the root cannot reach, so every value this returns folds back
/// cleanly.
pub fn unfold(graph: &ActionGraph) -> Result<Vec<ActionRecord>, StructuralError> {
    let root = graph.root().ok_or(StructuralError::EmptyGraph)?;

    let mut records: Vec<ActionRecord> = Vec::with_capacity(graph.len());
    let mut indices: FxHashMap<NodeKey, usize> = FxHashMap::default();
    let mut marks: FxHashMap<NodeKey, Mark> = FxHashMap::default();
    let mut stack: Vec<(NodeKey, usize)> = vec![(root, 0)];
    marks.insert(root, Mark::InProgress);

    while let Some(frame) = stack.last_mut() {
        let key = frame.0;
        let node = node_of(graph, key)?;
        if frame.1 < node.children().len() {
            let child = node.children()[frame.1];
            frame.1 += 1;
            match marks.get(&child) {
                Some(Mark::InProgress) => {
                    return Err(StructuralError::Cycle {
                        label: node.label().to_string(),
                    });
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(child, Mark::InProgress);
                    stack.push((child, 0));
                }
            }
        } else {
            let mut child_indices = Vec::with_capacity(node.children().len());
            for child in node.children() {
                let idx = indices
                    .get(child)
                    .copied()
                    .ok_or(StructuralError::MissingNode { key: *child })?;
                child_indices.push(idx);
            }
            records.push(encode_node(node, child_indices));
            indices.insert(key, records.len() - 1);
            marks.insert(key, Mark::Done);
            stack.pop();
        }
    }

    if records.len() != graph.len() {
        return Err(StructuralError::UnreachableNodes {
            count: graph.len() - records.len(),
        });
    }
    Ok(records)
}

/// Reconstruct a live graph from its flat form, recomputing in-degrees.
///
/// Single forward pass: every record's children already exist when the
/// record's edges are created, because well-formed child indices are
/// strictly below the record. The last record becomes the designated root.
pub fn fold(records: &[ActionRecord]) -> Result<ActionGraph, StructuralError> {
    if records.is_empty() {
        return Err(StructuralError::EmptyGraph);
    }

    let mut graph = ActionGraph::new();
    let mut keys: Vec<NodeKey> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let (label, target, kind) = decode_record(i, record)?;
        keys.push(graph.add_node(label, target, kind));
    }

    for (i, record) in records.iter().enumerate() {
        for &child in &record.child_indices {
            if child >= records.len() {
                return Err(StructuralError::DanglingChild { record: i, child });
            }
            if child >= i {
                return Err(StructuralError::ForwardChild { record: i, child });
            }
            graph
                .connect(keys[i], keys[child])
                .map_err(|_| StructuralError::DuplicateChild { record: i, child })?;
        }
    }

    // Every non-root record must be referenced by at least one parent.
    let degrees = graph.in_degrees();
    for (i, key) in keys.iter().enumerate().take(keys.len() - 1) {
        if degrees.get(key).copied().unwrap_or(0) == 0 {
            let label = graph
                .node(*key)
                .map(|n| n.label().to_string())
                .unwrap_or_default();
            return Err(StructuralError::OrphanRecord { record: i, label });
        }
    }

    let root = keys[keys.len() - 1];
    graph
        .set_root(root)
        .map_err(|_| StructuralError::MissingNode { key: root })?;
    Ok(graph)
}

fn node_of(graph: &ActionGraph, key: NodeKey) -> Result<&ActionNode, StructuralError> {
    graph.node(key).ok_or(StructuralError::MissingNode { key })
}

fn encode_node(node: &ActionNode, child_indices: Vec<usize>) -> ActionRecord {
    let mut params = Params::new();
    params.insert("label".into(), json!(node.label()));
    params.insert("target".into(), json!(node.target().as_str()));

    let kind = match node.kind() {
        ActionKind::Instant(effect) => match effect {
            InstantEffect::Pose(pose) => {
                params.insert("pose".into(), json!(pose));
                "pose"
            }
            InstantEffect::Flip(flipped) => {
                params.insert("flipped".into(), json!(flipped));
                "flip"
            }
            InstantEffect::Visible(visible) => {
                params.insert("visible".into(), json!(visible));
                "visibility"
            }
            InstantEffect::Layer(layer) => {
                params.insert("layer".into(), json!(layer));
                "layer"
            }
        },
        ActionKind::Timed {
            duration,
            easing,
            effect,
        } => {
            params.insert("duration".into(), json!(duration));
            params.insert("easing".into(), json!(easing));
            match effect {
                TimedEffect::MoveTo(goal) => {
                    params.insert("x".into(), json!(goal.x));
                    params.insert("y".into(), json!(goal.y));
                    "move"
                }
                TimedEffect::ScaleTo(goal) => {
                    params.insert("x".into(), json!(goal.x));
                    params.insert("y".into(), json!(goal.y));
                    "scale"
                }
                TimedEffect::RotateTo(angle) => {
                    params.insert("angle".into(), json!(angle));
                    "rotate"
                }
                TimedEffect::ColourTo(colour) => {
                    params.insert("r".into(), json!(colour.r));
                    params.insert("g".into(), json!(colour.g));
                    params.insert("b".into(), json!(colour.b));
                    params.insert("a".into(), json!(colour.a));
                    "colour"
                }
                TimedEffect::Delay => "delay",
                TimedEffect::RevealText(text) => {
                    params.insert("text".into(), json!(text));
                    "reveal"
                }
            }
        }
    };

    ActionRecord {
        kind: kind.to_string(),
        params,
        child_indices,
    }
}

fn decode_record(
    index: usize,
    record: &ActionRecord,
) -> Result<(String, ActorId, ActionKind), StructuralError> {
    let label = param_str(&record.params, "label")
        .unwrap_or(&record.kind)
        .to_string();
    let target: ActorId = param_str(&record.params, "target")
        .ok_or_else(|| malformed(index, "target"))?
        .into();

    let kind = match record.kind.as_str() {
        "pose" => ActionKind::Instant(InstantEffect::Pose(
            param_str(&record.params, "pose")
                .ok_or_else(|| malformed(index, "pose"))?
                .to_string(),
        )),
        "flip" => ActionKind::Instant(InstantEffect::Flip(
            param_bool(&record.params, "flipped").ok_or_else(|| malformed(index, "flipped"))?,
        )),
        "visibility" => ActionKind::Instant(InstantEffect::Visible(
            param_bool(&record.params, "visible").ok_or_else(|| malformed(index, "visible"))?,
        )),
        "layer" => ActionKind::Instant(InstantEffect::Layer(
            param_i32(&record.params, "layer").ok_or_else(|| malformed(index, "layer"))?,
        )),
        "move" => timed(index, record, TimedEffect::MoveTo(param_vec2(index, record)?))?,
        "scale" => timed(index, record, TimedEffect::ScaleTo(param_vec2(index, record)?))?,
        "rotate" => timed(
            index,
            record,
            TimedEffect::RotateTo(
                param_f32(&record.params, "angle").ok_or_else(|| malformed(index, "angle"))?,
            ),
        )?,
        "colour" => timed(
            index,
            record,
            TimedEffect::ColourTo(Colour::new(
                param_f32(&record.params, "r").ok_or_else(|| malformed(index, "r"))?,
                param_f32(&record.params, "g").ok_or_else(|| malformed(index, "g"))?,
                param_f32(&record.params, "b").ok_or_else(|| malformed(index, "b"))?,
                param_f32(&record.params, "a").ok_or_else(|| malformed(index, "a"))?,
            )),
        )?,
        "delay" => timed(index, record, TimedEffect::Delay)?,
        "reveal" => timed(
            index,
            record,
            TimedEffect::RevealText(
                param_str(&record.params, "text")
                    .ok_or_else(|| malformed(index, "text"))?
                    .to_string(),
            ),
        )?,
        other => {
            return Err(StructuralError::UnknownKind {
                record: index,
                kind: other.to_string(),
            });
        }
    };

    Ok((label, target, kind))
}

fn timed(
    index: usize,
    record: &ActionRecord,
    effect: TimedEffect,
) -> Result<ActionKind, StructuralError> {
    let duration =
        param_f32(&record.params, "duration").ok_or_else(|| malformed(index, "duration"))?;
    let easing = match record.params.get("easing") {
        None => Easing::default(),
        Some(value) => serde_json::from_value::<Easing>(value.clone())
            .map_err(|_| malformed(index, "easing"))?,
    };
    Ok(ActionKind::Timed {
        duration,
        easing,
        effect,
    })
}

fn param_vec2(index: usize, record: &ActionRecord) -> Result<Vec2, StructuralError> {
    Ok(Vec2::new(
        param_f32(&record.params, "x").ok_or_else(|| malformed(index, "x"))?,
        param_f32(&record.params, "y").ok_or_else(|| malformed(index, "y"))?,
    ))
}

fn malformed(index: usize, what: &str) -> StructuralError {
    StructuralError::MalformedParams {
        record: index,
        what: what.to_string(),
    }
}

fn param_str<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn param_f32(params: &Params, key: &str) -> Option<f32> {
    params.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

fn param_bool(params: &Params, key: &str) -> Option<bool> {
    params.get(key).and_then(Value::as_bool)
}

fn param_i32(params: &Params, key: &str) -> Option<i32> {
    params
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
}
