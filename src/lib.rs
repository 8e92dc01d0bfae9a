//! # Cuegraph: Action-Graph Engine for Scripted Sequences
//!
//! Cuegraph drives scripted theatrical sequences: each line of a script
//! resolves to a DAG of stage actions (move, scale, pose, dialogue reveal,
//! wait) executed in a partially-ordered, fan-out/fan-in fashion with
//! deterministic join barriers and single-threaded, tick-driven scheduling.
//!
//! ## Core Concepts
//!
//! - **Action nodes**: Schedulable units of stage direction, instant or timed
//! - **Graph**: A DAG of nodes with derived in-degrees and one designated root
//! - **Join scheduler**: Fires each node exactly once, the instant every
//!   parent has signalled completion
//! - **Timed runners**: `Armed -> Running -> Finished` interpolation driven by
//!   tick deltas and easing curves
//! - **Codec**: Post-order flat record lists for storage, folded back into
//!   live graphs with full structural validation
//! - **Sequence controller**: Advances act -> scene -> line on terminal-node
//!   completion, narrating everything to an event bus
//!
//! ## Quick Start
//!
//! ### Building and playing a graph
//!
//! ```
//! use cuegraph::actor::{MemoryStage, Vec2};
//! use cuegraph::easing::Easing;
//! use cuegraph::event_bus::EventBus;
//! use cuegraph::graph::ActionGraph;
//! use cuegraph::node::{ActionKind, InstantEffect, TimedEffect};
//! use cuegraph::scheduler::JoinScheduler;
//!
//! let mut graph = ActionGraph::new();
//! let enter = graph.add_node(
//!     "enter",
//!     "hero",
//!     ActionKind::Instant(InstantEffect::Visible(true)),
//! );
//! let walk = graph.add_node(
//!     "walk",
//!     "hero",
//!     ActionKind::Timed {
//!         duration: 2.0,
//!         easing: Easing::Linear,
//!         effect: TimedEffect::MoveTo(Vec2 { x: 10.0, y: 0.0 }),
//!     },
//! );
//! graph.connect(enter, walk).unwrap();
//!
//! let bus = EventBus::discard();
//! let mut stage = MemoryStage::new().with_actor("hero");
//! let mut scheduler = JoinScheduler::prime(&graph, bus.sender()).unwrap();
//! scheduler.activate_root(&graph, &mut stage).unwrap();
//!
//! // The instant node applied at activation; the timed node armed.
//! scheduler.tick(&graph, &mut stage, 1.0); // halfway
//! let report = scheduler.tick(&graph, &mut stage, 1.5); // overshoot clamps
//! assert_eq!(report.terminals, vec![walk]);
//! ```
//!
//! ### Storage round trip
//!
//! ```
//! use cuegraph::codec::{fold, unfold};
//! use cuegraph::graph::ActionGraph;
//! use cuegraph::node::{ActionKind, InstantEffect};
//!
//! let mut graph = ActionGraph::new();
//! let root = graph.add_node("root", "hero", ActionKind::Instant(InstantEffect::Pose("a".into())));
//! let leaf = graph.add_node("leaf", "hero", ActionKind::Instant(InstantEffect::Pose("b".into())));
//! graph.connect(root, leaf).unwrap();
//!
//! let records = unfold(&graph).unwrap();
//! // Post-order: children precede parents, the root is last.
//! assert_eq!(records.last().unwrap().child_indices, vec![0]);
//! let rebuilt = fold(&records).unwrap();
//! assert_eq!(rebuilt.len(), 2);
//! ```
//!
//! ## Module Guide
//!
//! - [`node`] - Action nodes, instant and timed effect variants
//! - [`graph`] - The live DAG: edges, roots, terminals, derived degrees
//! - [`scheduler`] - The join barrier and tick loop
//! - [`runner`] - Per-node timed interpolation state machine
//! - [`codec`] - Flat record storage form, fold/unfold with validation
//! - [`sequence`] - Scripts and the outer playback loop
//! - [`actor`] - The adapter seam to whatever renders the stage
//! - [`easing`] - Normalized-time easing curves
//! - [`event_bus`] - Structured playback events and pluggable sinks
//! - [`telemetry`] - Tracing and panic-report setup for host applications

pub mod actor;
pub mod codec;
pub mod easing;
pub mod event_bus;
pub mod graph;
pub mod node;
pub mod runner;
pub mod scheduler;
pub mod sequence;
pub mod telemetry;
pub mod types;
