//! Join synchronization: deciding when each node may start.
//!
//! The [`JoinScheduler`] tracks, per node, how many completion signals have
//! arrived (`received`) against the node's derived in-degree (`expected`),
//! and fires the node's body exactly once, the instant `received == expected`
//! with `expected > 0`. The root has no parents and is fired explicitly by
//! [`activate_root`](JoinScheduler::activate_root), never by a signal.
//!
//! Fan-out happens naturally (a finished node signals every child); fan-in is
//! the barrier: a node with two parents starts only after both have finished,
//! regardless of the order they finish in.
//!
//! Firing an instant node applies its effect and completes it within the
//! same activation; chains of instants cascade through an explicit work
//! queue. Firing a timed node arms a [`TimedRunner`], which first consumes
//! time on the *next* tick so one frame's delta is never double-counted.
//!
//! Integrity faults — a signal for an already-fired or unknown node, an
//! unresolvable target actor — are reported (event bus, `tracing`, and the
//! returned [`TickReport`]) and then discarded; they never crash the tick
//! loop, and a missing actor never deadlocks the graph because the affected
//! node is treated as instantly finished.

use std::collections::VecDeque;
use std::fmt;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::actor::ActorAdapter;
use crate::event_bus::Event;
use crate::graph::ActionGraph;
use crate::node::ActionKind;
use crate::runner::{RunnerPhase, TimedRunner};
use crate::types::{ActorId, NodeKey};

/// Join bookkeeping for one node during one play-through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinState {
    /// In-degree of the node, computed when the scheduler was primed.
    pub expected: u32,
    /// Completion signals observed so far this play-through.
    pub received: u32,
    /// Whether the node's body has already run.
    pub fired: bool,
}

/// Non-fatal integrity fault observed during playback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackFault {
    /// A completion signal arrived for a node that already fired. Parents
    /// signal each child at most once, so this indicates a graph-integrity
    /// bug upstream.
    SignalAfterFire { key: NodeKey },
    /// A signal arrived for a key the scheduler was never primed with.
    UnknownSignal { key: NodeKey },
    /// The node's target actor could not be resolved; the node was skipped.
    MissingActor { key: NodeKey, actor: ActorId },
}

impl fmt::Display for PlaybackFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackFault::SignalAfterFire { key } => {
                write!(f, "signal for already-fired node {key}")
            }
            PlaybackFault::UnknownSignal { key } => write!(f, "signal for unknown node {key}"),
            PlaybackFault::MissingActor { key, actor } => {
                write!(f, "node {key} skipped: actor '{actor}' not found")
            }
        }
    }
}

/// What happened during one scheduler call (a tick, an activation, or a
/// single external signal).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Nodes whose bodies started during this call, in firing order.
    pub fired: Vec<NodeKey>,
    /// Nodes that completed during this call.
    pub finished: Vec<NodeKey>,
    /// Completed nodes with no children: the line-finished signal.
    pub terminals: Vec<NodeKey>,
    /// Integrity faults observed (also reported via events and `tracing`).
    pub faults: Vec<PlaybackFault>,
}

impl TickReport {
    /// True when a terminal node completed during this call.
    #[must_use]
    pub fn line_finished(&self) -> bool {
        !self.terminals.is_empty()
    }

    /// Fold another report into this one, preserving order.
    pub fn merge(&mut self, other: TickReport) {
        self.fired.extend(other.fired);
        self.finished.extend(other.finished);
        self.terminals.extend(other.terminals);
        self.faults.extend(other.faults);
    }
}

/// Errors from priming or activating a scheduler.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("graph has no root to activate")]
    #[diagnostic(code(cuegraph::scheduler::missing_root))]
    MissingRoot,

    /// The designated root has incoming edges; it would be signalled as well
    /// as explicitly activated, breaking exactly-once firing.
    #[error("root node has {expected} incoming edge(s); the root must have none")]
    #[diagnostic(
        code(cuegraph::scheduler::root_has_parents),
        help("Re-root the graph or remove the edges pointing at the root.")
    )]
    RootHasParents { expected: u32 },

    #[error("root already activated for this play-through")]
    #[diagnostic(code(cuegraph::scheduler::already_activated))]
    AlreadyActivated,
}

/// Runs one graph through one play-through.
///
/// Primed from a graph's derived in-degrees; owns the armed/running
/// [`TimedRunner`]s and the per-node [`JoinState`] table. The scheduler
/// borrows the graph on every call and never mutates it — the structure is
/// frozen for the whole play-through.
pub struct JoinScheduler {
    joins: FxHashMap<NodeKey, JoinState>,
    root: NodeKey,
    armed: Vec<TimedRunner>,
    running: Vec<TimedRunner>,
    play_id: Uuid,
    events: flume::Sender<Event>,
    activated: bool,
}

impl JoinScheduler {
    /// Prime a scheduler for one play-through of `graph`.
    ///
    /// Every node's `expected` count is its derived in-degree; `received`
    /// starts at zero. Fails if the graph has no root or the root has
    /// parents.
    pub fn prime(
        graph: &ActionGraph,
        events: flume::Sender<Event>,
    ) -> Result<Self, SchedulerError> {
        let root = graph.root().ok_or(SchedulerError::MissingRoot)?;
        let degrees = graph.in_degrees();
        let root_expected = degrees.get(&root).copied().unwrap_or(0);
        if root_expected > 0 {
            return Err(SchedulerError::RootHasParents {
                expected: root_expected,
            });
        }

        let joins = degrees
            .into_iter()
            .map(|(key, expected)| {
                (
                    key,
                    JoinState {
                        expected,
                        received: 0,
                        fired: false,
                    },
                )
            })
            .collect();

        Ok(JoinScheduler {
            joins,
            root,
            armed: Vec::new(),
            running: Vec::new(),
            play_id: Uuid::new_v4(),
            events,
            activated: false,
        })
    }

    /// Identifier of this play-through, stamped on emitted events.
    #[must_use]
    pub fn play_id(&self) -> Uuid {
        self.play_id
    }

    /// Join bookkeeping for one node, if the scheduler knows the key.
    #[must_use]
    pub fn join_state(&self, key: NodeKey) -> Option<JoinState> {
        self.joins.get(&key).copied()
    }

    /// True when no runner is armed or running.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.armed.is_empty() && self.running.is_empty()
    }

    /// Fire the root explicitly, cascading through any instant chain.
    ///
    /// The root is the one node started without a signal; calling this twice
    /// in a play-through is an error.
    pub fn activate_root(
        &mut self,
        graph: &ActionGraph,
        adapter: &mut dyn ActorAdapter,
    ) -> Result<TickReport, SchedulerError> {
        if self.activated {
            return Err(SchedulerError::AlreadyActivated);
        }
        self.activated = true;

        let mut report = TickReport::default();
        let mut pending = VecDeque::new();
        if let Some(js) = self.joins.get_mut(&self.root) {
            js.fired = true;
        }
        debug!(play = %self.play_id, root = %self.root, "activating root");
        self.fire(self.root, graph, adapter, &mut report, &mut pending);
        self.settle(graph, adapter, &mut report, &mut pending);
        Ok(report)
    }

    /// Deliver one completion signal to `child`, firing it if the join
    /// barrier is now satisfied (and cascading from there).
    pub fn signal(
        &mut self,
        graph: &ActionGraph,
        adapter: &mut dyn ActorAdapter,
        child: NodeKey,
    ) -> TickReport {
        let mut report = TickReport::default();
        let mut pending = VecDeque::new();
        self.deliver(child, graph, adapter, &mut report, &mut pending);
        self.settle(graph, adapter, &mut report, &mut pending);
        report
    }

    /// Advance every running node by one tick's delta.
    ///
    /// Runners armed on an earlier call join the running set at the start of
    /// this tick; runners armed *during* this tick (by a completion cascade)
    /// stay armed until the next one, so a single frame's delta is never
    /// double-counted.
    pub fn tick(
        &mut self,
        graph: &ActionGraph,
        adapter: &mut dyn ActorAdapter,
        delta: f32,
    ) -> TickReport {
        let mut report = TickReport::default();

        for runner in &mut self.armed {
            runner.start();
        }
        self.running.append(&mut self.armed);

        let count = self.running.len();
        let mut completed = VecDeque::new();
        for idx in 0..count {
            if self.running[idx].tick(delta, adapter) {
                completed.push_back(self.running[idx].key());
            }
        }
        self.running.retain(|r| r.phase() != RunnerPhase::Finished);

        self.settle(graph, adapter, &mut report, &mut completed);
        report
    }

    /// Process completed nodes: record them, signal children, fire whatever
    /// becomes ready, and keep going until the cascade is exhausted.
    fn settle(
        &mut self,
        graph: &ActionGraph,
        adapter: &mut dyn ActorAdapter,
        report: &mut TickReport,
        pending: &mut VecDeque<NodeKey>,
    ) {
        while let Some(done) = pending.pop_front() {
            let Some(node) = graph.node(done) else {
                report.finished.push(done);
                continue;
            };
            report.finished.push(done);
            self.emit(Event::node(
                self.play_id,
                node.label(),
                "finished",
                format!("node {done} finished"),
            ));

            if node.is_terminal() {
                debug!(play = %self.play_id, node = %done, "terminal node completed");
                report.terminals.push(done);
                self.emit(Event::node(
                    self.play_id,
                    node.label(),
                    "terminal",
                    format!("terminal node {done} completed"),
                ));
                continue;
            }

            for &child in node.children() {
                self.deliver(child, graph, adapter, report, pending);
            }
        }
    }

    fn deliver(
        &mut self,
        child: NodeKey,
        graph: &ActionGraph,
        adapter: &mut dyn ActorAdapter,
        report: &mut TickReport,
        pending: &mut VecDeque<NodeKey>,
    ) {
        let ready = match self.joins.get_mut(&child) {
            None => {
                self.fault(PlaybackFault::UnknownSignal { key: child }, report);
                return;
            }
            Some(js) if js.fired => {
                self.fault(PlaybackFault::SignalAfterFire { key: child }, report);
                return;
            }
            Some(js) => {
                js.received += 1;
                let ready = js.expected > 0 && js.received == js.expected;
                if ready {
                    js.fired = true;
                }
                ready
            }
        };

        if ready {
            self.fire(child, graph, adapter, report, pending);
        }
    }

    /// Run a node's body: apply an instant effect inline, or arm a timed
    /// runner. Instant nodes (and skipped nodes) complete immediately and
    /// join the pending queue.
    fn fire(
        &mut self,
        key: NodeKey,
        graph: &ActionGraph,
        adapter: &mut dyn ActorAdapter,
        report: &mut TickReport,
        pending: &mut VecDeque<NodeKey>,
    ) {
        let Some(node) = graph.node(key) else {
            self.fault(PlaybackFault::UnknownSignal { key }, report);
            return;
        };

        report.fired.push(key);
        debug!(play = %self.play_id, node = %key, label = node.label(), "node fired");
        self.emit(Event::node(
            self.play_id,
            node.label(),
            "fired",
            format!("node {key} fired"),
        ));

        match node.kind() {
            ActionKind::Instant(effect) => {
                if !effect.apply(node.target(), adapter) {
                    self.fault(
                        PlaybackFault::MissingActor {
                            key,
                            actor: node.target().clone(),
                        },
                        report,
                    );
                }
                pending.push_back(key);
            }
            ActionKind::Timed { .. } => match TimedRunner::arm(node, adapter) {
                Some(runner) => self.armed.push(runner),
                None => {
                    self.fault(
                        PlaybackFault::MissingActor {
                            key,
                            actor: node.target().clone(),
                        },
                        report,
                    );
                    pending.push_back(key);
                }
            },
        }
    }

    fn fault(&self, fault: PlaybackFault, report: &mut TickReport) {
        warn!(play = %self.play_id, %fault, "playback fault");
        let scope = match fault {
            PlaybackFault::MissingActor { .. } => "missing-actor",
            _ => "signal-integrity",
        };
        self.emit(Event::scheduler(self.play_id, scope, fault.to_string()));
        report.faults.push(fault);
    }

    fn emit(&self, event: Event) {
        // A dropped bus is not an error; playback carries on silently.
        let _ = self.events.send(event);
    }
}
