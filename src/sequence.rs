//! Outer playback loop: scripts, cursors, and line advancement.
//!
//! A [`Script`] nests acts, scenes, and lines; each [`Line`] stores its
//! action graph in flat record form. The [`SequenceController`] walks that
//! nesting with an explicit [`Cursor`] — no ambient "current scene" state —
//! folding each line's records into a live graph, handing the root to a
//! freshly primed [`JoinScheduler`], and watching for the graph's terminal
//! node. When a terminal completes the controller advances deterministically:
//! next line in the scene, else next scene, else next act, else the finished
//! state, raising one `script`-scoped event when nothing remains.
//!
//! Advancement is driven only by terminal completion; calling
//! [`advance`](SequenceController::advance) while a line is playing is
//! rejected, which is what rules out double-advance races.
//!
//! # Examples
//!
//! ```rust
//! use cuegraph::actor::MemoryStage;
//! use cuegraph::codec::unfold;
//! use cuegraph::event_bus::EventBus;
//! use cuegraph::graph::ActionGraph;
//! use cuegraph::node::{ActionKind, InstantEffect};
//! use cuegraph::sequence::{Act, Line, PlayState, Scene, Script, SequenceController};
//!
//! let mut graph = ActionGraph::new();
//! let enter = graph.add_node("enter", "hero", ActionKind::Instant(InstantEffect::Visible(true)));
//! let bow = graph.add_node("bow", "hero", ActionKind::Instant(InstantEffect::Pose("bow".into())));
//! graph.connect(enter, bow).unwrap();
//! let records = unfold(&graph).unwrap();
//!
//! let script = Script::new("demo").with_act(
//!     Act::new("act one")
//!         .with_scene(Scene::new("opening").with_line(Line::new("entrance", records))),
//! );
//!
//! let mut controller = SequenceController::with_bus(script, EventBus::discard());
//! let mut stage = MemoryStage::new().with_actor("hero");
//! controller.play(&mut stage).unwrap();
//! // An all-instant line runs to its terminal at activation.
//! assert_eq!(controller.state(), PlayState::Finished);
//! ```

use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actor::ActorAdapter;
use crate::codec::{fold, ActionRecord, StructuralError};
use crate::event_bus::{Event, EventBus};
use crate::graph::ActionGraph;
use crate::scheduler::{JoinScheduler, SchedulerError, TickReport};

/// One playable unit: a label plus its action graph in flat record form.
///
/// The records are folded into a fresh live graph every time the line is
/// played, so join state never leaks between play-throughs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub label: String,
    pub records: Vec<ActionRecord>,
}

impl Line {
    pub fn new(label: impl Into<String>, records: Vec<ActionRecord>) -> Self {
        Line {
            label: label.into(),
            records,
        }
    }
}

/// An ordered run of lines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub label: String,
    pub lines: Vec<Line>,
}

impl Scene {
    pub fn new(label: impl Into<String>) -> Self {
        Scene {
            label: label.into(),
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }
}

/// An ordered run of scenes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Act {
    pub label: String,
    pub scenes: Vec<Scene>,
}

impl Act {
    pub fn new(label: impl Into<String>) -> Self {
        Act {
            label: label.into(),
            scenes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }
}

/// The full nested script a controller plays front to back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub acts: Vec<Act>,
}

impl Script {
    pub fn new(title: impl Into<String>) -> Self {
        Script {
            title: title.into(),
            acts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_act(mut self, act: Act) -> Self {
        self.acts.push(act);
        self
    }
}

/// Position within a script: indices into acts, scenes, and lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub act: usize,
    pub scene: usize,
    pub line: usize,
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.act, self.scene, self.line)
    }
}

/// Controller state between calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    /// No line is live; [`play`](SequenceController::play) starts the line
    /// under the cursor.
    Idle,
    /// A line's graph is live and consuming ticks.
    PlayingLine,
    /// The last act has completed; nothing remains to play.
    Finished,
}

/// Errors from driving a sequence.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a line is already playing")]
    #[diagnostic(
        code(cuegraph::sequence::already_playing),
        help("Wait for the current line's terminal node; advancement is automatic.")
    )]
    AlreadyPlaying,

    /// Only terminal-node completion may move the cursor mid-line.
    #[error("cannot advance while a line is playing")]
    #[diagnostic(code(cuegraph::sequence::advance_while_playing))]
    AdvanceWhilePlaying,

    /// Normal terminal state, reported as an error only to the caller that
    /// asked for more content than the script has.
    #[error("script is exhausted")]
    #[diagnostic(code(cuegraph::sequence::script_exhausted))]
    ScriptExhausted,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// The live graph and scheduler for the line currently playing.
struct LiveLine {
    graph: ActionGraph,
    scheduler: JoinScheduler,
}

/// Plays one [`Script`] front to back over an actor adapter.
///
/// Owns the current line's graph exclusively for the duration of its
/// play-through; the graph and its join state are discarded wholesale when
/// the line finishes or fails, never rolled back node by node.
pub struct SequenceController {
    script: Script,
    bus: EventBus,
    events: flume::Sender<Event>,
    cursor: Cursor,
    state: PlayState,
    live: Option<LiveLine>,
}

impl SequenceController {
    /// A controller narrating to the default stdout sink.
    pub fn new(script: Script) -> Self {
        Self::with_bus(script, EventBus::default())
    }

    /// A controller narrating to the given bus. The bus is pumped at the end
    /// of every [`play`](Self::play) and [`tick`](Self::tick) call.
    pub fn with_bus(script: Script, bus: EventBus) -> Self {
        let events = bus.sender();
        let (cursor, state) = match seek(&script, Cursor::default()) {
            Some(cursor) => (cursor, PlayState::Idle),
            None => (Cursor::default(), PlayState::Finished),
        };
        SequenceController {
            script,
            bus,
            events,
            cursor,
            state,
            live: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// The bus this controller narrates to; add sinks here.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Play-through id of the live line, if one is playing.
    #[must_use]
    pub fn play_id(&self) -> Option<Uuid> {
        self.live.as_ref().map(|l| l.scheduler.play_id())
    }

    /// Start playing the line under the cursor.
    ///
    /// Folds the line's records into a fresh graph, primes a scheduler, and
    /// fires the root. Lines made entirely of instant nodes complete within
    /// this call, in which case the controller has already advanced (possibly
    /// through several lines) by the time it returns.
    pub fn play(&mut self, adapter: &mut dyn ActorAdapter) -> Result<TickReport, SequenceError> {
        match self.state {
            PlayState::PlayingLine => return Err(SequenceError::AlreadyPlaying),
            PlayState::Finished => return Err(SequenceError::ScriptExhausted),
            PlayState::Idle => {}
        }
        let report = self.start_line(adapter)?;
        let report = self.follow_terminals(report, adapter);
        self.bus.pump();
        Ok(report)
    }

    /// Advance every running node by one tick's delta.
    ///
    /// A no-op unless a line is playing. When the line's terminal completes,
    /// the controller tears the line down and starts the next one within the
    /// same call; the new line's nodes are armed but do not consume this
    /// tick's delta.
    pub fn tick(&mut self, delta: f32, adapter: &mut dyn ActorAdapter) -> TickReport {
        if self.state != PlayState::PlayingLine {
            return TickReport::default();
        }
        let report = match self.live.as_mut() {
            Some(live) => live.scheduler.tick(&live.graph, adapter, delta),
            None => TickReport::default(),
        };
        let report = self.follow_terminals(report, adapter);
        self.bus.pump();
        report
    }

    /// Skip the cursor to the next line without playing the current one.
    ///
    /// Rejected while a line is playing; terminal completion is the only
    /// thing allowed to move the cursor mid-line.
    pub fn advance(&mut self) -> Result<Cursor, SequenceError> {
        match self.state {
            PlayState::PlayingLine => Err(SequenceError::AdvanceWhilePlaying),
            PlayState::Finished => Err(SequenceError::ScriptExhausted),
            PlayState::Idle => match self.next_cursor() {
                Some(next) => {
                    self.cursor = next;
                    Ok(next)
                }
                None => {
                    self.state = PlayState::Finished;
                    Err(SequenceError::ScriptExhausted)
                }
            },
        }
    }

    fn line_at(&self, cursor: Cursor) -> Option<&Line> {
        self.script
            .acts
            .get(cursor.act)?
            .scenes
            .get(cursor.scene)?
            .lines
            .get(cursor.line)
    }

    fn next_cursor(&self) -> Option<Cursor> {
        let mut from = self.cursor;
        from.line += 1;
        seek(&self.script, from)
    }

    fn start_line(&mut self, adapter: &mut dyn ActorAdapter) -> Result<TickReport, SequenceError> {
        let line = self
            .line_at(self.cursor)
            .ok_or(SequenceError::ScriptExhausted)?;
        let label = line.label.clone();
        let graph = fold(&line.records)?;
        let mut scheduler = JoinScheduler::prime(&graph, self.events.clone())?;
        debug!(line = %label, at = %self.cursor, play = %scheduler.play_id(), "line started");
        self.emit(Event::sequence("line", format!("line '{label}' started")));
        let report = scheduler.activate_root(&graph, adapter)?;
        self.live = Some(LiveLine { graph, scheduler });
        self.state = PlayState::PlayingLine;
        Ok(report)
    }

    /// Consume terminal completions: tear down the finished line, advance the
    /// cursor, and start the next line, looping while all-instant lines keep
    /// finishing at activation.
    fn follow_terminals(
        &mut self,
        mut report: TickReport,
        adapter: &mut dyn ActorAdapter,
    ) -> TickReport {
        let mut line_done = report.line_finished();
        while line_done && self.state == PlayState::PlayingLine {
            let label = self
                .line_at(self.cursor)
                .map(|l| l.label.clone())
                .unwrap_or_default();
            self.live = None;
            self.emit(Event::sequence("line", format!("line '{label}' finished")));

            let here = self.cursor;
            match self.next_cursor() {
                None => {
                    self.state = PlayState::Finished;
                    info!(script = %self.script.title, "script finished");
                    self.emit(Event::sequence(
                        "script",
                        format!("script '{}' finished", self.script.title),
                    ));
                    break;
                }
                Some(next) => {
                    if next.act != here.act || next.scene != here.scene {
                        let scene_label = self
                            .script
                            .acts
                            .get(here.act)
                            .and_then(|a| a.scenes.get(here.scene))
                            .map(|s| s.label.clone())
                            .unwrap_or_default();
                        self.emit(Event::sequence(
                            "scene",
                            format!("scene '{scene_label}' finished"),
                        ));
                    }
                    if next.act != here.act {
                        let act_label = self
                            .script
                            .acts
                            .get(here.act)
                            .map(|a| a.label.clone())
                            .unwrap_or_default();
                        self.emit(Event::sequence("act", format!("act '{act_label}' finished")));
                    }
                    self.cursor = next;
                    match self.start_line(adapter) {
                        Ok(r) => {
                            line_done = r.line_finished();
                            report.merge(r);
                        }
                        Err(err) => {
                            // Leave the cursor on the broken line; a later
                            // play() surfaces the same error to the caller.
                            self.state = PlayState::Idle;
                            warn!(%err, at = %self.cursor, "failed to start next line");
                            self.emit(Event::diagnostic(
                                "sequence",
                                format!("failed to start line at {}: {err}", self.cursor),
                            ));
                            break;
                        }
                    }
                }
            }
        }
        report
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

/// First cursor position at or after `from` that addresses an existing line.
fn seek(script: &Script, from: Cursor) -> Option<Cursor> {
    let mut act = from.act;
    let mut scene = from.scene;
    let mut line = from.line;
    loop {
        let a = script.acts.get(act)?;
        let Some(s) = a.scenes.get(scene) else {
            act += 1;
            scene = 0;
            line = 0;
            continue;
        };
        if s.lines.get(line).is_some() {
            return Some(Cursor { act, scene, line });
        }
        scene += 1;
        line = 0;
    }
}
