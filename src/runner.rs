//! Per-node timed execution: the `Armed -> Running -> Finished` machine.
//!
//! A [`TimedRunner`] is created when the scheduler fires a node whose kind is
//! [`ActionKind::Timed`](crate::node::ActionKind::Timed). The origin value of
//! the interpolation is captured from the actor adapter at that moment; the
//! runner then accumulates tick deltas, maps normalized time through the
//! node's easing curve, and writes the interpolated value back through the
//! adapter until the duration elapses.
//!
//! Ordering rule: a runner armed during a tick does not consume that tick's
//! delta. The scheduler promotes armed runners to `Running` at the start of
//! the next tick, so one frame's delta is never double-counted. "Wait one
//! frame" is therefore a state, not a suspended coroutine.

use tracing::trace;

use crate::actor::{ActorAdapter, Colour, Vec2};
use crate::easing::Easing;
use crate::node::{ActionKind, ActionNode, TimedEffect};
use crate::types::{ActorId, NodeKey};

/// Phase of one timed node's life within a play-through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerPhase {
    /// Fired, origin captured, waiting for its first tick.
    Armed,
    /// Accumulating time and interpolating.
    Running,
    /// Final value written; completion signals emitted by the scheduler.
    Finished,
}

/// Origin value captured when the node was armed.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Origin {
    Position(Vec2),
    Scale(Vec2),
    Rotation(f32),
    Colour(Colour),
    /// Delay and text reveal interpolate from nothing.
    None,
}

/// Drives one timed node through its interpolation.
#[derive(Clone, Debug)]
pub struct TimedRunner {
    key: NodeKey,
    target: ActorId,
    duration: f32,
    easing: Easing,
    effect: TimedEffect,
    origin: Origin,
    elapsed: f32,
    phase: RunnerPhase,
}

impl TimedRunner {
    /// Arm a runner for `node`, capturing the interpolation origin.
    ///
    /// Returns `None` when the node's kind is not timed, or when the target
    /// actor cannot be resolved for an effect that needs one — the caller
    /// reports the missing actor and completes the node immediately.
    pub(crate) fn arm(node: &ActionNode, adapter: &dyn ActorAdapter) -> Option<TimedRunner> {
        let ActionKind::Timed {
            duration,
            easing,
            effect,
        } = node.kind()
        else {
            return None;
        };

        let target = node.target().clone();
        let origin = match effect {
            TimedEffect::MoveTo(_) => Origin::Position(adapter.position(&target)?),
            TimedEffect::ScaleTo(_) => Origin::Scale(adapter.scale(&target)?),
            TimedEffect::RotateTo(_) => Origin::Rotation(adapter.rotation(&target)?),
            TimedEffect::ColourTo(_) => Origin::Colour(adapter.colour(&target)?),
            TimedEffect::Delay => Origin::None,
            TimedEffect::RevealText(_) => {
                if !adapter.contains(&target) {
                    return None;
                }
                Origin::None
            }
        };

        Some(TimedRunner {
            key: node.key(),
            target,
            duration: *duration,
            easing: *easing,
            effect: effect.clone(),
            origin,
            elapsed: 0.0,
            phase: RunnerPhase::Armed,
        })
    }

    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    #[must_use]
    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    /// Normalized, clamped, eased progress at the current elapsed time.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.easing.apply(self.raw())
    }

    fn raw(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Promote `Armed -> Running`. Called by the scheduler at the start of
    /// the first tick that includes this runner.
    pub(crate) fn start(&mut self) {
        if self.phase == RunnerPhase::Armed {
            self.phase = RunnerPhase::Running;
        }
    }

    /// Advance by one tick's delta, writing the interpolated value.
    ///
    /// Returns `true` when the node finished on this tick. The final write
    /// always happens with progress exactly `1.0`, so the goal value is
    /// reached precisely rather than approximated.
    pub(crate) fn tick(&mut self, delta: f32, adapter: &mut dyn ActorAdapter) -> bool {
        if self.phase != RunnerPhase::Running {
            return self.phase == RunnerPhase::Finished;
        }

        self.elapsed += delta;
        let raw = self.raw();
        let done = raw >= 1.0;
        let progress = if done { 1.0 } else { self.easing.apply(raw) };

        trace!(key = %self.key, raw, progress, "timed runner tick");
        self.apply(progress, adapter);

        if done {
            self.phase = RunnerPhase::Finished;
        }
        done
    }

    fn apply(&self, progress: f32, adapter: &mut dyn ActorAdapter) {
        match &self.effect {
            TimedEffect::MoveTo(goal) => {
                if let Origin::Position(from) = self.origin {
                    adapter.set_position(&self.target, from.lerp(*goal, progress));
                }
            }
            TimedEffect::ScaleTo(goal) => {
                if let Origin::Scale(from) = self.origin {
                    adapter.set_scale(&self.target, from.lerp(*goal, progress));
                }
            }
            TimedEffect::RotateTo(goal) => {
                if let Origin::Rotation(from) = self.origin {
                    adapter.set_rotation(&self.target, from + (goal - from) * progress);
                }
            }
            TimedEffect::ColourTo(goal) => {
                if let Origin::Colour(from) = self.origin {
                    adapter.set_colour(&self.target, from.lerp(*goal, progress));
                }
            }
            TimedEffect::Delay => {}
            TimedEffect::RevealText(text) => {
                let total = text.chars().count();
                let visible = ((progress * total as f32).round() as usize).min(total);
                let shown: String = text.chars().take(visible).collect();
                adapter.set_dialogue(&self.target, &shown);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::MemoryStage;
    use crate::graph::ActionGraph;

    fn timed_move(duration: f32, goal: Vec2) -> (ActionGraph, NodeKey) {
        let mut graph = ActionGraph::new();
        let key = graph.add_node(
            "walk",
            "hero",
            ActionKind::Timed {
                duration,
                easing: Easing::Linear,
                effect: TimedEffect::MoveTo(goal),
            },
        );
        (graph, key)
    }

    #[test]
    fn arm_captures_origin_and_starts_armed() {
        let (graph, key) = timed_move(2.0, Vec2::new(10.0, 0.0));
        let stage = MemoryStage::new().with_actor("hero");
        let runner = TimedRunner::arm(graph.node(key).unwrap(), &stage).unwrap();
        assert_eq!(runner.phase(), RunnerPhase::Armed);
        assert_eq!(runner.key(), key);
    }

    #[test]
    fn arm_fails_for_missing_actor() {
        let (graph, key) = timed_move(2.0, Vec2::new(10.0, 0.0));
        let stage = MemoryStage::new();
        assert!(TimedRunner::arm(graph.node(key).unwrap(), &stage).is_none());
    }

    #[test]
    fn linear_move_interpolates_and_clamps() {
        let (graph, key) = timed_move(2.0, Vec2::new(10.0, 0.0));
        let mut stage = MemoryStage::new().with_actor("hero");
        let hero: ActorId = "hero".into();

        let mut runner = TimedRunner::arm(graph.node(key).unwrap(), &stage).unwrap();
        runner.start();

        assert!(!runner.tick(1.0, &mut stage));
        assert_eq!(stage.position(&hero), Some(Vec2::new(5.0, 0.0)));

        // 1.5s more: raw 1.25 clamps to 1, final write is exact.
        assert!(runner.tick(1.5, &mut stage));
        assert_eq!(stage.position(&hero), Some(Vec2::new(10.0, 0.0)));
        assert_eq!(runner.phase(), RunnerPhase::Finished);
    }

    #[test]
    fn zero_duration_completes_on_first_tick_with_full_progress() {
        let (graph, key) = timed_move(0.0, Vec2::new(4.0, 4.0));
        let mut stage = MemoryStage::new().with_actor("hero");
        let mut runner = TimedRunner::arm(graph.node(key).unwrap(), &stage).unwrap();
        runner.start();
        assert!(runner.tick(0.016, &mut stage));
        assert_eq!(stage.position(&"hero".into()), Some(Vec2::new(4.0, 4.0)));
    }

    #[test]
    fn armed_runner_ignores_ticks_until_started() {
        let (graph, key) = timed_move(1.0, Vec2::new(4.0, 0.0));
        let mut stage = MemoryStage::new().with_actor("hero");
        let mut runner = TimedRunner::arm(graph.node(key).unwrap(), &stage).unwrap();
        assert!(!runner.tick(10.0, &mut stage));
        assert_eq!(stage.position(&"hero".into()), Some(Vec2::default()));
        assert_eq!(runner.phase(), RunnerPhase::Armed);
    }

    #[test]
    fn reveal_text_shows_prefix_by_progress() {
        let mut graph = ActionGraph::new();
        let key = graph.add_node(
            "say",
            "hero",
            ActionKind::Timed {
                duration: 4.0,
                easing: Easing::Linear,
                effect: TimedEffect::RevealText("hello".into()),
            },
        );
        let mut stage = MemoryStage::new().with_actor("hero");
        let hero: ActorId = "hero".into();

        let mut runner = TimedRunner::arm(graph.node(key).unwrap(), &stage).unwrap();
        runner.start();
        runner.tick(2.0, &mut stage);
        assert_eq!(stage.dialogue(&hero).unwrap().chars().count(), 3);
        runner.tick(2.0, &mut stage);
        assert_eq!(stage.dialogue(&hero).as_deref(), Some("hello"));
    }
}
