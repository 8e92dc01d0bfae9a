//! Structured playback events and pluggable sinks.
//!
//! The engine narrates what it does — nodes firing and finishing, join
//! faults, line and script transitions — as structured [`Event`]s pushed
//! onto a flume channel. An [`EventBus`] owns the channel plus any number of
//! [`EventSink`]s and is pumped once per tick by the sequence controller;
//! there is no background task because the whole engine is single-threaded
//! and tick-driven by design.

mod bus;
mod event;
mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, NodeEvent, SchedulerEvent, SequenceEvent};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
