//! Process-level diagnostics: tracing subscriber and panic reporting.
//!
//! Host applications call [`init`] once at startup; the engine itself only
//! emits `tracing` events and playback [`Event`](crate::event_bus::Event)s
//! and never installs a subscriber on its own. Filtering is driven by
//! `RUST_LOG` (loaded from a `.env` file if one is present), defaulting to
//! `error,cuegraph=info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the tracing subscriber and the miette panic hook.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    dotenvy::dotenv().ok();
    init_tracing();
    init_miette();
}

/// Install a compact fmt subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,cuegraph=info"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    // try_init: tests and embedding hosts may already have a subscriber.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok();
}

/// Pretty panic reports through miette.
pub fn init_miette() {
    miette::set_panic_hook();
}
