//! Structured logging setup, grounded on `tucano-core::logging`: an
//! env-filtered `tracing` subscriber with a human or JSON layer, plus a
//! span filter to quiet one noisy repeating span. The teacher quiets its
//! audit-replica span; this crate quiets the per-tick zone-switch
//! evaluation instead, since that's the span that would otherwise fire
//! once per market tick regardless of whether a zone handover occurred.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the span wrapped around `SwingStateMachine`'s per-tick active-
/// zone handover check.
pub const ZONE_SWITCH_EVAL_SPAN_NAME: &str = "swing_zone_switch_eval";

/// Initializes human-readable logging, filtered by `RUST_LOG` (default
/// `info`), with the zone-switch-eval span silenced.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(ZoneSwitchSpanFilter)
        .init()
}

/// Initializes JSON logging for log aggregators, same filtering as
/// [`init_logging`].
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .with(ZoneSwitchSpanFilter)
        .init()
}

struct ZoneSwitchSpanFilter;

impl<S> tracing_subscriber::layer::Layer<S> for ZoneSwitchSpanFilter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn event_enabled(
        &self,
        _: &tracing::Event<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        if let Some(span) = ctx.lookup_current() {
            span.name() != ZONE_SWITCH_EVAL_SPAN_NAME
        } else {
            true
        }
    }
}
