use std::borrow::Cow;
use std::time::Duration as StdDuration;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

/// Initialises tracing.
///
/// Formatted events go to `stderr`, filtered by `FACTOREC_LOG`. Sentry gets its own filter,
/// `FACTOREC_SENTRY_LOG`.
pub fn init(sentry_dsn: Option<String>, traces_sample_rate: f32) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            traces_sample_rate,
            ..Default::default()
        },
    ));
    tracing_subscriber::Registry::default()
        .with(sentry_layer(env_filter("FACTOREC_SENTRY_LOG", "factorec=debug")?))
        .with(format_layer(env_filter("FACTOREC_LOG", "factorec=info")?))
        .try_init()?;
    Ok(guard)
}

/// Reads the directives from the environment variable, falling back to `default` when unset.
fn env_filter(variable: &str, default: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_env(variable)
        .or_else(|_| EnvFilter::try_new(default))
        .with_context(|| format!("invalid log directives for `{}`", variable))
}

/// Errors and warnings become Sentry events. Per-pass progress at `info` and `debug` is kept
/// as breadcrumbs for the next event, and `trace` is dropped.
fn sentry_event_kind(level: Level) -> EventFilter {
    match level {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    }
}

/// Only the `info` spans, that is the whole `fit`, are sent as transactions. The per-pass
/// optimizer spans are `debug`.
fn is_sentry_span(level: Level) -> bool {
    level <= Level::INFO
}

fn sentry_layer<S>(filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    sentry::integrations::tracing::layer()
        .event_filter(|metadata| sentry_event_kind(*metadata.level()))
        .span_filter(|metadata| is_sentry_span(*metadata.level()))
        .with_filter(filter)
}

/// Progress goes to `stderr`, so that `stdout` stays clean for the JSON answers.
fn format_layer<S>(filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter)
}

#[must_use]
pub fn format_duration(duration: StdDuration) -> String {
    // Sub-millisecond precision is noise in the logs.
    let duration = StdDuration::from_millis(duration.as_millis() as u64);
    humantime::format_duration(duration).to_string()
}

#[must_use]
pub fn format_elapsed(instant: Instant) -> String {
    format_duration(instant.elapsed())
}
