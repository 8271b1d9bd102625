use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt::time, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber, writing to `path`.
///
/// The terminal belongs to the game while it runs, so logs never go to
/// stdout/stderr. A non-empty `RUST_LOG` replaces the default directives.
/// Call once, before the terminal is switched to raw mode.
pub fn init(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(time::uptime())
                .with_writer(Mutex::new(file)),
        )
        .with(env_filter(rust_log.as_deref())?)
        .try_init()?;
    Ok(())
}

fn env_filter(rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    let default_level = if cfg!(debug_assertions) {
        "sineai_runner=debug"
    } else {
        "sineai_runner=info"
    };
    let directives = match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => default_level,
    };
    Ok(EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse(directives)?)
}
