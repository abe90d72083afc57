use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

fn env_filter(verbosity_level: Level) -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("hyper_util=error".parse()?)
        .add_directive("reqwest=warn".parse()?))
}

/// Initialize logging on stderr so command output on stdout stays clean.
/// `RUST_LOG` overrides the level picked with `-v`.
///
/// # Errors
///
/// Returns an error if the filter cannot be built or a subscriber is already set
pub fn init(verbosity_level: Option<Level>, json: bool) -> Result<()> {
    let filter = env_filter(verbosity_level.unwrap_or(Level::ERROR))?;

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(false)
            .with_writer(io::stderr);

        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .with_writer(io::stderr)
            .pretty();

        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
