use serde_derive::Deserialize;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{filter::FromEnvError, fmt::time::ChronoUtc, EnvFilter};

/// Level used when neither the environment nor the config names one.
pub const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Deserialize)]
pub struct Log {
    pub level: String,
    /// JSON lines instead of human readable output.
    #[serde(default)]
    pub structured: bool,
}

/// setup log from an optional environment filter and the config file
///
/// if the environment filter is present, then the config level is not used.
/// Output goes to stderr, stdout belongs to the presenter.
pub fn setup(
    env_filter: Result<EnvFilter, FromEnvError>,
    config: Option<&Log>,
) -> Result<(), SetGlobalDefaultError> {
    let structured = config.map(|c| c.structured).unwrap_or(false);
    let filter = env_filter.unwrap_or_else(|_| {
        let level = config.map(|c| c.level.as_str()).unwrap_or(DEFAULT_LEVEL);
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    });

    let builder = tracing_subscriber::fmt()
        .with_timer(ChronoUtc::rfc_3339())
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if structured {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.with_ansi(true).finish())
    }
}
