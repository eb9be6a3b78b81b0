use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events follow `--log-level`.
const CLIENT_TARGETS: [&str; 4] = [
    "urprimary",
    "urprimary_client",
    "urprimary_frame",
    "urprimary_transport",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `level` for the urprimary crates; other crates never log below warn, so
/// `--log-level trace` shows the primary stream and not the dependencies.
pub fn targets(level: LogLevel) -> Targets {
    let level = level.as_filter();
    CLIENT_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| targets.with_target(*target, level))
        .with_default(level.min(LevelFilter::WARN))
}

/// Log to stderr so stdout stays parseable. Events carry the thread name,
/// which tells the pipeline worker apart from the control-mode poller.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let registry = tracing_subscriber::registry().with(targets(level));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(true);

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn client_crates_follow_the_requested_level() {
        let filter = targets(LogLevel::Debug);
        assert!(filter.would_enable("urprimary_client::client", &Level::DEBUG));
        assert!(filter.would_enable("urprimary_frame::reader", &Level::DEBUG));
        assert!(!filter.would_enable("urprimary_transport::tcp", &Level::TRACE));
    }

    #[test]
    fn other_crates_stay_at_warn() {
        let filter = targets(LogLevel::Trace);
        assert!(!filter.would_enable("mio::poll", &Level::INFO));
        assert!(filter.would_enable("mio::poll", &Level::WARN));

        let quiet = targets(LogLevel::Error);
        assert!(!quiet.would_enable("mio::poll", &Level::WARN));
    }
}
