//! Tracing configuration and initialization.

use tracing_subscriber::{
    EnvFilter,
    fmt::format::FmtSpan,
    util::{SubscriberInitExt as _, TryInitError},
};

pub struct Trc {
    env_filter: EnvFilter,
    /// Emit span enter/close events, useful when tracing individual cache operations.
    span_events: bool,
}

impl Default for Trc {
    fn default() -> Self {
        let maybe_env_filter = EnvFilter::try_from_env("NFS_CACHE_LOG")
            .or_else(|_| EnvFilter::try_from_default_env());

        match maybe_env_filter {
            // A user-provided filter probably means they are debugging; show spans too.
            Ok(env_filter) => Self {
                env_filter,
                span_events: true,
            },
            Err(_) => Self {
                env_filter: EnvFilter::new("info"),
                span_events: false,
            },
        }
    }
}

impl Trc {
    pub fn init(self) -> Result<(), TryInitError> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        tracing_subscriber::fmt()
            .with_env_filter(self.env_filter)
            .with_span_events(span_events)
            .with_writer(std::io::stderr)
            .finish()
            .try_init()
    }
}
