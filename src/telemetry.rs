use crate::config::AppConfig;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding binary or test run.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to this
/// crate and sqlx is kept at warn. Safe to call more than once.
pub fn init(config: &AppConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("bulldog_backend={},sqlx=warn", config.log_level).into()
        }))
        .try_init();
}
