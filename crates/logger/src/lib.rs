use std::env::{self, VarError};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    initialize_tracing(LevelFilter::INFO);
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` narrows the filter as usual; `RUST_LOG_FORMAT=json` switches
/// the output layer to structured JSON for log shippers.
fn initialize_tracing(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = match env::var("RUST_LOG_FORMAT") {
        Ok(format) => format,
        Err(VarError::NotPresent) => String::new(),
        Err(VarError::NotUnicode(_)) => {
            eprintln!("RUST_LOG_FORMAT is not valid unicode, falling back to compact output");
            String::new()
        }
    };

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).init();
}
