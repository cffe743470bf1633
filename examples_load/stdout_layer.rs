use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use tracing_log_format::config::{FormatterConfig, OutputMode};
use tracing_log_format::init::init_tracing;
use tracing_log_format::sink::StdoutSink;

#[tokio::main]
async fn main() {
    let config = FormatterConfig {
        mode: OutputMode::Json,
        pretty: true,
        ..FormatterConfig::default()
    };
    let formatter = config.build().expect("valid formatter config");
    init_tracing(formatter, Arc::new(StdoutSink::new())).expect("install subscriber");

    info!("starting service");
    warn!(retries = 3, "upstream slow");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    sleep(Duration::from_secs(2)).await;
}
