use crate::config::FormatterConfig;
use crate::error::InitError;
use crate::formatter::Formatter;
use crate::layer::FormatLayer;
use crate::sink::LineSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Buffering and filtering settings for [`FormatLayer`].
///
/// **Fields**
/// - `channel_buffer`: maximum number of rendered lines queued before new
///   ones are dropped.
/// - `batch_size`: number of lines written to the sink per batch.
/// - `flush_interval`: maximum time between flushes, even for a partial
///   batch.
/// - `min_level`: least severe level that is formatted at all.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub min_level: Level,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            min_level: Level::INFO,
        }
    }
}

/// Install a [`Registry`] with a [`FormatLayer`] as the global default
/// subscriber.
///
/// **Parameters**
/// - `formatter`: renders each event, e.g. a [`JsonFormatter`].
/// - `sink`: receives the rendered lines.
/// - `config`: [`LayerConfig`] controlling buffering and filtering.
///
/// **Returns**
/// - The handle of the background writer task.
/// - `Err(InitError::SetGlobal)` if a global subscriber is already set.
///
/// Must be called from within a Tokio runtime.
///
/// [`JsonFormatter`]: crate::formatter::JsonFormatter
pub fn init_tracing_with_config(
    formatter: Arc<dyn Formatter>,
    sink: Arc<dyn LineSink>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, InitError> {
    let (layer, handle) = FormatLayer::new(
        formatter,
        sink,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
        config.min_level,
    );

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(handle)
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(
    formatter: Arc<dyn Formatter>,
    sink: Arc<dyn LineSink>,
) -> Result<JoinHandle<()>, InitError> {
    init_tracing_with_config(formatter, sink, LayerConfig::default())
}

/// Initialize tracing with a formatter described by the `LOG_FORMAT_*`
/// environment variables.
pub fn init_tracing_from_env(sink: Arc<dyn LineSink>) -> Result<JoinHandle<()>, InitError> {
    let formatter = FormatterConfig::from_env()?.build()?;
    init_tracing(formatter, sink)
}
