use crate::sink::LineSink;
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all lines.
///
/// Useful for measuring formatting overhead without any I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LineSink for NoopSink {
    async fn write_line(&self, _line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::StandardFormatter;
    use crate::layer::FormatLayer;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tokio::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[tokio::test]
    async fn layer_accepts_lines_without_io() {
        let formatter = Arc::new(StandardFormatter::new("%(message)s", "%Y").unwrap());
        let (layer, handle) = FormatLayer::new(
            formatter,
            Arc::new(NoopSink),
            16,
            4,
            Duration::from_millis(10),
            tracing::Level::INFO,
        );
        let enqueued = Arc::clone(&layer.enqueued_events);

        tracing::subscriber::with_default(Registry::default().with(layer), || {
            for i in 0..8 {
                tracing::info!(i, "discarded");
            }
        });

        assert_eq!(enqueued.load(Ordering::Relaxed), 8);
        // Dropping the subscriber closes the channel and ends the writer task.
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("writer task exits")
            .unwrap();
    }
}
