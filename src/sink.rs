use async_trait::async_trait;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWriteExt, Stdout};

/// Asynchronous destination for rendered log lines.
///
/// The [`FormatLayer`] formats records on the application thread and hands
/// the resulting strings to a background task, which is the only caller of
/// these methods.
///
/// [`FormatLayer`]: crate::layer::FormatLayer
#[async_trait]
pub trait LineSink: Send + Sync {
    /// Write one rendered line. The line carries no trailing newline.
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted.
    /// - `Err(..)` on I/O failure; the layer retries the batch with
    ///   backoff a bounded number of times.
    async fn write_line(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush anything buffered. Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Writes each line, newline-terminated, to the process stdout.
pub struct StdoutSink {
    out: tokio::sync::Mutex<Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: tokio::sync::Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSink for StdoutSink {
    async fn write_line(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.out.lock().await.flush().await?;
        Ok(())
    }
}

/// Keeps every line in memory. Cloning shares the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LineSink for MemorySink {
    async fn write_line(&self, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_sink_clones_share_lines() {
        let sink = MemorySink::default();
        let writer = sink.clone();
        writer.write_line("one").await.unwrap();
        writer.write_line("two").await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(sink.lines(), vec!["one".to_string(), "two".to_string()]);
    }
}
