use crate::formatter::Formatter;
use crate::record::LogRecord;
use crate::sink::LineSink;
use std::error::Error;
use std::fmt::{self, Write as _};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Attempts made to deliver one batch before it is dropped.
const MAX_SEND_ATTEMPTS: u32 = 5;

/// `tracing_subscriber` layer that renders events with a [`Formatter`] and
/// forwards the lines to a [`LineSink`] via a bounded channel and
/// background task.
///
/// Formatting happens on the calling thread; only the rendered string
/// crosses the channel. Events below `min_level` are ignored.
pub struct FormatLayer {
    formatter: Arc<dyn Formatter>,
    sender: mpsc::Sender<String>,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full or closed.
    pub dropped_events: Arc<AtomicU64>,
}

impl FormatLayer {
    /// Create a new layer and spawn the background task that pulls lines
    /// from the channel and writes them to `sink` in batches.
    ///
    /// Must be called from within a Tokio runtime. Minimal thresholds are
    /// enforced for `buffer`, `batch_size` and `flush_interval`. The task
    /// flushes what is left and exits once the layer is dropped.
    pub fn new(
        formatter: Arc<dyn Formatter>,
        sink: Arc<dyn LineSink>,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
        min_level: Level,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel::<String>(buffer);

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let backoff = Duration::from_millis(100);
            let max_backoff = Duration::from_secs(10);
            let mut ticker = interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    line = rx.recv() => match line {
                        Some(line) => {
                            batch.push(line);
                            if batch.len() >= batch_size {
                                if let Err(e) = send_batch(&*sink, &mut batch, backoff, max_backoff).await {
                                    eprintln!("error writing log batch: {}", e);
                                }
                            }
                        }
                        None => {
                            if let Err(e) = send_batch(&*sink, &mut batch, backoff, max_backoff).await {
                                eprintln!("error flushing final log batch: {}", e);
                            }
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            if let Err(e) = send_batch(&*sink, &mut batch, backoff, max_backoff).await {
                                eprintln!("error flushing log batch: {}", e);
                            }
                        }
                    }
                }
            }
        });

        (
            Self {
                formatter,
                sender: tx,
                min_level,
                total_events: Arc::new(AtomicU64::new(0)),
                enqueued_events: Arc::new(AtomicU64::new(0)),
                dropped_events: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }
}

/// Write and flush `batch`, retrying with exponential backoff. The batch is
/// cleared whether or not delivery eventually succeeded.
async fn send_batch(
    sink: &dyn LineSink,
    batch: &mut Vec<String>,
    mut backoff: Duration,
    max_backoff: Duration,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut attempt = 1;
    loop {
        let mut result = Ok(());
        for line in batch.iter() {
            if let Err(e) = sink.write_line(line).await {
                result = Err(e);
                break;
            }
        }
        if result.is_ok() {
            result = sink.flush().await;
        }

        match result {
            Ok(()) => {
                batch.clear();
                return Ok(());
            }
            Err(e) if attempt >= MAX_SEND_ATTEMPTS => {
                let dropped = batch.len();
                batch.clear();
                return Err(format!("giving up on {} lines: {}", dropped, e).into());
            }
            Err(_) => {}
        }

        eprintln!("log sink write failed, retrying in {:?}", backoff);
        sleep(backoff).await;
        backoff = std::cmp::min(backoff * 2, max_backoff);
        attempt += 1;
    }
}

impl<S> Layer<S> for FormatLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new((*meta.level()).into(), meta.target(), visitor.finish());
        record.module_path = meta.module_path().map(|s| s.to_string());
        record.file = meta.file().map(|s| s.to_string());
        record.line = meta.line();

        let line = self.formatter.format(&mut record);
        match self.sender.try_send(line) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log channel full, dropping log line");
            }
        }
    }
}

/// Collects an event's `message` and renders every other field as
/// `key=value` after it.
#[derive(Default)]
pub struct FieldVisitor {
    message: String,
    extra: String,
}

impl FieldVisitor {
    /// The record message: the event message followed by its other fields.
    pub fn finish(self) -> String {
        match (self.message.is_empty(), self.extra.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.extra,
            (false, false) => format!("{} {}", self.message, self.extra),
        }
    }

    fn push(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        let _ = write!(self.extra, "{}={}", field.name(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push(field, format_args!("{:?}", value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, format_args!("{}", value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, format_args!("{}", value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, format_args!("{}", value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push(field, format_args!("{:?}", value));
        }
    }
}
