use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

/// Wall-clock time at which the first record of this process was built.
/// `relativeCreated` is measured against it.
static PROCESS_START: LazyLock<DateTime<Utc>> = LazyLock::new(Utc::now);

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = const { Cell::new(0) };
}

/// Small, stable numeric id for the calling thread.
fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
        }
        id.get()
    })
}

/// Severity of a [`LogRecord`].
///
/// Numeric values follow the usual `%(levelno)d` convention so templates
/// ported from other logging stacks render the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Level {
    pub fn name(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub fn number(&self) -> i64 {
        match self {
            Level::Trace => 5,
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warn => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level `{0}`")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" | "FATAL" => Ok(Level::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// One log event, as seen by the formatters.
///
/// The record is owned by the caller; formatting only ever touches the
/// cached `message`, through [`LogRecord::get_message`].
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// Logger name (the `tracing` target for bridged events).
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    pub process_id: u32,
    pub thread_id: u64,
    pub thread_name: Option<String>,
    /// Message format; each `{}` takes the next entry of `args`.
    pub msg: String,
    pub args: Vec<String>,
    pub message: Option<String>,
}

impl LogRecord {
    /// Build a record stamped with the current time, process and thread.
    pub fn new(level: Level, target: impl Into<String>, msg: impl Into<String>) -> Self {
        LazyLock::force(&PROCESS_START);
        let thread = std::thread::current();
        LogRecord {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            module_path: None,
            file: None,
            line: None,
            function: None,
            process_id: std::process::id(),
            thread_id: current_thread_id(),
            thread_name: thread.name().map(|s| s.to_string()),
            msg: msg.into(),
            args: Vec::new(),
            message: None,
        }
    }

    pub fn with_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        self.args = args.into_iter().map(|a| a.to_string()).collect();
        self.message = None;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Compute the message from `msg` and `args`, cache it and return it.
    ///
    /// Placeholders without a matching argument are left as `{}`; surplus
    /// arguments are appended, separated by spaces.
    pub fn get_message(&mut self) -> &str {
        let message = if self.args.is_empty() {
            self.msg.clone()
        } else {
            let mut out = String::with_capacity(self.msg.len());
            let mut args = self.args.iter();
            let mut rest = self.msg.as_str();
            while let Some(pos) = rest.find("{}") {
                out.push_str(&rest[..pos]);
                match args.next() {
                    Some(arg) => out.push_str(arg),
                    None => out.push_str("{}"),
                }
                rest = &rest[pos + 2..];
            }
            out.push_str(rest);
            for arg in args {
                out.push(' ');
                out.push_str(arg);
            }
            out
        };
        self.message.insert(message).as_str()
    }

    /// Last path component of `file`, or the empty string.
    pub fn filename(&self) -> &str {
        match &self.file {
            Some(file) => file.rsplit(['/', '\\']).next().unwrap_or(file),
            None => "",
        }
    }

    /// Milliseconds elapsed between process start and this record.
    pub fn relative_created(&self) -> i64 {
        (self.timestamp - *PROCESS_START).num_milliseconds()
    }
}
