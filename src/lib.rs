//! Compiled `%(field)s` log templates.
//!
//! A template such as `"%(asctime)s %(levelname)s: %(message)s"` is parsed
//! once into a [`CompiledTemplate`](template::CompiledTemplate) and then
//! rendered against any number of [`LogRecord`](record::LogRecord)s. The
//! [`JsonFormatter`](formatter::JsonFormatter) renders one template per
//! output key and serializes the result as a JSON object.
//!
//! [`layer::FormatLayer`] bridges `tracing` events into formatted lines.

pub mod config;
pub mod date;
pub mod error;
pub mod field;
pub mod formatter;
pub mod init;
pub mod layer;
pub mod noop_sink;
pub mod record;
pub mod sink;
pub mod template;

pub use error::{ConfigError, FormatError, RenderError};
pub use formatter::{Formatter, JsonFormatter, StandardFormatter};
pub use record::{Level, LogRecord};
pub use template::{CompiledTemplate, TemplateCompiler};
