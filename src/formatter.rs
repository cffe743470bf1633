use crate::error::FormatError;
use crate::record::LogRecord;
use crate::template::{CompiledTemplate, TemplateCompiler};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Turns a [`LogRecord`] into one line of output.
///
/// Implementations are built once from configuration and then called from
/// any thread; they must never panic or fail on bad record data.
pub trait Formatter: Send + Sync {
    /// Render `record`. Formatting faults show up inside the returned
    /// string as `[error:...]` markers.
    fn format(&self, record: &mut LogRecord) -> String;
}

/// Formatter backed by a single template, producing plain text.
#[derive(Debug, Clone)]
pub struct StandardFormatter {
    template: CompiledTemplate,
}

impl StandardFormatter {
    pub fn new(template: &str, date_format: &str) -> Result<Self, FormatError> {
        let template = TemplateCompiler::new(date_format).compile(template)?;
        Ok(StandardFormatter { template })
    }

    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }
}

impl Formatter for StandardFormatter {
    fn format(&self, record: &mut LogRecord) -> String {
        self.template.render(record)
    }
}

/// Formatter rendering one template per output key into a JSON object.
///
/// ```
/// use tracing_log_format::formatter::{Formatter, JsonFormatter};
/// use tracing_log_format::record::{Level, LogRecord};
///
/// let formatter = JsonFormatter::new(
///     [("lvl", "%(levelname)s"), ("msg", "%(message)s")],
///     "%Y-%m-%d",
///     false,
/// )
/// .unwrap();
///
/// let mut record = LogRecord::new(Level::Error, "app", "boom");
/// assert_eq!(formatter.format(&mut record), r#"{"lvl":"ERROR","msg":"boom"}"#);
/// ```
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    fields: HashMap<String, CompiledTemplate>,
    pretty: bool,
}

impl JsonFormatter {
    /// Compile every template of `fields` against `date_format`.
    ///
    /// Templates share a single date formatter. The first template that
    /// fails to compile aborts construction.
    pub fn new<I, K, V>(fields: I, date_format: &str, pretty: bool) -> Result<Self, FormatError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut compiler = TemplateCompiler::new(date_format);
        let fields = fields
            .into_iter()
            .map(|(key, template)| Ok((key.into(), compiler.compile(template.as_ref())?)))
            .collect::<Result<HashMap<String, CompiledTemplate>, FormatError>>()?;
        Ok(JsonFormatter { fields, pretty })
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn field(&self, key: &str) -> Option<&CompiledTemplate> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Render every configured key for `record`, without serializing.
    pub fn render_fields(&self, record: &mut LogRecord) -> BTreeMap<String, String> {
        record.get_message();
        self.fields
            .iter()
            .map(|(key, template)| (key.clone(), template.render(record)))
            .collect()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &mut LogRecord) -> String {
        let fields = self.render_fields(record);
        encode(&fields, self.pretty)
    }
}

/// Serialize `value` as JSON, two-space indented when `pretty`.
///
/// A serialization failure is returned as `[error:...]` text.
pub(crate) fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|e| format!("[error:{}]", e))
}
