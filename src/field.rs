//! Registry of the fields a template may reference.
//!
//! Every `%(name)s` placeholder resolves to a [`FieldExtractor`], which pulls
//! one typed [`FieldValue`] out of a [`LogRecord`].

use crate::error::FormatError;
use crate::record::LogRecord;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;

/// Value extracted from a record, tagged with its natural type.
///
/// Text borrows from the record wherever it can.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Str(Cow<'a, str>),
    Int(i64),
    Time(DateTime<Utc>),
}

impl FieldValue<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) => "integer",
            FieldValue::Time(_) => "time",
        }
    }
}

/// The closed set of record fields understood by templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    LevelNo,
    LevelName,
    PathName,
    FileName,
    Module,
    LineNo,
    FuncName,
    Created,
    AscTime,
    Msecs,
    RelativeCreated,
    Thread,
    ThreadName,
    Process,
    Message,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Name,
        Field::LevelNo,
        Field::LevelName,
        Field::PathName,
        Field::FileName,
        Field::Module,
        Field::LineNo,
        Field::FuncName,
        Field::Created,
        Field::AscTime,
        Field::Msecs,
        Field::RelativeCreated,
        Field::Thread,
        Field::ThreadName,
        Field::Process,
        Field::Message,
    ];

    /// Name used for this field inside a template.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::LevelNo => "levelno",
            Field::LevelName => "levelname",
            Field::PathName => "pathname",
            Field::FileName => "filename",
            Field::Module => "module",
            Field::LineNo => "lineno",
            Field::FuncName => "funcName",
            Field::Created => "created",
            Field::AscTime => "asctime",
            Field::Msecs => "msecs",
            Field::RelativeCreated => "relativeCreated",
            Field::Thread => "thread",
            Field::ThreadName => "threadName",
            Field::Process => "process",
            Field::Message => "message",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads one [`Field`] from any record.
///
/// Holds nothing but the field it was resolved for, so a single extractor
/// can be shared between threads and reused for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldExtractor {
    field: Field,
}

impl FieldExtractor {
    pub const fn new(field: Field) -> Self {
        FieldExtractor { field }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// `message` reads the cached derived message; callers run
    /// [`LogRecord::get_message`] first.
    pub fn extract<'a>(&self, record: &'a LogRecord) -> FieldValue<'a> {
        let text = |s: &'a str| FieldValue::Str(Cow::Borrowed(s));
        match self.field {
            Field::Name => text(&record.target),
            Field::LevelNo => FieldValue::Int(record.level.number()),
            Field::LevelName => text(record.level.name()),
            Field::PathName => text(record.file.as_deref().unwrap_or("")),
            Field::FileName => text(record.filename()),
            Field::Module => text(record.module_path.as_deref().unwrap_or("")),
            Field::LineNo => FieldValue::Int(record.line.map(i64::from).unwrap_or(0)),
            Field::FuncName => text(record.function.as_deref().unwrap_or("")),
            Field::Created => FieldValue::Int(record.timestamp.timestamp()),
            Field::AscTime => FieldValue::Time(record.timestamp),
            Field::Msecs => FieldValue::Int(i64::from(record.timestamp.timestamp_subsec_millis())),
            Field::RelativeCreated => FieldValue::Int(record.relative_created()),
            Field::Thread => FieldValue::Int(record.thread_id as i64),
            Field::ThreadName => text(record.thread_name.as_deref().unwrap_or("")),
            Field::Process => FieldValue::Int(i64::from(record.process_id)),
            Field::Message => text(record.message.as_deref().unwrap_or(&record.msg)),
        }
    }
}

/// Look up the extractor for a template field name.
pub fn resolve(name: &str) -> Result<FieldExtractor, FormatError> {
    Field::from_name(name)
        .map(FieldExtractor::new)
        .ok_or_else(|| FormatError::UnknownField(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        LogRecord::new(Level::Warn, "db.pool", "pool {} exhausted")
            .with_args(["primary"])
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap())
            .with_location("src/db/pool.rs", 88)
            .with_module_path("app::db::pool")
            .with_function("acquire")
    }

    #[test]
    fn resolves_every_registered_name() {
        for field in Field::ALL {
            assert_eq!(resolve(field.name()).unwrap().field(), field);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            resolve("hostname"),
            Err(FormatError::UnknownField("hostname".to_string()))
        );
        // Names are case sensitive.
        assert!(resolve("LevelName").is_err());
    }

    #[test]
    fn extracts_typed_values() {
        let mut record = record();
        record.get_message();

        let get = |name: &str| resolve(name).unwrap().extract(&record);
        assert_eq!(get("name"), FieldValue::Str("db.pool".into()));
        assert_eq!(get("levelno"), FieldValue::Int(30));
        assert_eq!(get("levelname"), FieldValue::Str("WARN".into()));
        assert_eq!(get("pathname"), FieldValue::Str("src/db/pool.rs".into()));
        assert_eq!(get("filename"), FieldValue::Str("pool.rs".into()));
        assert_eq!(get("module"), FieldValue::Str("app::db::pool".into()));
        assert_eq!(get("lineno"), FieldValue::Int(88));
        assert_eq!(get("funcName"), FieldValue::Str("acquire".into()));
        assert_eq!(get("created"), FieldValue::Int(1_709_296_245));
        assert_eq!(get("asctime"), FieldValue::Time(record.timestamp));
        assert_eq!(get("msecs"), FieldValue::Int(0));
        assert_eq!(get("process"), FieldValue::Int(i64::from(std::process::id())));
        assert_eq!(get("message"), FieldValue::Str("pool primary exhausted".into()));
    }

    #[test]
    fn missing_optional_fields_are_empty() {
        let record = LogRecord::new(Level::Info, "app", "hi");
        let get = |name: &str| resolve(name).unwrap().extract(&record);
        assert_eq!(get("pathname"), FieldValue::Str("".into()));
        assert_eq!(get("lineno"), FieldValue::Int(0));
        assert_eq!(get("funcName"), FieldValue::Str("".into()));
    }
}
