use crate::error::FormatError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};

/// Pattern used for `%(asctime)s` when none is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// strftime-style formatter for `%(asctime)s`, parsed and validated once
/// up front.
///
/// Immutable after construction; one instance is shared by every template
/// of a formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatter {
    pattern: String,
    items: Vec<Item<'static>>,
}

impl DateFormatter {
    /// Parse `pattern` with chrono's strftime syntax and format a sample
    /// time with it.
    ///
    /// **Returns**
    /// - `Err(FormatError::InvalidDateFormat)` for unknown specifiers and
    ///   for parse-only specifiers such as `%#z`, which chrono would
    ///   otherwise only reject while formatting.
    pub fn new(pattern: impl Into<String>) -> Result<Self, FormatError> {
        let pattern = pattern.into();
        let items = match StrftimeItems::new(&pattern).parse_to_owned() {
            Ok(items) => items,
            Err(_) => return Err(FormatError::InvalidDateFormat(pattern)),
        };
        let formatter = DateFormatter { pattern, items };
        if formatter.format(&DateTime::<Utc>::UNIX_EPOCH).is_err() {
            return Err(FormatError::InvalidDateFormat(formatter.pattern));
        }
        Ok(formatter)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, t: &DateTime<Utc>) -> Result<String, fmt::Error> {
        let mut out = String::with_capacity(self.pattern.len() + 16);
        write!(out, "{}", t.format_with_items(self.items.iter()))?;
        Ok(out)
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        DateFormatter::new(DEFAULT_DATE_FORMAT)
            .expect("default date format is a compile-time constant and must be valid")
    }
}
