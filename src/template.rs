//! Compilation of `%(field)s` templates and rendering against records.
//!
//! A template is scanned once by [`TemplateCompiler::compile`]. The result,
//! a [`CompiledTemplate`], holds the literal runs, one argument slot per
//! placeholder and the matching [`FieldExtractor`]s, so rendering a record
//! is a single pass with no re-parsing.

use crate::date::{DateFormatter, DEFAULT_DATE_FORMAT};
use crate::error::{FormatError, RenderError};
use crate::field::{self, Field, FieldExtractor, FieldValue};
use crate::record::LogRecord;
use regex::Regex;
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::sync::{Arc, LazyLock};

/// Matches `%%` or a `%(name)x` placeholder. The closing paren and the
/// conversion letter are optional here so that broken placeholders are
/// reported instead of silently passed through.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%%|%\(([^)]*)(\))?([A-Za-z])?")
        .expect("placeholder regex is a compile-time constant and must be valid")
});

static FIELD_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[_\w]+$").expect("field name regex is a compile-time constant and must be valid")
});

/// Conversion applied to one argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `%s`: any value, rendered as text.
    Str,
    /// `%d`: integer values only.
    Int,
}

impl Verb {
    pub fn as_char(&self) -> char {
        match self {
            Verb::Str => 's',
            Verb::Int => 'd',
        }
    }

    fn for_field(field: Field) -> Verb {
        match field {
            Field::LevelNo => Verb::Int,
            _ => Verb::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Slot(Verb),
}

/// A parsed template, ready to render any number of records.
///
/// Immutable once built; share it freely between threads.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    source: String,
    pieces: Vec<Piece>,
    extractors: Vec<FieldExtractor>,
    needs_time: bool,
    date_formatter: Option<Arc<DateFormatter>>,
}

impl CompiledTemplate {
    /// The template text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Extractors in placeholder order.
    pub fn extractors(&self) -> &[FieldExtractor] {
        &self.extractors
    }

    pub fn needs_time_formatting(&self) -> bool {
        self.needs_time
    }

    pub fn date_formatter(&self) -> Option<&Arc<DateFormatter>> {
        self.date_formatter.as_ref()
    }

    /// printf-style view of the compiled form: literal percent signs as
    /// `%%`, each placeholder as its normalized `%s` or `%d`.
    ///
    /// A template without placeholders has nothing to substitute, so its
    /// source is returned as written.
    pub fn substitution(&self) -> String {
        if self.extractors.is_empty() {
            return self.source.clone();
        }
        let mut out = String::with_capacity(self.source.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(&text.replace('%', "%%")),
                Piece::Slot(verb) => {
                    out.push('%');
                    out.push(verb.as_char());
                }
            }
        }
        out
    }

    /// Render `record`, replacing the whole output with `[error:...]` if
    /// substitution fails.
    pub fn render(&self, record: &mut LogRecord) -> String {
        self.try_render(record)
            .unwrap_or_else(|e| format!("[error:{}]", e))
    }

    /// Render `record`.
    ///
    /// Computes the record's message first, extracts every field in order,
    /// formats `asctime` with the shared date formatter and substitutes the
    /// values into the template.
    pub fn try_render(&self, record: &mut LogRecord) -> Result<String, RenderError> {
        record.get_message();
        let record = &*record;

        let values = self
            .extractors
            .iter()
            .map(|extractor| {
                let value = extractor.extract(record);
                if self.needs_time && extractor.field() == Field::AscTime {
                    if let (FieldValue::Time(t), Some(dates)) = (&value, &self.date_formatter) {
                        let formatted = dates.format(t).map_err(|_| RenderError::DateFormat {
                            pattern: dates.pattern().to_string(),
                            field: extractor.field().name(),
                        })?;
                        return Ok(FieldValue::Str(Cow::Owned(formatted)));
                    }
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        self.substitute(&values)
    }

    pub(crate) fn substitute(&self, values: &[FieldValue<'_>]) -> Result<String, RenderError> {
        if values.len() != self.extractors.len() {
            return Err(RenderError::ArgumentCount {
                expected: self.extractors.len(),
                actual: values.len(),
            });
        }

        let mut out = String::with_capacity(self.source.len() + 16 * values.len());
        let mut slots = values.iter().zip(&self.extractors);
        for piece in &self.pieces {
            let (verb, (value, extractor)) = match piece {
                Piece::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Piece::Slot(verb) => match slots.next() {
                    Some(slot) => (verb, slot),
                    None => {
                        return Err(RenderError::ArgumentCount {
                            expected: self.extractors.len() + 1,
                            actual: values.len(),
                        })
                    }
                },
            };

            match (verb, value) {
                (_, FieldValue::Int(n)) => {
                    let _ = write!(out, "{}", n);
                }
                (Verb::Str, FieldValue::Str(s)) => out.push_str(s),
                (Verb::Str, FieldValue::Time(t)) => out.push_str(&t.to_rfc3339()),
                (Verb::Int, other) => {
                    return Err(RenderError::VerbMismatch {
                        verb: verb.as_char(),
                        kind: other.kind(),
                        field: extractor.field().name(),
                    })
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compiles templates against one date pattern.
///
/// The date formatter is built the first time a template uses
/// `%(asctime)s` and then shared by every later template from the same
/// compiler.
#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    date_format: String,
    date_formatter: Option<Arc<DateFormatter>>,
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        TemplateCompiler::new(DEFAULT_DATE_FORMAT)
    }
}

impl TemplateCompiler {
    pub fn new(date_format: impl Into<String>) -> Self {
        TemplateCompiler {
            date_format: date_format.into(),
            date_formatter: None,
        }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// The shared date formatter, if any template needed one so far.
    pub fn date_formatter(&self) -> Option<&Arc<DateFormatter>> {
        self.date_formatter.as_ref()
    }

    /// Parse `template` into a [`CompiledTemplate`].
    ///
    /// **Errors**
    /// - [`FormatError::MalformedPlaceholder`] for an unclosed placeholder,
    ///   a name outside `[_\w]+` or a missing conversion letter.
    /// - [`FormatError::UnsupportedConversion`] for letters other than
    ///   `s` and `d`.
    /// - [`FormatError::UnknownField`] for names not in the registry.
    /// - [`FormatError::InvalidDateFormat`] if `%(asctime)s` is used and the
    ///   date pattern is invalid.
    pub fn compile(&mut self, template: &str) -> Result<CompiledTemplate, FormatError> {
        let mut pieces = Vec::new();
        let mut extractors = Vec::new();
        let mut needs_time = false;
        let mut literal = String::new();
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            literal.push_str(&template[last..whole.start()]);
            last = whole.end();

            if whole.as_str() == "%%" {
                literal.push('%');
                continue;
            }

            let malformed = || FormatError::MalformedPlaceholder(whole.as_str().to_string());
            let name = caps.get(1).map_or("", |m| m.as_str());
            if caps.get(2).is_none() || !FIELD_NAME_RE.is_match(name) {
                return Err(malformed());
            }
            let conversion = caps
                .get(3)
                .and_then(|m| m.as_str().chars().next())
                .ok_or_else(malformed)?;
            if conversion != 's' && conversion != 'd' {
                return Err(FormatError::UnsupportedConversion {
                    field: name.to_string(),
                    conversion,
                });
            }

            let extractor = field::resolve(name)?;
            if extractor.field() == Field::AscTime {
                needs_time = true;
                if self.date_formatter.is_none() {
                    let dates = DateFormatter::new(self.date_format.clone())?;
                    self.date_formatter = Some(Arc::new(dates));
                }
            }

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Slot(Verb::for_field(extractor.field())));
            extractors.push(extractor);
        }

        literal.push_str(&template[last..]);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        tracing::debug!(
            template,
            placeholders = extractors.len(),
            needs_time,
            "compiled log template"
        );

        Ok(CompiledTemplate {
            source: template.to_string(),
            pieces,
            extractors,
            needs_time,
            date_formatter: if needs_time {
                self.date_formatter.clone()
            } else {
                None
            },
        })
    }
}

/// Compile a single template with its own date formatter.
pub fn compile(template: &str, date_format: &str) -> Result<CompiledTemplate, FormatError> {
    TemplateCompiler::new(date_format).compile(template)
}
