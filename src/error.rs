/// Error returned when a template or date pattern cannot be compiled.
///
/// All of these surface while a formatter is being constructed, so a bad
/// configuration fails at startup instead of on some later log call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown field name `{0}` in log template")]
    UnknownField(String),

    #[error("malformed placeholder `{0}` in log template")]
    MalformedPlaceholder(String),

    #[error("unsupported conversion `%{conversion}` for field `{field}` (expected `s` or `d`)")]
    UnsupportedConversion { field: String, conversion: char },

    #[error("invalid date format `{0}`")]
    InvalidDateFormat(String),
}

/// Error produced while substituting values into a compiled template.
///
/// Only reachable if a compiled template pairs a verb with a value of the
/// wrong type; [`CompiledTemplate::render`] turns it into inline text.
///
/// [`CompiledTemplate::render`]: crate::template::CompiledTemplate::render
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("%{verb} given {kind} value for `{field}`")]
    VerbMismatch {
        verb: char,
        kind: &'static str,
        field: &'static str,
    },

    #[error("date format `{pattern}` failed for `{field}`")]
    DateFormat { pattern: String, field: &'static str },

    #[error("template expects {expected} values, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
}

/// Error type returned when loading a formatter configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid formatter configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Error type returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set global subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}
