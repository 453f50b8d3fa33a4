use thiserror::Error;

use crate::modifier::Modifier;

/// A problem found while translating a template. Translation never stops at
///  one of these: the message is embedded in the SQL as `**message**` and
///  collected in [Translation::errors](crate::Translation::errors).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("Unknown or invalid modifier %{0}")]
    UnknownModifier(String),

    #[error("Unexpected type {found} for %{modifier}")]
    UnexpectedType {
        modifier: Modifier,
        found: &'static str,
    },

    /// A modifier with nothing left in the argument stream to consume.
    #[error("Extra modifier %{0}")]
    ExtraModifier(String),

    #[error("Alone quote")]
    LoneQuote,

    /// `%else` or `%end` without an open `%if`.
    #[error("Unexpected %{0}")]
    UnmatchedDirective(Modifier),

    #[error("Invalid date {0:?}")]
    InvalidDate(String),

    #[error("Invalid %{modifier} value of type {found}")]
    InvalidLimit {
        modifier: Modifier,
        found: &'static str,
    },

    #[error("Non-finite number {0}")]
    NonFinite(f64),

    #[error("Cannot apply limit: {0}")]
    Limit(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The partially translated SQL is kept for diagnostics. It must not be
    ///  executed.
    #[error("SQL translate error ({} problems) in `{sql}`", .errors.len())]
    Translate {
        sql: String,
        errors: Vec<FormatError>,
    },

    /// The dialect cannot express what was asked of it.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;
