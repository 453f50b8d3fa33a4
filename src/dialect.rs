use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Turns values into SQL literals for one particular database. The translator
///  decides *which* of these to call and *when*; the dialect decides how the
///  result is spelled.
///
/// When implementing a new dialect, a reasonable strategy is to delegate to
///  an existing one and only override what differs:
///
/// ```rust
/// # use sql_template::{Arg, Translator, error::Result, dialect::{Escaper, LimitApplier, postgres::Postgres}};
/// /// Postgres, but with booleans stored as integers.
/// struct LegacyPostgres;
///
/// impl Escaper for LegacyPostgres {
///     fn escape_text(&self, value: &str) -> String {
///         Postgres.escape_text(value)
///     }
///     fn escape_binary(&self, value: &[u8]) -> String {
///         Postgres.escape_binary(value)
///     }
///     fn escape_bool(&self, value: bool) -> String {
///         if value { "1".into() } else { "0".into() }
///     }
///     fn escape_identifier(&self, value: &str) -> String {
///         Postgres.escape_identifier(value)
///     }
///     fn unescape_binary(&self, value: &str) -> Option<Vec<u8>> {
///         Postgres.unescape_binary(value)
///     }
/// }
///
/// impl LimitApplier for LegacyPostgres {
///     fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()> {
///         Postgres.apply_limit(sql, limit, offset)
///     }
/// }
///
/// let translator = Translator::new(&LegacyPostgres);
/// let translation = translator.translate(vec![Arg::sql("SELECT * FROM [t] WHERE active=%b"), true.into()]);
/// assert_eq!(translation.sql, r#"SELECT * FROM "t" WHERE active=1"#);
/// ```
pub trait Escaper {
    /// A quoted string literal.
    fn escape_text(&self, value: &str) -> String;

    fn escape_binary(&self, value: &[u8]) -> String;

    fn escape_bool(&self, value: bool) -> String;

    fn escape_date(&self, value: NaiveDate) -> String {
        format!("'{}'", value.format(DATE_FORMAT))
    }

    fn escape_datetime(&self, value: NaiveDateTime) -> String {
        format!("'{}'", value.format(DATETIME_FORMAT))
    }

    /// A quoted identifier. Dots separate qualifiers (`schema.table.column`)
    ///  and a bare `*` is left alone.
    fn escape_identifier(&self, value: &str) -> String;

    /// Inverse of [escape_binary], also accepting the bare form the database
    ///  returns for binary columns.
    fn unescape_binary(&self, value: &str) -> Option<Vec<u8>>;
}

/// Applies LIMIT/OFFSET to an already assembled query.
pub trait LimitApplier {
    /// `limit` of `None` means no limit; an `offset` of 0 means no offset.
    fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()>;
}

/// Everything the translator needs from the driver layer.
pub trait Driver: Escaper + LimitApplier {}

impl<T: Escaper + LimitApplier + ?Sized> Driver for T {}

/// Looks up one of the bundled dialects by name.
pub fn by_name(name: &str) -> Option<&'static dyn Driver> {
    match name.to_ascii_lowercase().as_str() {
        "mysql" | "mariadb" => Some(&mysql::MySql),
        "postgres" | "postgresql" | "pgsql" => Some(&postgres::Postgres),
        "sqlite" | "sqlite3" => Some(&sqlite::Sqlite),
        "mssql" | "sqlserver" => Some(&mssql::Mssql),
        _ => None,
    }
}

/// Quotes each dot-separated part of [value] with [open] and [close],
///  doubling any [close] inside a part.
pub(crate) fn delimit_parts(value: &str, open: char, close: char) -> String {
    let mut res = String::with_capacity(value.len() + 2);
    for (i, part) in value.split('.').enumerate() {
        if i > 0 {
            res.push('.');
        }
        if part == "*" {
            res.push('*');
            continue;
        }
        res.push(open);
        for c in part.chars() {
            if c == close {
                res.push(close);
            }
            res.push(c);
        }
        res.push(close);
    }
    res
}

/// Wraps [value] in single quotes, doubling the quotes inside. This is the
///  standard SQL spelling.
pub(crate) fn quote_doubling(value: &str) -> String {
    let mut res = String::with_capacity(value.len() + 2);
    res.push('\'');
    for c in value.chars() {
        if c == '\'' {
            res.push('\'');
        }
        res.push(c);
    }
    res.push('\'');
    res
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    let mut res = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(res, "{b:02x}");
    }
    res
}

pub(crate) fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok()))
        .collect()
}
