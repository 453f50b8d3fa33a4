use std::{borrow::Cow, collections::VecDeque, sync::LazyLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::{
    config::{Config, Substitutions},
    dialect::Driver,
    error::{Error, FormatError},
    lex::{self, Lexer, Mode, TokenType},
    modifier::Modifier,
    value::{Arg, Value},
};

/// Written in place of anything inside a `%if` branch that is turned off.
const SUPPRESSED: &str = "...";

// Integers written as strings pass through `%i` untouched so that large
//  numbers and exponent forms survive.
static INTEGER_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+(e[0-9]+)?$").expect("integer pattern is valid"));

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?\s*$")
        .expect("numeric pattern is valid")
});

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?")
        .expect("numeric prefix pattern is valid")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];

/// The outcome of a translation. The SQL is always present; when `errors`
///  is not empty it contains `**message**` markers where things went wrong
///  and must not be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub sql: String,
    pub errors: Vec<FormatError>,
}

impl Translation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<String, Error> {
        if self.errors.is_empty() {
            Ok(self.sql)
        } else {
            Err(Error::Translate {
                sql: self.sql,
                errors: self.errors,
            })
        }
    }
}

/// Compiles argument streams into SQL for one driver.
///
/// ```rust
/// # use sql_template::{Arg, Translator, dialect::mysql::MySql};
/// let translator = Translator::new(&MySql);
/// let sql = translator
///     .translate(vec![
///         Arg::sql("SELECT * FROM [users] WHERE [name]=%s AND [age]>%i"),
///         "Jim".into(),
///         30.into(),
///     ])
///     .into_result()
///     .expect("a valid template");
/// assert_eq!(sql, "SELECT * FROM `users` WHERE `name`='Jim' AND `age`>30");
/// ```
pub struct Translator<'d, D: Driver + ?Sized> {
    driver: &'d D,
    config: Config,
}

impl<'d, D: Driver + ?Sized> Translator<'d, D> {
    pub fn new(driver: &'d D) -> Self {
        Self::with_config(driver, Config::default())
    }

    pub fn with_config(driver: &'d D, config: Config) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translates a whole argument stream. Never fails outright: problems are
    ///  reported through [Translation::errors].
    pub fn translate(&self, args: Vec<Arg>) -> Translation {
        trace!(args = args.len(), "translating");
        let cursor = Cursor::new(self.driver, &self.config.substitutions, args);
        let translation = cursor.run();
        if translation.is_ok() {
            debug!(sql = %translation.sql, "translated");
        } else {
            warn!(sql = %translation.sql, errors = ?translation.errors, "SQL translate error");
        }
        translation
    }

    /// Formats a single value (scalar or array) the way it would be formatted
    ///  after `%modifier` in a template, or bare when [modifier] is `None`.
    pub fn format_value(&self, value: &Arg, modifier: Option<Modifier>) -> Translation {
        let mut cursor = Cursor::new(self.driver, &self.config.substitutions, Vec::new());
        let sql = cursor.format_value(value, modifier);
        Translation {
            sql,
            errors: cursor.errors,
        }
    }
}

/// State of a single translation. Arguments are popped off the front as they
///  are consumed, so the cursor can only move forward; expansion pushes the
///  expanded items back onto the front.
struct Cursor<'t, D: Driver + ?Sized> {
    driver: &'t D,
    substitutions: &'t Substitutions,
    args: VecDeque<Arg>,
    /// Number of arguments taken off the stream so far.
    consumed: usize,
    errors: Vec<FormatError>,
    /// Depth of `%if` nesting.
    if_level: usize,
    /// The depth whose `%if`/`%else` opened the current comment, 0 if none.
    if_level_start: usize,
    comment: bool,
    limit: Option<u64>,
    offset: u64,
}

impl<'t, D: Driver + ?Sized> Cursor<'t, D> {
    fn new(driver: &'t D, substitutions: &'t Substitutions, args: Vec<Arg>) -> Self {
        Self {
            driver,
            substitutions,
            args: args.into(),
            consumed: 0,
            errors: Vec::new(),
            if_level: 0,
            if_level_start: 0,
            comment: false,
            limit: None,
            offset: 0,
        }
    }

    fn next_arg(&mut self) -> Option<Arg> {
        let arg = self.args.pop_front()?;
        self.consumed += 1;
        Some(arg)
    }

    /// Records [error] and returns the marker that takes the place of the
    ///  offending value.
    fn fail(&mut self, error: FormatError) -> String {
        trace!(%error, "format error");
        let marker = format!("**{error}**");
        self.errors.push(error);
        marker
    }

    fn run(mut self) -> Translation {
        let mut pieces: Vec<String> = Vec::with_capacity(self.args.len());
        let mut inserting = false;
        let mut seen_pairs = false;
        let mut last_pairs = None;

        while let Some(arg) = self.next_arg() {
            if self.consumed == 1 {
                inserting = is_insert_command(&arg);
            }

            match arg {
                Arg::Sql(fragment) => {
                    let piece = self.scan(&fragment, Mode::Template);
                    pieces.push(piece);
                }
                _ if self.comment => pieces.push(SUPPRESSED.to_string()),
                Arg::Pairs(pairs) => {
                    let modifier = if !seen_pairs {
                        seen_pairs = true;
                        if inserting {
                            Modifier::Values
                        } else {
                            Modifier::Set
                        }
                    } else {
                        // Consecutive rows of a multi-row INSERT
                        if last_pairs == Some(self.consumed - 1) {
                            pieces.push(",".to_string());
                        }
                        if inserting {
                            Modifier::List
                        } else {
                            Modifier::Set
                        }
                    };
                    let piece = self.format_pairs(&pairs, Some(modifier));
                    pieces.push(piece);
                    last_pairs = Some(self.consumed);
                }
                // A list passed as the whole argument stream
                Arg::List(items) if self.consumed == 1 => {
                    trace!(items = items.len(), "flattening leading list");
                    self.consumed = 0;
                    self.splice(items);
                }
                other => {
                    let piece = self.format_value(&other, None);
                    pieces.push(piece);
                }
            }
        }

        if self.comment {
            pieces.push("*/".to_string());
        }
        if self.if_level > 0 {
            warn!(open = self.if_level, "template ends inside %if");
        }

        let mut sql = join_pieces(&pieces);

        if self.errors.is_empty() && (self.limit.is_some() || self.offset > 0) {
            trace!(limit = ?self.limit, offset = self.offset, "applying limit");
            if let Err(e) = self.driver.apply_limit(&mut sql, self.limit, self.offset) {
                let marker = self.fail(FormatError::Limit(e.to_string()));
                sql.push(' ');
                sql.push_str(&marker);
            }
        }

        Translation {
            sql,
            errors: self.errors,
        }
    }

    fn splice(&mut self, items: Vec<Arg>) {
        for item in items.into_iter().rev() {
            self.args.push_front(item);
        }
    }

    /// Rewrites identifiers and string literals of [source] and, in template
    ///  mode, replaces each `%modifier` with the next argument.
    fn scan(&mut self, source: &str, mode: Mode) -> String {
        if !lex::needs_scan(source, mode) {
            return source.to_string();
        }

        let mut out = String::with_capacity(source.len() + 16);
        let mut lexer = Lexer::with_mode(source, mode);
        while let Some(token) = lexer.next_token() {
            match token.ty {
                TokenType::Text => out.push_str(lexer.source_of(&token)),
                TokenType::Modifier => {
                    let replacement = self.modifier(lexer.contents(&token));
                    out.push_str(&replacement);
                }
                _ if self.comment => out.push_str(SUPPRESSED),
                TokenType::BacktickIdentifier | TokenType::BracketIdentifier => {
                    let ident = self.delimit(lexer.contents(&token));
                    out.push_str(&ident);
                }
                TokenType::StringSingleQuote | TokenType::StringDoubleQuote => {
                    let text = self.driver.escape_text(&lexer.unquoted(&token));
                    out.push_str(&text);
                }
                TokenType::LoneQuote => {
                    let marker = self.fail(FormatError::LoneQuote);
                    out.push_str(&marker);
                }
            }
        }
        out
    }

    fn modifier(&mut self, name: &str) -> String {
        let modifier = Modifier::lookup(name);
        match modifier {
            Some(Modifier::Else) => return self.else_directive(),
            Some(Modifier::End) => return self.end_directive(),
            _ => {}
        }

        let Some(arg) = self.next_arg() else {
            return self.fail(FormatError::ExtraModifier(name.to_string()));
        };
        let Some(modifier) = modifier else {
            if self.comment {
                return SUPPRESSED.to_string();
            }
            return self.fail(FormatError::UnknownModifier(name.to_string()));
        };

        // %if and %ex change what the rest of the stream means, so they act
        //  even inside a disabled branch
        match modifier {
            Modifier::If => self.if_directive(&arg),
            Modifier::Expand => match arg {
                Arg::List(items) => {
                    self.splice(items);
                    String::new()
                }
                _ if self.comment => SUPPRESSED.to_string(),
                other => self.fail(FormatError::UnexpectedType {
                    modifier,
                    found: other.type_name(),
                }),
            },
            _ if self.comment => SUPPRESSED.to_string(),
            Modifier::Limit | Modifier::Offset => self.record_limit(modifier, &arg),
            _ => self.format_value(&arg, Some(modifier)),
        }
    }

    fn if_directive(&mut self, condition: &Arg) -> String {
        self.if_level += 1;
        if !self.comment && !condition.is_truthy() {
            self.if_level_start = self.if_level;
            self.comment = true;
            return "/*".to_string();
        }
        String::new()
    }

    fn else_directive(&mut self) -> String {
        if self.if_level == 0 {
            return self.fail(FormatError::UnmatchedDirective(Modifier::Else));
        }
        if self.if_level_start == self.if_level {
            // the %if branch was off, so this one is on
            self.if_level_start = 0;
            self.comment = false;
            "*/".to_string()
        } else if !self.comment {
            self.if_level_start = self.if_level;
            self.comment = true;
            "/*".to_string()
        } else {
            // an outer %if already turned everything off
            String::new()
        }
    }

    fn end_directive(&mut self) -> String {
        if self.if_level == 0 {
            return self.fail(FormatError::UnmatchedDirective(Modifier::End));
        }
        self.if_level -= 1;
        if self.if_level_start == self.if_level + 1 {
            self.if_level_start = 0;
            self.comment = false;
            "*/".to_string()
        } else {
            String::new()
        }
    }

    /// Null leaves the value unset. Negative limits mean "no limit", negative
    ///  offsets are ignored.
    fn record_limit(&mut self, modifier: Modifier, arg: &Arg) -> String {
        let value = match arg {
            Arg::Value(Value::Null) => return String::new(),
            Arg::Value(Value::Int(i)) => *i,
            Arg::Value(Value::Float(f)) if f.is_finite() => f.trunc() as i64,
            Arg::Value(Value::Bool(b)) => i64::from(*b),
            Arg::Value(Value::Str(s)) | Arg::Sql(s) => numeric_prefix(s) as i64,
            other => {
                return self.fail(FormatError::InvalidLimit {
                    modifier,
                    found: other.type_name(),
                });
            }
        };
        if modifier == Modifier::Limit {
            self.limit = u64::try_from(value).ok();
        } else {
            self.offset = u64::try_from(value).unwrap_or(0);
        }
        String::new()
    }

    fn delimit(&self, identifier: &str) -> String {
        let identifier = self.substitutions.apply(identifier);
        self.driver.escape_identifier(&identifier)
    }

    fn format_value(&mut self, value: &Arg, modifier: Option<Modifier>) -> String {
        if let Some(m) = modifier
            && m.is_directive()
        {
            return self.fail(FormatError::UnknownModifier(m.name().to_string()));
        }

        match value {
            Arg::Pairs(pairs) => self.format_pairs(pairs, modifier),
            Arg::List(items) => self.format_list(items, modifier),
            Arg::Raw(sql) => sql.clone(),
            Arg::Sql(text) => self.format_scalar(&Value::Str(text.clone()), modifier),
            Arg::Value(v) => self.format_scalar(v, modifier),
        }
    }

    /// Formats a value whose modifier came from a `column%mod` key.
    fn format_keyed(&mut self, value: &Arg, modifier: Option<&str>) -> String {
        match modifier {
            None => self.format_value(value, None),
            Some(name) => match Modifier::lookup(name) {
                Some(m) => self.format_value(value, Some(m)),
                None => self.fail(FormatError::UnknownModifier(name.to_string())),
            },
        }
    }

    fn format_pairs(&mut self, pairs: &[(String, Arg)], modifier: Option<Modifier>) -> String {
        match modifier {
            Some(Modifier::Set) => self.format_assignments(pairs, ", "),
            Some(Modifier::And) => self.format_assignments(pairs, " AND "),
            Some(Modifier::Or) => self.format_assignments(pairs, " OR "),
            Some(Modifier::List) => {
                let values: Vec<String> = pairs
                    .iter()
                    .map(|(key, v)| self.format_keyed(v, split_key(key).1))
                    .collect();
                format!("({})", values.join(", "))
            }
            Some(Modifier::Values) => {
                let mut columns = Vec::with_capacity(pairs.len());
                let mut values = Vec::with_capacity(pairs.len());
                for (key, v) in pairs {
                    let (column, m) = split_key(key);
                    columns.push(self.delimit(column));
                    values.push(self.format_keyed(v, m));
                }
                format!("({}) VALUES ({})", columns.join(", "), values.join(", "))
            }
            None => {
                let values: Vec<String> = pairs
                    .iter()
                    .map(|(key, v)| self.format_keyed(v, split_key(key).1))
                    .collect();
                values.join(", ")
            }
            Some(m) => self.fail(FormatError::UnexpectedType {
                modifier: m,
                found: "pairs",
            }),
        }
    }

    fn format_assignments(&mut self, pairs: &[(String, Arg)], separator: &str) -> String {
        let assignments: Vec<String> = pairs
            .iter()
            .map(|(key, v)| {
                let (column, m) = split_key(key);
                let column = self.delimit(column);
                format!("{column}={}", self.format_keyed(v, m))
            })
            .collect();
        assignments.join(separator)
    }

    fn format_list(&mut self, items: &[Arg], modifier: Option<Modifier>) -> String {
        match modifier {
            Some(m @ (Modifier::And | Modifier::Or)) => {
                let separator = if m == Modifier::And { " AND " } else { " OR " };
                let conditions: Vec<String> = items
                    .iter()
                    .map(|item| self.format_value(item, Some(Modifier::Sql)))
                    .collect();
                conditions.join(separator)
            }
            Some(Modifier::List) => {
                let values: Vec<String> = items
                    .iter()
                    .map(|item| self.format_value(item, None))
                    .collect();
                format!("({})", values.join(", "))
            }
            Some(m @ (Modifier::Set | Modifier::Values)) => {
                self.fail(FormatError::UnexpectedType {
                    modifier: m,
                    found: "list",
                })
            }
            // IN (...) lists: every item under the same modifier
            m => {
                let values: Vec<String> = items
                    .iter()
                    .map(|item| self.format_value(item, m))
                    .collect();
                values.join(", ")
            }
        }
    }

    fn format_scalar(&mut self, value: &Value, modifier: Option<Modifier>) -> String {
        let Some(modifier) = modifier else {
            return match value {
                Value::Null => "NULL".to_string(),
                Value::Bool(b) => self.driver.escape_bool(*b),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => self.format_float(*f),
                Value::Str(s) => self.driver.escape_text(s),
                Value::Bytes(b) => self.driver.escape_binary(b),
                Value::Date(d) => self.driver.escape_date(*d),
                Value::DateTime(dt) => self.driver.escape_datetime(*dt),
            };
        };

        if *value == Value::Null {
            return "NULL".to_string();
        }

        let unexpected = |value: &Value| FormatError::UnexpectedType {
            modifier,
            found: value.type_name(),
        };

        match modifier {
            Modifier::Str => match text_of(value) {
                Some(s) => self.driver.escape_text(&s),
                None => self.fail(unexpected(value)),
            },
            Modifier::StrOrNull => match text_of(value) {
                Some(s) if s.is_empty() => "NULL".to_string(),
                Some(s) => self.driver.escape_text(&s),
                None => self.fail(unexpected(value)),
            },
            Modifier::Binary => match value {
                Value::Bytes(b) => self.driver.escape_binary(b),
                Value::Str(s) => self.driver.escape_binary(s.as_bytes()),
                _ => self.fail(unexpected(value)),
            },
            Modifier::Bool => self.driver.escape_bool(value.is_truthy()),
            Modifier::Int | Modifier::Uint => match value {
                Value::Str(s) if INTEGER_LIKE.is_match(s) => s.clone(),
                Value::Str(s) => (numeric_prefix(s) as i64).to_string(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) if f.is_finite() => (f.trunc() as i64).to_string(),
                Value::Float(f) => self.fail(FormatError::NonFinite(*f)),
                Value::Bool(b) => i64::from(*b).to_string(),
                _ => self.fail(unexpected(value)),
            },
            Modifier::Float => match value {
                // Something like -9E-005 is valid SQL, hex is not
                Value::Str(s) if NUMERIC.is_match(s) && !s.contains('x') => s.clone(),
                Value::Str(s) => self.format_float(numeric_prefix(s)),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => self.format_float(*f),
                Value::Bool(b) => i64::from(*b).to_string(),
                _ => self.fail(unexpected(value)),
            },
            Modifier::Date | Modifier::DateTime => self.format_temporal(modifier, value),
            Modifier::Identifier => match text_of(value) {
                Some(s) => self.delimit(&s),
                None => self.fail(unexpected(value)),
            },
            Modifier::Sql => match text_of(value) {
                Some(s) => self.scan(&s, Mode::RawSql),
                None => self.fail(unexpected(value)),
            },
            m if m.is_clause() => self.fail(unexpected(value)),
            _ => self.fail(FormatError::UnknownModifier(modifier.name().to_string())),
        }
    }

    fn format_float(&mut self, f: f64) -> String {
        if f.is_finite() {
            float_text(f)
        } else {
            self.fail(FormatError::NonFinite(f))
        }
    }

    fn format_temporal(&mut self, modifier: Modifier, value: &Value) -> String {
        let datetime = match value {
            Value::Date(d) => d.and_time(NaiveTime::MIN),
            Value::DateTime(dt) => *dt,
            Value::Str(s) => match parse_datetime(s) {
                Some(dt) => dt,
                None => return self.fail(FormatError::InvalidDate(s.clone())),
            },
            Value::Int(ts) => match from_timestamp(*ts) {
                Some(dt) => dt,
                None => return self.fail(FormatError::InvalidDate(ts.to_string())),
            },
            Value::Float(f) if f.is_finite() => match from_timestamp(f.trunc() as i64) {
                Some(dt) => dt,
                None => return self.fail(FormatError::InvalidDate(f.to_string())),
            },
            _ => {
                return self.fail(FormatError::UnexpectedType {
                    modifier,
                    found: value.type_name(),
                });
            }
        };
        if modifier == Modifier::Date {
            self.driver.escape_date(datetime.date())
        } else {
            self.driver.escape_datetime(datetime)
        }
    }
}

/// `INSERT` and `REPLACE` commands take their first associative array as a
///  VALUES clause; anything else takes it as SET.
fn is_insert_command(first: &Arg) -> bool {
    let Arg::Sql(command) = first else {
        return false;
    };
    let keyword: String = command.trim_start().chars().take(6).collect();
    keyword.eq_ignore_ascii_case("INSERT") || keyword.eq_ignore_ascii_case("REPLAC")
}

/// `"price%f"` => `("price", Some("f"))`
fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once('%') {
        Some((column, modifier)) => (column, Some(modifier)),
        None => (key, None),
    }
}

/// The textual form of a scalar, for modifiers that work on text. Dates have
///  none: they must be formatted with `%d` or `%t`.
fn text_of(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => Some(Cow::Borrowed("")),
        Value::Str(s) => Some(Cow::Borrowed(s)),
        Value::Int(i) => Some(Cow::Owned(i.to_string())),
        Value::Float(f) => Some(Cow::Owned(float_text(*f))),
        Value::Bool(true) => Some(Cow::Borrowed("1")),
        Value::Bool(false) => Some(Cow::Borrowed("")),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b)),
        Value::Date(_) | Value::DateTime(_) => None,
    }
}

/// Very large and very small magnitudes keep the exponent form:
///  `1e25`, `1.5e-7`.
fn float_text(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        format!("{f:e}")
    } else {
        f.to_string()
    }
}

/// The number a string starts with, or 0: `"12abc"` => 12, `"abc"` => 0.
fn numeric_prefix(s: &str) -> f64 {
    NUMERIC_PREFIX
        .find(s)
        .and_then(|m| m.as_str().trim().parse().ok())
        .unwrap_or(0.0)
}

fn from_timestamp(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.naive_utc())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Joins the translated pieces with single spaces, leaving out the space
///  where one side already has whitespace or where it would split
///  `col=` from its value, `(` from what follows or a value from `)`/`,`.
fn join_pieces(pieces: &[String]) -> String {
    let mut sql = String::with_capacity(pieces.iter().map(|p| p.len() + 1).sum());
    for piece in pieces.iter().filter(|p| !p.is_empty()) {
        if let (Some(l), Some(r)) = (sql.chars().last(), piece.chars().next())
            && !(l.is_whitespace() || r.is_whitespace() || matches!(l, '(' | '=') || matches!(r, ')' | ','))
        {
            sql.push(' ');
        }
        sql.push_str(piece);
    }
    sql
}
