use std::fmt::Write;

use super::{Escaper, LimitApplier, delimit_parts, decode_hex, encode_hex, quote_doubling};
use crate::error::Result;

/// PostgreSQL with `standard_conforming_strings` on (the default since 9.1),
///  so backslashes in string literals are ordinary characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Escaper for Postgres {
    fn escape_text(&self, value: &str) -> String {
        quote_doubling(value)
    }

    fn escape_binary(&self, value: &[u8]) -> String {
        format!("'\\x{}'", encode_hex(value))
    }

    fn escape_bool(&self, value: bool) -> String {
        let res = if value { "TRUE" } else { "FALSE" };
        res.to_string()
    }

    fn escape_identifier(&self, value: &str) -> String {
        delimit_parts(value, '"', '"')
    }

    // Accepts both the literal above and bytea output in hex format
    fn unescape_binary(&self, value: &str) -> Option<Vec<u8>> {
        let value = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .unwrap_or(value);
        decode_hex(value.strip_prefix("\\x")?)
    }
}

impl LimitApplier for Postgres {
    fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()> {
        // Writing to a String cannot fail
        if let Some(limit) = limit {
            _ = write!(sql, " LIMIT {limit}");
        }
        if offset > 0 {
            _ = write!(sql, " OFFSET {offset}");
        }
        Ok(())
    }
}
