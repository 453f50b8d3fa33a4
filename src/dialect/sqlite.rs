use std::fmt::Write;

use super::{Escaper, LimitApplier, delimit_parts, decode_hex, encode_hex, quote_doubling};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Escaper for Sqlite {
    fn escape_text(&self, value: &str) -> String {
        quote_doubling(value)
    }

    fn escape_binary(&self, value: &[u8]) -> String {
        format!("X'{}'", encode_hex(value))
    }

    // SQLite has no boolean type; TRUE/FALSE are only aliases since 3.23
    fn escape_bool(&self, value: bool) -> String {
        let res = if value { "1" } else { "0" };
        res.to_string()
    }

    fn escape_identifier(&self, value: &str) -> String {
        delimit_parts(value, '[', ']')
    }

    fn unescape_binary(&self, value: &str) -> Option<Vec<u8>> {
        let hex = value
            .strip_prefix("X'")
            .or_else(|| value.strip_prefix("x'"))
            .and_then(|v| v.strip_suffix('\''))?;
        decode_hex(hex)
    }
}

impl LimitApplier for Sqlite {
    fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()> {
        if limit.is_none() && offset == 0 {
            return Ok(());
        }
        // Writing to a String cannot fail
        match limit {
            Some(limit) => _ = write!(sql, " LIMIT {limit}"),
            None => sql.push_str(" LIMIT -1"),
        }
        if offset > 0 {
            _ = write!(sql, " OFFSET {offset}");
        }
        Ok(())
    }
}
