use std::fmt::Write;

use super::{Escaper, LimitApplier, delimit_parts, decode_hex, encode_hex};
use crate::error::Result;

/// MySQL allows OFFSET only together with LIMIT; this is the documented way
///  of saying "all remaining rows".
const NO_LIMIT: u64 = u64::MAX;

/// MySQL and MariaDB in their default SQL mode, where backslash is an escape
///  character inside string literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Escaper for MySql {
    fn escape_text(&self, value: &str) -> String {
        let mut res = String::with_capacity(value.len() + 2);
        res.push('\'');
        for c in value.chars() {
            match c {
                '\0' => res.push_str("\\0"),
                '\n' => res.push_str("\\n"),
                '\r' => res.push_str("\\r"),
                '\x1a' => res.push_str("\\Z"),
                '\\' | '\'' | '"' => {
                    res.push('\\');
                    res.push(c);
                }
                c => res.push(c),
            }
        }
        res.push('\'');
        res
    }

    fn escape_binary(&self, value: &[u8]) -> String {
        format!("X'{}'", encode_hex(value))
    }

    fn escape_bool(&self, value: bool) -> String {
        let res = if value { "1" } else { "0" };
        res.to_string()
    }

    fn escape_identifier(&self, value: &str) -> String {
        delimit_parts(value, '`', '`')
    }

    fn unescape_binary(&self, value: &str) -> Option<Vec<u8>> {
        let hex = value
            .strip_prefix("X'")
            .or_else(|| value.strip_prefix("x'"))
            .and_then(|v| v.strip_suffix('\''))?;
        decode_hex(hex)
    }
}

impl LimitApplier for MySql {
    fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()> {
        if limit.is_none() && offset == 0 {
            return Ok(());
        }
        // Writing to a String cannot fail
        _ = write!(sql, " LIMIT {}", limit.unwrap_or(NO_LIMIT));
        if offset > 0 {
            _ = write!(sql, " OFFSET {offset}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(MySql.escape_text("it's"), r"'it\'s'");
        assert_eq!(MySql.escape_text("a\\b\n"), r"'a\\b\n'");
        assert_eq!(MySql.escape_text("\"q\""), r#"'\"q\"'"#);
        assert_eq!(MySql.escape_identifier("db.t"), "`db`.`t`");
        assert_eq!(MySql.escape_identifier("we`ird"), "`we``ird`");
        assert_eq!(MySql.escape_bool(false), "0");
    }

    #[test]
    fn binary() {
        let escaped = MySql.escape_binary(b"\x00ab");
        assert_eq!(escaped, "X'006162'");
        assert_eq!(MySql.unescape_binary(&escaped), Some(b"\x00ab".to_vec()));
        assert_eq!(MySql.unescape_binary("006162"), None);
    }

    #[test]
    fn limit() {
        let mut sql = "SELECT 1".to_string();
        MySql.apply_limit(&mut sql, None, 0).expect("nothing");
        assert_eq!(sql, "SELECT 1");

        MySql.apply_limit(&mut sql, None, 3).expect("offset");
        assert_eq!(sql, "SELECT 1 LIMIT 18446744073709551615 OFFSET 3");

        let mut sql = "SELECT 1".to_string();
        MySql.apply_limit(&mut sql, Some(0), 0).expect("limit");
        assert_eq!(sql, "SELECT 1 LIMIT 0");
    }
}
