use super::{Escaper, LimitApplier, delimit_parts, decode_hex, encode_hex, quote_doubling};
use crate::error::{Error, Result};

/// Microsoft SQL Server. Limits are expressed with `TOP`, which has no
///  notion of an offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mssql;

impl Escaper for Mssql {
    fn escape_text(&self, value: &str) -> String {
        quote_doubling(value)
    }

    fn escape_binary(&self, value: &[u8]) -> String {
        format!("0x{}", encode_hex(value))
    }

    fn escape_bool(&self, value: bool) -> String {
        let res = if value { "1" } else { "0" };
        res.to_string()
    }

    fn escape_identifier(&self, value: &str) -> String {
        delimit_parts(value, '[', ']')
    }

    fn unescape_binary(&self, value: &str) -> Option<Vec<u8>> {
        let hex = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))?;
        decode_hex(hex)
    }
}

impl LimitApplier for Mssql {
    fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()> {
        if offset > 0 {
            return Err(Error::Unsupported(
                "OFFSET is not supported by the MSSQL dialect".into(),
            ));
        }
        if let Some(limit) = limit {
            *sql = format!("SELECT TOP {limit} * FROM ({sql}) t");
        }
        Ok(())
    }
}
