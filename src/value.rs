use chrono::{NaiveDate, NaiveDateTime};

/// A single value that can be bound to a template.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Used by `%if` and `%b`. Empty strings and `"0"` are false, as are
    ///  zero and null.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => truthy_str(s),
            Self::Bytes(b) => !(b.is_empty() || b == b"0"),
            Self::Date(_) | Self::DateTime(_) => true,
        }
    }
}

fn truthy_str(s: &str) -> bool {
    !(s.is_empty() || s == "0")
}

/// One item of the argument stream handed to
///  [Translator::translate](crate::Translator::translate).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arg {
    /// A literal SQL fragment. It is scanned for identifiers, string literals
    ///  and `%modifier` markers, which consume the following arguments.
    Sql(String),
    Value(Value),
    /// Already valid SQL; emitted verbatim under any modifier.
    Raw(String),
    /// Column name (optionally suffixed with `%modifier`) to value.
    Pairs(Vec<(String, Arg)>),
    List(Vec<Arg>),
}

impl Arg {
    pub fn sql(fragment: impl Into<String>) -> Self {
        Self::Sql(fragment.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    pub fn pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Arg>,
    {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list<V: Into<Arg>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Sql(_) => "string",
            Self::Value(v) => v.type_name(),
            Self::Raw(_) => "sql",
            Self::Pairs(_) => "pairs",
            Self::List(_) => "list",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Sql(s) | Self::Raw(s) => truthy_str(s),
            Self::Value(v) => v.is_truthy(),
            Self::Pairs(p) => !p.is_empty(),
            Self::List(l) => !l.is_empty(),
        }
    }
}

// These From implementations keep call sites short:
//  `vec![Arg::sql("SELECT * FROM t WHERE id=%i"), 5.into()]`
// Note that a plain string converts to a *value*; fragments are built with
//  [Arg::sql].
macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    i64 => Int,
    i32 => Int as i64,
    u32 => Int as i64,
    i16 => Int as i64,
    u8 => Int as i64,
    f64 => Float,
    f32 => Float as f64,
    String => Str,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<T> for Arg {
    fn from(v: T) -> Self {
        Arg::Value(v.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(Value::from("00").is_truthy());
        assert!(Value::from(-1).is_truthy());
        assert!(Value::from(NaiveDate::MIN).is_truthy());

        assert!(!Arg::list(Vec::<i64>::new()).is_truthy());
        assert!(Arg::list([0]).is_truthy());
        assert!(!Arg::sql("0").is_truthy());
    }

    #[test]
    fn conversions() {
        assert_eq!(Arg::from(5), Arg::Value(Value::Int(5)));
        assert_eq!(Arg::from("x"), Arg::Value(Value::Str("x".into())));
        assert_eq!(Arg::from(None::<i64>), Arg::null());
        assert_eq!(Arg::from(Some(2.5)), Arg::Value(Value::Float(2.5)));
        assert_eq!(
            Arg::pairs([("a%i", 1)]),
            Arg::Pairs(vec![("a%i".to_string(), Arg::Value(Value::Int(1)))])
        );
        assert_eq!(Arg::raw("NOW()").type_name(), "sql");
    }
}
