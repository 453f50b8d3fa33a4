use std::fmt::{Display, Formatter};

/// Everything that can follow a `%` in a template.
///
/// The first group formats a single value, the second selects how an array
///  is rendered and the last group are directives that steer the translator
///  itself and never produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Str,
    StrOrNull,
    Binary,
    Bool,
    Int,
    Uint,
    Float,
    Date,
    DateTime,
    Identifier,
    Sql,

    Set,
    Values,
    List,
    And,
    Or,

    If,
    Else,
    End,
    Limit,
    Offset,
    Expand,
}

/// Modifier names are case sensitive. `p` is an old spelling of `sql`.
pub(crate) const TABLE: &[(&str, Modifier)] = &[
    ("s", Modifier::Str),
    ("sn", Modifier::StrOrNull),
    ("bin", Modifier::Binary),
    ("b", Modifier::Bool),
    ("i", Modifier::Int),
    ("u", Modifier::Uint),
    ("f", Modifier::Float),
    ("d", Modifier::Date),
    ("t", Modifier::DateTime),
    ("n", Modifier::Identifier),
    ("sql", Modifier::Sql),
    ("p", Modifier::Sql),
    ("a", Modifier::Set),
    ("v", Modifier::Values),
    ("l", Modifier::List),
    ("and", Modifier::And),
    ("or", Modifier::Or),
    ("if", Modifier::If),
    ("else", Modifier::Else),
    ("end", Modifier::End),
    ("lmt", Modifier::Limit),
    ("ofs", Modifier::Offset),
    ("ex", Modifier::Expand),
];

impl Modifier {
    pub fn lookup(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, modifier)| *modifier)
    }

    /// The canonical spelling, without the `%`.
    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(_, m)| *m == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }

    pub fn is_directive(self) -> bool {
        matches!(
            self,
            Self::If | Self::Else | Self::End | Self::Limit | Self::Offset | Self::Expand
        )
    }

    /// Modifiers that only make sense applied to an array.
    pub fn is_clause(self) -> bool {
        matches!(
            self,
            Self::Set | Self::Values | Self::List | Self::And | Self::Or
        )
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
