use std::{borrow::Cow, collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};

static SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([^:\s]*):").expect("substitution pattern is valid"));

/// Named replacements for identifiers: with `prefix => "app_"` the identifier
///  `:prefix:users` becomes `app_users` before it is quoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Substitutions(HashMap<String, String>);

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unknown names are left exactly as written.
    pub fn apply<'a>(&self, identifier: &'a str) -> Cow<'a, str> {
        if self.0.is_empty() || !identifier.contains(':') {
            return Cow::Borrowed(identifier);
        }
        SUBSTITUTION.replace_all(identifier, |caps: &Captures| match self.0.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    #[cfg_attr(feature = "serde", serde(default))]
    pub substitutions: Substitutions,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_substitution(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitutions.insert(name, value);
        self
    }
}
