//! Translates SQL templates with `%modifier` placeholders into SQL for a
//!  concrete database.
//!
//! ```rust
//! use sql_template::{Arg, Translator, dialect::postgres::Postgres};
//!
//! let translation = Translator::new(&Postgres).translate(vec![
//!     Arg::sql("UPDATE [users] SET"),
//!     Arg::pairs([("name", Arg::from("O'Brien")), ("visits%i", Arg::from("12"))]),
//!     Arg::sql("WHERE [id]=%i"),
//!     5.into(),
//! ]);
//! assert!(translation.is_ok());
//! assert_eq!(
//!     translation.sql,
//!     r#"UPDATE "users" SET "name"='O''Brien', "visits"=12 WHERE "id"=5"#
//! );
//! ```

pub mod config;
pub mod dialect;
pub mod error;
#[doc(hidden)]
pub mod fuzz_helper;
pub mod lex;
pub mod modifier;
pub mod translate;
pub mod value;

pub use config::{Config, Substitutions};
pub use error::{Error, FormatError};
pub use modifier::Modifier;
pub use translate::{Translation, Translator};
pub use value::{Arg, Value};

#[cfg(test)]
mod tests;
