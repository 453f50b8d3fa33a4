use crate::{
    Arg, Config, FormatError, Modifier, Translation, Translator,
    dialect::{
        Driver, Escaper, LimitApplier, encode_hex, mssql::Mssql, mysql::MySql, postgres::Postgres,
        quote_doubling, sqlite::Sqlite,
    },
    error::Result,
};
use pretty_assertions::assert_eq;

/// Leaves identifiers bare so expected SQL stays readable.
pub struct PlainDriver;

impl Escaper for PlainDriver {
    fn escape_text(&self, value: &str) -> String {
        quote_doubling(value)
    }

    fn escape_binary(&self, value: &[u8]) -> String {
        format!("X'{}'", encode_hex(value))
    }

    fn escape_bool(&self, value: bool) -> String {
        let res = if value { "1" } else { "0" };
        res.to_string()
    }

    fn escape_identifier(&self, value: &str) -> String {
        value.to_string()
    }

    fn unescape_binary(&self, _value: &str) -> Option<Vec<u8>> {
        None
    }
}

impl LimitApplier for PlainDriver {
    fn apply_limit(&self, sql: &mut String, limit: Option<u64>, offset: u64) -> Result<()> {
        Postgres.apply_limit(sql, limit, offset)
    }
}

fn translate(args: Vec<Arg>) -> Translation {
    Translator::new(&PlainDriver).translate(args)
}

#[test]
fn select_with_implicit_values() {
    let translation = translate(vec![
        Arg::sql("SELECT * FROM foo WHERE id="),
        5.into(),
        Arg::sql("AND name="),
        "O'Brien".into(),
    ]);
    assert!(translation.is_ok());
    assert_eq!(
        translation.sql,
        "SELECT * FROM foo WHERE id=5 AND name='O''Brien'"
    );
}

#[test]
fn update_with_pairs() {
    let translation = translate(vec![
        Arg::sql("UPDATE t SET"),
        Arg::pairs([("x%i", "7"), ("y%s", "z")]),
    ]);
    assert!(translation.is_ok());
    assert_eq!(translation.sql, "UPDATE t SET x=7, y='z'");
}

#[test]
fn false_condition_wraps_in_comment() {
    let translation = translate(vec![
        Arg::sql("SELECT 1 %if"),
        false.into(),
        Arg::sql("/* never */ %end"),
    ]);
    assert!(translation.is_ok());
    assert_eq!(translation.sql, "SELECT 1 /* /* never */ */");
}

#[test]
fn plain_fragments_are_idempotent() {
    for sql in [
        "SELECT 1",
        "SELECT a, b FROM t WHERE a > 1 ORDER BY b DESC",
        "DELETE FROM t WHERE x <> 3;",
        "",
    ] {
        let translation = translate(vec![Arg::sql(sql)]);
        assert!(translation.is_ok());
        assert_eq!(translation.sql, sql);
    }
}

#[test]
fn literal_quoting_round_trips() {
    for s in ["", "plain", "it's", "''", r#"say "hi""#, "back\\slash", "žluťoučký"] {
        // A literal written the way the dialect escapes it survives a rescan
        let escaped = Postgres.escape_text(s);
        let translation = Translator::new(&Postgres).translate(vec![Arg::sql(format!(
            "SELECT {escaped}"
        ))]);
        assert!(translation.is_ok(), "{s:?}");
        assert_eq!(translation.sql, format!("SELECT {escaped}"));

        // ...and formats the same as the value itself
        let formatted = Translator::new(&MySql).format_value(&s.into(), Some(Modifier::Str));
        let rescanned = Translator::new(&MySql)
            .translate(vec![Arg::sql(quote_doubling(s))]);
        assert_eq!(formatted.sql, rescanned.sql);
    }
}

#[test]
fn double_quoted_literals_become_dialect_literals() {
    let translation = Translator::new(&MySql).translate(vec![Arg::sql(
        r#"SELECT "it's ""quoted""""#,
    )]);
    assert_eq!(translation.sql, r#"SELECT 'it\'s \"quoted\"'"#);
}

#[test]
fn binary_round_trips() {
    let bytes = vec![0, 1, 0x7f, 0x80, 0xff];
    for driver in [&MySql as &dyn Driver, &Postgres, &Sqlite, &Mssql] {
        let translation =
            Translator::new(driver).format_value(&bytes.clone().into(), Some(Modifier::Binary));
        assert!(translation.is_ok());
        assert_eq!(driver.unescape_binary(&translation.sql), Some(bytes.clone()));
    }
}

#[test]
fn numeric_passthrough() {
    let translator = Translator::new(&PlainDriver);
    assert_eq!(
        translator.format_value(&"1e10".into(), Some(Modifier::Int)).sql,
        "1e10"
    );
    assert_eq!(
        translator.format_value(&"abc".into(), Some(Modifier::Int)).sql,
        "0"
    );
}

/// Drops everything between `/*` and `*/`.
fn visible(sql: &str) -> String {
    let mut res = String::new();
    let mut rest = sql;
    while let Some(open) = rest.find("/*") {
        res.push_str(&rest[..open]);
        match rest[open..].find("*/") {
            Some(close) => rest = &rest[open + close + 2..],
            None => return res,
        }
    }
    res.push_str(rest);
    res
}

#[test]
fn conditional_balance() {
    for outer in [true, false] {
        for inner in [true, false] {
            let translation = translate(vec![
                Arg::sql("%if"),
                outer.into(),
                Arg::sql("A %if"),
                inner.into(),
                Arg::sql("B %else C %end D %else E %end"),
            ]);
            assert!(translation.is_ok());

            let expected = match (outer, inner) {
                (true, true) => "ABD",
                (true, false) => "ACD",
                (false, _) => "E",
            };
            let letters: String = visible(&translation.sql)
                .chars()
                .filter(char::is_ascii_uppercase)
                .collect();
            assert_eq!(letters, expected, "{}", translation.sql);

            let opened = translation.sql.matches("/*").count();
            assert_eq!(opened, translation.sql.matches("*/").count());
            assert_eq!(opened, if outer { 2 } else { 1 });
        }
    }
}

#[test]
fn branches_consume_the_same_arguments() {
    for cond in [true, false] {
        let translation = translate(vec![
            Arg::sql("SELECT * FROM t WHERE 1=1 %if"),
            cond.into(),
            Arg::sql("AND a=%i %lmt %ex"),
            5.into(),
            10.into(),
            Arg::list([Arg::sql("AND c IN %l"), Arg::list([1, 2])]),
            Arg::sql("%end AND b=%i"),
            7.into(),
        ]);
        assert!(translation.is_ok(), "{translation:?}");

        // Whatever the branch did, what follows %end binds the same value
        assert!(visible(&translation.sql).contains(" AND b=7"));
        let expected = if cond {
            "SELECT * FROM t WHERE 1=1 AND a=5  AND c IN (1, 2) AND b=7 LIMIT 10"
        } else {
            "SELECT * FROM t WHERE 1=1 /* AND a=... ... AND c IN ... */ AND b=7"
        };
        assert_eq!(translation.sql, expected);
    }
}

#[test]
fn unmatched_directives_do_not_abort() {
    let translation = translate(vec![
        Arg::sql("SELECT %i %end, %i"),
        1.into(),
        2.into(),
    ]);
    assert!(!translation.is_ok());
    assert_eq!(translation.sql, "SELECT 1 **Unexpected %end**, 2");
    assert_eq!(
        translation.errors,
        vec![FormatError::UnmatchedDirective(Modifier::End)]
    );
}

#[test]
fn insert_detects_values_and_rows() {
    let translation = translate(vec![
        Arg::sql("INSERT INTO t"),
        Arg::pairs([("a", Arg::from(1)), ("b", Arg::from("x"))]),
        Arg::pairs([("a", Arg::from(2)), ("b", Arg::from("y"))]),
    ]);
    assert!(translation.is_ok());
    assert_eq!(
        translation.sql,
        "INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')"
    );
}

#[test]
fn other_commands_default_to_set() {
    let translation = translate(vec![
        Arg::sql("UPSERT t SET"),
        Arg::pairs([("a", 1)]),
    ]);
    assert_eq!(translation.sql, "UPSERT t SET a=1");
}

#[test]
fn limit_is_applied_to_the_assembled_query() {
    let translation = translate(vec![
        Arg::sql("SELECT * FROM t %lmt"),
        10.into(),
        Arg::sql("WHERE a=%i %ofs"),
        1.into(),
        5.into(),
    ]);
    assert!(translation.is_ok());
    assert!(!translation.sql.contains('%'));
    assert_eq!(
        translation.sql,
        "SELECT * FROM t WHERE a=1  LIMIT 10 OFFSET 5"
    );
}

#[test]
fn limit_is_skipped_on_error() {
    let translation = translate(vec![
        Arg::sql("SELECT * FROM t WHERE a=%x %lmt"),
        1.into(),
        10.into(),
    ]);
    assert!(!translation.is_ok());
    assert!(!translation.sql.contains("LIMIT"));
}

#[test]
fn limits_per_dialect() {
    let args = || {
        vec![
            Arg::sql("SELECT * FROM [t] %ofs"),
            20.into(),
        ]
    };
    assert_eq!(
        Translator::new(&MySql).translate(args()).sql,
        "SELECT * FROM `t`  LIMIT 18446744073709551615 OFFSET 20"
    );
    assert_eq!(
        Translator::new(&Sqlite).translate(args()).sql,
        "SELECT * FROM [t]  LIMIT -1 OFFSET 20"
    );
    let mssql = Translator::new(&Mssql).translate(args());
    assert!(matches!(mssql.errors.as_slice(), [FormatError::Limit(_)]));
    assert_eq!(
        mssql.sql,
        "SELECT * FROM [t]  **Cannot apply limit: Unsupported: OFFSET is not supported by the MSSQL dialect**"
    );
}

#[test]
fn substitution_applies_to_all_identifiers() {
    let config = Config::new()
        .with_substitution("prefix", "app_")
        .with_substitution("schema", "main");
    let translator = Translator::with_config(&Postgres, config);
    let translation = translator.translate(vec![
        Arg::sql("INSERT INTO [:schema:.:prefix:log]"),
        Arg::pairs([(":prefix:id", 1)]),
    ]);
    assert!(translation.is_ok());
    assert_eq!(
        translation.sql,
        r#"INSERT INTO "main"."app_log" ("app_id") VALUES (1)"#
    );
}

#[test]
fn everything_at_once() {
    let translation = Translator::new(&MySql).translate(vec![Arg::list([
        Arg::sql("SELECT %n FROM [t] WHERE %and"),
        "t.name".into(),
        Arg::pairs([
            ("active%b", Arg::from(1)),
            ("kind", Arg::list(["a", "b"])),
        ]),
        Arg::sql("%if"),
        true.into(),
        Arg::sql("AND [created] > %d"),
        "2024-01-31 10:00".into(),
        Arg::sql("%end %ex"),
        Arg::list([Arg::sql("AND [id] IN %l"), Arg::list([1, 2])]),
        Arg::sql("%lmt"),
        3.into(),
    ])]);
    assert!(translation.is_ok(), "{translation:?}");
    assert_eq!(
        translation.sql,
        "SELECT `t`.`name` FROM `t` WHERE `active`=1 AND `kind`='a', 'b' \
         AND `created` > '2024-01-31' AND `id` IN (1, 2) LIMIT 3"
    );
}

#[test]
fn errors_are_collected_in_order() {
    let translation = translate(vec![
        Arg::sql("SELECT %d, 'oops, %q"),
        "not a date".into(),
        1.into(),
    ]);
    assert_eq!(
        translation.errors,
        vec![
            FormatError::InvalidDate("not a date".into()),
            FormatError::LoneQuote,
            FormatError::UnknownModifier("q".into()),
        ]
    );
    let err = translation.into_result().expect_err("errors");
    assert_eq!(
        err.to_string(),
        "SQL translate error (3 problems) in `SELECT **Invalid date \"not a date\"**, \
         **Alone quote**oops, **Unknown or invalid modifier %q**`"
    );
}
