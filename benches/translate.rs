use criterion::{Criterion, criterion_group, criterion_main};
use sql_template::{Arg, Config, Translator, dialect::mysql::MySql};

fn templates() -> Vec<Vec<Arg>> {
    vec![
        vec![
            Arg::sql("SELECT * FROM [users] WHERE [id]=%i AND [name]=%s"),
            42.into(),
            "O'Brien".into(),
        ],
        vec![
            Arg::sql("INSERT INTO [:prefix:log]"),
            Arg::pairs([("id", Arg::from(1)), ("msg", Arg::from("first"))]),
            Arg::pairs([("id", Arg::from(2)), ("msg", Arg::from("second"))]),
        ],
        vec![
            Arg::sql("SELECT * FROM t WHERE %and"),
            Arg::pairs([("a", Arg::from(1)), ("b%s", Arg::from("x"))]),
            Arg::sql("%if"),
            false.into(),
            Arg::sql("AND [c] IN (%i) %end %lmt"),
            Arg::list([1, 2, 3]),
            10.into(),
        ],
        vec![Arg::sql(
            "SELECT 1 -- nothing to rewrite here, the fast path copies it as is",
        )],
    ]
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = Config::new().with_substitution("prefix", "app_");
    let translator = Translator::with_config(&MySql, config);
    let templates = templates();
    c.bench_function("translate some templates", |b| {
        b.iter(|| {
            for template in &templates {
                let translation = translator.translate(template.clone());
                assert!(translation.is_ok());
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
