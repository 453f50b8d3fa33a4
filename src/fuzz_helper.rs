use crate::{
    Arg, Translator,
    config::Config,
    dialect::{Driver, mssql::Mssql, mysql::MySql, postgres::Postgres, sqlite::Sqlite},
    lex::{Lexer, Mode},
    modifier::TABLE,
};

const DIALECTS: [&dyn Driver; 4] = [&MySql, &Postgres, &Sqlite, &Mssql];

// A fixed set of values for the template's modifiers to consume
fn values(text: &str) -> Vec<Arg> {
    vec![
        Arg::from(text),
        Arg::from(1),
        Arg::from(false),
        Arg::pairs([("a", Arg::from(text)), ("b%i", Arg::from(2))]),
        Arg::list([Arg::from(text), Arg::null()]),
        Arg::from(-1.5),
    ]
}

pub fn translate_template(template: &str) {
    // Lexing in both modes must cover the input without gaps
    for mode in [Mode::Template, Mode::RawSql] {
        let lexer = Lexer::with_mode(template, mode);
        let rebuilt: String = lexer.clone().map(|t| lexer.source_of(&t)).collect();
        assert_eq!(rebuilt, template);
    }

    let config = Config::new().with_substitution("p", template);
    for driver in DIALECTS {
        let translator = Translator::with_config(driver, config.clone());

        let mut args = vec![Arg::sql(template)];
        args.extend(values(template));
        let translation = translator.translate(args);
        assert_eq!(translation.is_ok(), translation.clone().into_result().is_ok());

        let modifiers = TABLE.iter().map(|&(_, m)| Some(m));
        for modifier in modifiers.chain([None]) {
            for value in values(template) {
                _ = translator.format_value(&value, modifier);
            }
        }
    }
}
