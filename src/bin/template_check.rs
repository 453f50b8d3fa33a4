use clap::Parser;
use sql_template::{Arg, Config, Translator, dialect};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[clap(name = "template_check")]
struct Arguments {
    /// mysql, postgres, sqlite or mssql.
    #[clap(long, env = "SQL_TEMPLATE_DIALECT", default_value = "mysql")]
    dialect: String,

    #[clap(long)]
    limit: Option<i64>,

    #[clap(long)]
    offset: Option<i64>,

    /// Identifier substitution, `name=value`. May be repeated.
    #[clap(long = "subst", value_parser = parse_substitution)]
    substitutions: Vec<(String, String)>,
}

fn parse_substitution(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {s:?}"))
}

/// Reads one template fragment per line from stdin and prints the SQL it
///  translates to.
fn main() {
    let args = Arguments::parse();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Cannot install logger: {e}");
    }

    let Some(driver) = dialect::by_name(&args.dialect) else {
        eprintln!("Unknown dialect {:?}", args.dialect);
        std::process::exit(2);
    };

    let config = Config {
        substitutions: args.substitutions.into_iter().collect(),
    };
    let translator = Translator::with_config(driver, config);

    for line in std::io::stdin().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                std::process::exit(1);
            }
        };

        let mut template = vec![Arg::sql(line)];
        if let Some(limit) = args.limit {
            template.extend([Arg::sql("%lmt"), limit.into()]);
        }
        if let Some(offset) = args.offset {
            template.extend([Arg::sql("%ofs"), offset.into()]);
        }

        let now = std::time::Instant::now();
        let translation = translator.translate(template);
        print!("[in {}μs] ", now.elapsed().as_micros());
        match translation.into_result() {
            Ok(sql) => println!("{sql}"),
            Err(e) => {
                println!("{e}");
                if let sql_template::Error::Translate { errors, .. } = e {
                    for error in errors {
                        println!("    {error}");
                    }
                }
            }
        }
    }
}
