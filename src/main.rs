use std::collections::HashMap;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use labelsel_rust::{
    tokenize, EscapeMode, LabelSet, Matcher, ParseError, Position, Template, TemplateOptions,
};

#[derive(Parser)]
#[command(
    name = "labelsel",
    version,
    about = "Parse metric label selectors and render title templates"
)]
struct Cli {
    /// Log parser activity to stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream, one JSON object per line
    Tokens {
        /// Text to tokenize; read from stdin when omitted
        input: Option<String>,
    },
    /// Parse a selector into a JSON object of labels
    Labels {
        /// Selector; read from stdin when omitted
        input: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print a selector in canonical form
    Format {
        /// Selector; read from stdin when omitted
        input: Option<String>,
    },
    /// Parse a selector with `=`, `!=`, `=~` and `!~` matchers
    Matcher {
        /// Selector; read from stdin when omitted
        input: Option<String>,
        /// Print the conditions as JSON instead of selector syntax
        #[arg(long)]
        json: bool,
    },
    /// List the variables a template references, one per line
    Vars {
        /// Template; read from stdin when omitted
        input: Option<String>,
    },
    /// Render a template
    Render {
        /// Template; read from stdin when omitted
        input: Option<String>,
        /// Variable value, repeatable
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// Render `\$` as `$` instead of keeping the backslash
        #[arg(long)]
        strip_escapes: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Tokens { input } => {
            let input = read_input(input)?;
            for tok in tokenize(&input) {
                println!("{}", serde_json::to_string(&tok)?);
            }
        }
        Command::Labels { input, pretty } => {
            let input = read_input(input)?;
            let labels = checked(&input, LabelSet::parse(&input))?;
            let json = if pretty {
                serde_json::to_string_pretty(&labels)?
            } else {
                serde_json::to_string(&labels)?
            };
            println!("{}", json);
        }
        Command::Format { input } => {
            let input = read_input(input)?;
            println!("{}", checked(&input, LabelSet::parse(&input))?);
        }
        Command::Matcher { input, json } => {
            let input = read_input(input)?;
            let matcher = checked(&input, Matcher::parse(&input))?;
            if json {
                println!("{}", serde_json::to_string(&matcher)?);
            } else {
                println!("{}", matcher);
            }
        }
        Command::Vars { input } => {
            let input = read_input(input)?;
            let template = checked(&input, Template::parse(&input))?;
            for name in template.variables() {
                println!("{}", name);
            }
        }
        Command::Render {
            input,
            vars,
            strip_escapes,
        } => {
            let input = read_input(input)?;
            let options = TemplateOptions {
                escape: if strip_escapes {
                    EscapeMode::Strip
                } else {
                    EscapeMode::Preserve
                },
            };
            let template = checked(&input, Template::parse_with(&input, options))?;
            let data: HashMap<String, String> = vars.into_iter().collect();
            println!("{}", template.render(&data));
        }
    }
    Ok(())
}

fn read_input(arg: Option<String>) -> Result<String> {
    if let Some(text) = arg {
        return Ok(text);
    }
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    if input.ends_with('\n') {
        input.pop();
    }
    Ok(input)
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))
}

/// Show the offending line with a caret under the error position.
fn checked<T>(input: &str, result: Result<T, ParseError>) -> Result<T> {
    result.map_err(|err| {
        print_caret(input, err.position());
        anyhow::Error::new(err)
    })
}

fn print_caret(input: &str, pos: Position) {
    let line_text = input.lines().nth(pos.line.saturating_sub(1)).unwrap_or("");

    eprintln!("ERROR AT LINE {}:", pos.line);
    eprintln!("{}", line_text);

    let mut underline = String::new();
    for _ in 1..pos.column {
        underline.push(' ');
    }
    underline.push('^');
    eprintln!("{}", underline);
}
