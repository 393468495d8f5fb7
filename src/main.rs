mod debug_report;

use syntagma::{Attr, Dictionary, FeatureVector, GlrParser, Options, Reading, StaticAnalyzer};
use std::io::{self, IsTerminal, Read};

const DEFAULT_START: &str = "S";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let mut dictionary = Dictionary::new();
    for (category, words) in &config.dictionary {
        dictionary.add(category, words.clone());
    }
    let mut analyzer = StaticAnalyzer::new();
    for (surface, reading) in &config.readings {
        analyzer.add(surface, reading.clone());
    }

    let parser =
        match GlrParser::from_text(&config.grammar, &config.start, &dictionary, Box::new(analyzer)) {
            Ok(parser) => parser,
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        };

    let tokens = parser.read_tokens(&config.input);
    let report = parser.search_report(&tokens, Options { max_steps: config.max_steps });
    debug_report::print_run(&config.input, &tokens, &report, config.color);
}

struct CliConfig {
    grammar: String,
    start: String,
    dictionary: Vec<(String, Vec<String>)>,
    readings: Vec<(String, Reading)>,
    input: String,
    max_steps: usize,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut grammar: Option<String> = None;
    let mut start = DEFAULT_START.to_string();
    let mut dictionary: Vec<(String, Vec<String>)> = Vec::new();
    let mut readings: Vec<(String, Reading)> = Vec::new();
    let mut input: Option<String> = None;
    let mut max_steps = Options::default().max_steps;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("syntagma {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--grammar" | "-g" => {
                let value = args.next().ok_or_else(|| "error: --grammar expects a value".to_string())?;
                grammar = Some(load_grammar(&value)?);
            }
            "--start" => {
                start = args.next().ok_or_else(|| "error: --start expects a value".to_string())?;
            }
            "--dict" => {
                let value = args.next().ok_or_else(|| "error: --dict expects a value".to_string())?;
                dictionary.push(parse_dict(&value)?);
            }
            "--reading" => {
                let value = args.next().ok_or_else(|| "error: --reading expects a value".to_string())?;
                readings.push(parse_reading(&value)?);
            }
            "--max-steps" => {
                let value = args.next().ok_or_else(|| "error: --max-steps expects a value".to_string())?;
                max_steps = value
                    .parse()
                    .map_err(|_| format!("error: invalid --max-steps '{value}' (expected a number)"))?;
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--grammar=") => {
                grammar = Some(load_grammar(arg.trim_start_matches("--grammar="))?);
            }
            _ if arg.starts_with("--start=") => {
                start = arg.trim_start_matches("--start=").to_string();
            }
            _ if arg.starts_with("--dict=") => {
                dictionary.push(parse_dict(arg.trim_start_matches("--dict="))?);
            }
            _ if arg.starts_with("--reading=") => {
                readings.push(parse_reading(arg.trim_start_matches("--reading="))?);
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let grammar = grammar.ok_or_else(|| format!("error: no grammar provided\n\n{}", help_text()))?;

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };
    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { grammar, start, dictionary, readings, input, max_steps, color })
}

/// A value containing `=` is inline notation, otherwise it is a file path.
fn load_grammar(value: &str) -> Result<String, String> {
    if value.contains('=') {
        return Ok(value.to_string());
    }
    std::fs::read_to_string(value).map_err(|err| format!("error: failed to read grammar '{value}': {err}"))
}

/// Parse one `CATEGORY=word1,word2` dictionary argument.
fn parse_dict(value: &str) -> Result<(String, Vec<String>), String> {
    let (category, words) = value
        .split_once('=')
        .ok_or_else(|| format!("error: invalid --dict '{value}' (expected CATEGORY=word1,word2)"))?;
    let words: Vec<String> =
        words.split(',').map(str::trim).filter(|w| !w.is_empty()).map(str::to_string).collect();
    if category.trim().is_empty() || words.is_empty() {
        return Err(format!("error: invalid --dict '{value}' (expected CATEGORY=word1,word2)"));
    }
    Ok((category.trim().to_string(), words))
}

/// Parse one `word=symbol:g=femn,n=sing` analyzer fixture argument.
fn parse_reading(value: &str) -> Result<(String, Reading), String> {
    let (surface, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("error: invalid --reading '{value}' (expected word=symbol:g=femn,n=sing)"))?;
    let (symbol, feature_text) = match rest.split_once(':') {
        Some((symbol, features)) => (symbol, Some(features)),
        None => (rest, None),
    };
    if surface.trim().is_empty() || symbol.trim().is_empty() {
        return Err(format!("error: invalid --reading '{value}' (expected word=symbol:g=femn,n=sing)"));
    }

    let mut features = FeatureVector::wildcard();
    for pair in feature_text.unwrap_or("").split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((letter, tag)) = pair.split_once('=') else {
            return Err(format!("error: invalid feature '{pair}' in --reading '{value}'"));
        };
        let attr = match letter.trim() {
            "g" => Attr::Gender,
            "n" => Attr::Number,
            "c" => Attr::Case,
            other => return Err(format!("error: unknown feature letter '{other}' in --reading '{value}'")),
        };
        features = features.set(attr, tag.trim());
    }

    let surface = surface.trim().to_string();
    let reading = Reading {
        symbol: symbol.trim().to_string(),
        lemma: surface.to_lowercase(),
        features,
    };
    Ok((surface, reading))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "syntagma {version}

Agreement-pattern search CLI.

Usage:
  syntagma --grammar <file|notation> [OPTIONS] [--] <input...>
  syntagma --grammar <file|notation> [OPTIONS] --input <text>

Options:
  -g, --grammar <file|text>  Grammar notation file, or inline notation when the
                             value contains '='.
  --start <symbol>           Start symbol. Default: {default_start}
  --dict <CAT=w1,w2>         Closed dictionary category (repeatable).
  --reading <w=sym:g=x,n=y>  Analyzer fixture reading (repeatable).
  --max-steps <n>            Step budget per start offset.
  -i, --input <text>         Input text to search. If omitted, reads remaining
                             args or stdin when no args are provided.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Example:
  syntagma -g 'S = adj<agr-gnc=1> CLOTHES' \\
      --dict 'CLOTHES=jacket,coat' \\
      --reading 'beautiful=adj:g=femn,n=sing' \\
      'a beautiful jacket'

Exit codes:
  0  Success.
  1  Internal error.
  2  Invalid arguments, unreadable grammar, or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_start = DEFAULT_START
    )
}
