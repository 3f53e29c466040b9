use anyhow::{bail, Context, Result};
use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use translit::{Dictionary, Settings};

const USAGE: &str = "[-d <dictionary>] (-t <text> | -i <input_file> [-o <output_file>])";

#[derive(Debug, Default, PartialEq)]
struct Args {
    dictionary: Option<String>,
    text: Option<String>,
    input: Option<String>,
    output: Option<String>,
}

impl Args {
    fn is_empty(&self) -> bool {
        *self == Args::default()
    }
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(flag) = iter.next() {
        let slot = match flag.as_str() {
            "-d" | "--dictionary" => &mut args.dictionary,
            "-t" | "--text" => &mut args.text,
            "-i" | "--input" => &mut args.input,
            "-o" | "--output" => &mut args.output,
            other => bail!("unknown argument {:?}", other),
        };
        let value = iter
            .next()
            .with_context(|| format!("missing value for {}", flag))?;
        *slot = Some(value.clone());
    }

    if !args.is_empty() && args.text.is_none() && args.input.is_none() {
        bail!("either a text (-t) or an input file (-i) is required");
    }
    Ok(args)
}

fn init_logging(settings: &Settings) -> Result<()> {
    if !settings.log {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if settings.show_log {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        fs::create_dir_all(&settings.log_dir)
            .with_context(|| format!("failed to create log dir {:?}", settings.log_dir))?;
        let file = File::options()
            .create(true)
            .append(true)
            .open(settings.log_dir.join("translit.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn run(args: Args, settings: &Settings) -> Result<()> {
    let name = args
        .dictionary
        .as_deref()
        .unwrap_or(settings.default_dictionary.as_str());
    let dict_path = settings.resolve_dictionary(name);
    let dict = Dictionary::load(&dict_path)
        .with_context(|| format!("failed to load dictionary {:?}", dict_path))?;
    let engine = dict
        .engine()
        .with_context(|| format!("invalid dictionary {:?}", dict_path))?;
    tracing::info!("using dictionary {:?} ({} rules)", dict_path, engine.rule_count());

    if let Some(text) = &args.text {
        println!("{}", engine.transliterate(text)?);
        return Ok(());
    }

    if let Some(input) = &args.input {
        let content =
            fs::read_to_string(input).with_context(|| format!("failed to read {:?}", input))?;
        let result = engine.transliterate(&content)?;
        match &args.output {
            Some(output) => {
                fs::write(output, result).with_context(|| format!("failed to write {:?}", output))?;
                tracing::info!("wrote {:?}", output);
            }
            None => print!("{}", result),
        }
        return Ok(());
    }

    print!("Text: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    println!("{}", engine.transliterate(line.trim_end_matches(['\r', '\n']))?);
    Ok(())
}

fn main() -> Result<()> {
    let raw: Vec<String> = env::args().collect();
    let args = match parse_args(&raw[1..]) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: {} {}", raw[0], USAGE);
            std::process::exit(1);
        }
    };

    let settings = Settings::load();
    init_logging(&settings)?;
    run(args, &settings)
}
