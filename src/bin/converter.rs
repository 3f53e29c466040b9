use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use glob::glob;
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;
use translit::{Dictionary, DictionaryInfo};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 && args.len() != 4 {
        eprintln!("Usage: {} <input_dir> <output_dir> [encoding]", args[0]);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let input_dir = &args[1];
    let output_dir = &args[2];
    let encoding = match args.get(3) {
        Some(label) => Encoding::for_label(label.as_bytes())
            .with_context(|| format!("unknown encoding {:?}", label))?,
        None => UTF_8,
    };

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory {:?}", output_dir))?;

    let line_regex = rule_line_regex()?;
    let mut converted = 0;
    for extension in ["txt", "csv"] {
        let pattern = format!("{}/*.{}", input_dir, extension);
        for entry in glob(&pattern).context("failed to read glob pattern")? {
            match entry {
                Ok(path) => {
                    let dict = convert_file(&path, encoding, &line_regex)?;
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("dictionary");
                    let out_path = Path::new(output_dir).join(format!("{}.json", stem));
                    dict.dump(&out_path)
                        .with_context(|| format!("failed to write {:?}", out_path))?;
                    println!("Wrote {:?} ({} rules)", out_path, dict.len());
                    converted += 1;
                }
                Err(e) => tracing::error!("error reading glob entry: {}", e),
            }
        }
    }

    println!("Converted {} files", converted);
    Ok(())
}

/// `pattern<TAB>replacement`, `pattern,replacement` or `pattern=>replacement`.
fn rule_line_regex() -> Result<Regex> {
    Ok(Regex::new(
        r"^(?P<pattern>[^\t,=]+?)\s*(?:\t|,|=>)\s*(?P<replacement>.*?)\s*$",
    )?)
}

fn convert_file(path: &Path, encoding: &'static Encoding, line_regex: &Regex) -> Result<Dictionary> {
    println!("Processing {:?}...", path);
    let buffer = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
    let (decoded, _, had_errors) = encoding.decode(&buffer);
    if had_errors {
        tracing::warn!("encoding errors in {:?}", path);
    }

    let name = path.file_stem().and_then(|s| s.to_str()).map(str::to_string);
    let mut dict = Dictionary::new(DictionaryInfo {
        name,
        ..Default::default()
    });
    parse_rules(&decoded, line_regex, &mut dict);
    Ok(dict)
}

fn parse_rules(text: &str, line_regex: &Regex, dict: &mut Dictionary) {
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match line_regex.captures(trimmed) {
            Some(caps) => dict.insert(&caps["pattern"], &caps["replacement"]),
            None => tracing::warn!("line {}: no separator, skipped: {:?}", number + 1, line),
        }
    }
}
