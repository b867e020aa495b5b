//! CLI: query text → (go | json)
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use gmqb_gen::{Generator, Options, Value};
use log::{debug, info};
use rayon::prelude::*;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// translate MongoDB filters and aggregation pipelines (extended JSON) into
/// gmqb builder code
#[derive(Parser, Debug)]
#[command(name = "gmqb-gen", version)]
pub struct CommandLineInterface {
    /// more log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// translate and print Go code
    Go(GoOut),
    /// decode and print canonical extended JSON
    Json(JsonOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// query text given inline
    #[arg(long, short, conflicts_with = "input")]
    query: Option<String>,

    /// one or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1..)]
    input: Vec<String>,

    /// jq pre-process filter for each document (e.g. '.command.filter')
    #[arg(long)]
    jq_expr: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct GeneratorSettings {
    /// TOML file with generator options
    #[arg(long)]
    config: Option<PathBuf>,

    /// builder package qualifier ('' for unqualified calls)
    #[arg(long)]
    package: Option<String>,

    /// bson package qualifier
    #[arg(long)]
    bson_package: Option<String>,

    /// emit unknown filter operators as gmqb.Raw conditions instead of failing
    #[arg(long)]
    raw_filter_fallback: bool,

    /// do not retry shell-escaped input (\"...\") after a failure
    #[arg(long)]
    no_unescape: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    /// arrays are pipelines, objects are filters
    #[default]
    Auto,
    Filter,
    Pipeline,
}

#[derive(clap::Parser, Debug)]
struct GoOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    generator_settings: GeneratorSettings,

    /// input shape
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// output .go file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct JsonOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// single-line output
    #[arg(long)]
    compact: bool,

    /// do not retry shell-escaped input (\"...\") after a failure
    #[arg(long)]
    no_unescape: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// One query to translate, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Source {
    label: String,
    text: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Source>> {
        let sources = if let Some(query) = &self.query {
            vec![Source { label: "query".to_string(), text: query.clone() }]
        } else if !self.input.is_empty() {
            let mut sources = Vec::new();
            for path in resolve_file_path_patterns(&self.input)? {
                let label = path.to_string_lossy().to_string();
                let text = if label == "-" {
                    read_stdin()?
                } else {
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read source file {label}"))?
                };
                sources.push(Source { label, text });
            }
            sources
        } else if !std::io::stdin().is_terminal() {
            vec![Source { label: "stdin".to_string(), text: read_stdin()? }]
        } else {
            bail!("no input: pass --query, --input or pipe a query on stdin");
        };
        match &self.jq_expr {
            None => Ok(sources),
            Some(jq_expr) => apply_jq(jq_expr, sources),
        }
    }
}

impl GeneratorSettings {
    fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_file(path)?,
            None => Options::default(),
        };
        if let Some(package) = &self.package {
            options.builder_package = package.clone();
        }
        if let Some(package) = &self.bson_package {
            options.bson_package = package.clone();
        }
        options.raw_filter_fallback |= self.raw_filter_fallback;
        if self.no_unescape {
            options.unescape_fallback = false;
        }
        options.validate()?;
        Ok(options)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Go(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let generator = Generator::new(target.generator_settings.options()?);
                let sources = target.input_settings.load()?;
                info!("translating {} input(s) in {:?} mode", sources.len(), target.mode);
                let outputs = sources
                    .par_iter()
                    .map(|source| {
                        generate(&generator, target.mode, &source.text)
                            .with_context(|| format!("failed to translate {}", source.label))
                    })
                    .collect::<Result<Vec<_>>>()?;
                write_output(target.out.as_ref(), &join_outputs(&sources, outputs))
            }
            Command::Json(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let sources = target.input_settings.load()?;
                let outputs = sources
                    .par_iter()
                    .map(|source| {
                        canonical_json(&source.text, target.compact, !target.no_unescape)
                            .with_context(|| format!("failed to decode {}", source.label))
                    })
                    .collect::<Result<Vec<_>>>()?;
                write_output(target.out.as_ref(), &join_outputs(&sources, outputs))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn generate_once(generator: &Generator, mode: Mode, text: &str) -> gmqb_gen::Result<String> {
    match mode {
        Mode::Auto => generator.generate(text),
        Mode::Filter => generator.generate_filter(text.trim()),
        Mode::Pipeline => generator.generate_pipeline(text.trim()),
    }
}

/// Shell-escaped queries get one unescaped retry; the first error is the one
/// reported when both attempts fail.
fn generate(generator: &Generator, mode: Mode, text: &str) -> gmqb_gen::Result<String> {
    match generate_once(generator, mode, text) {
        Err(err) if generator.options().unescape_fallback && text.contains("\\\"") => {
            debug!("retrying with shell escapes removed after: {err}");
            generate_once(generator, mode, &unescape_shell(text)).map_err(|_| err)
        }
        result => result,
    }
}

fn canonical_json(text: &str, compact: bool, unescape: bool) -> Result<String> {
    let value = match Value::from_ext_json(text.trim()) {
        Err(err) if unescape && text.contains("\\\"") => {
            debug!("retrying with shell escapes removed after: {err}");
            Value::from_ext_json(unescape_shell(text).trim()).map_err(|_| err)?
        }
        result => result?,
    };
    let json = if compact { value.to_ext_json() } else { value.to_ext_json_pretty() };
    Ok(json?)
}

/// `\"` → `"` and `\\` → `\`; every other escape is left alone.
fn unescape_shell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next @ ('"' | '\\')) = chars.peek() {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn apply_jq(jq_expr: &str, sources: Vec<Source>) -> Result<Vec<Source>> {
    let mut selected = Vec::new();
    for source in sources {
        let outputs = crate::jq_exec::select_queries(jq_expr, &source.text)
            .with_context(|| format!("failed to apply jq expression to {}", source.label))?;
        let many = outputs.len() > 1;
        for (ix, text) in outputs.into_iter().enumerate() {
            let label = if many { format!("{}#{ix}", source.label) } else { source.label.clone() };
            selected.push(Source { label, text });
        }
    }
    Ok(selected)
}

/// A lone output is printed bare; several are each headed by `// <label>`.
fn join_outputs(sources: &[Source], outputs: Vec<String>) -> String {
    if outputs.len() == 1 {
        return outputs.into_iter().collect();
    }
    sources
        .iter()
        .zip(outputs)
        .map(|(source, code)| format!("// {}\n{code}", source.label))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn write_output(out: Option<&PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    Ok(text)
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matches = glob::glob(pattern)?
                .collect::<Result<Vec<_>, _>>()?;
            if matches.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            // glob yields alphabetical order; keep it
            out.append(&mut matches);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
