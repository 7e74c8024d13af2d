use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use pureform::{Classifier, Descriptor, ExtractionMode, PureformConfig, Reconstructor, StrategyTable};
use pureform_script::{Realm, Value, reader_for_extension};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for sources that are recognized but unsupported, or not
/// recognized at all.
const EXIT_UNSUPPORTED: u8 = 2;

#[derive(Parser)]
#[command(name = "pureform", version, about = "Classify and rebuild function sources")]
struct Cli {
    /// Project root (where .pureform/config.toml is looked up)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Override the configured extraction mode
    #[arg(long, global = true, value_enum)]
    extraction: Option<ExtractionMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the descriptor of a function source as JSON
    Classify {
        /// Source file (stdin if omitted or "-")
        file: Option<PathBuf>,
    },
    /// Classify and reconstruct a function, printing the rebuilt source
    Rebuild {
        /// Source file (stdin if omitted or "-")
        file: Option<PathBuf>,
    },
    /// Reconstruct a function and call it with JSON arguments
    Call {
        /// Source file ("-" for stdin)
        file: PathBuf,

        /// Arguments, each a JSON value
        args: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config, config_errors) = PureformConfig::load_with_errors(&cli.root);
    init_tracing(&config.log.filter);
    for err in &config_errors {
        tracing::warn!("{}", err);
    }

    match run(cli, config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, config: PureformConfig) -> Result<ExitCode> {
    let classifier = Classifier::new(cli.extraction.unwrap_or(config.classify.extraction));
    let reconstructor = Reconstructor::new(
        Realm::new(config.runtime.realm_options()),
        StrategyTable::standard(),
    );

    match cli.command {
        Command::Classify { file } => {
            let source = read_source(file.as_deref())?;
            let Some(descriptor) = classify(&classifier, &source)? else {
                return Ok(ExitCode::from(EXIT_UNSUPPORTED));
            };
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Command::Rebuild { file } => {
            let source = read_source(file.as_deref())?;
            let Some(descriptor) = classify(&classifier, &source)? else {
                return Ok(ExitCode::from(EXIT_UNSUPPORTED));
            };
            let callable = reconstructor.reconstruct(&descriptor)?;
            println!("{}", callable.source());
        }
        Command::Call { file, args } => {
            let source = read_source(Some(&file))?;
            let Some(descriptor) = classify(&classifier, &source)? else {
                return Ok(ExitCode::from(EXIT_UNSUPPORTED));
            };
            let args = args
                .iter()
                .map(|arg| {
                    serde_json::from_str(arg)
                        .map(|json| Value::from_json(&json))
                        .with_context(|| format!("argument is not valid JSON: {}", arg))
                })
                .collect::<Result<Vec<_>>>()?;

            let callable = reconstructor.reconstruct(&descriptor)?;
            // Script errors hold `Rc` values, so they are flattened to text.
            let result = callable.invoke(&args).map_err(|err| anyhow!("{}", err))?;
            let result = settle(result)?.to_json().map_err(|err| anyhow!("{}", err))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Classify, printing recoverable failures instead of returning them.
fn classify(classifier: &Classifier, source: &str) -> Result<Option<Descriptor>> {
    match classifier.classify(source) {
        Ok(descriptor) => Ok(Some(descriptor)),
        Err(err) if err.is_recoverable() => {
            eprintln!("{}", err);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        None => read_stdin(),
        Some(path) if path == Path::new("-") => read_stdin(),
        Some(path) => {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if reader_for_extension(ext).is_none() {
                    bail!("no reader for .{} files", ext);
                }
            }
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("failed to read stdin")?;
    Ok(source)
}

/// Drive a promise to completion; other values pass through.
fn settle(value: Value) -> Result<Value> {
    let Value::Promise(promise) = value else {
        return Ok(value);
    };
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(promise).map_err(|err| anyhow!("{}", err))
}
