//! pg-migrate-transforms CLI - inspect and exercise migration value transforms.

use clap::{Parser, Subcommand, ValueEnum};
use pg_migrate_transforms::{
    builtin_transforms, parse_typmod, BitElem, Encoded, RawValue, TransformError, TransformSet,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "pg-migrate-transforms")]
#[command(about = "Inspect and apply PostgreSQL migration value transforms")]
#[command(version)]
struct Cli {
    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in transforms
    List,

    /// Apply a transform to literal values
    Apply {
        /// Transform name (built-in, override or user-defined)
        name: String,

        /// Argument values, one per transform argument
        values: Vec<String>,

        /// Transform configuration file providing overrides and user transforms
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// How to read each value
        #[arg(long = "as", value_enum, default_value = "text")]
        kind: ValueKind,

        /// Treat the value \N as NULL
        #[arg(long)]
        null: bool,
    },

    /// Load and validate a transform configuration file
    Check {
        /// Path to YAML configuration file
        file: PathBuf,
    },

    /// Show which rule's transform applies to a column
    Select {
        /// Path to YAML configuration file
        file: PathBuf,

        /// Source data type tag (e.g. decimal, enum, tinyint)
        data_type: String,

        /// Full column type declaration (e.g. "decimal(10,2)")
        column_type: String,
    },
}

/// Source representation of an `apply` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ValueKind {
    /// String value
    Text,
    /// Integer value
    Int,
    /// Double precision value
    Float,
    /// Bytes, written as hex digits
    Hex,
    /// Bit vector, written as 0/1 digits
    Bits,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), TransformError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(TransformError::Config)?;

    match cli.command {
        Commands::List => {
            let transforms = builtin_transforms();
            let mut entries: Vec<(&str, usize)> =
                transforms.iter().map(|t| (t.name(), t.arity())).collect();
            entries.sort_unstable();

            if cli.output_json {
                let list: Vec<_> = entries
                    .iter()
                    .map(|(name, arity)| json!({ "name": name, "arity": arity }))
                    .collect();
                print_json(&json!(list))?;
            } else {
                for (name, _) in entries {
                    println!("{}", name);
                }
            }
        }

        Commands::Apply {
            name,
            values,
            config,
            kind,
            null,
        } => {
            let mut set = load_set(config.as_deref())?;
            let transform = set.transform(&name)?;
            let args = values
                .iter()
                .map(|v| parse_value(v, kind, null))
                .collect::<Result<Vec<_>, _>>()?;
            debug!("Applying {} to {} argument(s)", transform.name(), args.len());

            let result = transform.apply(&args)?;
            if cli.output_json {
                print_json(&json!({
                    "transform": transform.name(),
                    "result": result.as_text(),
                    "null": result.is_null(),
                    "indeterminate": result == Encoded::Indeterminate,
                }))?;
            } else {
                println!("{}", result);
            }
        }

        Commands::Check { file } => {
            let set = TransformSet::load(&file)?;
            let user = set.catalog().user_namespace().bound_names().len();
            info!("Configuration {:?} is valid", file);

            if cli.output_json {
                print_json(&json!({
                    "valid": true,
                    "rules": set.rules().len(),
                    "user_transforms": user,
                    "source_encoding": set.source_encoding().name(),
                }))?;
            } else {
                println!(
                    "Configuration OK: {} rules, {} user transforms",
                    set.rules().len(),
                    user
                );
            }
        }

        Commands::Select {
            file,
            data_type,
            column_type,
        } => {
            let set = TransformSet::load(&file)?;
            let typmod = parse_typmod(&data_type, &column_type)?;
            let rule = set.rules().select_typmod(&data_type, typmod.as_ref());

            if cli.output_json {
                print_json(&json!({
                    "data_type": data_type,
                    "column_type": column_type,
                    "typmod": typmod.map(|t| json!({ "precision": t.precision, "scale": t.scale })),
                    "transform": rule.map(|r| r.transform().name()),
                    "when": rule.and_then(|r| r.predicate()).map(|p| p.to_string()),
                }))?;
            } else {
                match rule {
                    Some(rule) => println!("{}", rule.transform().name()),
                    None => println!("none"),
                }
            }
        }
    }

    Ok(())
}

fn load_set(config: Option<&Path>) -> Result<TransformSet, TransformError> {
    match config {
        Some(path) => {
            let set = TransformSet::load(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(set)
        }
        None => Ok(TransformSet::default()),
    }
}

fn parse_value(raw: &str, kind: ValueKind, null: bool) -> Result<RawValue<'_>, TransformError> {
    if null && raw == "\\N" {
        return Ok(RawValue::Null);
    }
    let invalid = |what: &str| TransformError::Config(format!("'{}' is not a valid {}", raw, what));
    Ok(match kind {
        ValueKind::Text => RawValue::from(raw),
        ValueKind::Int => RawValue::Int(raw.trim().parse().map_err(|_| invalid("integer"))?),
        ValueKind::Float => RawValue::Float(raw.trim().parse().map_err(|_| invalid("float"))?),
        ValueKind::Hex => RawValue::from(hex::decode(raw.trim()).map_err(|_| invalid("hex string"))?),
        ValueKind::Bits => {
            let bits = raw
                .chars()
                .map(|c| match c {
                    '0' => Ok(BitElem::Int(0)),
                    '1' => Ok(BitElem::Int(1)),
                    _ => Err(invalid("bit string")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            RawValue::from(bits)
        }
    })
}

fn print_json(value: &serde_json::Value) -> Result<(), TransformError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| TransformError::Config(format!("JSON output failed: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
