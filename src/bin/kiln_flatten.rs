//! kiln-flatten: Fetch nested JSON from an API and save it as a flat CSV
//!
//! Usage:
//!   # Fetch from an endpoint (key may also come from KILN_API_KEY or .env)
//!   kiln-flatten --api-url https://api.example.com/lots --api-key SECRET
//!
//!   # Flatten a local file instead of fetching
//!   kiln-flatten --input lots.json -o lots.csv
//!
//!   # Read from stdin, skip the intermediate tables
//!   cat lots.json | kiln-flatten --input - --quiet

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use kiln::flatten::{normalize_shape, write_csv, FlattenConfig, TableFlattener};
use kiln::{parse_json, Error, Fetcher};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kiln-flatten")]
#[command(about = "Fetch nested JSON and flatten it into a CSV table", long_about = None)]
struct Args {
    /// Endpoint to fetch the JSON payload from
    #[arg(long, env = "KILN_API_URL", default_value = "")]
    api_url: String,

    /// Value sent in the x-api-key header
    #[arg(long, env = "KILN_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Destination CSV file (overwritten)
    #[arg(long, short = 'o', env = "KILN_OUTPUT_PATH", default_value = "lot-location.csv")]
    output: PathBuf,

    /// Read the payload from a JSON file instead of fetching ("-" for stdin)
    #[arg(long, value_name = "FILE")]
    input: Option<String>,

    /// Separator for nested column names (default: "_")
    #[arg(long)]
    separator: Option<String>,

    /// Maximum explode/expand passes before remaining lists are stringified
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Don't print the raw payload and intermediate tables
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1)
}

fn run(args: Args) -> Result<()> {
    // Build config
    let mut config = FlattenConfig::default();
    if let Some(sep) = args.separator {
        config.separator = sep;
    }
    if let Some(limit) = args.max_iterations {
        config.max_iterations = limit;
    }

    let raw = match &args.input {
        Some(path) => read_payload(path)?,
        None => Fetcher::new()?
            .fetch(&args.api_url, &args.api_key)
            .with_context(|| format!("failed to fetch {}", args.api_url))?,
    };
    if !args.quiet {
        println!("Raw Data: {}", raw);
    }

    let flattener = TableFlattener::new(config);

    let table = flattener.normalize(normalize_shape(raw));
    if !args.quiet {
        println!("After Initial Normalization:\n{}", table);
    }

    let table = flattener.flatten_table(table);
    if !args.quiet {
        println!("After Further Normalization:\n{}", table);
    }

    write_csv(&table, &args.output)?;
    println!("Data saved to {}", args.output.display());

    Ok(())
}

/// Load a JSON payload from a file, or stdin when `path` is "-"
fn read_payload(path: &str) -> Result<Value> {
    let bytes = if path == "-" {
        let mut content = Vec::new();
        std::io::stdin()
            .read_to_end(&mut content)
            .map_err(|e| Error::Io {
                path: PathBuf::from("<stdin>"),
                source: e,
            })?;
        content
    } else {
        std::fs::read(path).map_err(|e| Error::Io {
            path: PathBuf::from(path),
            source: e,
        })?
    };

    let value = parse_json(&bytes).with_context(|| format!("failed to parse {}", path))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["kiln-flatten", "--input", "lots.json"]).unwrap();
        assert_eq!(args.input.as_deref(), Some("lots.json"));
        assert!(!args.quiet);
        assert!(args.separator.is_none());
    }

    #[test]
    fn test_exit_code_survives_context() {
        let err = anyhow::Error::new(Error::Http {
            status: 500,
            reason: "Internal Server Error".to_string(),
        })
        .context("failed to fetch");
        assert_eq!(exit_code(&err), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
