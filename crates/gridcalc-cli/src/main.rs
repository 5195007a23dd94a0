//! gridcalc CLI - evaluate cell assignment scripts and single formulas

mod script;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gridcalc::prelude::*;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Spreadsheet formula engine")]
struct Cli {
    /// Number of addressable rows
    #[arg(long, global = true, default_value_t = default_limits().max_rows)]
    max_rows: u32,

    /// Number of addressable columns
    #[arg(long, global = true, default_value_t = default_limits().max_cols)]
    max_cols: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a script of `A1 = <input>` lines and print every non-empty cell
    Run {
        /// Script file, or `-` for stdin
        script: PathBuf,

        /// Print the cells as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a single formula (leading `=` optional)
    Eval {
        /// Formula source
        formula: String,
    },
}

/// One cell of `run` output
#[derive(Debug, Serialize)]
struct CellReport {
    cell: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn default_limits() -> GridLimits {
    GridLimits::default()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{fmt, EnvFilter};

    // GRIDCALC_LOG or RUST_LOG control the log level; default to WARN
    let filter = EnvFilter::try_from_env("GRIDCALC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new("warn"))
        .context("Invalid log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let options = EngineOptions::with_limits(GridLimits::new(cli.max_rows, cli.max_cols));

    match cli.command {
        Commands::Run { script, json } => run(&script, json, options),
        Commands::Eval { formula } => eval(&formula, options),
    }
}

fn read_script(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read script from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))
    }
}

fn run(path: &PathBuf, json: bool, options: EngineOptions) -> Result<()> {
    let text = read_script(path)?;
    let assignments = script::parse_script(&text)?;

    let mut engine = Engine::with_options(options);
    for assignment in &assignments {
        match engine.set_input(assignment.row, assignment.col, &assignment.input) {
            Ok(_) => {}
            // Unparsable formulas are stored on the cell and reported with it
            Err(err) if err.kind() == ErrorKind::Syntax => {
                tracing::debug!("Line {}: {}", assignment.line, err);
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("line {}: cannot set {}", assignment.line, assignment.input)
                })
            }
        }
    }

    let cells = engine.occupied_cells();
    let mut out = io::stdout().lock();

    if json {
        let reports: Vec<CellReport> = cells
            .iter()
            .map(|&(row, col)| CellReport {
                cell: CellAddress::new(row, col).to_a1_string(),
                input: engine.input(row, col),
                value: engine.value(row, col).map(value_to_json),
                error: engine.error(row, col).map(ToString::to_string),
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &reports).context("Failed to write JSON")?;
        writeln!(out)?;
        return Ok(());
    }

    for &(row, col) in &cells {
        let shown = match (engine.value(row, col), engine.error(row, col)) {
            (_, Some(error)) => format!("#ERROR: {}", error),
            (Some(value), None) => value.to_string(),
            (None, None) => String::new(),
        };
        writeln!(
            out,
            "{}\t{}\t{}",
            CellAddress::new(row, col),
            engine.input(row, col),
            shown
        )
        .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn eval(formula: &str, options: EngineOptions) -> Result<()> {
    let source = formula.strip_prefix('=').unwrap_or(formula);
    let engine = Engine::with_options(options);

    match engine.evaluate(source) {
        Ok(Some(value)) => {
            println!("{}", value);
            Ok(())
        }
        Ok(None) => bail!("Empty formula"),
        Err(err) => Err(err).with_context(|| format!("Failed to evaluate '{}'", formula)),
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Number(n) => serde_json::json!(n),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Table(table) => serde_json::Value::String(table.range().to_string()),
    }
}
