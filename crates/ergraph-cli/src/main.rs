//! ergraph CLI
//!
//! Command-line interface for:
//! - Compiling logical entity models (`*.er.json`) into physical ones
//! - Checking models without changing them
//! - Parsing path expressions

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ergraph_l2p::{
    check_physical, physical_digest_v1, render_physical, resolve_all, topsort, validate, Analyzer,
    PhysicalModel,
};
use ergraph_path::parse_path;

mod schema;

use schema::SchemaDocument;

#[derive(Parser)]
#[command(name = "ergraph")]
#[command(
    author,
    version,
    about = "ergraph: logical-to-physical compiler for entity-relationship models"
)]
struct Cli {
    /// Log compiler passes (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a logical model into a physical one.
    Compile {
        /// Input schema document (JSON)
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate a model, resolve its paths and report what compilation
    /// would still have to add.
    Check {
        /// Input schema document (JSON)
        input: PathBuf,
    },

    /// Parse a path expression and print its canonical form.
    Parse {
        /// Path expression, e.g. `~parent/*/name`
        expr: String,
        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Canonical rendering followed by its digest
    Text,
    /// Schema document with implementations filled in
    Json,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "warn,ergraph_l2p=debug"
        } else {
            "warn"
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { input, out, format } => cmd_compile(&input, out.as_deref(), format),
        Commands::Check { input } => cmd_check(&input),
        Commands::Parse { expr, json } => cmd_parse(&expr, json),
    }
}

fn read_document(input: &Path) -> Result<SchemaDocument> {
    tracing::debug!(input = %input.display(), "loading schema document");
    let text = fs::read_to_string(input)
        .map_err(|e| anyhow!("failed to read {}: {e}", input.display()))?;
    SchemaDocument::from_json(&text)
        .map_err(|e| anyhow!("failed to parse {}: {e}", input.display()))
}

fn cmd_compile(input: &Path, out: Option<&Path>, format: OutputFormat) -> Result<()> {
    let model = read_document(input)?.to_model()?;
    let (physical, report) = PhysicalModel::compile(model)?;
    let model = physical.as_model();

    let rendered = match format {
        OutputFormat::Text => {
            format!("{}digest {}\n", render_physical(model), physical_digest_v1(model))
        }
        OutputFormat::Json => {
            let mut json = SchemaDocument::from_model(model).to_json_pretty()?;
            json.push('\n');
            json
        }
    };

    match out {
        Some(path) => {
            fs::write(path, &rendered)?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => print!("{rendered}"),
    }

    eprintln!(
        "{} compiled `{}` in {} passes ({} attributes added, {} relationships implemented)",
        "ok".green().bold(),
        model.name,
        report.passes,
        report.synthesized.len(),
        report.implemented.len()
    );
    Ok(())
}

fn cmd_check(input: &Path) -> Result<()> {
    let model = read_document(input)?.to_model()?;
    validate(&model)?;
    let resolved = resolve_all(&model)?;
    let order = topsort(&model, &resolved)?;

    let analyzer = Analyzer::new(&model, &resolved);
    let mut missing_total = 0usize;
    for &rel in &order {
        let missing = analyzer.missing_attributes(rel);
        if missing.is_empty() {
            continue;
        }
        missing_total += missing.len();
        let names = missing
            .iter()
            .map(|&a| model.attribute_label(a))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}: missing {names}", model.relationship_label(rel));
    }

    let compiled = model
        .relationships()
        .all(|r| model.relationship(r).implementation.is_some());
    if compiled {
        check_physical(&model)?;
    }

    let state = if compiled {
        "physical"
    } else if missing_total == 0 {
        "logical, complete"
    } else {
        "logical"
    };
    eprintln!(
        "{} `{}`: {} entity types, {} relationships, {state}",
        "ok".green().bold(),
        model.name,
        model.entity_types().count(),
        model.relationship_count()
    );
    Ok(())
}

fn cmd_parse(expr: &str, json: bool) -> Result<()> {
    let path = parse_path(expr)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&path)?);
    } else {
        println!("{path}");
    }
    Ok(())
}
