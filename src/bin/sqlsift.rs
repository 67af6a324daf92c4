//! sqlsift — Liquibase updateSql post-processor
//!
//! # Usage
//!
//! ```bash
//! # Full run with ./sqlsift.toml
//! sqlsift
//!
//! # Machine-readable report, fail the build on any worker failure
//! sqlsift run --report json --strict
//!
//! # Translate a captured updateSql stream
//! sqlsift translate --dialect mssql --kind schema update.temp
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlsift::prelude::*;
use sqlsift::transpiler::Replacement;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlsift")]
#[command(version)]
#[command(about = "Dialect-specific scripts from Liquibase updateSql output", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlsift --config sqlsift.toml
    sqlsift run --report json --strict
    sqlsift translate --dialect oracle --kind data --properties config/liquibase-update-oracle.properties raw.sql
    sqlsift rules --dialect mssql")]
struct Cli {
    /// Config file (defaults to ./sqlsift.toml, then the user config dir)
    #[arg(short, long, global = true, env = "SQLSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "table", global = true)]
    report: ReportFormat,

    /// Exit with status 2 when any worker failed or was skipped
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate changelogs and translate them for every configured dialect
    Run,
    /// Extract and translate a raw updateSql stream (file or stdin)
    Translate {
        #[arg(short, long)]
        dialect: Dialect,
        #[arg(short, long, default_value = "schema")]
        kind: ChangeKind,
        /// Properties file holding schema/catalog bindings to strip
        #[arg(short, long)]
        properties: Option<PathBuf>,
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Show the rewrite rules of each dialect
    Rules {
        #[arg(short, long)]
        dialect: Option<Dialect>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sqlsift=debug" } else { "sqlsift=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        None | Some(Commands::Run) => run(&cli).await,
        Some(Commands::Translate {
            dialect,
            kind,
            properties,
            file,
        }) => translate(&cli, *dialect, *kind, properties.as_deref(), file.as_deref()),
        Some(Commands::Rules { dialect }) => {
            show_rules(*dialect);
            Ok(0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<i32> {
    let config = RunConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let runner = LiquibaseRunner::new(&config.tool);
    let pipeline = Pipeline::new(config, runner);

    let report = pipeline.run().await;
    match cli.report {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Table => print_report(&report),
    }

    if cli.strict && !report.is_success() {
        return Ok(2);
    }
    Ok(0)
}

fn print_report(report: &RunReport) {
    println!(
        "{:8} {:8} {:10} {}",
        "Dialect".white().bold(),
        "Kind".white().bold(),
        "Status".white().bold(),
        "Detail".white().bold()
    );
    println!("{}", "─".repeat(72).dimmed());

    for outcome in &report.outcomes {
        let (status, detail) = match &outcome.status {
            WorkerStatus::Completed { statements, output } => (
                "done".green(),
                format!("{} statement(s) → {}", statements, output.display()),
            ),
            WorkerStatus::Failed { stage, error } => ("failed".red().bold(), format!("[{stage}] {error}")),
            WorkerStatus::Skipped { reason } => ("skipped".yellow(), reason.clone()),
        };
        println!(
            "{:8} {:8} {:10} {}",
            outcome.dialect.name().cyan(),
            outcome.kind.to_string(),
            status,
            detail
        );
    }

    let elapsed = report.finished_at - report.started_at;
    println!();
    println!(
        "{}/{} worker(s) completed in {} ms",
        report.completed().to_string().cyan(),
        report.outcomes.len(),
        elapsed.num_milliseconds()
    );
}

fn translate(
    cli: &Cli,
    dialect: Dialect,
    kind: ChangeKind,
    properties: Option<&Path>,
    file: Option<&Path>,
) -> Result<i32> {
    let config = RunConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let qualifiers = match properties {
        Some(path) => SchemaQualifiers::load(path, &config.qualifier_key)?,
        None => SchemaQualifiers::default(),
    };

    let raw = match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let mut extractor = StatementExtractor::new(kind, dialect, config.markers.clone());
    let translator = Translator::new(dialect, qualifiers);
    for line in extractor.extract(&raw) {
        println!("{}", translator.translate_line(line));
    }
    Ok(0)
}

fn show_rules(only: Option<Dialect>) {
    let dialects: Vec<Dialect> = match only {
        Some(d) => vec![d],
        None => Dialect::ALL.to_vec(),
    };

    for dialect in dialects {
        println!("{}", dialect.display_name().cyan().bold());
        let rules = dialect.rule_set();
        if rules.is_identity() {
            println!("  {}", "(no rewrites, qualifiers only)".dimmed());
        }
        for (i, rule) in rules.rules().iter().enumerate() {
            let replacement = match rule.replacement() {
                Replacement::Literal(text) | Replacement::Template(text) => text.to_string(),
                Replacement::Custom(_) => "<computed>".to_string(),
            };
            println!(
                "  {}. {:10} {}  {} {}",
                i + 1,
                rule.name.yellow(),
                rule.pattern().white(),
                "→".dimmed(),
                replacement.green()
            );
            if !rule.description.is_empty() {
                println!("     {}", rule.description.dimmed());
            }
        }
        println!();
    }
}
