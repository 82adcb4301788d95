use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};
use data_sweeper::config::SweeperConfig;
use data_sweeper::pipeline::{CleaningPlan, run_plan};
use data_sweeper::session::Session;
use data_sweeper::sweeper::{
    ColumnKind, FileFormat, MissingStrategy, SampleDataset, TextNormalization, ValidationResult,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "data-sweeper",
    version,
    about = "Clean, validate and export tabular data"
)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the table comes from: a file or a built-in sample.
#[derive(Args)]
pub struct Source {
    /// Input file (CSV, Excel or JSON)
    #[arg(required_unless_present = "sample", conflicts_with = "sample")]
    pub input: Option<PathBuf>,

    /// Load a sample dataset instead of a file (iris, titanic, tips)
    #[arg(long)]
    pub sample: Option<SampleDataset>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply cleaning operations and optionally export the result
    Clean {
        #[command(flatten)]
        source: Source,

        /// Drop incomplete rows, drop duplicates and trim all text first
        #[arg(long)]
        quick: bool,

        /// Remove duplicate rows
        #[arg(long)]
        dedupe: bool,

        /// Treat missing values, e.g. `age=median` (drop, mean, median, mode)
        #[arg(long, value_name = "COLUMN=STRATEGY")]
        fill: Vec<String>,

        /// Convert a column, e.g. `joined=datetime` (numeric, text, datetime, categorical)
        #[arg(long, value_name = "COLUMN=KIND")]
        convert: Vec<String>,

        /// Trim surrounding whitespace in a text column
        #[arg(long, value_name = "COLUMN")]
        trim: Vec<String>,

        /// Title-case a text column
        #[arg(long, value_name = "COLUMN")]
        title: Vec<String>,

        /// Output file; the extension picks the format (.csv, .xlsx, .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run read-only validation checks
    Check {
        #[command(flatten)]
        source: Source,

        /// Check that a column holds email addresses
        #[arg(long, value_name = "COLUMN")]
        email: Vec<String>,

        /// Check that a numeric column lies in a range, e.g. `age=0:120`
        #[arg(long, value_name = "COLUMN=MIN:MAX")]
        range: Vec<String>,

        /// Exit with an error if any check finds violations
        #[arg(long)]
        strict: bool,
    },
    /// Replay a saved cleaning plan
    Run {
        /// Cleaning plan JSON file
        plan: PathBuf,

        #[command(flatten)]
        source: Source,

        /// Output file; the extension picks the format (.csv, .xlsx, .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show column kinds, missing values and a preview
    Profile {
        #[command(flatten)]
        source: Source,
    },
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SweeperConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SweeperConfig::default(),
    };
    let mut session = Session::new(config);

    match cli.command {
        Commands::Clean {
            source,
            quick,
            dedupe,
            fill,
            convert,
            trim,
            title,
            output,
        } => {
            load(&mut session, &source)?;
            handle_clean(&mut session, quick, dedupe, &fill, &convert, &trim, &title)?;
            finish(&session, output.as_deref())
        }
        Commands::Check {
            source,
            email,
            range,
            strict,
        } => {
            load(&mut session, &source)?;
            handle_check(&session, &email, &range, strict)
        }
        Commands::Run {
            plan,
            source,
            output,
        } => {
            let plan = CleaningPlan::from_file(&plan)?;
            load(&mut session, &source)?;
            let report = run_plan(&mut session, &plan)?;
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            println!("{}", report.summary());
            finish(&session, output.as_deref())
        }
        Commands::Profile { source } => {
            load(&mut session, &source)?;
            handle_profile(&session)
        }
    }
}

fn load(session: &mut Session, source: &Source) -> Result<()> {
    let table = match (&source.input, source.sample) {
        (_, Some(sample)) => session.load_sample(sample)?,
        (Some(path), None) => session
            .load_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        (None, None) => bail!("Provide an input file or --sample"),
    };
    println!(
        "Loaded {} rows x {} columns",
        table.height(),
        table.width()
    );
    Ok(())
}

fn handle_clean(
    session: &mut Session,
    quick: bool,
    dedupe: bool,
    fill: &[String],
    convert: &[String],
    trim: &[String],
    title: &[String],
) -> Result<()> {
    if quick {
        session.quick_clean()?;
    }

    if dedupe {
        let plan = session.plan_deduplicate()?;
        println!(
            "Found {} duplicate rows ({} rows remain)",
            plan.duplicates(),
            plan.remaining_rows()
        );
        session.confirm_deduplicate(plan)?;
    }

    for arg in fill {
        let (column, strategy) = split_assignment(arg)?;
        let strategy: MissingStrategy = strategy.parse()?;
        session.handle_missing(column, strategy)?;
    }

    let requests = convert
        .iter()
        .map(|arg| {
            let (column, kind) = split_assignment(arg)?;
            Ok((column.to_owned(), kind.parse::<ColumnKind>()?))
        })
        .collect::<Result<Vec<_>>>()?;
    let report = session.convert_types(&requests);
    for (column, error) in report.failures() {
        println!("warning: `{column}` not converted: {error}");
    }

    let mut text_columns: Vec<&String> = trim.iter().collect();
    for column in title {
        if !text_columns.contains(&column) {
            text_columns.push(column);
        }
    }
    for column in text_columns {
        let normalization = TextNormalization {
            trim: trim.contains(column),
            title_case: title.contains(column),
        };
        session.normalize_text(column, normalization)?;
    }

    Ok(())
}

fn handle_check(session: &Session, email: &[String], range: &[String], strict: bool) -> Result<()> {
    let mut results: Vec<ValidationResult> = Vec::new();
    for column in email {
        results.push(session.check_email(column)?);
    }
    for arg in range {
        let (column, min, max) = parse_range(arg)?;
        results.push(session.check_range(column, min, max)?);
    }

    if results.is_empty() {
        bail!("Nothing to check: pass --email and/or --range");
    }

    let mut failed = 0;
    for result in &results {
        println!("{}", result.message());
        if !result.samples.is_empty() {
            println!("  e.g. {}", result.samples.join(", "));
        }
        if !result.is_valid() {
            failed += 1;
        }
    }

    if strict && failed > 0 {
        bail!("{failed} check(s) found violations");
    }
    Ok(())
}

fn handle_profile(session: &Session) -> Result<()> {
    let table = session.table().context("No data loaded")?;
    for column in table.profile()? {
        println!(
            "{:<24} {:<12} {:>8} missing {:>8} distinct",
            column.name,
            column.kind.as_str(),
            column.nulls,
            column.distinct
        );
    }
    println!("{}", table.preview(session.config().preview_rows));
    Ok(())
}

/// Prints the action log and a preview, then writes the export if requested.
fn finish(session: &Session, output: Option<&Path>) -> Result<()> {
    println!("Recent actions:");
    for line in session.log_lines() {
        println!("  {line}");
    }
    if let Some(table) = session.table() {
        println!("{}", table.preview(session.config().preview_rows));
    }

    if let Some(path) = output {
        let name = path.to_string_lossy();
        let format = FileFormat::from_file_name(&name)?;
        let payload = session.export(format)?;
        std::fs::write(path, &payload.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "Wrote {} ({}, {} bytes)",
            path.display(),
            payload.media_type,
            payload.bytes.len()
        );
    }
    Ok(())
}

fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => Ok((column.trim(), value.trim())),
        _ => bail!("Expected COLUMN=VALUE, got '{arg}'"),
    }
}

fn parse_range(arg: &str) -> Result<(&str, f64, f64)> {
    let (column, bounds) = split_assignment(arg)?;
    let (min, max) = bounds
        .split_once(':')
        .with_context(|| format!("Expected MIN:MAX in '{arg}'"))?;
    let min: f64 = min
        .trim()
        .parse()
        .with_context(|| format!("Invalid minimum in '{arg}'"))?;
    let max: f64 = max
        .trim()
        .parse()
        .with_context(|| format!("Invalid maximum in '{arg}'"))?;
    Ok((column, min, max))
}
