//! benchdiff CLI - Compare data-access benchmark reports before and after
//!
//! # Main Commands
//!
//! ```bash
//! benchdiff load ./reports                        # Load the six reports, print records
//! benchdiff analyze ./reports --view crud_general # Print one analysis view
//! benchdiff analyze ./reports --view tech_comparison --format csv
//! benchdiff export ./reports --format csv -o out.csv
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! benchdiff normalize "1,234.5 μs"                 # Canonical value of a token
//! benchdiff classify CrudBenchmarks-report.csv ReadCustomer
//! benchdiff sources                                # Active source table
//! ```

use clap::{Parser, Subcommand};
use benchdiff::{
    compute_view, export_records, export_view, load_directory, normalize, to_json,
    AnalysisConfig, AnalysisView, ExportFormat, LoadReport, PipelineError, UnitKind,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "benchdiff")]
#[command(about = "Compare EF Core, ADO.NET and Dapper benchmark reports before and after", long_about = None)]
struct Cli {
    /// JSON configuration override (default: $BENCHDIFF_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the report tables and output the unified records as JSON
    Load {
        /// Directory holding the reports (default: configured data dir)
        dir: Option<PathBuf>,

        /// Output the full load report instead of the records
        #[arg(long)]
        report: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute an analysis view and output it as JSON
    Analyze {
        /// Directory holding the reports (default: configured data dir)
        dir: Option<PathBuf>,

        /// View name
        #[arg(short, long, default_value = "detailed_summary")]
        view: AnalysisView,

        /// json, or csv for views with an aggregate table
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the unified records
    Export {
        /// Directory holding the reports (default: configured data dir)
        dir: Option<PathBuf>,

        /// json or csv
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize a magnitude + unit token
    Normalize {
        /// Token, e.g. "1.5 ms" or "12 KB"
        token: String,

        /// time (→ μs) or memory (→ KB)
        #[arg(short, long, default_value = "time")]
        kind: UnitKind,
    },

    /// Classify a method label from a source table
    Classify {
        /// Source identity (report file name or path)
        source: String,

        /// Method label
        method: String,
    },

    /// Show the active source table and classification rules
    Sources,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let cli = Cli::parse();

    let result = AnalysisConfig::load(cli.config.as_deref())
        .map_err(|e| -> Box<dyn std::error::Error> { Box::new(PipelineError::from(e)) })
        .and_then(|config| match cli.command {
            Commands::Load { dir, report, output } => {
                cmd_load(&config, dir.as_deref(), report, output.as_deref())
            }

            Commands::Analyze {
                dir,
                view,
                format,
                output,
            } => cmd_analyze(&config, dir.as_deref(), view, format, output.as_deref()),

            Commands::Export { dir, format, output } => {
                cmd_export(&config, dir.as_deref(), format, output.as_deref())
            }

            Commands::Normalize { token, kind } => cmd_normalize(&token, kind),

            Commands::Classify { source, method } => cmd_classify(&config, &source, &method),

            Commands::Sources => cmd_sources(&config),
        });

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Load the dataset; a load with no records at all is an error here.
fn load(config: &AnalysisConfig, dir: Option<&Path>) -> Result<LoadReport, PipelineError> {
    let dir = dir.unwrap_or(config.data_dir.as_path());
    let report = load_directory(dir, &config.classifier());

    if report.dataset.is_empty() {
        return Err(PipelineError::NoData {
            failed_tables: report.failed_table_count(),
            skipped_rows: report.skipped_row_count(),
        });
    }
    Ok(report)
}

fn cmd_load(
    config: &AnalysisConfig,
    dir: Option<&Path>,
    full_report: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = load(config, dir)?;

    for table in &report.tables {
        eprintln!(
            "   {:<72} {:>4} rows, encoding {}, delimiter '{}'",
            table.identity,
            table.rows_loaded,
            table.encoding.as_deref().unwrap_or("-"),
            table.delimiter.map(format_delimiter).unwrap_or_default()
        );
    }

    let json = if full_report {
        to_json(&report)?
    } else {
        to_json(report.dataset.records())?
    };
    write_output(&json, output)?;

    Ok(())
}

fn cmd_analyze(
    config: &AnalysisConfig,
    dir: Option<&Path>,
    view: AnalysisView,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = load(config, dir)?;

    eprintln!("📊 {}", view.title());
    let content = export_view(&compute_view(&report.dataset, view), format)?;
    write_output(&content, output)?;

    Ok(())
}

fn cmd_export(
    config: &AnalysisConfig,
    dir: Option<&Path>,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = load(config, dir)?;

    let content = export_records(&report.dataset, format)?;
    eprintln!("📦 Exporting {} records as {}", report.dataset.len(), format);
    write_output(&content, output)?;

    Ok(())
}

fn cmd_normalize(token: &str, kind: UnitKind) -> Result<(), Box<dyn std::error::Error>> {
    match normalize(token, kind).map_err(PipelineError::from)? {
        Some(value) => println!("{} {}", value, kind.canonical_unit()),
        None => println!("(absent)"),
    }
    Ok(())
}

fn cmd_classify(
    config: &AnalysisConfig,
    source: &str,
    method: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let classification = config
        .classifier()
        .classify(method, source)
        .map_err(PipelineError::from)?;

    println!("Method:     {}", classification.method);
    println!("Technology: {}", classification.technology);
    println!("Period:     {}", classification.period);
    println!("Operation:  {}", classification.operation);
    if classification.ambiguous {
        println!("⚠️  Ambiguous: several keyword groups match this label");
    }
    Ok(())
}

fn cmd_sources(config: &AnalysisConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("📂 Data directory: {}\n", config.data_dir.display());

    println!("📋 Source tables ({}):", config.sources.tables().len());
    for table in config.sources.tables() {
        println!("  📄 {}", table.file);
        println!("     {} / {}", table.technology, table.period);
    }

    println!("\n🔤 Keyword groups (first match wins):");
    for group in &config.rules.groups {
        println!("  {:?}: {}", group.target, group.keywords.join(", "));
    }
    let policy = &config.rules.read_policy;
    println!(
        "\n📖 Read-style methods: {} before, {} after",
        policy.before, policy.after
    );
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
