mod definition;
mod report;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use optgroup_core::{Context, MapValueSource};

use definition::{build_command, load_definition};
use report::ParseReport;

/// Exit status when the command line was rejected.
const USAGE_ERROR_EXIT: u8 = 2;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "optgroup-check")]
#[command(about = "Check a command line against an option group definition")]
struct Cli {
    /// Command definition file (YAML for .yaml/.yml, JSON otherwise).
    #[arg(long)]
    definition: PathBuf,
    /// JSON object supplying option values keyed by long option name.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format for the parse report.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Arguments to check, given after `--`.
    #[arg(last = true)]
    argv: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_check(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(USAGE_ERROR_EXIT),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the checked command line was accepted.
fn run_check(cli: Cli) -> Result<bool, String> {
    let def = load_definition(&cli.definition)?;
    let built = build_command(&def).map_err(|err| format!("invalid definition: {err}"))?;

    let mut context = Context::from_process_env();
    if let Some(path) = &cli.config {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
        let source = MapValueSource::from_json_str(&text)
            .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
        context = context.with_source(source);
    }

    let result = built.command.parse(&context, &cli.argv);
    if let Err(errors) = &result {
        for error in errors {
            eprintln!("error: {error}");
        }
    }

    let report = ParseReport::new(&built, &result);
    let rendered = match cli.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|err| format!("Failed to render report: {err}"))?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)
            .map_err(|err| format!("Failed to render report: {err}"))?,
    };
    println!("{rendered}");

    Ok(result.is_ok())
}
