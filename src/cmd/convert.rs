//! Convert command CLI handler.

use crate::config::ConvertYamlConfig;
use crate::convert::{self, ConvertConfig, ConvertOptions, ConvertStats};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct ConvertArgs {
    pub file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub reset_sequences: bool,
    pub schema: Option<String>,
    pub single_transaction: bool,
    pub strict: bool,
    pub no_header: bool,
    pub progress: bool,
    pub dry_run: bool,
    pub json: bool,
}

/// JSON output for a conversion
#[derive(Serialize)]
struct ConvertJsonOutput {
    input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_file: Option<String>,
    dry_run: bool,
    elapsed_secs: f64,
    statistics: ConvertStats,
}

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let json = args.json;
    let dry_run = config.dry_run;
    let progress = config.progress && !json;

    let input_file = config.input.display().to_string();
    let output_file = if dry_run {
        None
    } else {
        config.output.as_ref().map(|p| p.display().to_string())
    };

    let start_time = Instant::now();
    let stats = convert::run(ConvertConfig { progress, ..config })?;
    let elapsed = start_time.elapsed();

    if json {
        let output = ConvertJsonOutput {
            input_file,
            output_file,
            dry_run,
            elapsed_secs: elapsed.as_secs_f64(),
            statistics: stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_stats(&stats, dry_run, progress);
    }

    Ok(())
}

/// Merge the optional YAML config with command-line flags; flags win.
fn build_config(args: &ConvertArgs) -> anyhow::Result<ConvertConfig> {
    let yaml = match &args.config {
        Some(path) => {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            ConvertYamlConfig::load(path)?.resolve_paths(base)
        }
        None => ConvertYamlConfig::default(),
    };

    let input = match args.file.clone().or(yaml.input) {
        Some(input) => input,
        None => anyhow::bail!("no input file given (pass FILE or set `input` in --config)"),
    };
    if !input.exists() {
        anyhow::bail!("input file does not exist: {}", input.display());
    }

    let defaults = ConvertOptions::default();

    Ok(ConvertConfig {
        input,
        output: args.output.clone().or(yaml.output),
        dry_run: args.dry_run,
        progress: args.progress,
        strict: args.strict || yaml.strict.unwrap_or(false),
        header: !args.no_header && yaml.header.unwrap_or(true),
        options: ConvertOptions {
            reset_sequences: args.reset_sequences || yaml.reset_sequences.unwrap_or(false),
            schema: args.schema.clone().or(yaml.schema).unwrap_or(defaults.schema),
            single_transaction: args.single_transaction
                || yaml.single_transaction.unwrap_or(defaults.single_transaction),
        },
    })
}

fn print_stats(stats: &ConvertStats, dry_run: bool, progress: bool) {
    if !progress && !dry_run && stats.warning_count == 0 {
        return;
    }

    eprintln!();
    eprintln!("Conversion Statistics:");
    eprintln!("  Lines read: {}", stats.lines_read);
    eprintln!("  Lines written: {}", stats.lines_written);
    eprintln!("  Tables converted: {}", stats.tables_converted);
    eprintln!("  SERIAL keys: {}", stats.serial_columns);
    eprintln!("  Foreign keys deferred: {}", stats.foreign_keys_deferred);
    eprintln!("  Triggers skipped: {}", stats.triggers_skipped);
    eprintln!("  Views skipped: {}", stats.views_skipped);
    if stats.sequence_resets > 0 {
        eprintln!("  Sequence resets: {}", stats.sequence_resets);
    }

    if stats.warning_count > 0 {
        eprintln!();
        eprintln!("Warnings ({}):", stats.warning_count);
        for warning in &stats.warnings {
            eprintln!("  ⚠ {}", warning);
        }
        if stats.warning_count > stats.warnings.len() {
            eprintln!("  ... (additional warnings truncated)");
        }
    }

    if dry_run {
        eprintln!();
        eprintln!("(Dry run - no output written)");
    }
}
