//! Conversion of SQLite dumps into SQL that PostgreSQL can load.
//!
//! The conversion is a single streaming pass:
//! - Token rewrites on every line (types, quoting, boolean literals)
//! - `CREATE TABLE` blocks buffered and finalized as a unit
//!   (`AUTOINCREMENT` keys → `SERIAL PRIMARY KEY`, dangling commas removed)
//! - Foreign keys lifted out of table definitions and replayed as
//!   `ALTER TABLE ... ADD` after all rows are loaded
//! - Triggers and views dropped
//! - A single `COMMIT;` closing the output

mod classify;
mod deferred;
mod driver;
mod error;
mod rules;
mod table;
mod warnings;

pub use classify::{classify, table_name, LineKind, Mode};
pub use deferred::{ForeignKeyEntry, ForeignKeyQueue, SequenceReset};
pub use driver::{convert, ConvertOptions, Transducer};
pub use error::ConvertError;
pub use rules::{rewrite_line, Rewrite, Rule, RULES};
pub use table::{FinalizedTable, TableBlock};
pub use warnings::{ConvertWarning, WarningCollector};

use crate::compression::Compression;
use crate::progress::ProgressReader;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Configuration for a file-level conversion
#[derive(Debug)]
pub struct ConvertConfig {
    /// Input dump (optionally compressed)
    pub input: PathBuf,
    /// Output SQL file (None for stdout)
    pub output: Option<PathBuf>,
    /// Dry run mode
    pub dry_run: bool,
    /// Show progress
    pub progress: bool,
    /// Fail if any warning is raised
    pub strict: bool,
    /// Prepend a comment header
    pub header: bool,
    pub options: ConvertOptions,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            dry_run: false,
            progress: false,
            strict: false,
            header: true,
            options: ConvertOptions::default(),
        }
    }
}

/// Statistics from a conversion
#[derive(Debug, Default, Clone, Serialize)]
pub struct ConvertStats {
    /// Input lines read
    pub lines_read: u64,
    /// Output lines written, header excluded
    pub lines_written: u64,
    /// CREATE TABLE statements finalized
    pub tables_converted: u64,
    /// Keys rewritten to SERIAL PRIMARY KEY
    pub serial_columns: u64,
    /// Foreign keys moved to ALTER TABLE statements
    pub foreign_keys_deferred: u64,
    pub triggers_skipped: u64,
    pub views_skipped: u64,
    /// Lines dropped (trigger/view bodies, orphan constraints, source COMMIT)
    pub lines_discarded: u64,
    pub sequence_resets: u64,
    /// Total warnings, including any beyond the stored ones
    pub warning_count: usize,
    pub warnings: Vec<ConvertWarning>,
}

/// Convert `config.input` and write the result.
///
/// File output goes through a temporary file in the destination directory
/// and only replaces `config.output` when the whole run succeeded.
pub fn run(config: ConvertConfig) -> anyhow::Result<ConvertStats> {
    let file = File::open(&config.input)
        .with_context(|| format!("failed to open {}", config.input.display()))?;
    let file_size = file.metadata()?.len();
    let compression = Compression::from_path(&config.input);

    tracing::info!(
        input = %config.input.display(),
        compression = %compression,
        "converting"
    );

    let progress_bar = if config.progress {
        let pb = ProgressBar::new(file_size);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}",
            )?
            .progress_chars("█▓▒░  ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let raw: Box<dyn Read> = match &progress_bar {
        Some(pb) => {
            let pb = pb.clone();
            Box::new(ProgressReader::new(file, move |bytes| pb.set_position(bytes)))
        }
        None => Box::new(file),
    };
    let reader = BufReader::with_capacity(64 * 1024, compression.wrap_reader(raw)?);

    let stats = if config.dry_run {
        convert(reader, &mut std::io::sink(), &config.options)?
    } else {
        match &config.output {
            Some(path) => write_to_file(reader, path, &config)?,
            None => {
                let stdout = std::io::stdout();
                let mut writer = BufWriter::new(stdout.lock());
                if config.header {
                    write_header(&mut writer, &config)?;
                }
                convert(reader, &mut writer, &config.options)?
            }
        }
    };

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("{} tables", stats.tables_converted));
    }

    tracing::info!(
        lines = stats.lines_read,
        tables = stats.tables_converted,
        foreign_keys = stats.foreign_keys_deferred,
        "conversion finished"
    );

    if config.strict && (config.dry_run || config.output.is_none()) {
        check_strict(&stats)?;
    }

    Ok(stats)
}

fn write_to_file<R: std::io::BufRead>(
    reader: R,
    path: &Path,
    config: &ConvertConfig,
) -> anyhow::Result<ConvertStats> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    let stats = {
        let mut writer = BufWriter::with_capacity(256 * 1024, temp.as_file_mut());
        if config.header {
            write_header(&mut writer, config)?;
        }
        let stats = convert(reader, &mut writer, &config.options)?;
        writer.flush()?;
        stats
    };

    if config.strict {
        check_strict(&stats)?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(stats)
}

fn check_strict(stats: &ConvertStats) -> anyhow::Result<()> {
    if stats.warning_count > 0 {
        return Err(ConvertError::StrictWarnings {
            count: stats.warning_count,
        }
        .into());
    }
    Ok(())
}

/// Write output header
fn write_header(writer: &mut dyn Write, config: &ConvertConfig) -> std::io::Result<()> {
    writeln!(writer, "-- Converted by lite2pg")?;
    writeln!(writer, "-- From: sqlite → To: postgres")?;
    writeln!(writer, "-- Source: {}", config.input.display())?;
    writeln!(writer)
}
