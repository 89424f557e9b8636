//! The line-at-a-time transducer.
//!
//! Each input line is rewritten by the rule table, classified against the
//! current [`Mode`], and then written, buffered into the open table block,
//! queued as a deferred constraint, or dropped. Deferred statements and the
//! closing `COMMIT;` are written by [`Transducer::finish`].

use super::classify::{classify, LineKind, Mode};
use super::deferred::{ForeignKeyQueue, SequenceReset};
use super::error::ConvertError;
use super::rules::{self, rewrite_line};
use super::table::{split_header, TableBlock};
use super::warnings::{ConvertWarning, WarningCollector};
use super::ConvertStats;
use std::io::{BufRead, Write};

const COMMIT: &str = "COMMIT;";

/// Options that change what the transducer emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Emit `SELECT SETVAL(...)` for every key rewritten to `SERIAL`
    pub reset_sequences: bool,
    /// Schema used to qualify sequence resets
    pub schema: String,
    /// Drop the dump's own `COMMIT;`/`END TRANSACTION;` so the deferred
    /// statements run inside its transaction
    pub single_transaction: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            reset_sequences: false,
            schema: "public".to_string(),
            single_transaction: false,
        }
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Normal,
    InTable(TableBlock),
    InTrigger {
        start_line: usize,
    },
    InView {
        start_line: usize,
    },
}

impl State {
    fn mode(&self) -> Mode {
        match self {
            State::Normal => Mode::Normal,
            State::InTable(_) => Mode::InTable,
            State::InTrigger { .. } => Mode::InTrigger,
            State::InView { .. } => Mode::InView,
        }
    }
}

/// Converts one dump. Create one per run and call [`finish`](Self::finish)
/// once the input is exhausted.
#[derive(Debug)]
pub struct Transducer {
    options: ConvertOptions,
    state: State,
    foreign_keys: ForeignKeyQueue,
    sequences: Vec<SequenceReset>,
    warnings: WarningCollector,
    stats: ConvertStats,
    line_number: usize,
}

impl Transducer {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            state: State::Normal,
            foreign_keys: ForeignKeyQueue::new(),
            sequences: Vec::new(),
            warnings: WarningCollector::new(),
            stats: ConvertStats::default(),
            line_number: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn foreign_keys(&self) -> &ForeignKeyQueue {
        &self.foreign_keys
    }

    /// Process one raw input line, with or without its line terminator.
    pub fn process_line<W: Write + ?Sized>(
        &mut self,
        raw: &str,
        out: &mut W,
    ) -> anyhow::Result<()> {
        self.line_number += 1;
        self.stats.lines_read += 1;

        let rewrite = rewrite_line(raw);
        if rewrite.fired(rules::MISSING_DATATYPE) {
            let column = rewrite
                .text
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
            self.warnings.add(ConvertWarning::MissingDatatypePatched {
                line: self.line_number,
                column,
            });
        }
        let line = rewrite.text;

        if let State::InTable(_) = self.state {
            return self.table_line(line, out);
        }

        match classify(&line, self.state.mode()) {
            LineKind::TableStart { name } => {
                let mut pieces = split_header(&line).into_iter();
                let header = pieces.next().unwrap_or_default();
                self.state = State::InTable(TableBlock::open(header, name, self.line_number));
                for piece in pieces {
                    self.table_line(piece, out)?;
                }
            }
            LineKind::ForeignKey => {
                self.warnings.add(ConvertWarning::OrphanForeignKey {
                    line: self.line_number,
                });
                self.stats.lines_discarded += 1;
            }
            LineKind::TriggerStart { terminated } => {
                self.stats.triggers_skipped += 1;
                self.stats.lines_discarded += 1;
                if !terminated {
                    self.state = State::InTrigger {
                        start_line: self.line_number,
                    };
                }
            }
            LineKind::ViewStart { terminated } => {
                self.stats.views_skipped += 1;
                self.stats.lines_discarded += 1;
                if !terminated {
                    self.state = State::InView {
                        start_line: self.line_number,
                    };
                }
            }
            LineKind::TriggerEnd | LineKind::ViewEnd => {
                self.stats.lines_discarded += 1;
                self.state = State::Normal;
            }
            LineKind::Commit if self.options.single_transaction => {
                self.stats.lines_discarded += 1;
            }
            LineKind::Commit | LineKind::TableEnd | LineKind::Other => match self.state {
                State::Normal => {
                    writeln!(out, "{}", line)?;
                    self.stats.lines_written += 1;
                }
                _ => self.stats.lines_discarded += 1,
            },
        }

        Ok(())
    }

    /// Route one line of an open table block: constraints are deferred, the
    /// terminator finalizes the block, anything else is buffered.
    fn table_line<W: Write + ?Sized>(
        &mut self,
        line: String,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let State::InTable(block) = &mut self.state else {
            return Ok(());
        };

        match classify(&line, Mode::InTable) {
            LineKind::ForeignKey => {
                if block.name().is_empty() {
                    self.warnings.add(ConvertWarning::UnnamedTableConstraint {
                        line: self.line_number,
                    });
                }
                self.foreign_keys.push(block.name(), &line);
                self.stats.foreign_keys_deferred += 1;
            }
            LineKind::TableEnd => {
                block.push(line);
                if let State::InTable(block) = std::mem::take(&mut self.state) {
                    self.finish_table(block, out)?;
                }
            }
            _ => block.push(line),
        }

        Ok(())
    }

    fn finish_table<W: Write + ?Sized>(
        &mut self,
        block: TableBlock,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let start_line = block.start_line();
        let table = block.finalize();

        if table.has_unresolved_autoincrement() {
            self.warnings.add(ConvertWarning::UnresolvedAutoincrement {
                table: table.name.clone(),
                line: start_line,
            });
        }

        for line in &table.lines {
            writeln!(out, "{}", line)?;
        }
        self.stats.lines_written += table.lines.len() as u64;

        if let Some(column) = table.serial_column {
            self.stats.serial_columns += 1;
            if !table.name.is_empty() {
                self.sequences.push(SequenceReset {
                    table_name: table.name.clone(),
                    column,
                });
            }
        }

        self.stats.tables_converted += 1;
        tracing::debug!(
            table = %table.name,
            tables = self.stats.tables_converted,
            "table converted"
        );
        Ok(())
    }

    /// Write deferred constraints, optional sequence resets and the final
    /// `COMMIT;`. Fails if the input ended inside a block.
    pub fn finish<W: Write + ?Sized>(mut self, out: &mut W) -> anyhow::Result<ConvertStats> {
        let unterminated = match &self.state {
            State::Normal => None,
            State::InTable(block) => Some(ConvertError::UnterminatedBlock {
                mode: Mode::InTable,
                start_line: block.start_line(),
                table: Some(block.name().to_string()),
            }),
            State::InTrigger { start_line } => Some(ConvertError::UnterminatedBlock {
                mode: Mode::InTrigger,
                start_line: *start_line,
                table: None,
            }),
            State::InView { start_line } => Some(ConvertError::UnterminatedBlock {
                mode: Mode::InView,
                start_line: *start_line,
                table: None,
            }),
        };
        if let Some(err) = unterminated {
            return Err(err.into());
        }

        self.stats.lines_written += self.foreign_keys.write_all(out)?;

        if self.options.reset_sequences {
            for reset in &self.sequences {
                writeln!(out, "{}", reset.to_statement(&self.options.schema))?;
            }
            self.stats.sequence_resets = self.sequences.len() as u64;
            self.stats.lines_written += self.stats.sequence_resets;
        }

        writeln!(out, "{}", COMMIT)?;
        self.stats.lines_written += 1;
        out.flush()?;

        self.stats.warning_count = self.warnings.count();
        self.stats.warnings = self.warnings.into_warnings();
        Ok(self.stats)
    }
}

/// Convert a whole dump from `reader` to `writer`.
pub fn convert<R: BufRead, W: Write + ?Sized>(
    mut reader: R,
    writer: &mut W,
    options: &ConvertOptions,
) -> anyhow::Result<ConvertStats> {
    let mut transducer = Transducer::new(options.clone());
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        transducer.process_line(&line, writer)?;
    }

    transducer.finish(writer)
}
