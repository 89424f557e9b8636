mod convert;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lite2pg")]
#[command(version)]
#[command(about = "Convert SQLite dump files into SQL that PostgreSQL can load", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a SQLite dump into PostgreSQL syntax
    Convert {
        /// Input SQL dump (supports .gz, .bz2, .xz, .zst compression).
        /// Optional when the config file names one.
        file: Option<PathBuf>,

        /// Output SQL file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML config file supplying defaults for these options
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reset SERIAL sequences to the highest loaded key before COMMIT
        #[arg(long)]
        reset_sequences: bool,

        /// Schema used to qualify sequence resets
        #[arg(long)]
        schema: Option<String>,

        /// Drop the dump's own COMMIT so deferred constraints share its transaction
        #[arg(long)]
        single_transaction: bool,

        /// Fail if any warning is raised
        #[arg(long)]
        strict: bool,

        /// Skip the header comment
        #[arg(long)]
        no_header: bool,

        /// Show progress during conversion
        #[arg(short, long)]
        progress: bool,

        /// Preview without writing output (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert {
            file,
            output,
            config,
            reset_sequences,
            schema,
            single_transaction,
            strict,
            no_header,
            progress,
            dry_run,
            json,
        } => convert::run(convert::ConvertArgs {
            file,
            output,
            config,
            reset_sequences,
            schema,
            single_transaction,
            strict,
            no_header,
            progress,
            dry_run,
            json,
        }),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "lite2pg", &mut io::stdout());
            Ok(())
        }
    }
}
