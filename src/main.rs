mod audit;
mod commands;
mod config;
mod diagnostics;
mod document;
mod error;
mod headless;
mod highlight;
mod html;
mod index;
mod link;
mod navigation;
mod replay;
mod types;
mod uri;
mod walker;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Format;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "LINKEDSRC_LOG";

/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "linkedsrc",
    version,
    about = "Definition/reference cross-linking for rendered source listings"
)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Audit every document under a directory for dead and ambiguous links
    Check {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
        /// Directory to audit
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// List the definitions, references, and anomalies of one document
    Index {
        /// Path under which the document is served, for same-document link checks
        #[arg(long)]
        document_path: Option<String>,
        /// HTML document to index
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Replay a scripted hover/click session and print the final state
    Replay {
        /// Path under which the document is served, for same-document link checks
        #[arg(long)]
        document_path: Option<String>,
        /// HTML document to drive
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// TOML script of steps
        script: PathBuf,
    },
    /// Run check, then re-run it whenever a document changes
    Watch {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
        /// Directory to watch
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Map a `--json` switch onto an output format.
const fn format_for(json: bool) -> Format {
    if json {
        return Format::Json;
    }
    return Format::Text;
}

/// Install the stderr log subscriber.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { format, path } => commands::check(&path, format),
        Commands::Index {
            document_path,
            file,
            json,
        } => commands::index(&file, document_path.as_deref(), format_for(json)).map(|()| return ExitCode::SUCCESS),
        Commands::Replay {
            document_path,
            file,
            json,
            script,
        } => commands::replay(&file, &script, document_path.as_deref(), format_for(json))
            .map(|()| return ExitCode::SUCCESS),
        Commands::Watch { format, path } => watch::run(&path, format),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(3_u8)
        },
    };
}
