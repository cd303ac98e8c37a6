mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gdp-impact",
    version,
    about = "Ground Delay Program impact evaluator for arrivals lists"
)]
struct Cli {
    /// Log pipeline decisions to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a GDP advisory against an arrivals list
    Analyze {
        /// Path to the GDP advisory PDF
        #[arg(long, value_name = "PDF")]
        advisory: PathBuf,

        /// Path to the arrivals list PDF
        #[arg(long, value_name = "PDF")]
        arrivals: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the highlighted arrivals PDF to this file
        #[arg(long = "out", value_name = "PDF")]
        out: Option<PathBuf>,

        /// Custom JSON config (default: builtin)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Never fall back to OCR for scanned pages
        #[arg(long)]
        no_ocr: bool,
    },
    /// Print the DEP SCOPE region codes of an advisory
    Scope {
        /// Path to the GDP advisory PDF
        advisory: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Custom JSON config (default: builtin)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Inspect and validate analyzer configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the builtin default configuration
    Show,
    /// Validate a custom config file
    Validate {
        /// Path to JSON config file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            advisory,
            arrivals,
            output,
            out,
            config,
            no_ocr,
        } => commands::analyze::run(
            &advisory,
            &arrivals,
            &output,
            out,
            config.as_deref(),
            no_ocr,
        ),
        Commands::Scope {
            advisory,
            output,
            config,
        } => commands::scope::run(&advisory, &output, config.as_deref()),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
