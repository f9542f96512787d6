//! Command-line entry point for ocrflow.
//!
//! The binary wraps `of-core`: it scaffolds `.ocrflow/` projects, lists the
//! configured agents, validates a session and runs the workflow over image
//! files while printing progress as it happens.

mod agents_cmd;
mod console_speech;
mod init_cmd;
mod project;
mod render;
mod run_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ocrflow")]
#[command(about = "OCR and remote-agent workflow runner")]
#[command(version)]
struct Cli {
    /// Log debug detail from the workflow core to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .ocrflow directory with sample configuration
    Init {
        /// Overwrite an existing .ocrflow directory
        #[arg(long)]
        force: bool,

        /// Only write the agents the compiled pipeline needs
        #[arg(long)]
        minimal: bool,

        /// Project root
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// List configured agents and their roles
    Agents {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Report everything that would prevent a run
    Check {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Image files to include
        images: Vec<PathBuf>,
    },
    /// Run the workflow over image files
    Run {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Read results aloud on the console
        #[arg(long)]
        speak: bool,

        /// Prompt for the direct agents, overriding config.toml
        #[arg(long)]
        prompt: Option<String>,

        /// Print the final state as JSON instead of progress lines
        #[arg(long)]
        json: bool,

        /// Image files to process
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "of_core=debug,of_cli=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { force, minimal, dir } => init_cmd::run(dir, force, minimal).await,
        Commands::Agents { dir } => agents_cmd::run(&dir).await,
        Commands::Check { dir, images } => run_cmd::check(&dir, &images).await,
        Commands::Run {
            dir,
            speak,
            prompt,
            json,
            images,
        } => {
            let options = run_cmd::RunOptions { speak, prompt, json };
            run_cmd::run(&dir, &images, options).await
        }
    }
}
