//! resumable CLI - inspect checkpoints and export them as text.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resumable::{
    export_record, load_record, recover_partial_writes, split_name, suggest_location, Config,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "resumable")]
#[command(version)]
#[command(about = "Inspect, locate and export resumable checkpoints")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a filename into directory, stem and suffix
    Split {
        path: PathBuf,

        /// Make the path absolute first
        #[arg(short, long)]
        absolute: bool,
    },

    /// Show where input and progress for a file would be found
    Locate {
        input: PathBuf,

        /// Save file or directory (defaults to the configured one)
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Print a checkpoint or array file as JSON
    Show { path: PathBuf },

    /// Export a checkpoint as plain text
    Export {
        path: PathBuf,

        /// Keys to leave out (repeatable)
        #[arg(short, long = "reject")]
        reject: Vec<String>,
    },

    /// Remove partially written checkpoints left by interrupted saves
    Clean { dir: PathBuf },

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

fn print_example_config() {
    let example = r#"# resumable configuration file

[progress]
# Save file or directory; ${VAR} is expanded from the environment
save = "."
# start_only | resume_or_start | force_restart
mode = "resume_or_start"
# new_wins | saved_wins
precedence = "new_wins"
allow_empty = false
rejected = []
excepted = []

[save]
fallback_dir = "."
rejected = []

[export]
rejected = []
"#;
    println!("{example}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::from_optional_file(cli.config.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    match cli.command {
        Commands::Example => print_example_config(),

        Commands::Split { path, absolute } => {
            let split = split_name(&path, absolute)
                .with_context(|| format!("Failed to split {path:?}"))?;
            println!("dir:    {}", split.dir.display());
            println!("stem:   {}", split.stem);
            println!("suffix: {}", split.suffix);
        }

        Commands::Locate { input, save } => {
            let save = save.unwrap_or_else(|| config.load_options().save);
            let location = suggest_location(&input, &save)
                .with_context(|| format!("Failed to locate {input:?}"))?;
            match &location.input {
                Some(p) => println!("input: {}", p.display()),
                None => println!("input: <not found>"),
            }
            println!("save:  {}", location.save.display());
            println!("state: {}", location.state);
        }

        Commands::Show { path } => {
            let record = load_record(&path)
                .with_context(|| format!("Failed to load {path:?}"))?;
            let json = serde_json::to_string_pretty(&record).context("Failed to render record")?;
            println!("{json}");
        }

        Commands::Export { path, reject } => {
            let record = load_record(&path)
                .with_context(|| format!("Failed to load {path:?}"))?;
            let mut rejected: BTreeSet<String> = config.export_rejected();
            rejected.extend(reject);
            let out = export_record(&path, &record, &rejected)
                .with_context(|| format!("Failed to export {path:?}"))?;
            info!(dir = %out.display(), "Exported");
        }

        Commands::Clean { dir } => {
            let removed = recover_partial_writes(&dir)
                .with_context(|| format!("Failed to clean {dir:?}"))?;
            info!(removed = removed.len(), "Cleanup complete");
        }
    }

    Ok(())
}
