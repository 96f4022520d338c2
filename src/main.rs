//! Draftsync - developer tooling for the edit synchronization engine.
//!
//! # Usage
//!
//! ```bash
//! draftsync to-markup page.html
//! echo '## Title' | draftsync to-structured
//! draftsync replay session.jsonl --plain --debounce 300
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::executor::block_on;

use draftsync::adapter::{BuiltinLoader, UnavailableLoader};
use draftsync::config::{
    ConfigFlags, EditableRegion, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use draftsync::convert::{to_portable_markup, to_structured_text};
use draftsync::replay::{parse_script, replay};
use draftsync::sink::ChangeEvent;

/// Edit synchronization tooling
#[derive(Parser, Debug)]
#[command(name = "draftsync", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert structured (html-like) text to portable markup
    ToMarkup {
        /// Input file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Convert portable markup to structured (html-like) text
    ToStructured {
        /// Input file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Replay a JSON-lines edit script and print delivered events
    Replay {
        /// Script file
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Use the plain text surface instead of the rich component
        #[arg(long)]
        plain: bool,

        /// Idle interval before a flush, in milliseconds
        #[arg(long, value_name = "MS")]
        debounce: Option<u64>,

        /// Region name carried in events
        #[arg(long, value_name = "NAME")]
        section: Option<String>,

        /// Initial markup of the region
        #[arg(long, value_name = "FILE")]
        initial: Option<PathBuf>,

        /// Pretty-print events
        #[arg(long)]
        pretty: bool,
    },
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_events(events: &[ChangeEvent], pretty: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    for event in events {
        let line = if pretty {
            serde_json::to_string_pretty(event)?
        } else {
            serde_json::to_string(event)?
        };
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn run_replay(script: &Path, initial: Option<&Path>, flags: &ConfigFlags) -> Result<()> {
    let steps = parse_script(&read_input(Some(script))?)
        .with_context(|| format!("Invalid script {}", script.display()))?;
    let initial = match initial {
        Some(path) => read_input(Some(path))?,
        None => String::new(),
    };
    let section = flags.section.clone().unwrap_or_else(|| "content".to_string());
    let mut region = EditableRegion::new(section, initial);
    if let Some(ms) = flags.debounce_ms {
        region = region.with_debounce(ms);
    }

    let events = if flags.plain {
        block_on(replay(region, &UnavailableLoader, &steps))
    } else {
        block_on(replay(region, &BuiltinLoader, &steps))
    }
    .context("Replay failed")?;
    print_events(&events, flags.pretty)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    match cli.command {
        Some(Commands::ToMarkup { file }) => {
            let input = read_input(file.as_deref())?;
            println!("{}", to_portable_markup(&input));
        }
        Some(Commands::ToStructured { file }) => {
            let input = read_input(file.as_deref())?;
            println!("{}", to_structured_text(&input));
        }
        Some(Commands::Replay {
            script,
            plain,
            debounce,
            section,
            initial,
            pretty,
        }) => {
            let replay_flags = ConfigFlags {
                debounce_ms: debounce,
                plain,
                section,
                pretty,
            };
            run_replay(&script, initial.as_deref(), &effective.union(&replay_flags))?;
        }
        None => {
            if !cli.save && !cli.clear {
                anyhow::bail!("No command given (try --help)");
            }
        }
    }
    Ok(())
}
