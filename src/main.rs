use anyhow::{Context, Result};
use chess_music::{plan, render, PlaybackConfig};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-music")]
#[command(about = "Turn a chess game written in PGN into music")]
#[command(version)]
struct Cli {
    /// YAML playback configuration
    #[arg(short, long, global = true, env = "CHESS_MUSIC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the note each move plays
    Notes {
        /// PGN file, or - for stdin
        pgn: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play the whole game offline and save the recording
    Render {
        /// PGN file, or - for stdin
        pgn: PathBuf,

        /// Output file (defaults to the configured download name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chess_music=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PlaybackConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PlaybackConfig::default(),
    };
    config.validate()?;

    match cli.command {
        Commands::Notes { pgn, json } => {
            let source = read_pgn(&pgn)?;
            let events = plan(&source, config.note_delay_ms)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                for event in &events {
                    let note = event
                        .note
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:>6} ms  {:<10} {:<4} {:<3} {:.1}",
                        event.offset_ms,
                        event.notation,
                        note,
                        event.duration.token(),
                        event.velocity
                    );
                }
            }
        }
        Commands::Render { pgn, output } => {
            let source = read_pgn(&pgn)?;
            match render(&source, &config)? {
                Some(download) => {
                    let path = output.unwrap_or_else(|| PathBuf::from(&download.file_name));
                    fs::write(&path, &download.bytes)
                        .with_context(|| format!("Error writing to '{}'", path.display()))?;
                    eprintln!("Wrote {} bytes to {}", download.bytes.len(), path.display());
                }
                None => eprintln!("Nothing to render: the game has no moves"),
            }
        }
    }

    Ok(())
}

fn read_pgn(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Error reading PGN from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("Error reading file '{}'", path.display()))
}
