//! `volprofile`: load an intraday volume profile and query it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use tracing::info;
use volprofile_core::Config;
use volprofile_profile::{LoadedProfile, ProfileLoader};

#[derive(Parser)]
#[command(name = "volprofile")]
#[command(about = "Intraday volume profile queries", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults are used for anything it omits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the instrument profile path
    #[arg(long)]
    primary: Option<PathBuf>,

    /// Override the market default profile path
    #[arg(long = "default")]
    default_path: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where the profile came from and its shape
    Summary,

    /// Print the bucket starting exactly at a time
    Entry {
        #[arg(long, value_parser = parse_time)]
        at: NaiveTime,
    },

    /// Expected share of daily volume between two times
    Cumulative {
        #[arg(long, value_parser = parse_time)]
        from: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        to: NaiveTime,
    },

    /// Fraction of a period's volume due by a given time
    Target {
        #[arg(long, value_parser = parse_time)]
        at: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        from: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        to: NaiveTime,
    },
}

/// Accepts `HH:MM` or `HH:MM:SS`.
fn parse_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| format!("invalid time '{raw}', expected HH:MM or HH:MM:SS"))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = &cli.primary {
        config.source.primary_path = path.clone();
    }
    if let Some(path) = &cli.default_path {
        config.source.default_path = path.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let loader = ProfileLoader::new(config).context("invalid configuration")?;
    let LoadedProfile { profile, origin } = loader.load();

    match cli.cmd {
        Commands::Summary => {
            let span = match (profile.first_start(), profile.last_end()) {
                (Some(start), Some(end)) => {
                    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
                }
                _ => "empty".to_string(),
            };
            println!("origin:      {origin}");
            println!("buckets:     {}", profile.len());
            println!("span:        {span}");
            println!("total share: {:.6}", profile.total_share());
        }
        Commands::Entry { at } => match profile.entry_at(at) {
            Some(bucket) => println!("{bucket}"),
            None => println!("Entry not found at {}", at.format("%H:%M")),
        },
        Commands::Cumulative { from, to } => {
            let share = profile
                .cumulative_percentage(from, to)
                .context("cumulative volume query")?;
            info!(%from, %to, share, "cumulative volume");
            println!("{:.2}%", share * 100.0);
        }
        Commands::Target { at, from, to } => {
            let target = profile
                .normalized_target(at, from, to)
                .context("normalized target query")?;
            info!(%at, %from, %to, target, "normalized target");
            println!("{:.2}%", target * 100.0);
        }
    }

    Ok(())
}
