//! dungeon-graph: generate and inspect dungeon room graphs
//!
//! Prints one level (or a run of levels) as DOT, JSON or a text summary.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use dg_core::export::{summary, to_dot, to_json};
use dg_core::{GameRng, GenerationConfig, GenerationService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Graphviz digraph
    Dot,
    /// Full generation record
    Json,
    /// Room counts and pass statistics
    Summary,
}

/// Generate the room graph of a dungeon level
#[derive(Parser, Debug)]
#[command(name = "dungeon-graph")]
#[command(author, version, about = "Procedural dungeon room graph generator", long_about = None)]
struct Args {
    /// Dungeon level, starting at 1
    #[arg(short = 'l', long = "level", default_value_t = 1)]
    level: u32,

    /// Number of consecutive levels to generate
    #[arg(short = 'n', long = "count", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Seed; a random one is picked and logged when omitted
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// JSON generation config; missing fields take defaults
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Summary)]
    format: Format,

    /// Print the default config as JSON and exit
    #[arg(long = "print-config")]
    print_config: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GenerationConfig> {
    let Some(path) = path else {
        return Ok(GenerationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    GenerationConfig::from_json_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.print_config {
        println!("{}", GenerationConfig::default().to_json_string()?);
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;
    let seed = args.seed.unwrap_or_else(|| GameRng::from_entropy().seed());
    tracing::info!(level = args.level, count = args.count, seed, "starting generation");

    let mut service = GenerationService::new(config)?;
    let levels = if args.count == 1 {
        vec![service.generate(args.level, seed)?]
    } else {
        service.generate_run(args.level, args.count, seed)?
    };

    for level in &levels {
        match args.format {
            Format::Dot => print!("{}", to_dot(&level.graph)),
            Format::Json => println!("{}", to_json(level)?),
            Format::Summary => print!("{}", summary(level)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_defaults_to_one() {
        let args = Args::try_parse_from(["dungeon-graph", "--level", "4"]).unwrap();
        assert_eq!(args.count, 1);
        assert_eq!(args.level, 4);
        assert_eq!(args.format, Format::Summary);
    }

    #[test]
    fn test_count_zero_is_rejected() {
        assert!(Args::try_parse_from(["dungeon-graph", "--count", "0"]).is_err());
        assert!(Args::try_parse_from(["dungeon-graph", "-n", "0"]).is_err());
        let args = Args::try_parse_from(["dungeon-graph", "-n", "3"]).unwrap();
        assert_eq!(args.count, 3);
    }
}
