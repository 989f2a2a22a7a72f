use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use mvvlens::commands;

#[derive(Parser)]
#[command(name = "mvvlens")]
#[command(
  about = "mvvlens - MVV Corpus Analytics\nSimilarity, positioning, uniqueness and quality for Mission/Vision/Values records"
)]
#[command(version)]
struct Cli {
  /// Path to the corpus JSON file (an array of company records)
  #[arg(short, long, env = "MVVLENS_CORPUS")]
  corpus: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Corpus diagnostics: counts, categories, MVV fill rates
  Stats,
  /// Combined similarity score for one company pair
  Pair {
    /// First company id
    id_a: String,
    /// Second company id
    id_b: String,
  },
  /// Progressive top-K similarity search for one company
  Similar {
    /// Target company id
    id: String,
    /// How many similar companies to return
    #[arg(short, default_value_t = 5)]
    k: usize,
  },
  /// 2-D positioning map of the whole corpus
  Map,
  /// Rank the corpus by uniqueness
  Uniqueness,
  /// Quality grade and suggestions for one company
  Quality {
    /// Company id
    id: String,
  },
}

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Stats => {
      commands::show_stats(&cli.corpus)?;
    }
    Commands::Pair { id_a, id_b } => {
      commands::show_pair(&cli.corpus, &id_a, &id_b)?;
    }
    Commands::Similar { id, k } => {
      commands::show_similar(&cli.corpus, &id, k)?;
    }
    Commands::Map => {
      commands::show_map(&cli.corpus)?;
    }
    Commands::Uniqueness => {
      commands::show_uniqueness(&cli.corpus)?;
    }
    Commands::Quality { id } => {
      commands::show_quality(&cli.corpus, &id)?;
    }
  }

  Ok(())
}
