use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::corpus::{Corpus, CorpusStats};
use crate::engine::Engine;
use crate::matrix::RankingPhase;

fn load_engine(corpus_path: &Path) -> Result<Engine<Corpus>> {
  let corpus = Corpus::load(corpus_path)?;
  Ok(Engine::new(corpus))
}

/// Print corpus-level diagnostics: counts, categories, MVV fill rates.
pub fn show_stats(corpus_path: &Path) -> Result<()> {
  let corpus = Corpus::load(corpus_path)?;
  let stats = corpus.stats();

  println!("{} companies loaded", stats.total.to_string().cyan().bold());
  println!(
    "  complete MVV: {} ({:.1}%)",
    stats.complete_mvv,
    CorpusStats::fill_rate(stats.complete_mvv, stats.total)
  );
  println!(
    "  with embedding: {} ({:.1}%)",
    stats.with_embedding,
    CorpusStats::fill_rate(stats.with_embedding, stats.total)
  );

  println!("\n{}", "MVV fill rates".bold());
  for (field, filled) in [
    ("mission", stats.mission_filled),
    ("vision", stats.vision_filled),
    ("values", stats.values_filled),
  ] {
    println!(
      "  {:<8} {}/{} ({:.1}%)",
      field,
      filled,
      stats.total,
      CorpusStats::fill_rate(filled, stats.total)
    );
  }

  println!("\n{}", "Categories".bold());
  for (category, count) in &stats.category_counts {
    println!("  {:<24} {}", category.blue(), count);
  }

  Ok(())
}

/// Print the combined similarity of one pair.
pub fn show_pair(corpus_path: &Path, id_a: &str, id_b: &str) -> Result<()> {
  let mut engine = load_engine(corpus_path)?;
  let score = engine.compute_similarity(id_a, id_b)?;
  println!("{} ~ {}: {}", id_a.cyan(), id_b.cyan(), format!("{score:.3}").yellow().bold());
  Ok(())
}

/// Run the progressive top-K search, printing each snapshot as it lands.
pub fn show_similar(corpus_path: &Path, target_id: &str, k: usize) -> Result<()> {
  let mut engine = load_engine(corpus_path)?;
  let search = engine.find_top_similar(target_id, k)?;

  for snapshot in search {
    let label = match snapshot.phase {
      RankingPhase::Quick => "quick (embedding only)".to_string(),
      RankingPhase::Refined => {
        format!("refined {}/{}", snapshot.refined, snapshot.entries.len())
      }
    };
    println!("{}", format!("=== {label} ===").bold());
    for (rank, entry) in snapshot.entries.iter().enumerate() {
      println!(
        "  {:>2}. {:<24} {}",
        rank + 1,
        entry.id.cyan(),
        format!("{:.3}", entry.score).yellow()
      );
    }
  }

  Ok(())
}

/// Compute the positioning map and print one row per company.
pub fn show_map(corpus_path: &Path) -> Result<()> {
  let mut engine = load_engine(corpus_path)?;
  let positions = engine.compute_positions();

  println!("{:<24} {:>8} {:>8}  {}", "company".bold(), "x", "y", "cluster".bold());
  for position in positions {
    println!(
      "{:<24} {:>8.3} {:>8.3}  {}",
      position.company_id.cyan(),
      position.x,
      position.y,
      position.cluster.blue()
    );
  }

  Ok(())
}

/// Rank the corpus by uniqueness and print scores with their factors.
pub fn show_uniqueness(corpus_path: &Path) -> Result<()> {
  let mut engine = load_engine(corpus_path)?;
  let mut scores = engine.compute_uniqueness();
  scores.sort_by(|a, b| {
    b.final_score
      .partial_cmp(&a.final_score)
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| a.company_id.cmp(&b.company_id))
  });

  println!(
    "{:<4} {:<24} {:>6} {:>6} {:>6} {:>6} {:>6}",
    "rank",
    "company".bold(),
    "final",
    "base",
    "indus",
    "cross",
    "rare"
  );
  for (rank, score) in scores.iter().enumerate() {
    println!(
      "{:<4} {:<24} {} {:>6.3} {:>6.3} {:>6.3} {:>6.3}",
      rank + 1,
      score.company_id.cyan(),
      format!("{:>6.3}", score.final_score).yellow().bold(),
      score.base_score,
      score.industry_score,
      score.cross_industry_score,
      score.rarity_score
    );
  }

  Ok(())
}

/// Print one company's quality grade and improvement suggestions.
pub fn show_quality(corpus_path: &Path, id: &str) -> Result<()> {
  let engine = load_engine(corpus_path)?;
  let grade = engine.compute_quality(id)?;

  println!("{}", id.cyan().bold());
  println!("  overall:           {}", format!("{:.0}", grade.overall_quality).yellow().bold());
  println!("  comprehensiveness: {:.0}", grade.comprehensiveness);
  println!("  specificity:       {:.0}", grade.specificity);
  println!("  consistency:       {:.0}", grade.consistency);

  if !grade.suggestions.is_empty() {
    println!("\n{}", "Suggestions".bold());
    for suggestion in &grade.suggestions {
      println!("  - {suggestion}");
    }
  }

  Ok(())
}
