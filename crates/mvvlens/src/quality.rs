use std::collections::HashSet;

use crate::company::Company;
use crate::lexical::{self, Tokenize};

// Fixed blend for the overall grade. Comprehensiveness leads: with fields
// missing, the other two sub-scores measure very little.
const COMPREHENSIVENESS_WEIGHT: f32 = 0.4;
const SPECIFICITY_WEIGHT: f32 = 0.3;
const CONSISTENCY_WEIGHT: f32 = 0.3;

/// Characters at which a field earns full length credit.
const ADEQUATE_CHARS: usize = 20;

/// Thematic overlap between the three fields that earns the full
/// consistency score. Less reads as disjoint, much more as duplication.
const IDEAL_OVERLAP: f32 = 0.3;

/// Boilerplate hits at or beyond this exhaust the specificity penalty.
const BOILERPLATE_HIT_CAP: usize = 4;

/// Stock phrases that say nothing about a particular company.
const BOILERPLATE_PHRASES: &[&str] = &[
  "world-class",
  "world class",
  "industry-leading",
  "industry leading",
  "best-in-class",
  "best in class",
  "cutting-edge",
  "cutting edge",
  "state-of-the-art",
  "leading company",
  "innovative solutions",
  "paradigm shift",
  "synergy",
  "value-added",
  // and their Japanese counterparts
  "業界をリード",
  "世界最高水準",
  "ナンバーワン",
  "イノベーションを推進",
  "社会に貢献",
];

/// Rule-based quality grade for one company's MVV text. Sub-scores and the
/// overall grade are all in [0, 100]; no other company is consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityScore {
  pub company_id: String,
  pub comprehensiveness: f32,
  pub specificity: f32,
  pub consistency: f32,
  pub overall_quality: f32,
  pub suggestions: Vec<String>,
}

pub fn score(company: &Company, tokenizer: &dyn Tokenize) -> QualityScore {
  let mission = company.mission.clone().unwrap_or_default();
  let vision = company.vision.clone().unwrap_or_default();
  let values = company.values_text();

  let comprehensiveness = comprehensiveness(&mission, &vision, &values);
  let specificity = specificity(tokenizer, &format!("{mission} {vision} {values}"));
  let consistency = consistency(tokenizer, &mission, &vision, &values);

  let overall_quality = (COMPREHENSIVENESS_WEIGHT * comprehensiveness
    + SPECIFICITY_WEIGHT * specificity
    + CONSISTENCY_WEIGHT * consistency)
    .clamp(0.0, 100.0);

  let suggestions =
    suggestions(&mission, &vision, &values, comprehensiveness, specificity, consistency);

  QualityScore {
    company_id: company.id.clone(),
    comprehensiveness,
    specificity,
    consistency,
    overall_quality,
    suggestions,
  }
}

/// Presence and adequate length of all three fields, each worth a third.
fn comprehensiveness(mission: &str, vision: &str, values: &str) -> f32 {
  let field_credit = |text: &str| -> f32 {
    if text.is_empty() {
      return 0.0;
    }
    (text.chars().count() as f32 / ADEQUATE_CHARS as f32).min(1.0)
  };

  (field_credit(mission) + field_credit(vision) + field_credit(values)) / 3.0 * 100.0
}

/// Lexical diversity rewarded, stock phrases penalized.
fn specificity(tokenizer: &dyn Tokenize, text: &str) -> f32 {
  let tokens = tokenizer.tokenize(text);
  if tokens.is_empty() {
    return 0.0;
  }

  let unique: HashSet<&String> = tokens.iter().collect();
  let diversity = unique.len() as f32 / tokens.len() as f32;

  let lowered = text.to_lowercase();
  let hits = BOILERPLATE_PHRASES.iter().filter(|phrase| lowered.contains(&phrase.to_lowercase())).count();
  let penalty = (hits as f32 / BOILERPLATE_HIT_CAP as f32).min(1.0);

  (0.6 * diversity + 0.4 * (1.0 - penalty)) * 100.0
}

/// Thematic token overlap between the fields. Scored as a band: zero
/// overlap means the three statements talk past each other, near-total
/// overlap means they repeat each other; both are penalized.
fn consistency(tokenizer: &dyn Tokenize, mission: &str, vision: &str, values: &str) -> f32 {
  let sets: Vec<HashSet<String>> = [mission, vision, values]
    .iter()
    .filter(|text| !text.is_empty())
    .map(|text| lexical::significant_tokens(tokenizer, text))
    .collect();

  if sets.len() < 2 {
    return 0.0;
  }

  let mut overlap_sum = 0.0f32;
  let mut pairs = 0usize;
  for i in 0..sets.len() {
    for j in (i + 1)..sets.len() {
      overlap_sum += lexical::jaccard(&sets[i], &sets[j]);
      pairs += 1;
    }
  }
  let overlap = overlap_sum / pairs as f32;

  if overlap <= IDEAL_OVERLAP {
    overlap / IDEAL_OVERLAP * 100.0
  } else {
    (1.0 - overlap) / (1.0 - IDEAL_OVERLAP) * 100.0
  }
}

fn suggestions(
  mission: &str,
  vision: &str,
  values: &str,
  comprehensiveness: f32,
  specificity: f32,
  consistency: f32,
) -> Vec<String> {
  let mut out = Vec::new();

  for (field, text) in [("mission", mission), ("vision", vision), ("values", values)] {
    if text.is_empty() {
      out.push(format!("Add a {field} statement; it is currently missing."));
    }
  }

  let weakest = [
    ("comprehensiveness", comprehensiveness),
    ("specificity", specificity),
    ("consistency", consistency),
  ]
  .into_iter()
  .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

  match weakest {
    Some(("comprehensiveness", score)) if score < 100.0 => {
      out.push(
        "Flesh out the shorter statements; each field should stand on its own.".to_string(),
      );
    }
    Some(("specificity", score)) if score < 100.0 => {
      out.push(
        "Replace generic phrasing with language specific to what the company actually does."
          .to_string(),
      );
    }
    Some(("consistency", score)) if score < 100.0 => {
      out.push(
        "Align the mission, vision and values around a shared theme, without repeating the same sentence three times."
          .to_string(),
      );
    }
    _ => {}
  }

  out
}
