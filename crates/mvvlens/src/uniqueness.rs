use std::collections::{HashMap, HashSet};

use crate::company::Company;
use crate::lexical::{self, Tokenize};
use crate::matrix::SimilarityMatrix;

// Fixed blend for the final distinctiveness score.
const BASE_WEIGHT: f32 = 0.30;
const INDUSTRY_WEIGHT: f32 = 0.40;
const CROSS_INDUSTRY_WEIGHT: f32 = 0.20;
const RARITY_WEIGHT: f32 = 0.10;

/// How many of a company's rarest tokens feed the rarity factor.
const RARITY_TOP_TOKENS: usize = 5;

/// Multi-factor distinctiveness of one company within the corpus.
/// Every component and the blend live in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct UniquenessScore {
  pub company_id: String,
  /// 1 − mean similarity to every other company.
  pub base_score: f32,
  /// 1 − mean similarity to same-category companies; 1.0 when the company
  /// is alone in its category (vacuously maximal distinctiveness).
  pub industry_score: f32,
  /// 1 − mean similarity to companies outside the category.
  pub cross_industry_score: f32,
  /// Inverse document frequency of the company's most distinctive tokens.
  pub rarity_score: f32,
  pub final_score: f32,
}

/// Score every company in the matrix. `companies` supplies categories and
/// MVV text; the matrix supplies the pairwise similarities (and therefore
/// inherits whatever cache/batching produced it).
pub fn score_all(
  matrix: &SimilarityMatrix,
  companies: &[&Company],
  tokenizer: &dyn Tokenize,
) -> Vec<UniquenessScore> {
  let by_id: HashMap<&str, &Company> = companies.iter().map(|c| (c.id.as_str(), *c)).collect();
  let n = matrix.len();

  // Token sets and document frequencies for the rarity factor
  let token_sets: Vec<HashSet<String>> = matrix
    .ids()
    .iter()
    .map(|id| match by_id.get(id.as_str()) {
      Some(company) => lexical::significant_tokens(tokenizer, &company.mvv_text()),
      None => HashSet::new(),
    })
    .collect();
  let mut document_frequency: HashMap<&str, usize> = HashMap::new();
  for tokens in &token_sets {
    for token in tokens {
      *document_frequency.entry(token.as_str()).or_insert(0) += 1;
    }
  }

  matrix
    .ids()
    .iter()
    .enumerate()
    .map(|(i, id)| {
      let category = by_id.get(id.as_str()).map(|c| c.category.as_str()).unwrap_or_default();
      let row = matrix.row(i);

      let mut all = MeanAccumulator::default();
      let mut same_category = MeanAccumulator::default();
      let mut other_category = MeanAccumulator::default();

      for (j, &similarity) in row.iter().enumerate() {
        if j == i {
          continue;
        }
        let peer_category =
          by_id.get(matrix.ids()[j].as_str()).map(|c| c.category.as_str()).unwrap_or_default();
        all.add(similarity);
        if peer_category == category {
          same_category.add(similarity);
        } else {
          other_category.add(similarity);
        }
      }

      let base_score = 1.0 - all.mean_or(0.0);
      let industry_score = 1.0 - same_category.mean_or(0.0);
      let cross_industry_score = 1.0 - other_category.mean_or(0.0);
      let rarity_score = rarity(&token_sets[i], &document_frequency, n);

      let final_score = (BASE_WEIGHT * base_score
        + INDUSTRY_WEIGHT * industry_score
        + CROSS_INDUSTRY_WEIGHT * cross_industry_score
        + RARITY_WEIGHT * rarity_score)
        .clamp(0.0, 1.0);

      UniquenessScore {
        company_id: id.clone(),
        base_score,
        industry_score,
        cross_industry_score,
        rarity_score,
        final_score,
      }
    })
    .collect()
}

/// Mean inverse document frequency of the company's `RARITY_TOP_TOKENS`
/// rarest tokens: 1.0 for a token no other company uses, 0.0 for one every
/// company uses. No tokens at all means no rarity signal.
fn rarity(tokens: &HashSet<String>, document_frequency: &HashMap<&str, usize>, n: usize) -> f32 {
  if tokens.is_empty() {
    return 0.0;
  }
  if n <= 1 {
    return 1.0;
  }

  let mut rarities: Vec<f32> = tokens
    .iter()
    .map(|token| {
      let df = document_frequency.get(token.as_str()).copied().unwrap_or(1);
      1.0 - (df - 1) as f32 / (n - 1) as f32
    })
    .collect();
  rarities.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
  rarities.truncate(RARITY_TOP_TOKENS);

  rarities.iter().sum::<f32>() / rarities.len() as f32
}

/// Running mean with an explicit fallback for the empty case, so "no peers"
/// turns into maximal distinctiveness instead of a division by zero.
#[derive(Debug, Default)]
struct MeanAccumulator {
  sum: f32,
  count: usize,
}

impl MeanAccumulator {
  fn add(&mut self, value: f32) {
    self.sum += value;
    self.count += 1;
  }

  fn mean_or(&self, empty_value: f32) -> f32 {
    if self.count == 0 {
      empty_value
    } else {
      self.sum / self.count as f32
    }
  }
}
