use crate::company::Company;
use crate::lexical::{self, Tokenize};
use crate::similarity;

/// Tuned scoring constants. The blend weights and the affine rescale are UX
/// decisions, not derived mathematics. They live here so they can be
/// adjusted and tested without touching the scoring structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
  /// Weight of embedding cosine similarity in the raw blend.
  pub embedding: f32,
  /// Weight of lexical (Jaccard) similarity in the raw blend.
  pub text: f32,
  /// Flat bonus applied when both companies share a category.
  pub category_bonus: f32,
  /// Gain of the affine rescale stretching the raw score distribution.
  pub rescale_gain: f32,
  /// Offset of the affine rescale.
  pub rescale_offset: f32,
}

impl Default for ScoreWeights {
  fn default() -> Self {
    Self {
      embedding: 0.70,
      text: 0.25,
      category_bonus: 0.15,
      rescale_gain: 1.3,
      rescale_offset: 0.2,
    }
  }
}

impl ScoreWeights {
  /// Apply the affine rescale, capped at 1.0. Monotonic in `raw`, so it
  /// never reorders a ranking.
  pub fn rescale(&self, raw: f32) -> f32 {
    (raw * self.rescale_gain + self.rescale_offset).min(1.0)
  }
}

/// Combined similarity score for a company pair, in [0, 1].
///
/// `raw = embedding·cosine + text·jaccard + category_bonus·same_category`,
/// then rescaled. Identical ids short-circuit to exactly 1.0: a company is
/// always fully similar to itself, whatever its data looks like.
pub fn combined_score(
  weights: &ScoreWeights,
  tokenizer: &dyn Tokenize,
  a: &Company,
  b: &Company,
) -> f32 {
  if a.id == b.id {
    return 1.0;
  }

  let embedding_sim = similarity::cosine_opt(a.embedding.as_deref(), b.embedding.as_deref());
  let text_sim = lexical::text_similarity(tokenizer, &a.mvv_text(), &b.mvv_text());
  let category_match = if a.category == b.category { 1.0 } else { 0.0 };

  if a.embedding.is_none() || b.embedding.is_none() {
    tracing::debug!(pair = %format!("{}/{}", a.id, b.id), "missing embedding, scoring degrades to text");
  }

  let raw =
    weights.embedding * embedding_sim + weights.text * text_sim + weights.category_bonus * category_match;

  weights.rescale(raw)
}

/// Cheap first-pass score: embedding similarity only, no rescale. Used by
/// the quick ranking pass where O(n) calls must stay inexpensive.
pub fn quick_score(a: &Company, b: &Company) -> f32 {
  if a.id == b.id {
    return 1.0;
  }
  similarity::cosine_opt(a.embedding.as_deref(), b.embedding.as_deref())
}
