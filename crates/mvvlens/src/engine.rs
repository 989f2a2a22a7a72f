use thiserror::Error;

use crate::cache::{CacheStats, SimilarityCache, DEFAULT_CACHE_CAPACITY};
use crate::company::{Company, CompanyStore};
use crate::lexical::{Tokenize, WordTokenizer};
use crate::matrix::{MatrixBuilder, SimilarityMatrix, TopSimilarSearch, DEFAULT_BATCH_SIZE};
use crate::positions::{self, Position};
use crate::quality::{self, QualityScore};
use crate::scorer::{self, ScoreWeights};
use crate::uniqueness::{self, UniquenessScore};

/// Asking about an id the record store has never seen is a caller bug, not
/// a data-quality problem. It is the one condition surfaced as an error.
/// Sparse or missing MVV data never is; it degrades scores instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
  #[error("unknown company id: {id}")]
  UnknownCompanyId { id: String },
}

/// Engine tuning knobs. Constructed by the host application and handed to
/// `Engine::new`; nothing in here is global state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  pub cache_capacity: usize,
  pub batch_size: usize,
  pub weights: ScoreWeights,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      cache_capacity: DEFAULT_CACHE_CAPACITY,
      batch_size: DEFAULT_BATCH_SIZE,
      weights: ScoreWeights::default(),
    }
  }
}

/// The similarity & analytics engine: pairwise scores, progressive top-K
/// search, full-matrix positioning, uniqueness and quality.
///
/// Owns the similarity cache for one application session; create it once,
/// drop it on reset. Everything runs on the caller's thread; long
/// computations hand control back between batches instead of spawning
/// anything.
pub struct Engine<S: CompanyStore> {
  store: S,
  cache: SimilarityCache,
  config: EngineConfig,
  tokenizer: Box<dyn Tokenize>,
}

impl<S: CompanyStore> Engine<S> {
  pub fn new(store: S) -> Self {
    Self::with_config(store, EngineConfig::default())
  }

  pub fn with_config(store: S, config: EngineConfig) -> Self {
    Self {
      store,
      cache: SimilarityCache::new(config.cache_capacity),
      config,
      tokenizer: Box::new(WordTokenizer),
    }
  }

  /// Swap in an external tokenizer implementation.
  pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenize>) -> Self {
    self.tokenizer = tokenizer;
    self
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn cache_stats(&self) -> CacheStats {
    self.cache.stats()
  }

  /// Replace the record store, e.g. after a corpus reload. The cache holds
  /// scores for the old records, so it is cleared wholesale.
  pub fn set_store(&mut self, store: S) {
    self.store = store;
    self.cache.clear();
  }

  /// Drop cached scores involving `id`. Call after one company is added,
  /// removed, or re-embedded. Returns how many entries were dropped.
  pub fn invalidate(&mut self, id: &str) -> usize {
    self.cache.invalidate(id)
  }

  pub fn invalidate_all(&mut self) {
    self.cache.clear();
  }

  fn lookup(&self, id: &str) -> Result<&Company, EngineError> {
    self.store.get(id).ok_or_else(|| EngineError::UnknownCompanyId { id: id.to_string() })
  }

  /// Combined similarity for one pair, cached. Symmetric in its arguments;
  /// identical ids return exactly 1.0.
  pub fn compute_similarity(&mut self, id_a: &str, id_b: &str) -> Result<f32, EngineError> {
    let Self { store, cache, config, tokenizer } = self;
    let a = store.get(id_a).ok_or_else(|| EngineError::UnknownCompanyId { id: id_a.to_string() })?;
    let b = store.get(id_b).ok_or_else(|| EngineError::UnknownCompanyId { id: id_b.to_string() })?;
    if a.id == b.id {
      return Ok(1.0);
    }

    if let Some(score) = cache.get(id_a, id_b) {
      return Ok(score);
    }

    let score = scorer::combined_score(&config.weights, tokenizer.as_ref(), a, b);
    cache.set(id_a, id_b, score);
    Ok(score)
  }

  /// Progressive top-K search against the whole corpus: quick snapshot
  /// first, then refined snapshots. See [`TopSimilarSearch`].
  pub fn find_top_similar(
    &mut self,
    target_id: &str,
    k: usize,
  ) -> Result<TopSimilarSearch<'_>, EngineError> {
    let target = self
      .store
      .get(target_id)
      .ok_or_else(|| EngineError::UnknownCompanyId { id: target_id.to_string() })?;
    let candidates: Vec<&Company> = self.store.companies().iter().collect();

    Ok(TopSimilarSearch::new(
      target,
      candidates,
      &mut self.cache,
      &self.config.weights,
      self.tokenizer.as_ref(),
      self.config.batch_size,
      k,
    ))
  }

  /// Batched full-matrix fill over the whole corpus. The caller drives the
  /// iterator (and may interleave other work between batches) or calls
  /// `finish()` to run it to the end.
  pub fn matrix_builder(&mut self) -> MatrixBuilder<'_> {
    MatrixBuilder::new(
      self.store.companies().iter().collect(),
      &mut self.cache,
      &self.config.weights,
      self.tokenizer.as_ref(),
      self.config.batch_size,
    )
  }

  /// Complete similarity matrix, computed in one go.
  pub fn compute_matrix(&mut self) -> SimilarityMatrix {
    self.matrix_builder().finish()
  }

  /// 2-D positioning map of the whole corpus via classical MDS.
  pub fn compute_positions(&mut self) -> Vec<Position> {
    let matrix = self.compute_matrix();
    let companies: Vec<&Company> = self.store.companies().iter().collect();
    let positions = positions::project(&matrix, &companies);
    tracing::info!(companies = positions.len(), "positions computed");
    positions
  }

  /// Uniqueness scores for the whole corpus, in store order.
  pub fn compute_uniqueness(&mut self) -> Vec<UniquenessScore> {
    let matrix = self.compute_matrix();
    let companies: Vec<&Company> = self.store.companies().iter().collect();
    uniqueness::score_all(&matrix, &companies, self.tokenizer.as_ref())
  }

  /// Quality grade for one company. Needs no other records and no cache.
  pub fn compute_quality(&self, id: &str) -> Result<QualityScore, EngineError> {
    let company = self.lookup(id)?;
    Ok(quality::score(company, self.tokenizer.as_ref()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::corpus::Corpus;

  fn company(id: &str, category: &str, mission: &str, embedding: Vec<f32>) -> Company {
    let mut company = Company::new(id, category);
    if !mission.is_empty() {
      company.mission = Some(mission.to_string());
    }
    if !embedding.is_empty() {
      company.embedding = Some(embedding);
    }
    company
  }

  fn small_engine() -> Engine<Corpus> {
    let corpus = Corpus::new(vec![
      company("alpha", "retail", "serve every neighborhood", vec![1.0, 0.0]),
      company("beta", "retail", "serve every customer", vec![0.9, 0.1]),
      company("gamma", "energy", "power the grid", vec![0.0, 1.0]),
    ])
    .unwrap();
    Engine::new(corpus)
  }

  #[test]
  fn similarity_is_symmetric() {
    let mut engine = small_engine();
    let ab = engine.compute_similarity("alpha", "beta").unwrap();
    let ba = engine.compute_similarity("beta", "alpha").unwrap();
    assert_eq!(ab, ba);
  }

  #[test]
  fn self_similarity_is_one() {
    let mut engine = small_engine();
    assert_eq!(engine.compute_similarity("alpha", "alpha").unwrap(), 1.0);
  }

  #[test]
  fn unknown_id_is_an_error() {
    let mut engine = small_engine();
    let err = engine.compute_similarity("alpha", "ghost").unwrap_err();
    assert_eq!(err, EngineError::UnknownCompanyId { id: "ghost".to_string() });
  }

  #[test]
  fn second_lookup_hits_the_cache() {
    let mut engine = small_engine();
    engine.compute_similarity("alpha", "beta").unwrap();
    engine.compute_similarity("beta", "alpha").unwrap();
    assert_eq!(engine.cache_stats().hits, 1);
    assert_eq!(engine.cache_stats().insertions, 1);
  }

  #[test]
  fn invalidate_forces_recomputation() {
    let mut engine = small_engine();
    engine.compute_similarity("alpha", "beta").unwrap();
    assert_eq!(engine.invalidate("alpha"), 1);
    engine.compute_similarity("alpha", "beta").unwrap();
    assert_eq!(engine.cache_stats().insertions, 2);
  }

  #[test]
  fn top_similar_streams_quick_then_refined() {
    let mut engine = small_engine();
    let snapshots: Vec<_> = engine.find_top_similar("alpha", 2).unwrap().collect();
    assert!(snapshots.len() >= 2);
    assert_eq!(snapshots[0].phase, crate::matrix::RankingPhase::Quick);
    let last = snapshots.last().unwrap();
    assert_eq!(last.refined, last.entries.len());
    assert_eq!(last.entries[0].id, "beta");
  }

  #[test]
  fn top_similar_rejects_unknown_target() {
    let mut engine = small_engine();
    assert!(engine.find_top_similar("ghost", 3).is_err());
  }

  #[test]
  fn positions_cover_the_corpus() {
    let mut engine = small_engine();
    let positions = engine.compute_positions();
    assert_eq!(positions.len(), 3);
    assert_eq!(positions[0].cluster, "retail");
  }

  #[test]
  fn uniqueness_covers_the_corpus() {
    let mut engine = small_engine();
    let scores = engine.compute_uniqueness();
    assert_eq!(scores.len(), 3);
    let gamma = scores.iter().find(|s| s.company_id == "gamma").unwrap();
    assert_eq!(gamma.industry_score, 1.0);
  }

  #[test]
  fn quality_rejects_unknown_id() {
    let engine = small_engine();
    assert!(engine.compute_quality("ghost").is_err());
  }

  #[test]
  fn set_store_clears_the_cache() {
    let mut engine = small_engine();
    engine.compute_similarity("alpha", "beta").unwrap();
    let corpus = Corpus::new(vec![
      company("alpha", "retail", "a different mission entirely", vec![0.0, 1.0]),
      company("beta", "retail", "serve every customer", vec![0.9, 0.1]),
    ])
    .unwrap();
    engine.set_store(corpus);
    engine.compute_similarity("alpha", "beta").unwrap();
    // both computations inserted: the cache did not survive the reload
    assert_eq!(engine.cache_stats().insertions, 2);
  }
}
