use std::collections::HashMap;

use crate::cache::SimilarityCache;
use crate::company::Company;
use crate::lexical::Tokenize;
use crate::scorer::{self, ScoreWeights};

/// Pairs scored per step before control returns to the caller. Keeps a full
/// n×n fill from blocking an event loop.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Dense symmetric similarity matrix over a fixed id ordering.
/// Diagonal is 1.0; only the upper triangle is ever computed, the mirror
/// half is written at the same time.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
  ids: Vec<String>,
  index: HashMap<String, usize>,
  values: Vec<f32>,
}

impl SimilarityMatrix {
  fn new(ids: Vec<String>) -> Self {
    let n = ids.len();
    let index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
    let mut values = vec![0.0; n * n];
    for i in 0..n {
      values[i * n + i] = 1.0;
    }
    Self { ids, index, values }
  }

  pub fn ids(&self) -> &[String] {
    &self.ids
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  pub fn get(&self, i: usize, j: usize) -> f32 {
    self.values[i * self.ids.len() + j]
  }

  pub fn get_by_id(&self, id_a: &str, id_b: &str) -> Option<f32> {
    let &i = self.index.get(id_a)?;
    let &j = self.index.get(id_b)?;
    Some(self.get(i, j))
  }

  pub fn row(&self, i: usize) -> &[f32] {
    let n = self.ids.len();
    &self.values[i * n..(i + 1) * n]
  }

  pub fn index_of(&self, id: &str) -> Option<usize> {
    self.index.get(id).copied()
  }

  fn set_symmetric(&mut self, i: usize, j: usize, value: f32) {
    let n = self.ids.len();
    self.values[i * n + j] = value;
    self.values[j * n + i] = value;
  }
}

/// Progress report yielded after each completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixProgress {
  pub completed_pairs: usize,
  pub total_pairs: usize,
}

/// Batched upper-triangle fill of the similarity matrix.
///
/// Each `next()` scores up to `batch_size` uncached pairs and returns,
/// which is the engine's only suspension point: the caller decides when
/// the next batch runs. Dropping the builder abandons the fill; already
/// computed pair scores stay in the cache for the next attempt.
pub struct MatrixBuilder<'a> {
  companies: Vec<&'a Company>,
  cache: &'a mut SimilarityCache,
  weights: &'a ScoreWeights,
  tokenizer: &'a dyn Tokenize,
  batch_size: usize,
  pairs: Vec<(usize, usize)>,
  cursor: usize,
  matrix: SimilarityMatrix,
}

impl<'a> MatrixBuilder<'a> {
  pub fn new(
    companies: Vec<&'a Company>,
    cache: &'a mut SimilarityCache,
    weights: &'a ScoreWeights,
    tokenizer: &'a dyn Tokenize,
    batch_size: usize,
  ) -> Self {
    let ids: Vec<String> = companies.iter().map(|c| c.id.clone()).collect();
    let n = companies.len();
    let mut pairs = Vec::with_capacity(n.saturating_sub(1) * n / 2);
    for i in 0..n {
      for j in (i + 1)..n {
        pairs.push((i, j));
      }
    }

    Self {
      companies,
      cache,
      weights,
      tokenizer,
      batch_size: batch_size.max(1),
      pairs,
      cursor: 0,
      matrix: SimilarityMatrix::new(ids),
    }
  }

  pub fn total_pairs(&self) -> usize {
    self.pairs.len()
  }

  pub fn is_complete(&self) -> bool {
    self.cursor >= self.pairs.len()
  }

  /// Drain the remaining batches and return the completed matrix.
  pub fn finish(mut self) -> SimilarityMatrix {
    while self.next().is_some() {}
    self.matrix
  }

  fn score_pair(&mut self, i: usize, j: usize) -> f32 {
    let a = self.companies[i];
    let b = self.companies[j];
    if let Some(score) = self.cache.get(&a.id, &b.id) {
      return score;
    }
    let score = scorer::combined_score(self.weights, self.tokenizer, a, b);
    self.cache.set(&a.id, &b.id, score);
    score
  }
}

impl Iterator for MatrixBuilder<'_> {
  type Item = MatrixProgress;

  fn next(&mut self) -> Option<Self::Item> {
    if self.is_complete() {
      return None;
    }

    let end = (self.cursor + self.batch_size).min(self.pairs.len());
    for k in self.cursor..end {
      let (i, j) = self.pairs[k];
      let score = self.score_pair(i, j);
      self.matrix.set_symmetric(i, j, score);
    }
    self.cursor = end;

    tracing::debug!(completed = self.cursor, total = self.pairs.len(), "matrix batch scored");

    Some(MatrixProgress { completed_pairs: self.cursor, total_pairs: self.pairs.len() })
  }
}

/// Which pass produced a ranking snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingPhase {
  /// Embedding-only scores, available after one O(n) sweep.
  Quick,
  /// Combined scores for some or all ranked entries.
  Refined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCompany {
  pub id: String,
  pub score: f32,
}

/// A full ranking, re-published after every refinement step. The entry
/// order may change between snapshots; the caller always receives the
/// complete current list, never a delta.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingSnapshot {
  pub phase: RankingPhase,
  /// How many entries carry a refined (combined) score so far.
  pub refined: usize,
  pub entries: Vec<RankedCompany>,
}

/// Two-pass top-K search as an iterator of ranking snapshots.
///
/// The first `next()` quick-scores every candidate (embedding cosine only),
/// sorts, and yields the provisional top-K. Each following `next()` refines
/// one batch of those entries with the combined scorer (cache-checked),
/// re-sorts, and yields the updated list, until all K are refined. Dropping
/// the iterator cancels the search; there is no callback to go stale.
pub struct TopSimilarSearch<'a> {
  target: &'a Company,
  candidates: Vec<&'a Company>,
  cache: &'a mut SimilarityCache,
  weights: &'a ScoreWeights,
  tokenizer: &'a dyn Tokenize,
  batch_size: usize,
  k: usize,
  // Indices into `candidates`, paired with the current best-known score.
  ranked: Vec<(usize, f32)>,
  refined: usize,
  started: bool,
}

impl<'a> TopSimilarSearch<'a> {
  pub fn new(
    target: &'a Company,
    candidates: Vec<&'a Company>,
    cache: &'a mut SimilarityCache,
    weights: &'a ScoreWeights,
    tokenizer: &'a dyn Tokenize,
    batch_size: usize,
    k: usize,
  ) -> Self {
    Self {
      target,
      candidates,
      cache,
      weights,
      tokenizer,
      batch_size: batch_size.max(1),
      k,
      ranked: Vec::new(),
      refined: 0,
      started: false,
    }
  }

  /// Run both passes to the end and return the final refined ranking.
  pub fn finish(mut self) -> Vec<RankedCompany> {
    let mut last = Vec::new();
    while let Some(snapshot) = self.next() {
      last = snapshot.entries;
    }
    last
  }

  fn sort_ranked(&mut self) {
    let candidates = &self.candidates;
    self.ranked.sort_by(|a, b| {
      b.1
        .partial_cmp(&a.1)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| candidates[a.0].id.cmp(&candidates[b.0].id))
    });
  }

  fn snapshot(&self, phase: RankingPhase) -> RankingSnapshot {
    RankingSnapshot {
      phase,
      refined: self.refined,
      entries: self
        .ranked
        .iter()
        .map(|&(i, score)| RankedCompany { id: self.candidates[i].id.clone(), score })
        .collect(),
    }
  }
}

impl Iterator for TopSimilarSearch<'_> {
  type Item = RankingSnapshot;

  fn next(&mut self) -> Option<Self::Item> {
    if !self.started {
      self.started = true;

      // Quick pass: cheap scores for every candidate, keep the top K.
      self.ranked = self
        .candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.id != self.target.id)
        .map(|(i, c)| (i, scorer::quick_score(self.target, c)))
        .collect();
      self.sort_ranked();
      self.ranked.truncate(self.k);

      tracing::debug!(target = %self.target.id, candidates = self.candidates.len(), "quick ranking published");
      return Some(self.snapshot(RankingPhase::Quick));
    }

    if self.refined >= self.ranked.len() {
      return None;
    }

    // Refinement pass: combined scores for the next batch of entries. The
    // entries were picked by quick score, so refinement order follows that
    // provisional ranking even as re-sorting shuffles the published list.
    let end = (self.refined + self.batch_size).min(self.ranked.len());
    for slot in self.refined..end {
      let (candidate_idx, _) = self.ranked[slot];
      let candidate = self.candidates[candidate_idx];
      let score = match self.cache.get(&self.target.id, &candidate.id) {
        Some(score) => score,
        None => {
          let score =
            scorer::combined_score(self.weights, self.tokenizer, self.target, candidate);
          self.cache.set(&self.target.id, &candidate.id, score);
          score
        }
      };
      self.ranked[slot].1 = score;
    }
    self.refined = end;
    self.sort_ranked();

    Some(self.snapshot(RankingPhase::Refined))
  }
}
