use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::company::{Company, CompanyStore};

/// In-memory company corpus with id lookup. This is the record store the
/// engine reads from; loading and cleaning happen here, analysis does not.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
  companies: Vec<Company>,
  index: HashMap<String, usize>,
}

impl Corpus {
  pub fn new(companies: Vec<Company>) -> Result<Self> {
    let mut corpus = Corpus::default();
    for company in companies {
      corpus.push(company)?;
    }
    Ok(corpus)
  }

  /// Load a corpus from a JSON array of company records.
  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
    let raw: Vec<Company> = serde_json::from_str(&content)
      .with_context(|| format!("Invalid corpus JSON in {}", path.display()))?;

    let mut corpus = Corpus::default();
    for company in raw {
      corpus.push(clean_company(company))?;
    }

    tracing::info!(companies = corpus.len(), "corpus loaded");
    Ok(corpus)
  }

  fn push(&mut self, company: Company) -> Result<()> {
    if company.id.is_empty() {
      return Err(anyhow!("Company record with empty id"));
    }
    if self.index.contains_key(&company.id) {
      return Err(anyhow!("Duplicate company id {}", company.id));
    }
    self.index.insert(company.id.clone(), self.companies.len());
    self.companies.push(company);
    Ok(())
  }

  /// All company ids in corpus order.
  pub fn ids(&self) -> Vec<String> {
    self.companies.iter().map(|c| c.id.clone()).collect()
  }

  /// Companies grouped by category, categories sorted.
  pub fn by_category(&self) -> Vec<(String, Vec<&Company>)> {
    let mut groups: HashMap<&str, Vec<&Company>> = HashMap::new();
    for company in &self.companies {
      groups.entry(company.category.as_str()).or_default().push(company);
    }

    let mut grouped: Vec<(String, Vec<&Company>)> =
      groups.into_iter().map(|(category, members)| (category.to_string(), members)).collect();
    grouped.sort_by(|a, b| a.0.cmp(&b.0));
    grouped
  }

  pub fn stats(&self) -> CorpusStats {
    let total = self.companies.len();
    let mission_filled =
      self.companies.iter().filter(|c| c.mission.as_deref().is_some_and(|m| !m.is_empty())).count();
    let vision_filled =
      self.companies.iter().filter(|c| c.vision.as_deref().is_some_and(|v| !v.is_empty())).count();
    let values_filled =
      self.companies.iter().filter(|c| c.values.as_deref().is_some_and(|v| !v.is_empty())).count();
    let complete_mvv = self.companies.iter().filter(|c| c.has_complete_mvv()).count();
    let with_embedding = self.companies.iter().filter(|c| c.has_embedding()).count();

    let mut category_counts: Vec<(String, usize)> =
      self.by_category().into_iter().map(|(category, members)| (category, members.len())).collect();
    // Largest categories first, name as tie-break
    category_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    CorpusStats {
      total,
      mission_filled,
      vision_filled,
      values_filled,
      complete_mvv,
      with_embedding,
      category_counts,
    }
  }

  /// Compute embeddings for companies that lack one. Companies with no MVV
  /// text at all are left untouched, since there is nothing to embed.
  pub fn backfill_embeddings(&mut self, provider: &mut dyn EmbeddingProvider) -> Result<usize> {
    let pending: Vec<usize> = self
      .companies
      .iter()
      .enumerate()
      .filter(|(_, c)| !c.has_embedding() && !c.mvv_text().is_empty())
      .map(|(i, _)| i)
      .collect();

    if pending.is_empty() {
      return Ok(0);
    }

    let texts: Vec<String> = pending.iter().map(|&i| self.companies[i].combined_mvv()).collect();
    let embeddings = provider.embed(&texts)?;
    if embeddings.len() != texts.len() {
      return Err(anyhow!(
        "Embedding provider returned {} vectors for {} texts",
        embeddings.len(),
        texts.len()
      ));
    }

    for (&i, embedding) in pending.iter().zip(embeddings) {
      self.companies[i].embedding = Some(embedding);
    }

    tracing::info!(backfilled = pending.len(), "embeddings backfilled");
    Ok(pending.len())
  }
}

impl CompanyStore for Corpus {
  fn get(&self, id: &str) -> Option<&Company> {
    self.index.get(id).map(|&i| &self.companies[i])
  }

  fn companies(&self) -> &[Company] {
    &self.companies
  }
}

/// Corpus-level diagnostics: counts and MVV fill rates.
#[derive(Debug, Clone)]
pub struct CorpusStats {
  pub total: usize,
  pub mission_filled: usize,
  pub vision_filled: usize,
  pub values_filled: usize,
  pub complete_mvv: usize,
  pub with_embedding: usize,
  pub category_counts: Vec<(String, usize)>,
}

impl CorpusStats {
  pub fn fill_rate(filled: usize, total: usize) -> f32 {
    if total == 0 {
      0.0
    } else {
      filled as f32 / total as f32 * 100.0
    }
  }
}

/// Normalize a raw record: trim fields, normalize value separators, demote
/// empty strings to None.
fn clean_company(mut company: Company) -> Company {
  company.mission = company.mission.and_then(clean_text);
  company.vision = company.vision.and_then(clean_text);
  company.values = company.values.map(|values| {
    values
      .into_iter()
      // Some exports pack several values into one ;-separated cell
      .flat_map(|v| v.split(';').map(str::to_string).collect::<Vec<_>>())
      .filter_map(clean_text)
      .collect::<Vec<_>>()
  });
  if company.values.as_deref().is_some_and(|v| v.is_empty()) {
    company.values = None;
  }
  company
}

fn clean_text(text: String) -> Option<String> {
  let trimmed = text.trim().to_string();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed)
  }
}

/// Seam for the external embedding-generation service. The production
/// implementation lives outside this crate; tests use the mock below.
pub trait EmbeddingProvider {
  fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Mock embedding provider for tests: cycles through canned vectors.
#[derive(Debug, Default)]
pub struct MockEmbeddingProvider {
  pub response_embeddings: Vec<Vec<f32>>,
}

impl MockEmbeddingProvider {
  pub fn with_embeddings(embeddings: Vec<Vec<f32>>) -> Self {
    Self { response_embeddings: embeddings }
  }
}

impl EmbeddingProvider for MockEmbeddingProvider {
  fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if self.response_embeddings.is_empty() {
      return Err(anyhow!("Mock provider has no embeddings configured"));
    }
    Ok(
      texts
        .iter()
        .enumerate()
        .map(|(i, _)| self.response_embeddings[i % self.response_embeddings.len()].clone())
        .collect(),
    )
  }
}
