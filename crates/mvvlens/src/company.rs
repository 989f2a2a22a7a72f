use serde::{Deserialize, Serialize};

/// One company record as the surrounding application stores it. The engine
/// only reads these; mutation belongs to the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub category: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mission: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub vision: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub values: Option<Vec<String>>,

  // Embedding vector (None until the external service has produced one)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub embedding: Option<Vec<f32>>,
}

impl Company {
  pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: String::new(),
      category: category.into(),
      mission: None,
      vision: None,
      values: None,
      embedding: None,
    }
  }

  /// Values joined into one string for text handling.
  pub fn values_text(&self) -> String {
    self.values.as_deref().unwrap_or_default().join("、")
  }

  /// Plain Mission + Vision + Values concatenation, fed to the tokenizer.
  pub fn mvv_text(&self) -> String {
    let mut parts = Vec::new();
    if let Some(mission) = &self.mission {
      parts.push(mission.clone());
    }
    if let Some(vision) = &self.vision {
      parts.push(vision.clone());
    }
    if self.values.is_some() {
      parts.push(self.values_text());
    }
    parts.join(" ")
  }

  /// Labeled MVV text for embedding and display:
  /// `Mission: … | Vision: … | Values: …`, absent fields skipped.
  pub fn combined_mvv(&self) -> String {
    let mut parts = Vec::new();
    if let Some(mission) = &self.mission {
      parts.push(format!("Mission: {mission}"));
    }
    if let Some(vision) = &self.vision {
      parts.push(format!("Vision: {vision}"));
    }
    if self.values.is_some() {
      parts.push(format!("Values: {}", self.values_text()));
    }
    parts.join(" | ")
  }

  /// True when all three MVV fields are present and non-empty.
  pub fn has_complete_mvv(&self) -> bool {
    self.mission.as_deref().is_some_and(|m| !m.is_empty())
      && self.vision.as_deref().is_some_and(|v| !v.is_empty())
      && self.values.as_deref().is_some_and(|v| !v.is_empty())
  }

  pub fn has_embedding(&self) -> bool {
    self.embedding.is_some()
  }
}

/// Record accessor the engine pulls companies through.
pub trait CompanyStore {
  fn get(&self, id: &str) -> Option<&Company>;
  fn companies(&self) -> &[Company];

  fn len(&self) -> usize {
    self.companies().len()
  }

  fn is_empty(&self) -> bool {
    self.companies().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn full_company() -> Company {
    Company {
      id: "company_1".to_string(),
      name: "Acme".to_string(),
      category: "manufacturing".to_string(),
      mission: Some("Build useful things".to_string()),
      vision: Some("A world of makers".to_string()),
      values: Some(vec!["craft".to_string(), "honesty".to_string()]),
      embedding: Some(vec![0.1, 0.2]),
    }
  }

  #[test]
  fn combined_mvv_labels_all_fields() {
    let company = full_company();
    assert_eq!(
      company.combined_mvv(),
      "Mission: Build useful things | Vision: A world of makers | Values: craft、honesty"
    );
  }

  #[test]
  fn combined_mvv_skips_absent_fields() {
    let mut company = full_company();
    company.vision = None;
    assert_eq!(
      company.combined_mvv(),
      "Mission: Build useful things | Values: craft、honesty"
    );
  }

  #[test]
  fn mvv_text_is_plain_concatenation() {
    let company = full_company();
    assert_eq!(company.mvv_text(), "Build useful things A world of makers craft、honesty");
  }

  #[test]
  fn completeness_requires_all_three_fields() {
    let mut company = full_company();
    assert!(company.has_complete_mvv());

    company.values = None;
    assert!(!company.has_complete_mvv());

    company.values = Some(vec![]);
    assert!(!company.has_complete_mvv());
  }

  #[test]
  fn empty_mission_counts_as_incomplete() {
    let mut company = full_company();
    company.mission = Some(String::new());
    assert!(!company.has_complete_mvv());
  }

  #[test]
  fn deserializes_with_missing_optionals() {
    let company: Company =
      serde_json::from_str(r#"{"id": "c1", "category": "retail"}"#).unwrap();
    assert_eq!(company.id, "c1");
    assert!(company.mission.is_none());
    assert!(company.embedding.is_none());
    assert!(!company.has_embedding());
  }
}
