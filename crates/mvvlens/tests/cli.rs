use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Write a small fixture corpus and return its path.
fn fixture_corpus(dir: &TempDir) -> PathBuf {
  let path = dir.path().join("corpus.json");
  let corpus = serde_json::json!([
    {
      "id": "hardware",
      "name": "Hardware & Sons",
      "category": "manufacturing",
      "mission": "Craft durable tools for working hands",
      "vision": "A workshop in every neighborhood",
      "values": ["craftsmanship", "honesty"],
      "embedding": [0.9, 0.1, 0.0]
    },
    {
      "id": "toolworks",
      "category": "manufacturing",
      "mission": "Build reliable tools for makers",
      "vision": "Tools that outlive their owners",
      "values": ["durability"],
      "embedding": [0.8, 0.2, 0.0]
    },
    {
      "id": "grid",
      "category": "energy",
      "mission": "Power every home with clean energy",
      "embedding": [0.0, 0.9, 0.1]
    },
    {
      "id": "blank",
      "category": "services"
    }
  ]);
  std::fs::write(&path, serde_json::to_string_pretty(&corpus).unwrap()).unwrap();
  path
}

fn mvvlens_cmd(corpus: &PathBuf) -> Command {
  let mut cmd = Command::cargo_bin("mvvlens").expect("binary exists");
  cmd.arg("--corpus").arg(corpus);
  cmd
}

#[test]
fn stats_reports_counts_and_fill_rates() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .arg("stats")
    .assert()
    .success()
    .stdout(contains("4 companies loaded").and(contains("manufacturing")).and(contains("mission")));
}

#[test]
fn pair_prints_a_score() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .args(["pair", "hardware", "toolworks"])
    .assert()
    .success()
    .stdout(contains("hardware").and(contains("toolworks")));
}

#[test]
fn pair_with_unknown_id_fails() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .args(["pair", "hardware", "ghost"])
    .assert()
    .failure()
    .stderr(contains("unknown company id"));
}

#[test]
fn similar_prints_quick_and_refined_passes() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .args(["similar", "hardware", "-k", "2"])
    .assert()
    .success()
    .stdout(contains("quick").and(contains("refined")).and(contains("toolworks")));
}

#[test]
fn map_lists_every_company_with_its_cluster() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .arg("map")
    .assert()
    .success()
    .stdout(
      contains("hardware")
        .and(contains("toolworks"))
        .and(contains("grid"))
        .and(contains("blank"))
        .and(contains("energy")),
    );
}

#[test]
fn uniqueness_ranks_the_corpus() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .arg("uniqueness")
    .assert()
    .success()
    .stdout(contains("rank").and(contains("grid")));
}

#[test]
fn quality_prints_grades_and_suggestions() {
  let temp = TempDir::new().unwrap();
  let corpus = fixture_corpus(&temp);

  mvvlens_cmd(&corpus)
    .args(["quality", "grid"])
    .assert()
    .success()
    .stdout(contains("comprehensiveness").and(contains("vision")));
}

#[test]
fn missing_corpus_file_fails_cleanly() {
  let temp = TempDir::new().unwrap();
  let corpus = temp.path().join("nope.json");

  Command::cargo_bin("mvvlens")
    .unwrap()
    .arg("--corpus")
    .arg(&corpus)
    .arg("stats")
    .assert()
    .failure()
    .stderr(contains("Failed to read corpus file"));
}
