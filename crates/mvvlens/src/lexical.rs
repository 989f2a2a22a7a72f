use std::collections::HashSet;

/// Tokens this short carry no lexical signal and are dropped.
const MIN_TOKEN_CHARS: usize = 2;

/// Stop words filtered out before overlap scoring. English function words
/// plus the Japanese particles and light verbs that dominate MVV prose.
const STOP_WORDS: &[&str] = &[
  // Articles and determiners
  "the", "a", "an", // Conjunctions
  "and", "or", "but", // Prepositions
  "in", "on", "at", "to", "for", "of", "with", "by", "over", // Common verbs
  "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will",
  "would", "could", "should", // Pronouns
  "you", "your", "we", "our", "us", "they", "them", "their", "it", "its",
  // Japanese particles and fillers
  "の", "を", "に", "は", "が", "と", "で", "や", "へ", "から", "まで", "など", "する", "します",
  "こと", "もの", "ため", "よう", "私たち", "われわれ",
];

/// Get the stop words as a HashSet for efficient lookup
pub fn stop_words() -> HashSet<&'static str> {
  STOP_WORDS.iter().cloned().collect()
}

/// Tokenizer seam. The engine treats tokenization as an external concern;
/// `WordTokenizer` is the default implementation.
pub trait Tokenize {
  fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Whitespace tokenizer: lowercase, trim non-alphanumeric edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenize for WordTokenizer {
  fn tokenize(&self, text: &str) -> Vec<String> {
    text
      .split_whitespace()
      .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
      .filter(|word| !word.is_empty())
      .collect()
  }
}

/// Tokenize `text` and keep only meaningful tokens: at least
/// `MIN_TOKEN_CHARS` characters and not a stop word.
pub fn significant_tokens(tokenizer: &dyn Tokenize, text: &str) -> HashSet<String> {
  let stop_words = stop_words();

  tokenizer
    .tokenize(text)
    .into_iter()
    .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
    .filter(|token| !stop_words.contains(token.as_str()))
    .collect()
}

/// Jaccard index of two token sets: |A∩B| / |A∪B|.
///
/// Two empty sets score 0, not 1: absence of text is not identity.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
  if a.is_empty() && b.is_empty() {
    return 0.0;
  }

  let intersection = a.intersection(b).count();
  let union = a.union(b).count();
  intersection as f32 / union as f32
}

/// Lexical overlap between two text bundles: tokenize, filter, Jaccard.
pub fn text_similarity(tokenizer: &dyn Tokenize, text_a: &str, text_b: &str) -> f32 {
  let tokens_a = significant_tokens(tokenizer, text_a);
  let tokens_b = significant_tokens(tokenizer, text_b);
  jaccard(&tokens_a, &tokens_b)
}
