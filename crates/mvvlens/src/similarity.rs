/// Cosine similarity between two embedding vectors, clamped to [0, 1].
///
/// MVV embeddings are non-adversarial, so a negative cosine carries no
/// useful signal and is floored at 0. Mismatched lengths, empty vectors and
/// zero-magnitude vectors all yield 0: "no signal", never an error.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
  if a.is_empty() || b.is_empty() || a.len() != b.len() {
    return 0.0;
  }

  let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
  let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

  if magnitude_a == 0.0 || magnitude_b == 0.0 {
    0.0
  } else {
    (dot_product / (magnitude_a * magnitude_b)).clamp(0.0, 1.0)
  }
}

/// Cosine similarity between two optional embeddings. Either side missing
/// means no signal.
pub fn cosine_opt(a: Option<&[f32]>, b: Option<&[f32]>) -> f32 {
  match (a, b) {
    (Some(a), Some(b)) => cosine(a, b),
    _ => 0.0,
  }
}
