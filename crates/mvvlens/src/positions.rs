use std::collections::HashMap;

use crate::company::Company;
use crate::matrix::SimilarityMatrix;

/// Eigenvalues at or below this are treated as degenerate spectrum.
const EIGEN_EPSILON: f64 = 1e-9;
/// Power-iteration budget per eigenpair.
const MAX_POWER_ITERATIONS: usize = 300;
const CONVERGENCE_TOL: f64 = 1e-12;

/// One company placed on the 2-D positioning map. `cluster` is the
/// company's pre-existing category; grouping is by attribute, nothing is
/// discovered here.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
  pub company_id: String,
  pub x: f32,
  pub y: f32,
  pub cluster: String,
}

/// Classical multidimensional scaling of a similarity matrix into 2-D.
///
/// Dissimilarity `d = 1 − s`, double-centered squared distances, then the
/// two algebraically largest eigenpairs scale the coordinates by √λ. A
/// degenerate spectrum (no positive eigenvalues, e.g. every company
/// identical) collapses all points to the origin rather than failing.
pub fn project(matrix: &SimilarityMatrix, companies: &[&Company]) -> Vec<Position> {
  let clusters: HashMap<&str, &str> =
    companies.iter().map(|c| (c.id.as_str(), c.category.as_str())).collect();

  let coords = mds_coordinates(matrix);

  matrix
    .ids()
    .iter()
    .enumerate()
    .map(|(i, id)| Position {
      company_id: id.clone(),
      x: coords[i].0 as f32,
      y: coords[i].1 as f32,
      cluster: clusters.get(id.as_str()).copied().unwrap_or_default().to_string(),
    })
    .collect()
}

fn mds_coordinates(matrix: &SimilarityMatrix) -> Vec<(f64, f64)> {
  let n = matrix.len();
  if n == 0 {
    return Vec::new();
  }
  if n == 1 {
    return vec![(0.0, 0.0)];
  }

  // Squared dissimilarities
  let mut d2 = vec![0.0f64; n * n];
  for i in 0..n {
    for j in 0..n {
      let d = 1.0 - matrix.get(i, j) as f64;
      d2[i * n + j] = d * d;
    }
  }

  // Double centering: b_ij = -1/2 (d2_ij - rowmean_i - colmean_j + grand)
  let mut row_means = vec![0.0f64; n];
  for i in 0..n {
    row_means[i] = d2[i * n..(i + 1) * n].iter().sum::<f64>() / n as f64;
  }
  let grand_mean = row_means.iter().sum::<f64>() / n as f64;

  let mut b = vec![0.0f64; n * n];
  for i in 0..n {
    for j in 0..n {
      // the matrix is symmetric, so column means equal row means
      b[i * n + j] = -0.5 * (d2[i * n + j] - row_means[i] - row_means[j] + grand_mean);
    }
  }

  let (first, second) = top_two_eigenpairs(&b, n);

  let axis = |pair: &Option<(f64, Vec<f64>)>, i: usize| -> f64 {
    match pair {
      Some((value, vector)) if *value > EIGEN_EPSILON => vector[i] * value.sqrt(),
      _ => 0.0,
    }
  };

  (0..n).map(|i| (axis(&first, i), axis(&second, i))).collect()
}

type EigenPair = Option<(f64, Vec<f64>)>;

/// Two algebraically largest eigenpairs of a symmetric matrix via power
/// iteration with deflation. The Gershgorin shift keeps the shifted matrix
/// positive semidefinite, so the dominant eigenvalue of `B + cI` is the
/// algebraically largest of `B`. Without it, power iteration would lock
/// onto the largest magnitude, which can be a negative eigenvalue.
fn top_two_eigenpairs(b: &[f64], n: usize) -> (EigenPair, EigenPair) {
  let shift = (0..n)
    .map(|i| (0..n).map(|j| b[i * n + j].abs()).sum::<f64>())
    .fold(0.0f64, f64::max);

  if shift <= EIGEN_EPSILON {
    // Zero matrix: every company equidistant from itself only
    return (None, None);
  }

  let mut shifted = b.to_vec();
  for i in 0..n {
    shifted[i * n + i] += shift;
  }

  let first = dominant_eigenpair(&shifted, n, &[]);
  let second = match &first {
    Some((value, vector)) => {
      // Deflate: A' = A − μ v vᵀ
      let mut deflated = shifted.clone();
      for i in 0..n {
        for j in 0..n {
          deflated[i * n + j] -= value * vector[i] * vector[j];
        }
      }
      dominant_eigenpair(&deflated, n, std::slice::from_ref(vector))
    }
    None => None,
  };

  let unshift = |pair: Option<(f64, Vec<f64>)>| pair.map(|(value, vector)| (value - shift, vector));
  (unshift(first), unshift(second))
}

fn dominant_eigenpair(a: &[f64], n: usize, orthogonal_to: &[Vec<f64>]) -> Option<(f64, Vec<f64>)> {
  // Deterministic, non-uniform start so it is unlikely to be orthogonal to
  // the dominant eigenvector
  let mut v: Vec<f64> = (0..n).map(|i| 1.0 / (i + 1) as f64).collect();
  orthogonalize(&mut v, orthogonal_to);
  if normalize(&mut v).is_none() {
    return None;
  }

  let mut eigenvalue = 0.0f64;
  for _ in 0..MAX_POWER_ITERATIONS {
    let mut next = mat_vec(a, n, &v);
    orthogonalize(&mut next, orthogonal_to);
    let norm = normalize(&mut next)?;

    let delta = (norm - eigenvalue).abs();
    eigenvalue = norm;
    v = next;
    if delta < CONVERGENCE_TOL {
      break;
    }
  }

  // Rayleigh quotient for the final estimate
  let av = mat_vec(a, n, &v);
  let rayleigh: f64 = v.iter().zip(&av).map(|(x, y)| x * y).sum();

  // Deterministic sign: first non-negligible component points positive
  if let Some(lead) = v.iter().find(|x| x.abs() > EIGEN_EPSILON) {
    if *lead < 0.0 {
      for x in v.iter_mut() {
        *x = -*x;
      }
    }
  }

  Some((rayleigh, v))
}

fn mat_vec(a: &[f64], n: usize, v: &[f64]) -> Vec<f64> {
  (0..n)
    .map(|i| (0..n).map(|j| a[i * n + j] * v[j]).sum())
    .collect()
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
  for u in basis {
    let dot: f64 = v.iter().zip(u).map(|(x, y)| x * y).sum();
    for (x, y) in v.iter_mut().zip(u) {
      *x -= dot * y;
    }
  }
}

fn normalize(v: &mut [f64]) -> Option<f64> {
  let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
  if norm <= EIGEN_EPSILON {
    return None;
  }
  for x in v.iter_mut() {
    *x /= norm;
  }
  Some(norm)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SimilarityCache;
  use crate::lexical::WordTokenizer;
  use crate::matrix::MatrixBuilder;
  use crate::scorer::ScoreWeights;

  fn company(id: &str, category: &str, embedding: Vec<f32>) -> Company {
    let mut company = Company::new(id, category);
    company.embedding = Some(embedding);
    company
  }

  fn matrix_for(companies: &[Company]) -> SimilarityMatrix {
    let mut cache = SimilarityCache::new(256);
    let weights = ScoreWeights::default();
    MatrixBuilder::new(companies.iter().collect(), &mut cache, &weights, &WordTokenizer, 50)
      .finish()
  }

  fn distance(a: &Position, b: &Position) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
  }

  #[test]
  fn empty_corpus_projects_to_nothing() {
    let matrix = matrix_for(&[]);
    assert!(project(&matrix, &[]).is_empty());
  }

  #[test]
  fn single_company_sits_at_origin() {
    let companies = vec![company("a", "retail", vec![1.0, 0.0])];
    let matrix = matrix_for(&companies);
    let positions = project(&matrix, &companies.iter().collect::<Vec<_>>());
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].x, 0.0);
    assert_eq!(positions[0].y, 0.0);
  }

  #[test]
  fn identical_companies_collapse_together() {
    let companies = vec![
      company("a", "retail", vec![0.6, 0.8]),
      company("b", "retail", vec![0.6, 0.8]),
      company("c", "retail", vec![0.6, 0.8]),
    ];
    let matrix = matrix_for(&companies);
    let positions = project(&matrix, &companies.iter().collect::<Vec<_>>());

    assert_eq!(positions.len(), 3);
    for pair in positions.windows(2) {
      assert!(distance(&pair[0], &pair[1]) < 1e-4);
    }
  }

  #[test]
  fn dissimilar_companies_spread_out() {
    let companies = vec![
      company("a", "retail", vec![1.0, 0.0, 0.0]),
      company("b", "energy", vec![0.0, 1.0, 0.0]),
      company("c", "biotech", vec![0.0, 0.0, 1.0]),
    ];
    let matrix = matrix_for(&companies);
    let positions = project(&matrix, &companies.iter().collect::<Vec<_>>());

    assert!(distance(&positions[0], &positions[1]) > 0.01);
    assert!(distance(&positions[0], &positions[2]) > 0.01);
    assert!(distance(&positions[1], &positions[2]) > 0.01);
  }

  #[test]
  fn distances_reflect_dissimilarity_ordering() {
    // a and b point the same way, c is orthogonal to both
    let companies = vec![
      company("a", "retail", vec![1.0, 0.0]),
      company("b", "retail", vec![0.98, 0.2]),
      company("c", "energy", vec![0.0, 1.0]),
    ];
    let matrix = matrix_for(&companies);
    let positions = project(&matrix, &companies.iter().collect::<Vec<_>>());

    let close = distance(&positions[0], &positions[1]);
    let far = distance(&positions[0], &positions[2]);
    assert!(close < far);
  }

  #[test]
  fn cluster_label_is_the_category() {
    let companies =
      vec![company("a", "retail", vec![1.0, 0.0]), company("b", "energy", vec![0.0, 1.0])];
    let matrix = matrix_for(&companies);
    let positions = project(&matrix, &companies.iter().collect::<Vec<_>>());
    assert_eq!(positions[0].cluster, "retail");
    assert_eq!(positions[1].cluster, "energy");
  }

  #[test]
  fn eigensolver_recovers_known_spectrum() {
    // diag(3, 1) has eigenpairs (3, e1) and (1, e2)
    let b = vec![3.0, 0.0, 0.0, 1.0];
    let (first, second) = top_two_eigenpairs(&b, 2);
    let (v1, e1) = first.unwrap();
    let (v2, e2) = second.unwrap();
    assert!((v1 - 3.0).abs() < 1e-6);
    assert!((v2 - 1.0).abs() < 1e-6);
    assert!(e1[0].abs() > 0.99);
    assert!(e2[1].abs() > 0.99);
  }

  #[test]
  fn negative_spectrum_collapses_to_origin() {
    // All-negative eigenvalues: projection must not produce coordinates
    let b = vec![-2.0, 0.0, 0.0, -1.0];
    let (first, second) = top_two_eigenpairs(&b, 2);
    let (v1, _) = first.unwrap();
    assert!(v1 <= 1e-9);
    // deflation may leave nothing usable behind; both are fine
    assert!(second.map_or(true, |(v2, _)| v2 <= 1e-9));
  }
}
