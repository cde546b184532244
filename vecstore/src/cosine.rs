/// Compute the cosine similarity between two vectors.
///
/// Returns a value in `[-1, 1]` where 1 means identical direction and
/// -1 means opposite direction. Uses f64 intermediate precision.
/// Returns -1.0 for zero vectors or dimension mismatches so they never
/// clear a similarity threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return -1.0;
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return -1.0;
    }

    // Clamp to [-1, 1] to absorb floating point error.
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!((s - 1.0).abs() < 0.001, "identical: got {s}");
    }

    #[test]
    fn test_scaled_is_identical() {
        let s = cosine_similarity(&[2.0, 4.0], &[1.0, 2.0]);
        assert!((s - 1.0).abs() < 0.001, "scaled: got {s}");
    }

    #[test]
    fn test_orthogonal() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(s.abs() < 0.001, "orthogonal: got {s}");
    }

    #[test]
    fn test_opposite() {
        let s = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((s + 1.0).abs() < 0.001, "opposite: got {s}");
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), -1.0);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), -1.0);
        assert_eq!(cosine_similarity(&[], &[]), -1.0);
    }
}
