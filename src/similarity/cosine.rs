use crate::artifacts::StyleEmbedding;

/// Cosine of the angle between two embeddings.
///
/// `None` when the dimensions differ or either vector has zero length.
pub fn cosine_similarity(a: &StyleEmbedding, b: &StyleEmbedding) -> Option<f64> {
    let (a, b) = (a.as_slice(), b.as_slice());
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f64]) -> StyleEmbedding {
        StyleEmbedding::new(values.to_vec())
    }

    #[test]
    fn parallel_orthogonal_and_opposite() {
        let same = cosine_similarity(&v(&[1.0, 2.0, 3.0]), &v(&[2.0, 4.0, 6.0])).unwrap();
        assert!((same - 1.0).abs() < 1e-12);
        let orthogonal = cosine_similarity(&v(&[1.0, 0.0]), &v(&[0.0, 5.0])).unwrap();
        assert!(orthogonal.abs() < 1e-12);
        let opposite = cosine_similarity(&v(&[1.0, -1.0]), &v(&[-1.0, 1.0])).unwrap();
        assert!((opposite + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_have_no_similarity() {
        assert!(cosine_similarity(&v(&[1.0, 0.0]), &v(&[1.0])).is_none());
        assert!(cosine_similarity(&v(&[0.0, 0.0]), &v(&[1.0, 1.0])).is_none());
        assert!(cosine_similarity(&v(&[]), &v(&[])).is_none());
    }
}
