//! Row vector utilities.

/// Euclidean length of a vector.
pub fn l2_norm(vector: &[f64]) -> f64 {
    vector.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// L2 normalize a vector in place (unit length). Zero vectors are left as is.
pub fn normalize_l2(vector: &mut [f64]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_length_after_normalizing() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_is_unchanged() {
        let mut zero = vec![0.0; 3];
        normalize_l2(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }
}
