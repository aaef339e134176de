use nalgebra::Vector3;

use crate::core::error::AnnealError;

/// Squared norms below this are treated as the zero vector.
const DEGENERATE_NORM_SQ: f64 = 1e-300;

#[inline]
pub fn dot(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

/// Scales `v` onto the unit sphere.
pub fn normalize(v: &Vector3<f64>) -> Result<Vector3<f64>, AnnealError> {
    let norm_sq = dot(v, v);
    if !norm_sq.is_finite() || norm_sq < DEGENERATE_NORM_SQ {
        return Err(AnnealError::NumericDegeneracy);
    }
    Ok(v * (1.0 / norm_sq.sqrt()))
}

#[inline]
pub fn copy(dst: &mut Vector3<f64>, src: &Vector3<f64>) {
    *dst = *src;
}

/// Element-wise copy of one point array into another of the same length.
///
/// # Panics
/// If the slices differ in length. Configurations never change size during
/// a run, so a mismatch is a caller bug.
pub fn copy_array(dst: &mut [Vector3<f64>], src: &[Vector3<f64>]) {
    assert_eq!(dst.len(), src.len(), "copy_array length mismatch");
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        copy(d, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_orthogonal_and_parallel() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert_eq!(dot(&x, &y), 0.0);
        assert_eq!(dot(&x, &x), 1.0);
        assert!((dot(&Vector3::new(1.0, 2.0, 3.0), &Vector3::new(4.0, 5.0, 6.0)) - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_scales_to_unit() {
        let v = normalize(&Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
        assert!((v.z - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_is_degenerate() {
        let err = normalize(&Vector3::zeros()).unwrap_err();
        assert!(matches!(err, AnnealError::NumericDegeneracy));
        assert!(normalize(&Vector3::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_copy_array() {
        let src = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0)];
        let mut dst = vec![Vector3::zeros(); 2];
        copy_array(&mut dst, &src);
        assert_eq!(dst, src);
    }
}
