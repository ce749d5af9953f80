#[must_use]
pub fn norm(x: &[f32]) -> f32 {
    x.iter().map(|xi| xi * xi).sum::<f32>().sqrt()
}

#[must_use]
#[inline]
pub fn dot(x: &[f32], y: &[f32]) -> f32 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).fold(0.0, |dot, (xi, yi)| dot + xi * yi)
}

/// `x += scale * y`, in place.
#[inline]
pub fn scaled_add(x: &mut [f32], scale: f32, y: &[f32]) {
    debug_assert_eq!(x.len(), y.len());
    for (xi, yi) in x.iter_mut().zip(y) {
        *xi += scale * yi;
    }
}

/// Smallest positive `f32`, guards the cosine denominator against zero-norm rows.
pub const MIN_POSITIVE_SUBNORMAL: f32 = 1e-45;

/// Cosine similarity of two vectors with known norms.
#[must_use]
#[inline]
pub fn cosine_similarity(x: &[f32], x_norm: f32, y: &[f32], y_norm: f32) -> f32 {
    dot(x, y) / (x_norm * y_norm).max(MIN_POSITIVE_SUBNORMAL)
}
