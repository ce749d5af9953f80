//! Dense latent factor storage.

use rand::Rng;

use crate::math::vector::{dot, norm};

/// Row-major `n_rows × n_factors` matrix of latent factors.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorMatrix {
    n_factors: usize,
    values: Vec<f32>,
}

impl FactorMatrix {
    #[must_use]
    pub fn zeros(n_rows: usize, n_factors: usize) -> Self {
        Self {
            n_factors,
            values: vec![0.0; n_rows * n_factors],
        }
    }

    /// Fills the matrix with independent draws from `[0, end_range)`, row by row.
    #[must_use]
    pub fn random<R: Rng>(n_rows: usize, n_factors: usize, end_range: f32, rng: &mut R) -> Self {
        let values = (0..n_rows * n_factors)
            .map(|_| rng.gen::<f32>() * end_range)
            .collect();
        Self { n_factors, values }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.len().checked_div(self.n_factors).unwrap_or(0)
    }

    #[must_use]
    pub const fn n_factors(&self) -> usize {
        self.n_factors
    }

    #[must_use]
    #[inline]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.n_factors..(index + 1) * self.n_factors]
    }

    #[inline]
    pub fn row_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.values[index * self.n_factors..(index + 1) * self.n_factors]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // `chunks_exact` panics on a zero chunk size.
        self.values.chunks_exact(self.n_factors.max(1))
    }

    /// L2 norm of every row.
    #[must_use]
    pub fn norms(&self) -> Vec<f32> {
        self.rows().map(norm).collect()
    }

    /// `YᵀY + λI`: the `n_factors × n_factors` Gram matrix with `regularization` on the diagonal.
    #[must_use]
    pub fn regularized_gram(&self, regularization: f32) -> Self {
        let k = self.n_factors;
        let mut gram = Self::zeros(k, k);
        for i in 0..k {
            for j in 0..k {
                gram.values[i * k + j] = self.rows().map(|row| row[i] * row[j]).sum();
            }
            gram.values[i * k + i] += regularization;
        }
        gram
    }

    /// Multiplies the square matrix by the vector: `out[i] = dot(self[i], x)`.
    pub fn mul_vector(&self, x: &[f32], out: &mut [f32]) {
        for (i, out) in out.iter_mut().enumerate() {
            *out = dot(self.row(i), x);
        }
    }
}
