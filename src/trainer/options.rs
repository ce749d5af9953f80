use std::fmt::{Debug, Formatter};

use crate::prelude::*;

pub const DEFAULT_N_FACTORS: usize = 8;
pub const DEFAULT_N_ITERATIONS: usize = 20;
pub const DEFAULT_EXPLICIT_REGULARIZATION: f32 = 0.1;
pub const DEFAULT_IMPLICIT_REGULARIZATION: f32 = 0.01;
pub const DEFAULT_LEARNING_RATE: f32 = 0.1;
pub const DEFAULT_ALPHA: f32 = 40.0;

/// Progress of a single optimization pass.
#[derive(Debug, Copy, Clone)]
pub struct IterationReport {
    /// One-based pass number.
    pub iteration: usize,

    /// Training RMSE, `NaN` for implicit feedback.
    pub train_loss: f32,
}

/// Invoked after every pass. An error aborts the fit.
pub type Callback<'a> = Box<dyn FnMut(&IterationReport) -> Result + 'a>;

/// Fitting hyperparameters.
///
/// Override the defaults with the struct update syntax:
///
/// ```
/// use factorec::FitOptions;
///
/// let options = FitOptions {
///     factors: 20,
///     seed: Some(42),
///     ..Default::default()
/// };
/// assert_eq!(options.iterations, 20);
/// ```
pub struct FitOptions<'a> {
    pub factors: usize,
    pub iterations: usize,

    /// Falls back to the feedback-specific default when `None`.
    pub regularization: Option<f32>,

    /// Explicit feedback only.
    pub learning_rate: f32,

    /// Implicit feedback only: `confidence = 1 + alpha * value`.
    pub alpha: f32,

    /// Seeds the generator used for the initial factors and the per-pass shuffles.
    pub seed: Option<u64>,

    pub callback: Option<Callback<'a>>,
}

impl Default for FitOptions<'_> {
    fn default() -> Self {
        Self {
            factors: DEFAULT_N_FACTORS,
            iterations: DEFAULT_N_ITERATIONS,
            regularization: None,
            learning_rate: DEFAULT_LEARNING_RATE,
            alpha: DEFAULT_ALPHA,
            seed: None,
            callback: None,
        }
    }
}

impl Debug for FitOptions<'_> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FitOptions")
            .field("factors", &self.factors)
            .field("iterations", &self.iterations)
            .field("regularization", &self.regularization)
            .field("learning_rate", &self.learning_rate)
            .field("alpha", &self.alpha)
            .field("seed", &self.seed)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl FitOptions<'_> {
    pub(crate) fn report(&mut self, iteration: usize, train_loss: f32) -> Result {
        debug!(iteration = iteration, train_loss = train_loss, "pass finished");
        match &mut self.callback {
            Some(callback) => callback(&IterationReport {
                iteration,
                train_loss,
            })
            .with_context(|| format!("the callback failed on iteration #{}", iteration)),
            None => Ok(()),
        }
    }
}
