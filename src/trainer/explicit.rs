//! Adaptive stochastic gradient descent with twin learners.
//!
//! The leading «slow» dimensions are updated from the very first pass, while the remaining
//! «fast» ones join from the second pass on. Every user and item keeps its own AdaGrad
//! accumulator per learner, so the learning rate adapts per entity rather than per dimension.
//!
//! See algorithm 2 in https://www.csie.ntu.edu.tw/~cjlin/papers/libmf/mf_adaptive_pakdd.pdf.

use std::ops::Range;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::factors::FactorMatrix;
use crate::math::mean::RootMeanSquare;
use crate::math::vector::dot;
use crate::prelude::*;
use crate::trainer::options::FitOptions;
use crate::trainer::Interactions;

/// Share of the dimensions assigned to the slow learner.
const SLOW_SHARE: f64 = 0.08;

/// Number of the leading dimensions assigned to the slow learner, at least one.
#[must_use]
pub fn n_slow_factors(n_factors: usize) -> usize {
    ((n_factors as f64 * SLOW_SHARE).round() as usize).max(1)
}

/// Updates a fixed range of the factor dimensions.
struct Learner {
    dimensions: Range<usize>,
    user_accumulators: Vec<f32>,
    item_accumulators: Vec<f32>,
}

impl Learner {
    fn new(dimensions: Range<usize>, n_users: usize, n_items: usize) -> Self {
        Self {
            dimensions,
            user_accumulators: vec![1.0; n_users],
            item_accumulators: vec![1.0; n_items],
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    fn update(
        &mut self,
        user: usize,
        user_factors: &mut [f32],
        item: usize,
        item_factors: &mut [f32],
        residual: f32,
        learning_rate: f32,
        regularization: f32,
    ) {
        if self.dimensions.is_empty() {
            return;
        }

        let user_rate = learning_rate / self.user_accumulators[user].sqrt();
        let item_rate = learning_rate / self.item_accumulators[item].sqrt();

        let mut user_squared_gradient = 0.0;
        let mut item_squared_gradient = 0.0;
        for d in self.dimensions.clone() {
            let user_gradient = -residual * item_factors[d] + regularization * user_factors[d];
            let item_gradient = -residual * user_factors[d] + regularization * item_factors[d];

            user_squared_gradient += user_gradient * user_gradient;
            item_squared_gradient += item_gradient * item_gradient;

            user_factors[d] -= user_rate * user_gradient;
            item_factors[d] -= item_rate * item_gradient;
        }

        let n_dimensions = self.dimensions.len() as f32;
        self.user_accumulators[user] += user_squared_gradient / n_dimensions;
        self.item_accumulators[item] += item_squared_gradient / n_dimensions;
    }
}

/// Runs the passes over the observations, reshuffled on every pass.
#[instrument(level = "debug", skip_all, fields(n_observations = interactions.len()))]
pub fn optimize<R: Rng>(
    interactions: &Interactions,
    user_factors: &mut FactorMatrix,
    item_factors: &mut FactorMatrix,
    regularization: f32,
    rng: &mut R,
    options: &mut FitOptions<'_>,
) -> Result {
    let n_factors = user_factors.n_factors();
    let n_slow_factors = n_slow_factors(n_factors);
    let learning_rate = options.learning_rate;
    debug!(n_slow_factors, learning_rate, regularization, "starting");

    let mut slow = Learner::new(0..n_slow_factors, user_factors.n_rows(), item_factors.n_rows());
    let mut fast =
        Learner::new(n_slow_factors..n_factors, user_factors.n_rows(), item_factors.n_rows());

    let mut order = Vec::with_capacity(interactions.len());
    for pass in 0..options.iterations {
        order.clear();
        order.extend(0..interactions.len());
        order.shuffle(rng);

        let mut loss = RootMeanSquare::default();
        for &j in &order {
            let (user, item) = (interactions.users[j], interactions.items[j]);
            let user_row = user_factors.row_mut(user);
            let item_row = item_factors.row_mut(item);
            let residual = interactions.values[j] - dot(user_row, item_row);

            slow.update(user, user_row, item, item_row, residual, learning_rate, regularization);
            if pass != 0 {
                fast.update(user, user_row, item, item_row, residual, learning_rate, regularization);
            }

            loss.push(f64::from(residual));
        }

        options.report(pass + 1, loss.finalise() as f32)?;
    }

    Ok(())
}
