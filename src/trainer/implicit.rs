//! Alternating least squares for implicit feedback, solved with the conjugate gradient method.
//!
//! Each row solves `(YᵀCᵤY + λI)·xᵤ = YᵀCᵤpᵤ` with a few warm-started CG steps. `YᵀCᵤY` is never
//! formed: it equals `YᵀY + Yᵀ(Cᵤ − I)Y`, and `Cᵤ − I` is non-zero only on the observed entries.
//!
//! See https://www.benfrederickson.com/fast-implicit-matrix-factorization/.

use crate::factors::FactorMatrix;
use crate::math::vector::{dot, scaled_add};
use crate::prelude::*;
use crate::trainer::options::FitOptions;
use crate::trainer::sparse::Adjacency;

/// Maximum number of CG steps per row.
const N_CG_STEPS: usize = 3;

/// Squared residual norm under which the row is considered solved.
const RESIDUAL_TOLERANCE: f32 = 1e-20;

/// Runs the passes, each solving the users first and then the items against the new users.
#[instrument(level = "debug", skip_all)]
pub fn optimize(
    user_items: &Adjacency,
    item_users: &Adjacency,
    user_factors: &mut FactorMatrix,
    item_factors: &mut FactorMatrix,
    regularization: f32,
    options: &mut FitOptions<'_>,
) -> Result {
    debug!(regularization, "starting");
    for pass in 0..options.iterations {
        least_squares_cg(user_items, user_factors, item_factors, regularization);
        least_squares_cg(item_users, item_factors, user_factors, regularization);
        options.report(pass + 1, f32::NAN)?;
    }
    Ok(())
}

/// Updates every row of `x` in place, keeping `y` fixed.
fn least_squares_cg(
    adjacency: &Adjacency,
    x: &mut FactorMatrix,
    y: &FactorMatrix,
    regularization: f32,
) {
    let yty = y.regularized_gram(regularization);
    let n_factors = y.n_factors();

    let mut r = vec![0.0; n_factors];
    let mut p = vec![0.0; n_factors];
    let mut ap = vec![0.0; n_factors];

    for row in 0..adjacency.n_rows() {
        let entries = adjacency.row(row);
        let xu = x.row_mut(row);

        // r = YᵀCᵤpᵤ − YᵀCᵤY·xᵤ
        yty.mul_vector(xu, &mut r);
        r.iter_mut().for_each(|ri| *ri = -*ri);
        for &(index, confidence) in entries {
            let yi = y.row(index);
            scaled_add(&mut r, confidence - (confidence - 1.0) * dot(yi, xu), yi);
        }

        p.copy_from_slice(&r);
        let mut rs_old = dot(&r, &r);

        for _ in 0..N_CG_STEPS {
            // Ap = YᵀCᵤY·p
            yty.mul_vector(&p, &mut ap);
            for &(index, confidence) in entries {
                let yi = y.row(index);
                scaled_add(&mut ap, (confidence - 1.0) * dot(yi, &p), yi);
            }

            let alpha = rs_old / dot(&p, &ap);
            scaled_add(xu, alpha, &p);
            scaled_add(&mut r, -alpha, &ap);
            let rs_new = dot(&r, &r);
            if rs_new < RESIDUAL_TOLERANCE {
                break;
            }

            let beta = rs_new / rs_old;
            for (pi, ri) in p.iter_mut().zip(&r) {
                *pi = ri + beta * *pi;
            }
            rs_old = rs_new;
        }
    }
}
