//! Fitted model and its queries.

use std::hash::Hash;

use crate::dataset::Dataset;
use crate::factors::FactorMatrix;
use crate::id_map::IdMap;
use crate::math::vector::{cosine_similarity, dot};
use crate::prelude::*;
use crate::rec::Rec;
use crate::trainer::options::FitOptions;
use crate::trainer::{fit, Feedback};

/// Immutable result of a fit.
///
/// Unknown identifiers never fail a query: predictions fall back to the global mean,
/// and recommendations are empty.
pub struct Recommender<U, I> {
    user_map: IdMap<U>,
    item_map: IdMap<I>,
    rated: Vec<AHashSet<usize>>,
    global_mean: f32,
    user_factors: FactorMatrix,
    item_factors: FactorMatrix,
    user_norms: Vec<f32>,
    item_norms: Vec<f32>,
}

impl<U, I> Recommender<U, I>
where
    U: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    /// Fits the factors on graded ratings.
    pub fn fit_explicit(dataset: &Dataset<U, I>, options: FitOptions<'_>) -> Result<Self> {
        fit(dataset, options, Feedback::Explicit)
    }

    /// Fits the factors on positive-only interactions.
    pub fn fit_implicit(dataset: &Dataset<U, I>, options: FitOptions<'_>) -> Result<Self> {
        fit(dataset, options, Feedback::Implicit)
    }

    pub(crate) fn new(
        user_map: IdMap<U>,
        item_map: IdMap<I>,
        rated: Vec<AHashSet<usize>>,
        global_mean: f32,
        user_factors: FactorMatrix,
        item_factors: FactorMatrix,
    ) -> Self {
        let user_norms = user_factors.norms();
        let item_norms = item_factors.norms();
        Self {
            user_map,
            item_map,
            rated,
            global_mean,
            user_factors,
            item_factors,
            user_norms,
            item_norms,
        }
    }

    /// Predicted rating of the item by the user.
    #[must_use]
    pub fn predict(&self, user_id: &U, item_id: &I) -> f32 {
        match (self.user_map.get(user_id), self.item_map.get(item_id)) {
            (Some(user), Some(item)) => {
                dot(self.user_factors.row(user), self.item_factors.row(item))
            }
            _ => self.global_mean,
        }
    }

    /// Top items for the user, excluding the items seen in training.
    #[must_use]
    pub fn user_recs(&self, user_id: &U, count: usize) -> Vec<Rec<I>> {
        let Some(user) = self.user_map.get(user_id) else {
            return Vec::new();
        };
        let factors = self.user_factors.row(user);
        let rated = &self.rated[user];
        let scores = self
            .item_factors
            .rows()
            .map(|item_factors| dot(factors, item_factors))
            .collect_vec();
        rank(scores, count, |item| rated.contains(&item), &self.item_map)
    }

    /// Most similar items by cosine similarity of the factors.
    #[must_use]
    pub fn item_recs(&self, item_id: &I, count: usize) -> Vec<Rec<I>> {
        similar(&self.item_map, &self.item_factors, &self.item_norms, item_id, count)
    }

    /// Most similar users by cosine similarity of the factors.
    #[must_use]
    pub fn similar_users(&self, user_id: &U, count: usize) -> Vec<Rec<U>> {
        similar(&self.user_map, &self.user_factors, &self.user_norms, user_id, count)
    }

    #[must_use]
    pub fn user_factors(&self, user_id: &U) -> Option<&[f32]> {
        self.user_map
            .get(user_id)
            .map(|user| self.user_factors.row(user))
    }

    #[must_use]
    pub fn item_factors(&self, item_id: &I) -> Option<&[f32]> {
        self.item_map
            .get(item_id)
            .map(|item| self.item_factors.row(item))
    }

    /// Mean training rating, `NaN` for an empty explicit fit and always zero for implicit ones.
    #[must_use]
    pub const fn global_mean(&self) -> f32 {
        self.global_mean
    }

    #[must_use]
    pub fn user_ids(&self) -> &[U] {
        self.user_map.ids()
    }

    #[must_use]
    pub fn item_ids(&self) -> &[I] {
        self.item_map.ids()
    }

    #[must_use]
    pub fn n_users(&self) -> usize {
        self.user_map.len()
    }

    #[must_use]
    pub fn n_items(&self) -> usize {
        self.item_map.len()
    }

    #[must_use]
    pub const fn n_factors(&self) -> usize {
        self.user_factors.n_factors()
    }
}

fn similar<K: Eq + Hash + Clone>(
    map: &IdMap<K>,
    factors: &FactorMatrix,
    norms: &[f32],
    id: &K,
    count: usize,
) -> Vec<Rec<K>> {
    let Some(index) = map.get(id) else {
        return Vec::new();
    };
    let (target, target_norm) = (factors.row(index), norms[index]);
    let scores = factors
        .rows()
        .zip(norms)
        .map(|(other, &other_norm)| cosine_similarity(target, target_norm, other, other_norm))
        .collect_vec();
    rank(scores, count, |other| other == index, map)
}

/// Sorts the indices by descending score and takes the first `count` not excluded.
///
/// The sort is stable, so equal scores keep the ascending index order. `NaN` scores go last
/// regardless of their sign bit.
fn rank<K: Eq + Hash + Clone>(
    scores: Vec<f32>,
    count: usize,
    is_excluded: impl Fn(usize) -> bool,
    map: &IdMap<K>,
) -> Vec<Rec<K>> {
    let mut scores = scores.into_iter().enumerate().collect_vec();
    scores.sort_by(|(_, lhs), (_, rhs)| match (lhs.is_nan(), rhs.is_nan()) {
        (false, false) => rhs.total_cmp(lhs),
        (lhs_is_nan, rhs_is_nan) => lhs_is_nan.cmp(&rhs_is_nan),
    });
    scores
        .into_iter()
        .filter(|(index, _)| !is_excluded(*index))
        .take(count)
        .map(|(index, score)| Rec {
            id: map.lookup(index).clone(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::options::IterationReport;

    fn ids<T: Clone>(recs: &[Rec<T>]) -> Vec<T> {
        recs.iter().map(|rec| rec.id.clone()).collect()
    }

    fn seeded(seed: u64) -> FitOptions<'static> {
        FitOptions {
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn ratings() -> Dataset<i32, i32> {
        let mut dataset = Dataset::new();
        for user in 0..20 {
            for item in 0..15 {
                if (user * 7 + item * 3) % 4 != 0 {
                    let user_rating = if user % 2 == 0 { 4.0 } else { 1.0 };
                    dataset.push(user, item, user_rating + (item % 2) as f32);
                }
            }
        }
        dataset
    }

    fn assert_sorted<T>(recs: &[Rec<T>]) {
        assert!(recs.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn rated_items_are_excluded_ok() -> crate::Result {
        let mut dataset = Dataset::new();
        for item in ["A", "B", "C", "D"] {
            dataset.push(1, item, 1.0);
        }
        for item in ["C", "D", "E", "F"] {
            dataset.push(2, item, 1.0);
        }
        let recommender = Recommender::fit_implicit(&dataset, FitOptions::default())?;

        let mut item_ids = ids(&recommender.user_recs(&1, 5));
        item_ids.sort_unstable();
        assert_eq!(item_ids, ["E", "F"]);

        let mut item_ids = ids(&recommender.user_recs(&2, 5));
        item_ids.sort_unstable();
        assert_eq!(item_ids, ["A", "B"]);
        Ok(())
    }

    #[test]
    fn item_recs_same_score_ok() -> crate::Result {
        let mut dataset = Dataset::new();
        dataset.push(1, "A", 1.0);
        dataset.push(1, "B", 1.0);
        dataset.push(2, "C", 1.0);
        let recommender = Recommender::fit_implicit(&dataset, FitOptions::default())?;
        assert_eq!(ids(&recommender.item_recs(&"A", 5)), ["B", "C"]);
        Ok(())
    }

    #[test]
    fn rank_keeps_index_order_on_ties_ok() {
        let mut map = IdMap::new();
        for id in ["a", "b", "c", "d"] {
            map.add(id);
        }
        let recs = rank(vec![0.5, 1.0, 0.5, 1.0], 10, |_| false, &map);
        assert_eq!(ids(&recs), ["b", "d", "a", "c"]);

        let recs = rank(vec![0.5, 1.0, 0.5, 1.0], 2, |index| index == 1, &map);
        assert_eq!(ids(&recs), ["d", "a"]);
    }

    #[test]
    fn rank_puts_nan_last_ok() {
        let mut map = IdMap::new();
        for id in ["a", "b", "c", "d", "e"] {
            map.add(id);
        }
        let recs = rank(vec![f32::NAN, 0.5, -f32::NAN, -1.0, 1.0], 10, |_| false, &map);
        assert_eq!(ids(&recs), ["e", "b", "d", "a", "c"]);
        assert!(recs[3].score.is_nan() && recs[4].score.is_nan());

        let recs = rank(vec![f32::NAN, 0.5, -f32::NAN, -1.0, 1.0], 3, |_| false, &map);
        assert_eq!(ids(&recs), ["e", "b", "d"]);
    }

    #[test]
    fn ids_ok() -> crate::Result {
        let mut dataset = Dataset::new();
        dataset.push(1, "A", 1.0);
        dataset.push(1, "B", 1.0);
        dataset.push(2, "B", 1.0);
        let recommender = Recommender::fit_implicit(&dataset, FitOptions::default())?;
        assert_eq!(recommender.user_ids(), &[1, 2]);
        assert_eq!(recommender.item_ids(), &["A", "B"]);
        assert_eq!(recommender.n_users(), 2);
        assert_eq!(recommender.n_items(), 2);
        Ok(())
    }

    #[test]
    fn factors_ok() -> crate::Result {
        let mut dataset = Dataset::new();
        dataset.push(1, "A", 1.0);
        dataset.push(1, "B", 1.0);
        dataset.push(2, "B", 1.0);
        let options = FitOptions {
            factors: 20,
            ..Default::default()
        };
        let recommender = Recommender::fit_implicit(&dataset, options)?;

        assert_eq!(recommender.n_factors(), 20);
        assert_eq!(recommender.user_factors(&1).map(<[f32]>::len), Some(20));
        assert_eq!(recommender.item_factors(&"A").map(<[f32]>::len), Some(20));
        assert_eq!(recommender.user_factors(&3), None);
        assert_eq!(recommender.item_factors(&"C"), None);
        Ok(())
    }

    #[test]
    fn cold_start_ok() -> crate::Result {
        let mut dataset = Dataset::new();
        dataset.push(1, 1, 5.0);
        dataset.push(2, 1, 3.0);
        let recommender = Recommender::fit_explicit(&dataset, FitOptions::default())?;

        assert!((recommender.global_mean() - 4.0).abs() < 1e-6);
        assert_eq!(recommender.predict(&1000, &1), recommender.global_mean());
        assert_eq!(recommender.predict(&1, &1000), recommender.global_mean());
        assert!(recommender.user_recs(&1000, 5).is_empty());
        assert!(recommender.item_recs(&1000, 5).is_empty());
        assert!(recommender.similar_users(&1000, 5).is_empty());
        Ok(())
    }

    #[test]
    fn predict_is_dot_product_ok() -> crate::Result {
        let recommender = Recommender::fit_explicit(&ratings(), seeded(42))?;
        let user_factors = recommender.user_factors(&3).unwrap();
        let item_factors = recommender.item_factors(&4).unwrap();
        assert_eq!(recommender.predict(&3, &4), dot(user_factors, item_factors));
        Ok(())
    }

    #[test]
    fn explicit_fit_learns_ratings_ok() -> crate::Result {
        let dataset = ratings();
        let options = FitOptions {
            iterations: 50,
            seed: Some(42),
            ..Default::default()
        };
        let recommender = Recommender::fit_explicit(&dataset, options)?;

        let squared_error = |predict: &dyn Fn(i32, i32) -> f32| -> f32 {
            dataset
                .iter()
                .map(|observation| {
                    let error = observation.value
                        - predict(observation.user_id, observation.item_id);
                    error * error
                })
                .sum()
        };
        let model_error = squared_error(&|user, item| recommender.predict(&user, &item));
        let baseline_error = squared_error(&|_, _| recommender.global_mean());
        assert!(model_error < baseline_error);
        Ok(())
    }

    #[test]
    fn no_self_match_ok() -> crate::Result {
        let recommender = Recommender::fit_explicit(&ratings(), seeded(42))?;
        for user in 0..20 {
            let recs = recommender.similar_users(&user, 5);
            assert_eq!(recs.len(), 5);
            assert!(recs.iter().all(|rec| rec.id != user));
            assert_sorted(&recs);
        }
        for item in 0..15 {
            let recs = recommender.item_recs(&item, 20);
            assert_eq!(recs.len(), 14);
            assert!(recs.iter().all(|rec| rec.id != item));
            assert_sorted(&recs);
        }
        Ok(())
    }

    #[test]
    fn user_recs_count_bound_ok() -> crate::Result {
        let dataset = ratings();
        let recommender = Recommender::fit_implicit(&dataset, seeded(42))?;
        for user in 0..20 {
            let n_rated = dataset
                .iter()
                .filter(|observation| observation.user_id == user)
                .count();
            for count in [0, 1, 3, 100] {
                let recs = recommender.user_recs(&user, count);
                assert_eq!(recs.len(), count.min(15 - n_rated));
                assert_sorted(&recs);
                assert!(recs.iter().all(|rec| {
                    !dataset.iter().any(|observation| {
                        observation.user_id == user && observation.item_id == rec.id
                    })
                }));
            }
        }
        Ok(())
    }

    #[test]
    fn deterministic_with_seed_ok() -> crate::Result {
        let dataset = ratings();
        for feedback in [Feedback::Explicit, Feedback::Implicit] {
            let lhs = fit(&dataset, seeded(7), feedback)?;
            let rhs = fit(&dataset, seeded(7), feedback)?;
            assert_eq!(lhs.user_factors, rhs.user_factors);
            assert_eq!(lhs.item_factors, rhs.item_factors);
        }
        Ok(())
    }

    #[test]
    fn implicit_global_mean_is_zero_ok() -> crate::Result {
        let recommender = Recommender::fit_implicit(&ratings(), seeded(42))?;
        assert_eq!(recommender.global_mean(), 0.0);
        Ok(())
    }

    #[test]
    fn no_training_data_ok() -> crate::Result {
        let dataset = Dataset::<i32, i32>::new();

        let recommender = Recommender::fit_explicit(&dataset, FitOptions::default())?;
        assert!(recommender.user_ids().is_empty());
        assert!(recommender.item_ids().is_empty());
        assert!(recommender.predict(&1, &1).is_nan());

        let recommender = Recommender::fit_implicit(&dataset, FitOptions::default())?;
        assert!(recommender.user_ids().is_empty());
        assert_eq!(recommender.predict(&1, &1), 0.0);
        Ok(())
    }

    #[test]
    fn callback_ok() -> crate::Result {
        let mut dataset = Dataset::new();
        dataset.push(1, 1, 5.0);

        for feedback in [Feedback::Explicit, Feedback::Implicit] {
            let mut iterations = Vec::new();
            let options = FitOptions {
                iterations: 7,
                callback: Some(Box::new(|report: &IterationReport| {
                    iterations.push(report.iteration);
                    Ok(())
                })),
                ..Default::default()
            };
            fit(&dataset, options, feedback)?;
            assert_eq!(iterations, (1..=7).collect_vec());
        }
        Ok(())
    }

    #[test]
    fn callback_error_aborts_fit_ok() {
        let mut dataset = Dataset::new();
        dataset.push(1, 1, 5.0);

        let mut n_calls = 0;
        let options = FitOptions {
            callback: Some(Box::new(|report: &IterationReport| {
                n_calls += 1;
                match report.iteration {
                    3 => Err(anyhow!("stop")),
                    _ => Ok(()),
                }
            })),
            ..Default::default()
        };
        assert!(Recommender::fit_explicit(&dataset, options).is_err());
        assert_eq!(n_calls, 3);
    }
}
