//! Fits the user and item latent factors.
//!
//! Ingests the observations into dense indices, draws the initial factors and runs either the
//! explicit-feedback SGD or the implicit-feedback ALS for the configured number of passes.

use std::hash::Hash;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::Dataset;
use crate::factors::FactorMatrix;
use crate::helpers::tracing::format_elapsed;
use crate::id_map::IdMap;
use crate::math::mean::Mean;
use crate::prelude::*;
use crate::recommender::Recommender;
use crate::trainer::options::FitOptions;
use crate::trainer::sparse::Adjacency;

pub mod explicit;
pub mod implicit;
pub mod options;
pub mod sparse;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Graded ratings.
    Explicit,

    /// Positive-only interaction strengths.
    Implicit,
}

impl Feedback {
    /// Upper bound of the initial factor values.
    #[must_use]
    pub const fn end_range(self) -> f32 {
        match self {
            Self::Explicit => 0.1,
            Self::Implicit => 0.01,
        }
    }

    #[must_use]
    pub const fn default_regularization(self) -> f32 {
        match self {
            Self::Explicit => options::DEFAULT_EXPLICIT_REGULARIZATION,
            Self::Implicit => options::DEFAULT_IMPLICIT_REGULARIZATION,
        }
    }
}

/// Observations remapped to dense indices, kept as parallel arrays.
#[derive(Default)]
pub struct Interactions {
    pub users: Vec<usize>,
    pub items: Vec<usize>,
    pub values: Vec<f32>,
}

impl Interactions {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            users: Vec::with_capacity(capacity),
            items: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, user: usize, item: usize, value: f32) {
        self.users.push(user);
        self.items.push(item);
        self.values.push(value);
    }

    /// Builds the user → items and item → users lists with `confidence = 1 + alpha * value`.
    #[must_use]
    pub fn to_adjacency(&self, n_users: usize, n_items: usize, alpha: f32) -> (Adjacency, Adjacency) {
        let (user_items, item_users): (Vec<_>, Vec<_>) = self
            .users
            .iter()
            .zip(&self.items)
            .zip(&self.values)
            .map(|((&user, &item), &value)| {
                let confidence = 1.0 + alpha * value;
                ((user, item, confidence), (item, user, confidence))
            })
            .unzip();
        (
            Adjacency::from_triples(n_users, &user_items),
            Adjacency::from_triples(n_items, &item_users),
        )
    }
}

struct Ingested<U, I> {
    user_map: IdMap<U>,
    item_map: IdMap<I>,
    rated: Vec<AHashSet<usize>>,
    interactions: Interactions,
}

fn ingest<U, I>(dataset: &Dataset<U, I>) -> Ingested<U, I>
where
    U: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    let mut user_map = IdMap::new();
    let mut item_map = IdMap::new();
    let mut rated: Vec<AHashSet<usize>> = Vec::new();
    let mut interactions = Interactions::with_capacity(dataset.len());

    for observation in dataset {
        let user = user_map.add(observation.user_id.clone());
        let item = item_map.add(observation.item_id.clone());
        if user == rated.len() {
            rated.push(AHashSet::default());
        }
        rated[user].insert(item);
        interactions.push(user, item, observation.value);
    }

    Ingested {
        user_map,
        item_map,
        rated,
        interactions,
    }
}

#[instrument(level = "info", skip_all, fields(feedback = ?feedback, n_observations = dataset.len()))]
pub fn fit<U, I>(
    dataset: &Dataset<U, I>,
    mut options: FitOptions<'_>,
    feedback: Feedback,
) -> Result<Recommender<U, I>>
where
    U: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    if options.factors == 0 {
        bail!("the number of factors must be positive");
    }
    let start_instant = Instant::now();

    let Ingested {
        user_map,
        item_map,
        rated,
        interactions,
    } = ingest(dataset);
    info!(n_users = user_map.len(), n_items = item_map.len(), "ingested");

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let end_range = feedback.end_range();
    let mut user_factors = FactorMatrix::random(user_map.len(), options.factors, end_range, &mut rng);
    let mut item_factors = FactorMatrix::random(item_map.len(), options.factors, end_range, &mut rng);

    let regularization = options
        .regularization
        .unwrap_or_else(|| feedback.default_regularization());
    let global_mean = match feedback {
        Feedback::Explicit => {
            let mut mean = Mean::default();
            for &value in &interactions.values {
                mean.push(f64::from(value));
            }
            explicit::optimize(
                &interactions,
                &mut user_factors,
                &mut item_factors,
                regularization,
                &mut rng,
                &mut options,
            )?;
            mean.mean() as f32
        }
        Feedback::Implicit => {
            let (user_items, item_users) =
                interactions.to_adjacency(user_map.len(), item_map.len(), options.alpha);
            implicit::optimize(
                &user_items,
                &item_users,
                &mut user_factors,
                &mut item_factors,
                regularization,
                &mut options,
            )?;
            0.0
        }
    };

    info!(elapsed = format_elapsed(start_instant).as_str(), "fitted");
    Ok(Recommender::new(user_map, item_map, rated, global_mean, user_factors, item_factors))
}
