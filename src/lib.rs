//! Matrix factorization recommendations.
//!
//! Learns user and item latent factors from explicit ratings (twin-learner adaptive SGD)
//! or implicit feedback (conjugate-gradient ALS), and answers predictions, top-N
//! recommendations and similarity queries against the fitted factors.

pub mod dataset;
pub mod factors;
pub mod helpers;
pub mod id_map;
pub mod math;
pub mod prelude;
pub mod rec;
pub mod recommender;
pub mod trainer;

pub use self::dataset::{Dataset, Observation};
pub use self::id_map::IdMap;
pub use self::prelude::Result;
pub use self::rec::Rec;
pub use self::recommender::Recommender;
pub use self::trainer::options::{Callback, FitOptions, IterationReport};
pub use self::trainer::Feedback;
