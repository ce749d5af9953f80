//! CLI options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand as ClapSubcommand};
use factorec::trainer::options::{
    DEFAULT_ALPHA, DEFAULT_LEARNING_RATE, DEFAULT_N_FACTORS, DEFAULT_N_ITERATIONS,
};
use factorec::FitOptions;

pub mod parsers;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "FACTOREC_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance traces sample rate for Sentry
    #[arg(long, default_value = "0", env = "FACTOREC_TRACES_SAMPLE_RATE")]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    Fit(FitOpts),
}

/// Fits the factors on a delimited file and answers the queries as JSON lines
#[derive(Args)]
pub struct FitOpts {
    /// Path to the `<USER><DELIMITER><ITEM><DELIMITER><VALUE>` lines
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Field delimiter
    #[arg(long, default_value = "\t")]
    pub delimiter: char,

    /// Treat the values as implicit feedback strengths instead of ratings
    #[arg(long)]
    pub implicit: bool,

    #[command(flatten)]
    pub hyperparameters: HyperparameterOpts,

    #[command(flatten)]
    pub queries: QueryOpts,
}

/// Hyperparameters of the fit.
#[derive(Args, Clone, Copy)]
pub struct HyperparameterOpts {
    /// Number of latent factors
    #[arg(long = "factors", default_value_t = DEFAULT_N_FACTORS, value_parser = parsers::non_zero_usize)]
    pub n_factors: usize,

    /// Number of optimization passes
    #[arg(long = "iterations", default_value_t = DEFAULT_N_ITERATIONS)]
    pub n_iterations: usize,

    /// Regularization, defaults to 0.1 for ratings and 0.01 for implicit feedback
    #[arg(long)]
    pub regularization: Option<f32>,

    /// Learning rate, ratings only
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    pub learning_rate: f32,

    /// Confidence scale, implicit feedback only
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f32,

    /// Random seed for reproducible fits
    #[arg(long)]
    pub seed: Option<u64>,
}

impl HyperparameterOpts {
    /// Converts into the fit options, without a callback.
    #[must_use]
    pub fn to_options<'a>(self) -> FitOptions<'a> {
        FitOptions {
            factors: self.n_factors,
            iterations: self.n_iterations,
            regularization: self.regularization,
            learning_rate: self.learning_rate,
            alpha: self.alpha,
            seed: self.seed,
            callback: None,
        }
    }
}

/// Queries to answer after the fit.
#[derive(Args)]
pub struct QueryOpts {
    /// Recommend items to the user
    #[arg(long = "user-recs", value_name = "USER")]
    pub user_recs: Vec<String>,

    /// Find items similar to the item
    #[arg(long = "item-recs", value_name = "ITEM")]
    pub item_recs: Vec<String>,

    /// Find users similar to the user
    #[arg(long = "similar-users", value_name = "USER")]
    pub similar_users: Vec<String>,

    /// Predict the rating of the item by the user
    #[arg(long = "predict", value_name = "USER:ITEM", value_parser = parsers::user_item_pair)]
    pub predictions: Vec<(String, String)>,

    /// Maximum number of results per query
    #[arg(short = 'n', long, default_value = "10", value_parser = parsers::non_zero_usize)]
    pub count: usize,
}
