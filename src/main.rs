use clap::Parser;
use factorec::helpers::tracing::{format_elapsed, init as init_tracing};
use factorec::prelude::*;
use factorec::{FitOptions, IterationReport, Rec, Recommender};
use serde::Serialize;
use tracing::error;

use crate::input::read_dataset;
use crate::opts::{FitOpts, Opts, QueryOpts, Subcommand};

mod input;
mod opts;

fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = init_tracing(opts.sentry_dsn, opts.traces_sample_rate)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting…");

    let result = match opts.subcommand {
        Subcommand::Fit(opts) => run_fit(opts),
    };
    if let Err(error) = &result {
        error!("{:#}", error);
        sentry::integrations::anyhow::capture_anyhow(error);
    }
    result
}

#[instrument(skip_all, fields(implicit = opts.implicit))]
fn run_fit(opts: FitOpts) -> Result {
    let dataset = read_dataset(&opts.input, opts.delimiter)?;

    let start_instant = Instant::now();
    let options = FitOptions {
        callback: Some(Box::new(|report: &IterationReport| {
            info!(iteration = report.iteration, train_loss = report.train_loss, "pass finished");
            Ok(())
        })),
        ..opts.hyperparameters.to_options()
    };
    let recommender = if opts.implicit {
        Recommender::fit_implicit(&dataset, options)?
    } else {
        Recommender::fit_explicit(&dataset, options)?
    };
    info!(
        n_users = recommender.n_users(),
        n_items = recommender.n_items(),
        global_mean = recommender.global_mean(),
        elapsed = format_elapsed(start_instant).as_str(),
        "fitted",
    );

    for answer in answer_queries(&recommender, &opts.queries) {
        println!("{}", serde_json::to_string(&answer)?);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(tag = "query", rename_all = "snake_case")]
enum Answer<'a> {
    UserRecs {
        user_id: &'a str,
        recs: Vec<Rec<String>>,
    },
    ItemRecs {
        item_id: &'a str,
        recs: Vec<Rec<String>>,
    },
    SimilarUsers {
        user_id: &'a str,
        recs: Vec<Rec<String>>,
    },
    Predict {
        user_id: &'a str,
        item_id: &'a str,
        prediction: f32,
    },
}

fn answer_queries<'a>(
    recommender: &Recommender<String, String>,
    queries: &'a QueryOpts,
) -> Vec<Answer<'a>> {
    let count = queries.count;
    let user_recs = queries.user_recs.iter().map(|user_id| Answer::UserRecs {
        user_id,
        recs: recommender.user_recs(user_id, count),
    });
    let item_recs = queries.item_recs.iter().map(|item_id| Answer::ItemRecs {
        item_id,
        recs: recommender.item_recs(item_id, count),
    });
    let similar_users = queries.similar_users.iter().map(|user_id| Answer::SimilarUsers {
        user_id,
        recs: recommender.similar_users(user_id, count),
    });
    let predictions = queries.predictions.iter().map(|(user_id, item_id)| Answer::Predict {
        user_id,
        item_id,
        prediction: recommender.predict(user_id, item_id),
    });
    user_recs
        .chain(item_recs)
        .chain(similar_users)
        .chain(predictions)
        .collect()
}
