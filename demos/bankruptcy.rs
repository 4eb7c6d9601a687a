//! Drive a full session on a bankruptcy data file: load, set up, train, test,
//! then classify one raw row.
//!
//! Usage:
//!   cargo run --example bankruptcy -- <american_bankruptcy.csv> [config.json]
//!   cargo run --example bankruptcy -- <qualitative_bankruptcy.csv>
//!
//! The schema is picked from the file name. A JSON config needs the `serde` feature.

use std::env;
use std::thread;
use std::time::Duration;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_nn_trainer::{
    LearnOptions, Network, Operation, Screen, Session, TrainingSet, AMERICAN_BANKRUPTCY,
    QUALITATIVE_BANKRUPTCY,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: bankruptcy <data.csv> [config.json]")?;

    let schema = if path.contains("qualitative") {
        QUALITATIVE_BANKRUPTCY
    } else {
        AMERICAN_BANKRUPTCY
    };
    let (hidden_layers, options) = settings(args.next(), schema.attribute_count())?;

    let mut session = Session::new(
        Network::new(schema.attribute_count(), 1)?,
        TrainingSet::new(schema),
    );
    session.load_training_set(&path, 20.0)?;

    if !session.learning_setup(&hidden_layers, options)? {
        return Err("training set is not ready".into());
    }

    session.learning_process(Operation::Start)?;
    while session.screen() == Screen::Learning {
        let progress = session.poll();
        info!(
            epoch = progress.epoch_index,
            error = progress.epoch_error,
            "progress"
        );
        thread::sleep(Duration::from_millis(500));
    }

    session.learning_process(Operation::Test)?;
    let failed = session.tests().iter().filter(|t| !t.passed).count();
    println!(
        "status={:?} tested={} failed={} accuracy={:.1}%",
        session.learn().status(),
        session.tests().len(),
        failed,
        session.learn().report().percentage()
    );

    session.back();
    session.learning_process(Operation::Execute)?;
    // Raw rows, as a user would type them on the Execute screen.
    let mut raw = TrainingSet::new(schema);
    raw.load(&path, 20.0)?;
    let first = raw.instances().first().ok_or("training file has no rows")?;
    let output = session.run(&first.attributes)?;
    println!(
        "first row: expected={} output={:.4}",
        first.classification, output[0]
    );
    Ok(())
}

#[cfg(feature = "serde")]
fn settings(
    config: Option<String>,
    inputs: usize,
) -> rust_nn_trainer::Result<(Vec<usize>, LearnOptions)> {
    match config {
        Some(path) => {
            let config = rust_nn_trainer::Config::load_json(path)?;
            config.validate()?;
            if config.network.inputs != inputs {
                return Err(rust_nn_trainer::Error::InvalidConfig(format!(
                    "config has {} inputs, data has {inputs}",
                    config.network.inputs
                )));
            }
            Ok((config.network.hidden_layers, config.learn))
        }
        None => Ok(defaults()),
    }
}

#[cfg(not(feature = "serde"))]
fn settings(
    config: Option<String>,
    _inputs: usize,
) -> rust_nn_trainer::Result<(Vec<usize>, LearnOptions)> {
    if config.is_some() {
        return Err(rust_nn_trainer::Error::InvalidConfig(
            "JSON configs need the `serde` feature".to_owned(),
        ));
    }
    Ok(defaults())
}

fn defaults() -> (Vec<usize>, LearnOptions) {
    (vec![50, 50], LearnOptions::default())
}
