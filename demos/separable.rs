//! Train a 2-4-1 network on a linearly separable point cloud in the background,
//! printing progress until it converges, then test it on the held-out points.
//!
//! Usage:
//!   cargo run --example separable

use std::thread;
use std::time::Duration;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_nn_trainer::network;
use rust_nn_trainer::{
    Attribute, AttributeKind, Column, Instance, Learn, LearnOptions, NetworkBuilder, Schema,
    TrainingSet,
};

const POINT: Schema = Schema {
    name: "point",
    columns: &[
        Column::Attribute(Attribute {
            column: "x0",
            name: "x0",
            kind: AttributeKind::Numeric,
            min: -1.0,
            max: 1.0,
        }),
        Column::Attribute(Attribute {
            column: "x1",
            name: "x1",
            kind: AttributeKind::Numeric,
            min: -1.0,
            max: 1.0,
        }),
        Column::Label("side"),
    ],
    positive_label: "above",
    negative_label: "below",
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Label: which side of x0 = x1, skipping points near the boundary.
    let mut rng = StdRng::seed_from_u64(1);
    let dist = Uniform::new_inclusive(-1.0_f64, 1.0_f64);
    let mut data = Vec::with_capacity(400);
    while data.len() < 400 {
        let x0 = dist.sample(&mut rng);
        let x1 = dist.sample(&mut rng);
        if (x0 - x1).abs() < 0.2 {
            continue;
        }
        data.push(Instance {
            attributes: vec![x0, x1],
            classification: if x0 > x1 { 1.0 } else { 0.0 },
        });
    }

    let set = TrainingSet::from_instances(POINT, data, 25.0)?;
    let shared = network::shared(NetworkBuilder::new(2, 1)?.hidden_layer(4)?.build_with_seed(0)?);
    let mut learn = Learn::with_options(
        set,
        LearnOptions {
            learning_rate: 0.5,
            epsilon: 0.02,
            max_epochs: 5000,
        },
    );

    learn.start(&shared)?;
    while learn.is_running() {
        let progress = learn.snapshot();
        info!(
            epoch = progress.epoch_index,
            error = progress.epoch_error,
            "progress"
        );
        thread::sleep(Duration::from_millis(200));
    }
    learn.stop();

    let percentage = learn.test(&mut network::lock(&shared))?;
    let graph = learn.error_graph();
    println!(
        "status={:?} epochs={} final_error={:.6} test_accuracy={:.1}%",
        learn.status(),
        graph.len(),
        graph.errors.last().copied().unwrap_or(f64::NAN),
        percentage
    );
    Ok(())
}
