use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_nn_trainer::network::{self, SharedNetwork};
use rust_nn_trainer::{
    Attribute, AttributeKind, Column, Error, Instance, Learn, LearnOptions, NetworkBuilder,
    Schema, Status, TrainingSet,
};

const PLANE: Schema = Schema {
    name: "plane",
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
        Column::Label("class"),
    ],
    positive_label: "above",
    negative_label: "below",
};

/// Points on either side of `x0 = x1`, with a margin around the boundary.
/// The boundary passes through the origin, so a bias-free network can separate them.
fn separable(len: usize, seed: u64) -> Vec<Instance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        let x0: f64 = rng.gen_range(-1.0..=1.0);
        let x1: f64 = rng.gen_range(-1.0..=1.0);
        let d = x0 - x1;
        if d.abs() < 0.3 {
            continue;
        }
        data.push(Instance {
            attributes: vec![x0, x1],
            classification: if d > 0.0 { 1.0 } else { 0.0 },
        });
    }
    data
}

fn shared_network(seed: u64) -> SharedNetwork {
    let network = NetworkBuilder::new(2, 1)
        .unwrap()
        .hidden_layer(4)
        .unwrap()
        .build_with_seed(seed)
        .unwrap();
    network::shared(network)
}

fn wait_while_running(learn: &Learn) {
    let deadline = Instant::now() + Duration::from_secs(60);
    while learn.is_running() {
        assert!(Instant::now() < deadline, "training did not finish in time");
        thread::sleep(Duration::from_millis(5));
    }
}

fn wait_for_epochs(learn: &Learn, epochs: usize) {
    let deadline = Instant::now() + Duration::from_secs(60);
    while learn.epoch_index() < epochs {
        assert!(learn.is_running(), "training ended early: {:?}", learn.status());
        assert!(Instant::now() < deadline, "no progress");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn background_training_converges_on_separable_data() {
    let set = TrainingSet::from_instances(PLANE, separable(200, 3), 20.0).unwrap();
    let mut learn = Learn::with_options(
        set,
        LearnOptions {
            learning_rate: 0.5,
            epsilon: 0.05,
            max_epochs: 5000,
        },
    );
    let network = shared_network(0);

    learn.start(&network).unwrap();
    wait_while_running(&learn);
    learn.stop();

    let snapshot = learn.snapshot();
    assert_eq!(snapshot.status, Status::Converged, "{snapshot:?}");
    assert!(snapshot.epoch_error < 0.05);

    let graph = learn.error_graph();
    assert_eq!(graph.len(), snapshot.epoch_index);
    assert_eq!(graph.indices[0], 0.0);
    assert!(graph.errors.last().unwrap() < &graph.errors[0]);

    let percentage = learn.test(&mut network::lock(&network)).unwrap();
    assert!(percentage >= 90.0, "accuracy {percentage}");
}

#[test]
fn stop_freezes_weights() {
    let set = TrainingSet::from_instances(PLANE, separable(100, 5), 20.0).unwrap();
    let mut learn = Learn::with_options(
        set,
        LearnOptions {
            learning_rate: 0.1,
            epsilon: 0.0,
            max_epochs: usize::MAX,
        },
    );
    let network = shared_network(1);

    learn.start(&network).unwrap();
    wait_for_epochs(&learn, 2);
    learn.stop();

    assert!(!learn.is_running());
    assert_eq!(learn.status(), Status::Stopped);
    let snapshot = learn.snapshot();
    let weights = network::lock(&network).weights();

    thread::sleep(Duration::from_millis(50));
    assert_eq!(network::lock(&network).weights(), weights);
    assert_eq!(learn.snapshot(), snapshot);
}

#[test]
fn start_resumes_and_reset_starts_over() {
    let set = TrainingSet::from_instances(PLANE, separable(50, 7), 20.0).unwrap();
    let options = LearnOptions {
        learning_rate: 0.2,
        epsilon: 0.0,
        max_epochs: 6,
    };
    let mut learn = Learn::with_options(set, options);
    let network = shared_network(2);

    learn.start(&network).unwrap();
    wait_while_running(&learn);
    assert_eq!(learn.status(), Status::EpochLimit);
    assert_eq!(learn.epoch_index(), 6);

    // Counters are kept: the limit is hit again immediately.
    learn.start(&network).unwrap();
    wait_while_running(&learn);
    assert_eq!(learn.epoch_index(), 6);
    assert_eq!(learn.error_graph().len(), 6);

    learn.reset();
    assert_eq!(learn.status(), Status::Idle);
    assert_eq!(learn.epoch_index(), 0);
    assert!(learn.error_graph().is_empty());
    assert_eq!(*learn.options(), options);
}

#[test]
fn exclusive_operations_fail_while_running() {
    let set = TrainingSet::from_instances(PLANE, separable(100, 9), 20.0).unwrap();
    let mut learn = Learn::with_options(
        set,
        LearnOptions {
            learning_rate: 0.1,
            epsilon: 0.0,
            max_epochs: usize::MAX,
        },
    );
    let network = shared_network(3);
    let mut other = NetworkBuilder::new(2, 1)
        .unwrap()
        .hidden_layer(4)
        .unwrap()
        .build_with_seed(4)
        .unwrap();

    learn.start(&network).unwrap();
    assert!(matches!(learn.start(&network), Err(Error::Running)));
    assert!(matches!(learn.update(&mut other), Err(Error::Running)));
    assert!(matches!(learn.test(&mut other), Err(Error::Running)));
    assert!(matches!(learn.training_set_mut(), Err(Error::Running)));

    learn.stop();
    assert!(learn.update(&mut other).is_ok());
}

#[test]
fn dropping_a_running_trainer_joins_the_worker() {
    let set = TrainingSet::from_instances(PLANE, separable(100, 11), 20.0).unwrap();
    let network = shared_network(5);
    {
        let mut learn = Learn::with_options(
            set,
            LearnOptions {
                learning_rate: 0.1,
                epsilon: 0.0,
                max_epochs: usize::MAX,
            },
        );
        learn.start(&network).unwrap();
        wait_for_epochs(&learn, 1);
    }

    let weights = network::lock(&network).weights();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(network::lock(&network).weights(), weights);
}
