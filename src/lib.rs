//! Feedforward neural networks trained with online backpropagation.
//!
//! `rust-nn-trainer` builds small fully connected networks (`tanh` hidden layers,
//! one `sigmoid` output layer, no biases) and trains them one instance at a time
//! on tabular binary-classification data, optionally on a background thread.
//!
//! # Panics vs `Result`
//!
//! - Low-level hot path (panics on misuse): [`Network::run`],
//!   [`backprop::backpropagate`], [`Schema::normalize_attributes`]. Shape mismatches
//!   are programmer error and panic via `assert!`.
//! - Everything configured by a caller or read from a file returns [`Result`]:
//!   topology, hyperparameters, split percentages, training files, and the
//!   [`Learn`] entry points, which also check that network and data agree.
//!
//! # Data layout
//!
//! - Scalars are `f64`.
//! - Every neuron owns one weight per input of its layer; there are no biases.
//! - A [`TrainingSet`] keeps instances in order; the first
//!   `training_instance_count` form the training partition, the rest are held out.
//!
//! # Quick start
//!
//! ```rust
//! use rust_nn_trainer::{Instance, Learn, LearnOptions, NetworkBuilder, TrainingSet};
//! use rust_nn_trainer::QUALITATIVE_BANKRUPTCY;
//!
//! # fn main() -> rust_nn_trainer::Result<()> {
//! let data = (0..10)
//!     .map(|i| Instance {
//!         attributes: vec![(i % 2) as f64; 6],
//!         classification: (i % 2) as f64,
//!     })
//!     .collect();
//! let set = TrainingSet::from_instances(QUALITATIVE_BANKRUPTCY, data, 20.0)?;
//!
//! let mut network = NetworkBuilder::new(6, 1)?.hidden_layer(4)?.build_with_seed(0)?;
//! let mut learn = Learn::with_options(
//!     set,
//!     LearnOptions {
//!         learning_rate: 0.5,
//!         epsilon: 0.01,
//!         max_epochs: 200,
//!     },
//! );
//!
//! while !learn.update(&mut network)? {}
//! let _percentage = learn.test(&mut network)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Background training
//!
//! ```rust,no_run
//! use rust_nn_trainer::{network, Learn, NetworkBuilder, TrainingSet, AMERICAN_BANKRUPTCY};
//!
//! # fn main() -> rust_nn_trainer::Result<()> {
//! let mut set = TrainingSet::new(AMERICAN_BANKRUPTCY);
//! set.load("american_bankruptcy.csv", 20.0)?;
//! set.shuffle();
//! set.normalize();
//!
//! let shared = network::shared(NetworkBuilder::new(18, 1)?.hidden_layers(&[50, 50])?.build()?);
//! let mut learn = Learn::new(set);
//! learn.start(&shared)?;
//! while learn.is_running() {
//!     let progress = learn.snapshot();
//!     println!("epoch {} error {}", progress.epoch_index, progress.epoch_error);
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! learn.stop();
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod backprop;
pub mod builder;
pub mod config;
pub mod error;
pub mod layer;
pub mod learn;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod neuron;
pub mod session;
pub mod training_set;

pub use activation::Activation;
pub use builder::NetworkBuilder;
pub use config::{Config, LearnOptions, NetworkConfig};
pub use error::{Error, Result};
pub use layer::{Layer, LayerKind};
pub use learn::{ErrorGraph, Learn, LearnSnapshot, Status};
pub use metrics::{Test, TestReport};
pub use network::{Network, SharedNetwork};
pub use neuron::Neuron;
pub use session::{Operation, Screen, Session};
pub use training_set::{
    AMERICAN_BANKRUPTCY, Attribute, AttributeKind, Column, Instance, QUALITATIVE_BANKRUPTCY,
    Schema, TrainingSet,
};
