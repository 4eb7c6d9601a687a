//! Application controller for an interactive front end.
//!
//! [`Session`] owns the network, the trainer and the current [`Screen`]. A front end
//! forwards user intents as [`Operation`]s and reads progress back; it keeps its own
//! widget state.

use std::path::Path;

use tracing::{debug, info};

use crate::learn::{ErrorGraph, Learn, LearnSnapshot};
use crate::metrics::Test;
use crate::network::{self, SharedNetwork};
use crate::{Config, Error, LearnOptions, Network, Result, TrainingSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// User intent reported by the front end.
pub enum Operation {
    #[default]
    None,
    Start,
    Stop,
    Reinitialize,
    Test,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for a loaded, normalized training set and a topology.
    Setup,
    /// Network built; training can start.
    ReadyLearning,
    /// A worker is training.
    Learning,
    /// Showing held-out results.
    Testing,
    /// Running ad hoc instances.
    Executing,
}

#[derive(Debug)]
pub struct Session {
    network: SharedNetwork,
    learn: Learn,
    screen: Screen,
}

impl Session {
    pub fn new(network: Network, training_set: TrainingSet) -> Self {
        Self {
            network: network::shared(network),
            learn: Learn::new(training_set),
            screen: Screen::Setup,
        }
    }

    /// Build the network described by `config` and use its training options.
    pub fn from_config(config: &Config, training_set: TrainingSet) -> Result<Self> {
        config.validate()?;
        let network = config.network.builder()?.build()?;
        let mut session = Self::new(network, training_set);
        session.learn.set_options(config.learn)?;
        Ok(session)
    }

    #[inline]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[inline]
    pub fn network(&self) -> &SharedNetwork {
        &self.network
    }

    #[inline]
    pub fn learn(&self) -> &Learn {
        &self.learn
    }

    #[inline]
    pub fn learn_mut(&mut self) -> &mut Learn {
        &mut self.learn
    }

    /// Load, shuffle and normalize a training file, then go back to [`Screen::Setup`].
    ///
    /// On failure the previous training set, progress and test results are kept.
    pub fn load_training_set<P: AsRef<Path>>(
        &mut self,
        path: P,
        percent_for_testing: f64,
    ) -> Result<()> {
        if self.learn.is_running() {
            return Err(Error::Running);
        }
        let mut loaded = TrainingSet::new(*self.learn.training_set().schema());
        loaded.load(path, percent_for_testing)?;
        loaded.shuffle();
        loaded.normalize();

        self.learn.reset();
        *self.learn.training_set_mut()? = loaded;
        self.screen = Screen::Setup;
        Ok(())
    }

    /// Rebuild the network with `hidden_layers` and adopt `options`.
    ///
    /// Returns `Ok(false)` without touching anything while the training set is not
    /// loaded and normalized.
    pub fn learning_setup(&mut self, hidden_layers: &[usize], options: LearnOptions) -> Result<bool> {
        if self.learn.is_running() {
            return Err(Error::Running);
        }
        let set = self.learn.training_set();
        if !(set.is_loaded() && set.is_normalized()) {
            debug!("learning setup skipped: training set not ready");
            return Ok(false);
        }
        options.validate()?;

        network::lock(&self.network).setup(hidden_layers)?;
        self.learn.set_options(options)?;
        self.learn.reset();
        self.screen = Screen::ReadyLearning;
        Ok(true)
    }

    /// Carry out a user intent.
    pub fn learning_process(&mut self, operation: Operation) -> Result<()> {
        if operation == Operation::None {
            return Ok(());
        }
        if self.screen == Screen::Setup {
            return Err(Error::InvalidState(format!(
                "{operation:?} needs a configured network"
            )));
        }

        match operation {
            Operation::None => {}
            Operation::Start => {
                self.learn.reset();
                self.learn.start(&self.network)?;
                self.screen = Screen::Learning;
            }
            Operation::Stop => {
                self.learn.stop();
                self.screen = Screen::ReadyLearning;
            }
            Operation::Reinitialize => {
                if self.learn.is_running() {
                    return Err(Error::Running);
                }
                self.learn.reset();
                network::lock(&self.network).initialize_neurons();
                info!("network reinitialized");
            }
            Operation::Test => {
                self.test()?;
                self.screen = Screen::Testing;
            }
            Operation::Execute => {
                if self.learn.is_running() {
                    return Err(Error::Running);
                }
                self.screen = Screen::Executing;
            }
        }
        Ok(())
    }

    /// Read progress; leaves [`Screen::Learning`] once the worker has finished.
    pub fn poll(&mut self) -> LearnSnapshot {
        if self.screen == Screen::Learning && !self.learn.is_running() {
            self.learn.stop();
            self.screen = Screen::ReadyLearning;
        }
        self.learn.snapshot()
    }

    pub fn learning_graph(&self) -> ErrorGraph {
        self.learn.error_graph()
    }

    /// Evaluate the held-out partition; see [`Learn::test`].
    pub fn test(&mut self) -> Result<f64> {
        self.learn.test(&mut network::lock(&self.network))
    }

    #[inline]
    pub fn tests(&self) -> &[Test] {
        self.learn.tests()
    }

    /// Classify one instance of raw attribute values.
    pub fn run(&mut self, raw_attributes: &[f64]) -> Result<Vec<f64>> {
        if self.learn.is_running() {
            return Err(Error::Running);
        }
        self.learn
            .classify(&mut network::lock(&self.network), raw_attributes)
    }

    /// Return to the previous screen, stopping training if needed.
    pub fn back(&mut self) {
        self.screen = match self.screen {
            Screen::Setup | Screen::ReadyLearning => Screen::Setup,
            Screen::Learning => {
                self.learn.stop();
                Screen::ReadyLearning
            }
            Screen::Testing | Screen::Executing => Screen::ReadyLearning,
        };
    }
}
