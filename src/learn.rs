//! Training orchestration.
//!
//! [`Learn`] drives online backpropagation over the training partition of a
//! [`TrainingSet`], one instance per step, and aggregates step errors into one
//! epoch error per full pass.
//!
//! Training can be stepped on the caller's thread with [`Learn::update`] or run on a
//! background worker with [`Learn::start`] / [`Learn::stop`]. The worker locks the
//! [`SharedNetwork`] for one step at a time and publishes its progress through
//! atomics plus a locked error graph, so the foreground can read a
//! [`LearnSnapshot`] at any time. `stop` joins the worker: once it returns, nothing
//! touches the network anymore.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::backprop::backpropagate;
use crate::metrics::{Test, TestReport};
use crate::network::{self, SharedNetwork};
use crate::{Error, LearnOptions, Network, Result, TrainingSet, loss};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Lifecycle of a training run.
pub enum Status {
    /// Nothing has run since creation or the last reset.
    Idle,
    /// A background worker is stepping.
    Running,
    /// The worker was stopped before reaching a terminal condition.
    Stopped,
    /// An epoch error fell below epsilon.
    Converged,
    /// The epoch cap was reached.
    EpochLimit,
    /// A step produced a non-finite error or weight.
    Diverged,
}

impl Status {
    fn to_u8(self) -> u8 {
        match self {
            Status::Idle => 0,
            Status::Running => 1,
            Status::Stopped => 2,
            Status::Converged => 3,
            Status::EpochLimit => 4,
            Status::Diverged => 5,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Status::Running,
            2 => Status::Stopped,
            3 => Status::Converged,
            4 => Status::EpochLimit,
            5 => Status::Diverged,
            _ => Status::Idle,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Epoch error history as two parallel sequences, ready for plotting.
pub struct ErrorGraph {
    pub indices: Vec<f64>,
    pub errors: Vec<f64>,
}

impl ErrorGraph {
    pub fn push(&mut self, epoch_index: usize, epoch_error: f64) {
        self.indices.push(epoch_index as f64);
        self.errors.push(epoch_error);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.errors.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Progress counters as seen at one point in time.
pub struct LearnSnapshot {
    pub epoch_index: usize,
    pub step_index: usize,
    /// Error of the last completed epoch (`inf` before the first one completes).
    pub epoch_error: f64,
    pub status: Status,
}

/// Progress shared between the trainer and its worker.
#[derive(Debug)]
struct Progress {
    epoch_index: AtomicUsize,
    step_index: AtomicUsize,
    epoch_error: AtomicU64,
    status: AtomicU8,
    running: AtomicBool,
    stop_requested: AtomicBool,
    graph: Mutex<ErrorGraph>,
}

impl Progress {
    fn new() -> Self {
        Self {
            epoch_index: AtomicUsize::new(0),
            step_index: AtomicUsize::new(0),
            epoch_error: AtomicU64::new(f64::INFINITY.to_bits()),
            status: AtomicU8::new(Status::Idle.to_u8()),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            graph: Mutex::new(ErrorGraph::default()),
        }
    }

    fn epoch_index(&self) -> usize {
        self.epoch_index.load(Ordering::Acquire)
    }

    fn step_index(&self) -> usize {
        self.step_index.load(Ordering::Acquire)
    }

    fn epoch_error(&self) -> f64 {
        f64::from_bits(self.epoch_error.load(Ordering::Acquire))
    }

    fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: Status) {
        self.status.store(status.to_u8(), Ordering::Release);
    }

    fn graph(&self) -> MutexGuard<'_, ErrorGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_epoch(&self, epoch_index: usize, epoch_error: f64) {
        self.graph().push(epoch_index, epoch_error);
        self.epoch_error
            .store(epoch_error.to_bits(), Ordering::Release);
        self.step_index.store(0, Ordering::Release);
        self.epoch_index.store(epoch_index + 1, Ordering::Release);
    }

    fn reset(&self) {
        self.epoch_index.store(0, Ordering::Release);
        self.step_index.store(0, Ordering::Release);
        self.epoch_error
            .store(f64::INFINITY.to_bits(), Ordering::Release);
        self.set_status(Status::Idle);
        self.graph().clear();
    }

    fn snapshot(&self) -> LearnSnapshot {
        LearnSnapshot {
            epoch_index: self.epoch_index(),
            step_index: self.step_index(),
            epoch_error: self.epoch_error(),
            status: self.status(),
        }
    }
}

/// Buffers owned by whoever is stepping: the caller's thread for `update`,
/// the worker while a background run is active.
#[derive(Debug, Clone, Default)]
struct Scratch {
    inputs: Vec<f64>,
    outputs: Vec<f64>,
    expected: Vec<f64>,
    step_errors: Vec<f64>,
}

// Clears the running flag when the worker exits, including by panic.
struct RunningGuard(Arc<Progress>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

/// Trainer: hyperparameters, the training set, progress and the last test results.
#[derive(Debug)]
pub struct Learn {
    options: LearnOptions,
    training_set: Arc<TrainingSet>,
    progress: Arc<Progress>,
    scratch: Scratch,
    worker: Option<JoinHandle<Scratch>>,
    report: TestReport,
}

impl Learn {
    pub fn new(training_set: TrainingSet) -> Self {
        Self::with_options(training_set, LearnOptions::default())
    }

    pub fn with_options(training_set: TrainingSet, options: LearnOptions) -> Self {
        Self {
            options,
            training_set: Arc::new(training_set),
            progress: Arc::new(Progress::new()),
            scratch: Scratch::default(),
            worker: None,
            report: TestReport::default(),
        }
    }

    #[inline]
    pub fn options(&self) -> &LearnOptions {
        &self.options
    }

    /// Replace the hyperparameters. A running worker keeps the values it started with.
    pub fn set_options(&mut self, options: LearnOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Restore default hyperparameters.
    pub fn reset_options(&mut self) {
        self.options = LearnOptions::default();
    }

    #[inline]
    pub fn training_set(&self) -> &TrainingSet {
        &self.training_set
    }

    /// Mutable access to the training set while no worker is running.
    ///
    /// The current partial epoch is discarded, since the instance order may change.
    pub fn training_set_mut(&mut self) -> Result<&mut TrainingSet> {
        if self.is_running() {
            return Err(Error::Running);
        }
        self.join_worker();
        self.progress.step_index.store(0, Ordering::Release);
        self.scratch.step_errors.clear();
        Ok(Arc::make_mut(&mut self.training_set))
    }

    /// True while a background worker is stepping.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.progress.running.load(Ordering::Acquire)
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.progress.status()
    }

    #[inline]
    pub fn epoch_index(&self) -> usize {
        self.progress.epoch_index()
    }

    #[inline]
    pub fn step_index(&self) -> usize {
        self.progress.step_index()
    }

    #[inline]
    pub fn epoch_error(&self) -> f64 {
        self.progress.epoch_error()
    }

    pub fn snapshot(&self) -> LearnSnapshot {
        self.progress.snapshot()
    }

    /// Copy of the `(epoch index, epoch error)` history.
    pub fn error_graph(&self) -> ErrorGraph {
        self.progress.graph().clone()
    }

    /// One training step on the caller's thread. Returns `true` when training should stop.
    ///
    /// Fails with [`Error::Running`] while a worker owns the run, with
    /// [`Error::InvalidConfig`] for invalid options, with [`Error::Diverged`] if the
    /// step produced a non-finite error or weight.
    pub fn update(&mut self, network: &mut Network) -> Result<bool> {
        if self.is_running() {
            return Err(Error::Running);
        }
        self.join_worker();
        self.options.validate()?;
        self.check_network(network)?;
        self.check_training_partition()?;

        step(
            &self.options,
            &self.training_set,
            &self.progress,
            &mut self.scratch,
            network,
        )
    }

    /// Spawn a worker that steps until a terminal condition or [`Learn::stop`].
    ///
    /// Progress continues from the current counters; call [`Learn::reset`] first
    /// to start over.
    pub fn start(&mut self, network: &SharedNetwork) -> Result<()> {
        if self.is_running() {
            return Err(Error::Running);
        }
        self.join_worker();
        self.options.validate()?;
        self.check_network(&network::lock(network))?;
        self.check_training_partition()?;

        let options = self.options;
        let training_set = Arc::clone(&self.training_set);
        let progress = Arc::clone(&self.progress);
        let network = Arc::clone(network);
        let scratch = std::mem::take(&mut self.scratch);

        self.progress.stop_requested.store(false, Ordering::Release);
        self.progress.running.store(true, Ordering::Release);
        self.progress.set_status(Status::Running);

        let spawned = thread::Builder::new()
            .name("learn".to_owned())
            .spawn(move || train(options, training_set, progress, network, scratch));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!(
                    learning_rate = options.learning_rate,
                    epsilon = options.epsilon,
                    max_epochs = options.max_epochs,
                    epoch = self.epoch_index(),
                    "training started"
                );
                Ok(())
            }
            Err(e) => {
                self.progress.running.store(false, Ordering::Release);
                self.progress.set_status(Status::Stopped);
                Err(e.into())
            }
        }
    }

    /// Ask the worker to stop and wait for it.
    ///
    /// The in-flight step always completes. After this returns the worker has
    /// exited and no longer touches the network. A no-op when nothing runs.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.progress.stop_requested.store(true, Ordering::Release);
        self.join_worker();
        self.progress.stop_requested.store(false, Ordering::Release);

        let snapshot = self.snapshot();
        info!(
            epoch = snapshot.epoch_index,
            step = snapshot.step_index,
            error = snapshot.epoch_error,
            status = ?snapshot.status,
            "training stopped"
        );
    }

    /// Stop, then clear counters, history and test results. Options are kept.
    pub fn reset(&mut self) {
        self.stop();
        self.progress.reset();
        self.scratch.step_errors.clear();
        self.report = TestReport::default();
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        match handle.join() {
            Ok(scratch) => self.scratch = scratch,
            Err(_) => {
                error!("training worker panicked");
                self.scratch = Scratch::default();
                self.progress.set_status(Status::Stopped);
            }
        }
    }

    /// Evaluate the held-out partition.
    ///
    /// Returns the percentage of passed instances and keeps one [`Test`] record per
    /// instance. Weights are not modified.
    pub fn test(&mut self, network: &mut Network) -> Result<f64> {
        if self.is_running() {
            return Err(Error::Running);
        }
        self.check_network(network)?;

        let offset = self.training_set.training_instance_count();
        let testing = self.training_set.testing();
        if testing.is_empty() {
            return Err(Error::InvalidData(
                "testing partition is empty".to_owned(),
            ));
        }

        let mut outputs = vec![0.0; network.outputs()];
        let tests = testing
            .iter()
            .enumerate()
            .map(|(i, instance)| {
                network.run(&instance.attributes, &mut outputs);
                Test::evaluate(offset + i, instance, &outputs)
            })
            .collect();
        self.report = TestReport { tests };

        let percentage = self.report.percentage();
        info!(
            passed = self.report.passed(),
            total = self.report.total(),
            percentage,
            "test finished"
        );
        Ok(percentage)
    }

    /// Per-instance records of the last [`Learn::test`].
    #[inline]
    pub fn tests(&self) -> &[Test] {
        &self.report.tests
    }

    #[inline]
    pub fn report(&self) -> &TestReport {
        &self.report
    }

    /// Normalize raw attribute values with the training set's schema and run them.
    pub fn classify(&self, network: &mut Network, raw_attributes: &[f64]) -> Result<Vec<f64>> {
        self.check_network(network)?;
        let schema = self.training_set.schema();
        if raw_attributes.len() != schema.attribute_count() {
            return Err(Error::InvalidShape(format!(
                "got {} attribute values, schema {} has {}",
                raw_attributes.len(),
                schema.name,
                schema.attribute_count()
            )));
        }

        let mut inputs = raw_attributes.to_vec();
        schema.normalize_attributes(&mut inputs);
        Ok(network.predict(&inputs))
    }

    fn check_network(&self, network: &Network) -> Result<()> {
        if !network.is_setup() {
            return Err(Error::InvalidConfig(
                "network has no hidden layers; call setup first".to_owned(),
            ));
        }
        let attributes = self.training_set.schema().attribute_count();
        if network.inputs() != attributes {
            return Err(Error::InvalidShape(format!(
                "network inputs {} do not match the {attributes} attributes of {}",
                network.inputs(),
                self.training_set.schema().name
            )));
        }
        if network.outputs() != 1 {
            return Err(Error::InvalidShape(format!(
                "network must have one output per binary label, has {}",
                network.outputs()
            )));
        }
        Ok(())
    }

    fn check_training_partition(&self) -> Result<()> {
        if self.training_set.training().is_empty() {
            return Err(Error::InvalidData(
                "training partition is empty".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Drop for Learn {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker loop: step until told to stop, a terminal condition, or an error.
fn train(
    options: LearnOptions,
    training_set: Arc<TrainingSet>,
    progress: Arc<Progress>,
    network: SharedNetwork,
    mut scratch: Scratch,
) -> Scratch {
    let _running = RunningGuard(Arc::clone(&progress));

    loop {
        if progress.stop_requested.load(Ordering::Acquire) {
            progress.set_status(Status::Stopped);
            break;
        }

        let result = {
            let mut network = network::lock(&network);
            step(&options, &training_set, &progress, &mut scratch, &mut network)
        };

        match result {
            Ok(false) => {}
            Ok(true) | Err(_) => {
                let snapshot = progress.snapshot();
                info!(
                    epoch = snapshot.epoch_index,
                    error = snapshot.epoch_error,
                    status = ?snapshot.status,
                    "training finished"
                );
                break;
            }
        }
    }

    scratch
}

/// One training step. Returns `true` when a terminal condition holds.
fn step(
    options: &LearnOptions,
    training_set: &TrainingSet,
    progress: &Progress,
    scratch: &mut Scratch,
    network: &mut Network,
) -> Result<bool> {
    let epoch = progress.epoch_index();
    if epoch >= options.max_epochs {
        progress.set_status(Status::EpochLimit);
        return Ok(true);
    }
    if progress.epoch_error() < options.epsilon {
        progress.set_status(Status::Converged);
        return Ok(true);
    }

    let training = training_set.training();
    let step = progress.step_index();
    let instance = &training[step];

    scratch.inputs.clear();
    scratch.inputs.extend_from_slice(&instance.attributes);
    scratch.expected.clear();
    scratch.expected.resize(network.outputs(), instance.classification);
    scratch.outputs.resize(network.outputs(), 0.0);

    network.run(&scratch.inputs, &mut scratch.outputs);

    let step_error = loss::squared_error(&scratch.outputs, &scratch.expected);
    if !step_error.is_finite() {
        error!(epoch, step, "step error is not finite");
        progress.set_status(Status::Diverged);
        return Err(Error::Diverged { epoch, step });
    }

    backpropagate(
        network,
        &scratch.inputs,
        &scratch.expected,
        options.learning_rate,
    );
    // Nothing is recorded for a diverged step: `step_errors` keeps one entry per
    // completed step of the current epoch.
    if !network.is_finite() {
        error!(epoch, step, "weights are not finite");
        progress.set_status(Status::Diverged);
        return Err(Error::Diverged { epoch, step });
    }
    scratch.step_errors.push(step_error);

    let next = step + 1;
    if next < training.len() {
        progress.step_index.store(next, Ordering::Release);
        return Ok(false);
    }

    let epoch_error = loss::epoch_error(&scratch.step_errors);
    scratch.step_errors.clear();
    progress.finish_epoch(epoch, epoch_error);
    debug!(epoch, error = epoch_error, "epoch finished");

    Ok(false)
}
