use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use tracing::info;

use crate::{Error, Layer, LayerKind, Result};

/// A network handed to a background training worker.
///
/// The worker holds the lock for exactly one training step at a time.
pub type SharedNetwork = Arc<Mutex<Network>>;

pub fn shared(network: Network) -> SharedNetwork {
    Arc::new(Mutex::new(network))
}

/// Lock a shared network, recovering the guard if the lock is poisoned.
pub fn lock(network: &SharedNetwork) -> MutexGuard<'_, Network> {
    network.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A feedforward network: zero or more `tanh` hidden layers followed by one
/// `sigmoid` output layer.
///
/// `inputs` and `outputs` are fixed at construction. The hidden topology is
/// (re)built with [`Network::setup`]; a network must have at least one hidden
/// layer before it can [`run`](Network::run).
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    inputs: usize,
    outputs: usize,
    hidden_layers: Vec<Layer>,
    output_layer: Layer,
    // Reused buffer holding the input vector of the layer being evaluated.
    layer_inputs: Vec<f64>,
}

impl Network {
    /// Empty network accepting `inputs` values and producing `outputs` values.
    pub fn new(inputs: usize, outputs: usize) -> Result<Self> {
        if inputs == 0 {
            return Err(Error::InvalidConfig("inputs must be > 0".to_owned()));
        }
        if outputs == 0 {
            return Err(Error::InvalidConfig("outputs must be > 0".to_owned()));
        }

        Ok(Self {
            inputs,
            outputs,
            hidden_layers: Vec::new(),
            output_layer: Layer::new(LayerKind::Output, outputs, 0),
            layer_inputs: Vec::with_capacity(inputs),
        })
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// True once `setup` has produced at least one hidden layer.
    #[inline]
    pub fn is_setup(&self) -> bool {
        !self.hidden_layers.is_empty()
    }

    #[inline]
    pub fn hidden_layers(&self) -> &[Layer] {
        &self.hidden_layers
    }

    #[inline]
    pub fn hidden_layers_mut(&mut self) -> &mut [Layer] {
        &mut self.hidden_layers
    }

    #[inline]
    pub fn output_layer(&self) -> &Layer {
        &self.output_layer
    }

    #[inline]
    pub fn output_layer_mut(&mut self) -> &mut Layer {
        &mut self.output_layer
    }

    /// Widths of the hidden layers, in order.
    pub fn hidden_widths(&self) -> Vec<usize> {
        self.hidden_layers.iter().map(Layer::width).collect()
    }

    /// Rebuild the hidden layers (one per entry of `hidden_layers`) and randomize
    /// every weight, using the thread-local RNG.
    pub fn setup(&mut self, hidden_layers: &[usize]) -> Result<()> {
        self.setup_with_rng(hidden_layers, &mut rand::thread_rng())
    }

    /// Rebuild the hidden layers and randomize every weight using `rng`.
    ///
    /// Rejects an empty width list or a zero width and leaves the network untouched.
    pub fn setup_with_rng<R: Rng + ?Sized>(
        &mut self,
        hidden_layers: &[usize],
        rng: &mut R,
    ) -> Result<()> {
        if hidden_layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one hidden layer".to_owned(),
            ));
        }
        if let Some(idx) = hidden_layers.iter().position(|&w| w == 0) {
            return Err(Error::InvalidConfig(format!(
                "hidden layer {idx} must have at least one neuron"
            )));
        }

        self.clear();

        let mut fan_in = self.inputs;
        self.hidden_layers.reserve(hidden_layers.len());
        for &width in hidden_layers {
            self.hidden_layers
                .push(Layer::new_random(LayerKind::Hidden, width, fan_in, rng));
            fan_in = width;
        }
        self.output_layer.initialize(fan_in, rng);

        info!(
            inputs = self.inputs,
            outputs = self.outputs,
            hidden = ?hidden_layers,
            "network setup"
        );
        Ok(())
    }

    /// Re-randomize every weight in place, keeping the topology.
    pub fn initialize_neurons(&mut self) {
        self.initialize_neurons_with_rng(&mut rand::thread_rng());
    }

    pub fn initialize_neurons_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut fan_in = self.inputs;
        for layer in &mut self.hidden_layers {
            layer.initialize(fan_in, rng);
            fan_in = layer.width();
        }
        self.output_layer.initialize(fan_in, rng);
    }

    fn clear(&mut self) {
        self.hidden_layers.clear();
        self.output_layer = Layer::new(LayerKind::Output, self.outputs, 0);
    }

    /// Forward pass for a single instance.
    ///
    /// Every neuron caches its output; `outputs` receives the output layer's values
    /// in neuron order.
    ///
    /// Shape contract (panics on violation):
    /// - the network has been set up
    /// - `inputs.len() == self.inputs()`
    /// - `outputs.len() == self.outputs()`
    pub fn run(&mut self, inputs: &[f64], outputs: &mut [f64]) {
        assert!(
            self.is_setup(),
            "network must be set up with at least one hidden layer before running"
        );
        assert_eq!(
            inputs.len(),
            self.inputs,
            "input len {} does not match network inputs {}",
            inputs.len(),
            self.inputs
        );
        assert_eq!(
            outputs.len(),
            self.outputs,
            "output len {} does not match network outputs {}",
            outputs.len(),
            self.outputs
        );

        let mut current = std::mem::take(&mut self.layer_inputs);
        current.clear();
        current.extend_from_slice(inputs);

        for layer in &mut self.hidden_layers {
            layer.forward(&current);
            current.clear();
            current.extend(layer.outputs());
        }
        self.output_layer.forward(&current);

        self.layer_inputs = current;

        for (out, y) in outputs.iter_mut().zip(self.output_layer.outputs()) {
            *out = y;
        }
    }

    /// Allocating convenience wrapper around [`Network::run`].
    pub fn predict(&mut self, inputs: &[f64]) -> Vec<f64> {
        let mut outputs = vec![0.0; self.outputs];
        self.run(inputs, &mut outputs);
        outputs
    }

    /// All weights, hidden layers first, neuron by neuron.
    pub fn weights(&self) -> Vec<f64> {
        self.hidden_layers
            .iter()
            .chain(std::iter::once(&self.output_layer))
            .flat_map(|layer| layer.neurons())
            .flat_map(|neuron| neuron.weights().iter().copied())
            .collect()
    }

    /// True if every weight is finite.
    pub fn is_finite(&self) -> bool {
        self.hidden_layers
            .iter()
            .chain(std::iter::once(&self.output_layer))
            .flat_map(|layer| layer.neurons())
            .all(|neuron| neuron.weights().iter().all(|w| w.is_finite()))
    }

    pub(crate) fn layers_mut(&mut self) -> (&mut [Layer], &mut Layer) {
        (&mut self.hidden_layers, &mut self.output_layer)
    }
}
