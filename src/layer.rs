use rand::Rng;

use crate::Neuron;
use crate::activation::Activation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Role of a layer in the network. The role fixes the activation.
pub enum LayerKind {
    /// `tanh` activation, any width.
    Hidden,
    /// `sigmoid` activation, width fixed when the network is created.
    Output,
}

impl LayerKind {
    #[inline]
    pub fn activation(self) -> Activation {
        match self {
            LayerKind::Hidden => Activation::Tanh,
            LayerKind::Output => Activation::Sigmoid,
        }
    }
}

/// An ordered sequence of neurons that share the same fan-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    kind: LayerKind,
    neurons: Vec<Neuron>,
}

impl Layer {
    /// Layer of `width` neurons, each with `fan_in` zero weights.
    pub fn new(kind: LayerKind, width: usize, fan_in: usize) -> Self {
        Self {
            kind,
            neurons: (0..width).map(|_| Neuron::new(fan_in)).collect(),
        }
    }

    /// Layer of `width` neurons, each with `fan_in` uniform weights in `[-1, 1]`.
    pub fn new_random<R: Rng + ?Sized>(
        kind: LayerKind,
        width: usize,
        fan_in: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            kind,
            neurons: (0..width).map(|_| Neuron::new_random(fan_in, rng)).collect(),
        }
    }

    #[inline]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.kind.activation()
    }

    /// Number of neurons.
    #[inline]
    pub fn width(&self) -> usize {
        self.neurons.len()
    }

    /// Fan-in shared by every neuron (0 for an empty layer).
    #[inline]
    pub fn fan_in(&self) -> usize {
        self.neurons.first().map_or(0, Neuron::n)
    }

    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Mutable neurons. The slice length (the layer width) cannot change through it.
    #[inline]
    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    /// Re-randomize every weight and give every neuron a fan-in of `fan_in`.
    pub fn initialize<R: Rng + ?Sized>(&mut self, fan_in: usize, rng: &mut R) {
        for neuron in &mut self.neurons {
            neuron.resize(fan_in, rng);
            neuron.randomize(rng);
        }
    }

    /// Forward pass: every neuron caches `activation(Σ inputs * weights)`.
    ///
    /// Shape contract: `inputs.len() == self.fan_in()`.
    #[inline]
    pub fn forward(&mut self, inputs: &[f64]) {
        let activation = self.activation();
        for neuron in &mut self.neurons {
            neuron.forward(inputs, activation);
        }
    }

    /// Cached outputs of the last forward pass, in neuron order.
    pub fn outputs(&self) -> impl Iterator<Item = f64> + '_ {
        self.neurons.iter().map(Neuron::output)
    }

    /// Error flowing back into input `i` of this layer: `Σ_k weight_k[i] * delta_k`.
    #[inline]
    pub(crate) fn back_error(&self, i: usize) -> f64 {
        self.neurons
            .iter()
            .map(|neuron| neuron.weights()[i] * neuron.delta)
            .sum()
    }
}
