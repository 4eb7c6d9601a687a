use rand::Rng;

use crate::activation::{self, Activation};

/// A single unit: one weight per input plus the values cached by the last
/// forward (`output`) and backward (`delta`) pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neuron {
    weights: Vec<f64>,
    pub(crate) output: f64,
    pub(crate) delta: f64,
}

impl Neuron {
    /// Neuron with `n` zero weights.
    #[inline]
    pub fn new(n: usize) -> Self {
        Self {
            weights: vec![0.0; n],
            output: 0.0,
            delta: 0.0,
        }
    }

    /// Neuron with `n` weights drawn uniformly from `[-1, 1]`.
    pub fn new_random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut neuron = Self::new(n);
        neuron.randomize(rng);
        neuron
    }

    /// Fan-in.
    #[inline]
    pub fn n(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Overwrite all weights.
    ///
    /// Panics if `weights.len() != self.n()`: the fan-in is a topology property.
    pub fn set_weights(&mut self, weights: &[f64]) {
        assert_eq!(
            weights.len(),
            self.weights.len(),
            "weights len {} does not match neuron fan-in {}",
            weights.len(),
            self.weights.len()
        );
        self.weights.copy_from_slice(weights);
    }

    #[inline]
    pub(crate) fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    /// Output of the last forward pass.
    #[inline]
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Error signal of the last backward pass.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Refill every weight with a uniform value in `[-1, 1]`. The fan-in is unchanged.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for w in &mut self.weights {
            *w = rng.gen_range(-1.0..=1.0);
        }
    }

    /// Change the fan-in to `n`.
    ///
    /// The first `min(old, n)` weights are kept; new slots get uniform values in `[-1, 1]`.
    pub fn resize<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) {
        let old = self.weights.len();
        self.weights.truncate(n);
        self.weights
            .extend((old..n).map(|_| rng.gen_range(-1.0..=1.0)));
    }

    /// Computes and caches this neuron's output for `inputs`.
    ///
    /// Shape contract: `inputs.len() == self.n()`.
    #[inline]
    pub fn forward(&mut self, inputs: &[f64], activation: Activation) -> f64 {
        debug_assert_eq!(inputs.len(), self.weights.len());

        let global_input = activation::sum(inputs, &self.weights);
        self.output = activation.forward(global_input);
        self.output
    }

    /// Gradient descent on every weight: `w[j] -= learning_rate * inputs[j] * delta`.
    ///
    /// `inputs` yields the values this neuron saw in the forward pass, one per weight.
    #[inline]
    pub(crate) fn descend<I>(&mut self, inputs: I, learning_rate: f64)
    where
        I: IntoIterator<Item = f64>,
    {
        let step = learning_rate * self.delta;
        for (w, x) in self.weights.iter_mut().zip(inputs) {
            *w -= step * x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_weights_are_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let neuron = Neuron::new_random(64, &mut rng);
        assert_eq!(neuron.n(), 64);
        assert!(neuron.weights().iter().all(|w| (-1.0..=1.0).contains(w)));
    }

    #[test]
    fn resize_keeps_prefix() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut neuron = Neuron::new(3);
        neuron.set_weights(&[0.1, 0.2, 0.3]);

        neuron.resize(5, &mut rng);
        assert_eq!(neuron.n(), 5);
        assert_eq!(&neuron.weights()[..3], &[0.1, 0.2, 0.3]);
        assert!(neuron.weights()[3..].iter().all(|w| (-1.0..=1.0).contains(w)));

        neuron.resize(2, &mut rng);
        assert_eq!(neuron.weights(), &[0.1, 0.2]);
    }

    #[test]
    fn forward_caches_output() {
        let mut neuron = Neuron::new(2);
        neuron.set_weights(&[0.5, -0.25]);
        let y = neuron.forward(&[1.0, 2.0], Activation::Tanh);
        assert_eq!(y, 0.0);
        assert_eq!(neuron.output(), 0.0);

        let y = neuron.forward(&[2.0, 0.0], Activation::Sigmoid);
        assert!((y - 1.0_f64.exp() / (1.0 + 1.0_f64.exp())).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn set_weights_rejects_other_fan_in() {
        let mut neuron = Neuron::new(2);
        neuron.set_weights(&[1.0]);
    }
}
