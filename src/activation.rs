//! Activation and math functions.
//!
//! A neuron computes a global input `z = Σ inputs[i] * weights[i]` and then applies an
//! activation: `y = activation(z)`. There is no bias term and no separate output stage,
//! so `y` is the neuron's output.
//!
//! Derivatives are expressed in terms of the cached *output* `y`, which is what
//! backpropagation has at hand: `sigmoid'(z) = y (1 - y)` and `tanh'(z) = 1 - y^2`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element-wise activation function.
pub enum Activation {
    /// Used by every hidden layer.
    Tanh,
    /// Used by the output layer.
    Sigmoid,
}

impl Activation {
    #[inline]
    pub fn forward(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => tanh(x),
            Activation::Sigmoid => sigmoid(x),
        }
    }

    /// Derivative of the activation with respect to its input, expressed in terms
    /// of the cached post-activation output `y`.
    #[inline]
    pub fn derivative_from_output(self, y: f64) -> f64 {
        match self {
            Activation::Tanh => tanh_derivative(y),
            Activation::Sigmoid => sigmoid_derivative(y),
        }
    }
}

/// Sum of products of `inputs` and `weights`.
///
/// Shape contract: `inputs.len() == weights.len()`.
#[inline]
pub fn sum(inputs: &[f64], weights: &[f64]) -> f64 {
    debug_assert_eq!(inputs.len(), weights.len());

    let mut result = 0.0;
    for (&x, &w) in inputs.iter().zip(weights) {
        result = x.mul_add(w, result);
    }
    result
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// `y * (1 - y)` where `y = sigmoid(x)`.
#[inline]
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

#[inline]
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// `1 - y^2` where `y = tanh(x)`.
#[inline]
pub fn tanh_derivative(y: f64) -> f64 {
    1.0 - y * y
}

/// Thresholds a sigmoid output into a class: `1` if `x >= 0.5`, else `0`.
#[inline]
pub fn binary(x: f64) -> f64 {
    if x >= 0.5 { 1.0 } else { 0.0 }
}

/// Thresholds a tanh output into a class: `1` if `x >= 0`, else `-1`.
#[inline]
pub fn binary_symmetric(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { -1.0 }
}
