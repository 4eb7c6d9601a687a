//! Backpropagation with online gradient descent.
//!
//! One call processes one instance whose forward pass has just been run:
//!
//! 1. Output layer: `delta[i] = (output[i] - expected[i]) * sigmoid'(output[i])`.
//! 2. Hidden layers, last to first:
//!    `delta[i] = (Σ_k downstream[k].weight[i] * downstream[k].delta) * tanh'(output[i])`.
//! 3. Every weight: `weight[j] -= learning_rate * layer_input[j] * delta`, where
//!    `layer_input` is the original input vector for the first hidden layer and the
//!    previous layer's cached outputs otherwise.
//!
//! All deltas are computed before any weight changes, so every delta is taken
//! against the weights that produced the forward pass. The update is therefore
//! exactly `-learning_rate * dE/dw` for `E = Σ (output - expected)^2 / 2`.

use crate::{Layer, Network};

/// Runs one backward pass and updates every weight of `network` in place.
///
/// `network.run(inputs, ..)` must have been called with the same `inputs` just before.
///
/// Shape contract (panics on violation):
/// - `inputs.len() == network.inputs()`
/// - `expected.len() == network.outputs()`
pub fn backpropagate(network: &mut Network, inputs: &[f64], expected: &[f64], learning_rate: f64) {
    assert!(
        network.is_setup(),
        "network must be set up before backpropagation"
    );
    assert_eq!(
        inputs.len(),
        network.inputs(),
        "input len {} does not match network inputs {}",
        inputs.len(),
        network.inputs()
    );
    assert_eq!(
        expected.len(),
        network.outputs(),
        "expected len {} does not match network outputs {}",
        expected.len(),
        network.outputs()
    );

    let (hidden, output) = network.layers_mut();
    compute_deltas(hidden, output, expected);
    update_weights(hidden, output, inputs, learning_rate);
}

fn compute_deltas(hidden: &mut [Layer], output: &mut Layer, expected: &[f64]) {
    let activation = output.activation();
    for (neuron, &target) in output.neurons_mut().iter_mut().zip(expected) {
        let error = neuron.output - target;
        neuron.delta = error * activation.derivative_from_output(neuron.output);
    }

    for idx in (0..hidden.len()).rev() {
        let (upstream, downstream) = hidden.split_at_mut(idx + 1);
        let layer = &mut upstream[idx];
        let next: &Layer = downstream.first().unwrap_or(&*output);

        let activation = layer.activation();
        for (i, neuron) in layer.neurons_mut().iter_mut().enumerate() {
            let error = next.back_error(i);
            neuron.delta = error * activation.derivative_from_output(neuron.output);
        }
    }
}

fn update_weights(hidden: &mut [Layer], output: &mut Layer, inputs: &[f64], learning_rate: f64) {
    if let Some(last) = hidden.last() {
        for neuron in output.neurons_mut() {
            neuron.descend(last.outputs(), learning_rate);
        }
    }

    for idx in (0..hidden.len()).rev() {
        let (previous, current) = hidden.split_at_mut(idx);
        let layer = &mut current[0];

        match previous.last() {
            Some(prev) => {
                for neuron in layer.neurons_mut() {
                    neuron.descend(prev.outputs(), learning_rate);
                }
            }
            None => {
                for neuron in layer.neurons_mut() {
                    neuron.descend(inputs.iter().copied(), learning_rate);
                }
            }
        }
    }
}
