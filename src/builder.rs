//! Network builder.
//!
//! `NetworkBuilder` validates the topology up front and then builds a [`Network`]
//! whose weights are drawn from a seeded or caller-provided RNG:
//!
//! ```rust
//! use rust_nn_trainer::NetworkBuilder;
//!
//! # fn main() -> rust_nn_trainer::Result<()> {
//! let mut network = NetworkBuilder::new(18, 1)?
//!     .hidden_layer(50)?
//!     .hidden_layer(50)?
//!     .build_with_seed(0)?;
//! assert_eq!(network.predict(&[0.5; 18]).len(), 1);
//! # Ok(())
//! # }
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, Network, Result};

#[derive(Debug, Clone)]
/// Builder for a `Network`.
pub struct NetworkBuilder {
    inputs: usize,
    outputs: usize,
    hidden_layers: Vec<usize>,
}

impl NetworkBuilder {
    /// Start building a network with `inputs` inputs and `outputs` outputs.
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
        })
    }

    /// Append a hidden layer of `width` neurons.
    pub fn hidden_layer(mut self, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidConfig(
                "hidden layer width must be > 0".to_owned(),
            ));
        }
        self.hidden_layers.push(width);
        Ok(self)
    }

    /// Append one hidden layer per entry of `widths`.
    pub fn hidden_layers(self, widths: &[usize]) -> Result<Self> {
        widths.iter().try_fold(self, |b, &w| b.hidden_layer(w))
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the thread-local RNG.
    pub fn build(self) -> Result<Network> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        let mut network = Network::new(self.inputs, self.outputs)?;
        network.setup_with_rng(&self.hidden_layers, rng)?;
        Ok(network)
    }
}
