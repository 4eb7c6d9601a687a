//! Training and topology configuration.
//!
//! With the `serde` feature both types can be read from JSON, e.g.
//!
//! ```json
//! {
//!   "network": { "inputs": 18, "outputs": 1, "hidden_layers": [50, 50] },
//!   "learn": { "learning_rate": 0.1, "epsilon": 0.01, "max_epochs": 1000 }
//! }
//! ```
//!
//! Missing `learn` fields fall back to [`LearnOptions::default`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use std::path::Path;

use rand::Rng;

use crate::{Error, Network, NetworkBuilder, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
/// Hyperparameters of a training run.
pub struct LearnOptions {
    /// Step size of every weight update.
    pub learning_rate: f64,
    /// Training stops once an epoch error falls below this value.
    pub epsilon: f64,
    /// Training stops after this many completed epochs.
    pub max_epochs: usize,
}

impl Default for LearnOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epsilon: 0.01,
            max_epochs: 1000,
        }
    }
}

impl LearnOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "epsilon must be finite and >= 0, got {}",
                self.epsilon
            )));
        }
        if self.max_epochs == 0 {
            return Err(Error::InvalidConfig("max epochs must be > 0".to_owned()));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
/// Network topology: fixed input/output widths and the hidden layer widths.
pub struct NetworkConfig {
    pub inputs: usize,
    pub outputs: usize,
    pub hidden_layers: Vec<usize>,
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        self.builder().map(|_| ())
    }

    pub fn builder(&self) -> Result<NetworkBuilder> {
        NetworkBuilder::new(self.inputs, self.outputs)?.hidden_layers(&self.hidden_layers)
    }

    pub fn build_with_seed(&self, seed: u64) -> Result<Network> {
        self.builder()?.build_with_seed(seed)
    }

    pub fn build_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        self.builder()?.build_with_rng(rng)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
/// Full configuration: topology plus hyperparameters.
pub struct Config {
    pub network: NetworkConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub learn: LearnOptions,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.network.hidden_layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one hidden layer".to_owned(),
            ));
        }
        self.network.validate()?;
        self.learn.validate()
    }
}

#[cfg(feature = "serde")]
impl Config {
    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}


#[cfg(all(test, feature = "serde"))]
mod json_tests {
    use super::*;

    #[test]
    fn parses_json_with_default_learn_options() {
        let config = Config::from_json_str(
            r#"{"network":{"inputs":18,"outputs":1,"hidden_layers":[50,50]}}"#,
        )
        .unwrap();
        assert_eq!(config.network.hidden_layers, vec![50, 50]);
        assert_eq!(config.learn, LearnOptions::default());

        let json = config.to_json_string_pretty().unwrap();
        assert_eq!(Config::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_json_config() {
        let err = Config::from_json_str(
            r#"{"network":{"inputs":2,"outputs":1,"hidden_layers":[2]},"learn":{"max_epochs":0}}"#,
        )
        .unwrap_err();
        assert!(format!("{err}").contains("max epochs"));
        assert!(Config::from_json_str("{").is_err());
    }
}
