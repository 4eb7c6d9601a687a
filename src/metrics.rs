//! Held-out evaluation records.
//!
//! Evaluation never participates in backprop: the network only runs forward and
//! each output is thresholded into a class with [`activation::binary`].

use crate::activation;
use crate::training_set::Instance;

#[derive(Debug, Clone, PartialEq)]
/// Outcome for one instance of the testing partition.
pub struct Test {
    /// Position of the instance in the training set.
    pub index: usize,
    pub passed: bool,
    /// Raw network output (before thresholding).
    pub output: f64,
    pub instance: Instance,
}

impl Test {
    /// Build a record from the network `outputs` for `instance`.
    ///
    /// The instance passes when every thresholded output equals its expected value.
    pub fn evaluate(index: usize, instance: &Instance, outputs: &[f64]) -> Self {
        let passed = outputs
            .iter()
            .all(|&y| (activation::binary(y) - instance.classification).abs() == 0.0);
        Self {
            index,
            passed,
            output: outputs.first().copied().unwrap_or(f64::NAN),
            instance: instance.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Result of the last test run.
pub struct TestReport {
    pub tests: Vec<Test>,
}

impl TestReport {
    #[inline]
    pub fn total(&self) -> usize {
        self.tests.len()
    }

    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.passed).count()
    }

    /// `100 * passed / total` (0 when nothing was tested).
    pub fn percentage(&self) -> f64 {
        if self.tests.is_empty() {
            return 0.0;
        }
        100.0 * self.passed() as f64 / self.total() as f64
    }
}
