//! Step error.
//!
//! Training minimizes the half sum of squared differences between the network
//! output and the expected output for one instance:
//!
//! `E = Σ (output[i] - expected[i])^2 / 2`
//!
//! so that `dE/d(output[i]) = output[i] - expected[i]`, the error term that
//! starts backpropagation.

/// Half sum of squared differences.
///
/// Shape contract: `outputs.len() == expected.len()`.
#[inline]
pub fn squared_error(outputs: &[f64], expected: &[f64]) -> f64 {
    assert_eq!(
        outputs.len(),
        expected.len(),
        "outputs len {} does not match expected len {}",
        outputs.len(),
        expected.len()
    );

    outputs
        .iter()
        .zip(expected)
        .map(|(&o, &e)| {
            let d = o - e;
            d * d
        })
        .sum::<f64>()
        / 2.0
}

/// Mean of the step errors of an epoch (0 for an empty epoch).
#[inline]
pub fn epoch_error(step_errors: &[f64]) -> f64 {
    if step_errors.is_empty() {
        return 0.0;
    }
    step_errors.iter().sum::<f64>() / step_errors.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_is_zero_when_equal() {
        let out = [1.0, -2.0, 0.5];
        assert_eq!(squared_error(&out, &out), 0.0);
    }

    #[test]
    fn squared_error_halves_the_sum() {
        // ((1-2)^2 + (3-1)^2) / 2 = 2.5
        assert!((squared_error(&[1.0, 3.0], &[2.0, 1.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn epoch_error_is_the_mean() {
        assert_eq!(epoch_error(&[]), 0.0);
        assert!((epoch_error(&[0.1, 0.2, 0.6]) - 0.3).abs() < 1e-12);
    }
}
