//! The loss functions a network can be measured with.
//!
//! Only the half sum of squared errors is used, both to print diagnostics while training and to
//! derive the deltas of the output layer.

pub mod mean_squared;


use std::fmt::Debug;

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

pub use mean_squared::MeanSquared;

/// A trait representing the definitions of a function
/// for computing the loss/cost/error of a network
pub trait LossFunction
where
    Self: Sync + Send + Debug,
{
    /// Computes the loss of a single sample.
    ///
    /// Rayon is already used when averaging the losses of many samples so this should stay
    /// sequential.
    fn compute_loss(&self, outputs: &[f64], expected_outputs: &[f64]) -> f64;

    /// Computes the derivative of the error with respect to one of the outputs,
    ///
    /// dE/dO
    fn compute_loss_derivative_with_respect_to_output(
        &self,
        output: f64,
        expected_output: f64,
    ) -> f64;

    /// Computes the average of the loss for all of the samples using the
    /// current implementation
    fn average_loss_for_samples(
        &self,
        sample_outputs: &[Vec<f64>],
        sample_expected_outputs: &[Vec<f64>],
    ) -> f64 {
        let samples_amount = sample_outputs.len();
        assert_eq!(samples_amount, sample_expected_outputs.len());

        if samples_amount == 0 {
            return 0.0;
        }

        sample_outputs
            .par_iter()
            .zip(sample_expected_outputs)
            .map(|(outputs, expected_outputs)| self.compute_loss(outputs, expected_outputs))
            .sum::<f64>()
            / samples_amount as f64
    }
}

/// The expected outputs for a **label**: 1 for the neuron of the label and 0 for every other.
///
/// # Panics
///
/// Panics if the label has no neuron.
pub fn one_hot(label: usize, outputs_amount: usize) -> Vec<f64> {
    assert!(
        label < outputs_amount,
        "label {} has no output neuron out of {}",
        label,
        outputs_amount
    );

    (0..outputs_amount)
        .map(|neuron| if neuron == label { 1.0 } else { 0.0 })
        .collect()
}

/// `½ Σ_n (outputs[n] - t[n])²` with `t` the one hot encoding of **label**.
///
/// Only informational, nothing in the update rule reads it.
pub fn cost(outputs: &[f64], label: usize) -> f64 {
    MeanSquared.compute_loss(outputs, &one_hot(label, outputs.len()))
}
