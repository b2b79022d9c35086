use crate::loss_functions::LossFunction;

#[derive(Debug, Clone, Copy, Default)]
/// Half of the sum of the squared errors, `½ Σ (o - e)²`.
///
/// The half cancels out when differentiating, so the derivative is just `o - e`. It is not
/// divided by the amount of outputs.
pub struct MeanSquared;

impl LossFunction for MeanSquared {
    fn compute_loss(&self, outputs: &[f64], expected_outputs: &[f64]) -> f64 {
        assert_eq!(outputs.len(), expected_outputs.len());

        outputs
            .iter()
            .zip(expected_outputs)
            .map(|(output, expected)| (output - expected).powi(2))
            .sum::<f64>()
            / 2.0
    }

    fn compute_loss_derivative_with_respect_to_output(
        &self,
        output: f64,
        expected_output: f64,
    ) -> f64 {
        output - expected_output
    }
}
