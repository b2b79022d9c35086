use rand::RngCore;
use savefile_derive::Savefile;

use crate::layers::activations::Sigmoid;
use crate::layers::initializers::{Initializer, InitializerTrait};
use crate::types::ParameterError;
use crate::utils::matrix_operations::MatrixOperations;

#[derive(Debug, Clone, PartialEq, Savefile)]
/// A fully connected layer squashed by the Sigmoid.
///
/// The weights are dense, one row per input neuron and one column per output neuron, so
/// `weight(i, j)` connects the input neuron `i` to the output neuron `j`. There is one bias per
/// output neuron and it is **subtracted** from the weighted sum:
///
/// `output[j] = σ(Σ_i weight(i, j) * input[i] - bias[j])`
///
/// The shape is fixed at creation and nothing can resize it afterwards.
pub struct Dense {
    inputs_amount: usize,
    outputs_amount: usize,

    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl Dense {
    /// Creates a new Dense layer drawing every weight and bias from the **initializer**.
    pub fn new(
        inputs_amount: usize,
        outputs_amount: usize,
        initializer: &Initializer,
        rng: &mut dyn RngCore,
    ) -> Dense {
        let weights = initializer.initialize_2d((inputs_amount, outputs_amount), rng);
        let biases = initializer.initialize_1d(outputs_amount, rng);

        Dense {
            inputs_amount,
            outputs_amount,
            weights,
            biases,
        }
    }

    /// Creates a Dense layer out of already known parameters.
    ///
    /// Every row of **weights** must have one value per bias.
    pub fn from_parameters(
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Result<Dense, ParameterError> {
        let dense = Dense {
            inputs_amount: weights.len(),
            outputs_amount: biases.len(),
            weights,
            biases,
        };
        dense.check_shape(0)?;

        Ok(dense)
    }

    /// Makes sure the weights and the biases agree with the amounts of the layer, **layer** is
    /// only used to report where the mismatch is.
    pub(crate) fn check_shape(&self, layer: usize) -> Result<(), ParameterError> {
        let expected = (self.inputs_amount, self.outputs_amount);

        if self.inputs_amount == 0 || self.outputs_amount == 0 {
            return Err(ParameterError::ShapeMismatch {
                layer,
                expected,
                actual: (self.weights.get_height(), self.biases.len()),
            });
        }

        if self.weights.len() != self.inputs_amount || self.biases.len() != self.outputs_amount {
            return Err(ParameterError::ShapeMismatch {
                layer,
                expected,
                actual: (self.weights.len(), self.biases.len()),
            });
        }

        if let Some(row) = self
            .weights
            .iter()
            .find(|row| row.len() != self.outputs_amount)
        {
            return Err(ParameterError::ShapeMismatch {
                layer,
                expected,
                actual: (self.weights.len(), row.len()),
            });
        }

        Ok(())
    }

    pub fn inputs_amount(&self) -> usize {
        self.inputs_amount
    }

    pub fn outputs_amount(&self) -> usize {
        self.outputs_amount
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// The weight connecting the input neuron **input** to the output neuron **output**.
    ///
    /// # Panics
    ///
    /// Panics if any of the indices is out of bounds.
    pub fn weight(&self, input: usize, output: usize) -> f64 {
        self.weights[input][output]
    }

    /// Overwrites a single weight.
    ///
    /// # Panics
    ///
    /// Panics if any of the indices is out of bounds.
    pub fn set_weight(&mut self, input: usize, output: usize, value: f64) {
        self.weights[input][output] = value;
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn bias(&self, output: usize) -> f64 {
        self.biases[output]
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_bias(&mut self, output: usize, value: f64) {
        self.biases[output] = value;
    }

    /// The weighted sums of the layer minus the biases, before the Sigmoid.
    pub fn weighted_sums(&self, inputs: &[f64]) -> Vec<f64> {
        assert_eq!(inputs.len(), self.inputs_amount);

        self.weights
            .dot_product(inputs)
            .into_iter()
            .zip(&self.biases)
            .map(|(sum, bias)| sum - bias)
            .collect()
    }

    /// Computes the activations of the outputs of the layer from the activations of its inputs.
    pub fn propagate(&self, inputs: &[f64]) -> Vec<f64> {
        Sigmoid::propagate(&self.weighted_sums(inputs))
    }

    /// Computes the deltas of the input neurons from the deltas of the output neurons.
    ///
    /// `input_delta[i] = (Σ_k weight(i, k) * output_delta[k]) * σ'(input[i])`
    ///
    /// Has to run before `apply_gradients` since it reads the weights as they were during the
    /// forward pass.
    pub fn back_propagate(&self, output_deltas: &[f64], input_activations: &[f64]) -> Vec<f64> {
        assert_eq!(output_deltas.len(), self.outputs_amount);
        assert_eq!(input_activations.len(), self.inputs_amount);

        self.weights
            .multiply_vector(output_deltas)
            .into_iter()
            .zip(input_activations)
            .map(|(weighted_delta, activation)| {
                weighted_delta * Sigmoid::differential_of_output_with_respect_to_input(*activation)
            })
            .collect()
    }

    /// Moves the parameters of the layer one step against the deltas of its outputs.
    ///
    /// - `weight(i, j) -= learning_rate * input[i] * output_delta[j]`
    /// - `bias[j] -= learning_rate * output_delta[j]`
    pub fn apply_gradients(
        &mut self,
        input_activations: &[f64],
        output_deltas: &[f64],
        learning_rate: f64,
    ) {
        assert_eq!(output_deltas.len(), self.outputs_amount);

        self.weights
            .subtract_scaled_outer_product(input_activations, output_deltas, learning_rate);

        self.biases
            .iter_mut()
            .zip(output_deltas)
            .for_each(|(bias, delta)| *bias -= learning_rate * delta);
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::Dense;
    use crate::layers::activations::Sigmoid;
    use crate::layers::initializers::{ConstantInitializer, Initializer};
    use crate::types::ParameterError;
    use crate::utils::approx_eq::assert_approx_equal_distance;

    fn two_by_two() -> Dense {
        Dense::from_parameters(vec![vec![0.5, -1.0], vec![2.0, 0.25]], vec![0.1, -0.2]).unwrap()
    }

    #[test]
    fn should_subtract_the_bias_from_the_weighted_sum() {
        let dense = two_by_two();

        let sums = dense.weighted_sums(&[1.0, 0.5]);

        assert_approx_equal_distance(&sums, &[0.5 + 1.0 - 0.1, -1.0 + 0.125 + 0.2], 1e-12);
        assert_approx_equal_distance(
            &dense.propagate(&[1.0, 0.5]),
            &[Sigmoid::function(1.4), Sigmoid::function(-0.675)],
            1e-12,
        );
    }

    #[test]
    fn should_back_propagate_through_the_unchanged_weights() {
        let dense = two_by_two();
        let inputs = [0.3, 0.9];
        let output_deltas = [0.2, -0.4];

        let input_deltas = dense.back_propagate(&output_deltas, &inputs);

        let expected = [
            (0.5 * 0.2 + -1.0 * -0.4) * 0.3 * 0.7,
            (2.0 * 0.2 + 0.25 * -0.4) * 0.9 * 0.1,
        ];
        assert_approx_equal_distance(&input_deltas, &expected, 1e-12);
    }

    #[test]
    fn should_apply_gradients_scaled_by_the_learning_rate() {
        let mut dense = two_by_two();

        dense.apply_gradients(&[1.0, 0.5], &[0.2, -0.4], 0.1);

        assert_approx_equal_distance(&dense.weights()[0], &[0.5 - 0.02, -1.0 + 0.04], 1e-12);
        assert_approx_equal_distance(&dense.weights()[1], &[2.0 - 0.01, 0.25 + 0.02], 1e-12);
        assert_approx_equal_distance(dense.biases(), &[0.1 - 0.02, -0.2 + 0.04], 1e-12);
    }

    #[test]
    fn should_create_the_requested_shape() {
        let initializer: Initializer = ConstantInitializer::new(0.5).into();
        let dense = Dense::new(784, 16, &initializer, &mut StdRng::seed_from_u64(0));

        assert_eq!(dense.inputs_amount(), 784);
        assert_eq!(dense.outputs_amount(), 16);
        assert_eq!(dense.weights().len(), 784);
        assert!(dense.weights().iter().all(|row| row.len() == 16));
        assert_eq!(dense.biases(), &[0.5; 16][..]);
        assert!(dense.check_shape(0).is_ok());
    }

    #[test]
    fn should_refuse_ragged_weights() {
        let result = Dense::from_parameters(vec![vec![1.0, 2.0], vec![3.0]], vec![0.0, 0.0]);

        assert!(matches!(
            result,
            Err(ParameterError::ShapeMismatch {
                expected: (2, 2),
                actual: (2, 1),
                ..
            })
        ));
    }

    #[test]
    #[should_panic]
    fn should_refuse_inputs_of_the_wrong_size() {
        two_by_two().propagate(&[1.0, 2.0, 3.0]);
    }
}
