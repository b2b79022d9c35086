//! The logistic activation, `1 / (1 + e^-x)`.

#[derive(Debug, Clone, Copy, Default)]
/// The Sigmoid activation, maps any real number into **(0, 1)**.
///
/// Inputs of a very large magnitude saturate towards 0 or 1 without any special handling.
pub struct Sigmoid;

impl Sigmoid {
    /// Squashes a single weighted sum.
    pub fn function(input: f64) -> f64 {
        1.0 / (1.0 + (-input).exp())
    }

    /// Squashes every weighted sum of a layer.
    pub fn propagate(inputs: &[f64]) -> Vec<f64> {
        inputs.iter().map(|input| Self::function(*input)).collect()
    }

    /// The derivative of the Sigmoid at the input that produced **output**.
    ///
    /// Expressed with the output itself, `σ(x) * (1 - σ(x))`, which is what both the forward
    /// pass keeps around and the backward pass needs.
    pub fn differential_of_output_with_respect_to_input(output: f64) -> f64 {
        output * (1.0 - output)
    }
}
