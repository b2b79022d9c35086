//! The inference and training engine: the forward pass, the backward pass computing the deltas
//! of every layer, and the update rule applying them.
//!
//! One training step always runs `infer`, `backward` and `apply` in that order for the same
//! sample. `infer` and `backward` only borrow the parameters, `apply` borrows them mutably, so
//! the deltas are always computed from the weights the forward pass used and nothing can read
//! the parameters while they are being updated.

use log::info;
use rand::RngCore;
use savefile::{load_file, save_file};
use savefile_derive::Savefile;

use crate::layers::activations::Sigmoid;
use crate::layers::Dense;
use crate::loss_functions::{one_hot, LossFunction, MeanSquared};
use crate::types::{ConfigError, InferenceError, NetworkConfig, ParameterError};

/// The version written to and expected from parameter files.
pub const PARAMETERS_FILE_VERSION: u32 = 0;

/// The value a pixel takes when it is fully foreground.
pub const MAX_PIXEL_VALUE: f64 = 255.0;

#[derive(Debug, Clone, PartialEq)]
/// The activations of every neuron of every layer for a single sample.
///
/// Index 0 is the input layer, holding the pixels divided by 255, and the last index is the
/// output layer. It can only be produced by [NetworkParameters::infer], so it always has the
/// shape of the network that produced it.
pub struct ActivationRecord {
    layers: Vec<Vec<f64>>,
}

impl ActivationRecord {
    /// The amount of layers including the input layer.
    pub fn layers_amount(&self) -> usize {
        self.layers.len()
    }

    /// The activations of the layer at **index**, 0 being the input layer.
    ///
    /// # Panics
    ///
    /// Panics if there is no such layer.
    pub fn layer(&self, index: usize) -> &[f64] {
        assert!(
            index < self.layers.len(),
            "invalid layer index {}, the network has {} layers",
            index,
            self.layers.len()
        );

        &self.layers[index]
    }

    /// The normalized pixels.
    pub fn inputs(&self) -> &[f64] {
        &self.layers[0]
    }

    /// The per digit scores, they are not normalized into a probability distribution.
    pub fn outputs(&self) -> &[f64] {
        &self.layers[self.layers.len() - 1]
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The error signal of every neuron of every layer after the input layer, for a single sample.
///
/// Layers are indexed like in [ActivationRecord], so the first hidden layer is 1 and the output
/// layer is the last index. The input layer has no deltas.
pub struct DeltaRecord {
    deltas: Vec<Vec<f64>>,
}

impl DeltaRecord {
    /// The index of the output layer, which is also the amount of layers with deltas.
    pub fn output_layer_index(&self) -> usize {
        self.deltas.len()
    }

    /// The deltas of the layer at **index**.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= index <= output_layer_index()`, asking for the deltas of the input
    /// layer or of a layer that doesn't exist is a bug in the caller.
    pub fn layer(&self, index: usize) -> &[f64] {
        assert!(
            index >= 1 && index <= self.deltas.len(),
            "invalid layer index {}, deltas only exist for layers 1 to {}",
            index,
            self.deltas.len()
        );

        &self.deltas[index - 1]
    }
}

#[derive(Debug, Clone, PartialEq, Savefile)]
/// The weights and biases of the whole network, one [Dense] per pair of consecutive layers.
pub struct NetworkParameters {
    layers: Vec<Dense>,
}

impl NetworkParameters {
    /// Creates a fresh set of parameters following the topology and the initializer of the
    /// **config**.
    pub fn new_random(
        config: &NetworkConfig,
        rng: &mut dyn RngCore,
    ) -> Result<NetworkParameters, ConfigError> {
        config.validate()?;

        let layers = config
            .layer_sizes
            .windows(2)
            .map(|sizes| Dense::new(sizes[0], sizes[1], &config.initializer, rng))
            .collect();

        Ok(NetworkParameters { layers })
    }

    /// Assembles parameters out of already existing layers, checking that every layer feeds
    /// exactly into the next one.
    pub fn from_layers(layers: Vec<Dense>) -> Result<NetworkParameters, ParameterError> {
        let parameters = NetworkParameters { layers };
        parameters.check_connections()?;

        Ok(parameters)
    }

    fn check_connections(&self) -> Result<(), ParameterError> {
        if self.layers.is_empty() {
            return Err(ConfigError::NotEnoughLayers { layers_amount: 0 }.into());
        }

        for (index, layer) in self.layers.iter().enumerate() {
            layer.check_shape(index)?;
        }

        if let Some(layer) = self
            .layers
            .windows(2)
            .position(|pair| pair[0].outputs_amount() != pair[1].inputs_amount())
        {
            return Err(ParameterError::DisconnectedLayers { layer });
        }

        Ok(())
    }

    /// Makes sure the parameters have exactly the topology of the **config**.
    pub fn check_against(&self, config: &NetworkConfig) -> Result<(), ParameterError> {
        config.validate()?;
        self.check_connections()?;

        if self.layers.len() + 1 != config.layer_sizes.len() {
            return Err(ParameterError::LayerCountMismatch {
                expected: config.layer_sizes.len(),
                actual: self.layers.len() + 1,
            });
        }

        for (index, (layer, sizes)) in self
            .layers
            .iter()
            .zip(config.layer_sizes.windows(2))
            .enumerate()
        {
            if layer.inputs_amount() != sizes[0] || layer.outputs_amount() != sizes[1] {
                return Err(ParameterError::ShapeMismatch {
                    layer: index,
                    expected: (sizes[0], sizes[1]),
                    actual: (layer.inputs_amount(), layer.outputs_amount()),
                });
            }
        }

        Ok(())
    }

    /// The connections between consecutive layers, from the input to the output.
    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Gives mutable access to a single connection without letting its shape change.
    ///
    /// # Panics
    ///
    /// Panics if there is no such connection.
    pub fn layer_mut(&mut self, index: usize) -> &mut Dense {
        &mut self.layers[index]
    }

    /// The amount of neurons in every layer, including the input layer.
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.inputs_amount())
            .chain(self.layers.iter().map(|layer| layer.outputs_amount()))
            .collect()
    }

    pub fn inputs_amount(&self) -> usize {
        self.layers[0].inputs_amount()
    }

    pub fn outputs_amount(&self) -> usize {
        self.layers[self.layers.len() - 1].outputs_amount()
    }

    /// Makes sure the **label** names one of the output neurons.
    pub fn check_label(&self, label: usize) -> Result<(), InferenceError> {
        let outputs_amount = self.outputs_amount();
        if label >= outputs_amount {
            return Err(InferenceError::LabelOutOfRange {
                label,
                outputs_amount,
            });
        }

        Ok(())
    }

    /// Runs the forward pass for one sample.
    ///
    /// Every pixel is expected in **[0, 255]** and is divided by 255 to become the activation
    /// of the input layer. A pixel vector that is not exactly as long as the input layer is
    /// refused.
    pub fn infer<P>(&self, pixels: &[P]) -> Result<ActivationRecord, InferenceError>
    where
        P: Copy + Into<f64>,
    {
        if pixels.len() != self.inputs_amount() {
            return Err(InferenceError::InputSizeMismatch {
                expected: self.inputs_amount(),
                actual: pixels.len(),
            });
        }

        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(
            pixels
                .iter()
                .map(|pixel| Into::<f64>::into(*pixel) / MAX_PIXEL_VALUE)
                .collect::<Vec<f64>>(),
        );

        for layer in self.layers.iter() {
            let outputs = layer.propagate(&layers[layers.len() - 1]);
            layers.push(outputs);
        }

        Ok(ActivationRecord { layers })
    }

    /// Computes the deltas of every layer, starting at the output layer and going back to the
    /// first hidden layer.
    ///
    /// - output layer: `delta[n] = (a[n] - t[n]) * a[n] * (1 - a[n])` where `t[n]` is 1 for the
    ///   **label** and 0 otherwise.
    /// - hidden layers: `delta[i] = (Σ_k weight(i, k) * next_delta[k]) * a[i] * (1 - a[i])`
    ///
    /// # Panics
    ///
    /// Panics if the **activations** were not produced by a network with this topology.
    pub fn backward(
        &self,
        activations: &ActivationRecord,
        label: usize,
    ) -> Result<DeltaRecord, InferenceError> {
        self.check_label(label)?;
        let outputs_amount = self.outputs_amount();

        assert_eq!(
            activations.layers_amount(),
            self.layers.len() + 1,
            "the activations don't belong to this network"
        );

        let output_deltas: Vec<f64> = activations
            .outputs()
            .iter()
            .zip(one_hot(label, outputs_amount))
            .map(|(activation, target)| {
                MeanSquared.compute_loss_derivative_with_respect_to_output(*activation, target)
                    * Sigmoid::differential_of_output_with_respect_to_input(*activation)
            })
            .collect();

        let mut deltas = vec![Vec::new(); self.layers.len()];
        deltas[self.layers.len() - 1] = output_deltas;

        // layer l + 1 must be done before layer l
        for layer_index in (1..self.layers.len()).rev() {
            let next_deltas = &deltas[layer_index];
            let layer_deltas = self.layers[layer_index]
                .back_propagate(next_deltas, activations.layer(layer_index));
            deltas[layer_index - 1] = layer_deltas;
        }

        Ok(DeltaRecord { deltas })
    }

    /// Applies one gradient descent step with the deltas of a single sample.
    ///
    /// Every connection `l -> l + 1` is moved by its source activations and destination deltas,
    /// see [Dense::apply_gradients].
    ///
    /// # Panics
    ///
    /// Panics if the records were not produced by a network with this topology.
    pub fn apply(
        &mut self,
        activations: &ActivationRecord,
        deltas: &DeltaRecord,
        learning_rate: f64,
    ) {
        assert_eq!(activations.layers_amount(), self.layers.len() + 1);
        assert_eq!(deltas.output_layer_index(), self.layers.len());

        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.apply_gradients(activations.layer(index), deltas.layer(index + 1), learning_rate);
        }
    }

    /// Writes the parameters to **path**, every weight and bias is stored exactly.
    pub fn save(&self, path: &str) -> Result<(), ParameterError> {
        if std::path::Path::new(path).exists() {
            log::warn!("{} already exists, replacing it", path);
        }

        save_file(path, PARAMETERS_FILE_VERSION, self)?;
        info!("saved network parameters to {}", path);

        Ok(())
    }

    /// Reads parameters written by [NetworkParameters::save].
    ///
    /// The file is refused if its layers don't chain into each other.
    pub fn load(path: &str) -> Result<NetworkParameters, ParameterError> {
        let parameters: NetworkParameters = load_file(path, PARAMETERS_FILE_VERSION)?;
        parameters.check_connections()?;
        info!(
            "loaded network parameters with layers {:?} from {}",
            parameters.layer_sizes(),
            path
        );

        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::layers::initializers::ConstantInitializer;

    fn small_config() -> NetworkConfig {
        NetworkConfig::new(vec![4, 3, 2], 0.1)
    }

    #[test]
    fn should_create_one_dense_per_connection() {
        let parameters =
            NetworkParameters::new_random(&NetworkConfig::default(), &mut StdRng::seed_from_u64(1))
                .unwrap();

        assert_eq!(parameters.layer_sizes(), vec![784, 16, 16, 10]);
        assert_eq!(parameters.layers()[0].weights().len(), 784);
        assert_eq!(parameters.layers()[2].biases().len(), 10);
    }

    #[test]
    fn should_refuse_invalid_configs() {
        let config = NetworkConfig::new(vec![784], 0.1);

        assert!(matches!(
            NetworkParameters::new_random(&config, &mut StdRng::seed_from_u64(1)),
            Err(ConfigError::NotEnoughLayers { layers_amount: 1 })
        ));
    }

    #[test]
    fn should_refuse_pixel_vectors_of_the_wrong_length() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(
            parameters.infer(&[0u8; 5]),
            Err(InferenceError::InputSizeMismatch {
                expected: 4,
                actual: 5
            })
        );
        assert!(parameters.infer(&[0u8; 3]).is_err());
    }

    #[test]
    fn should_normalize_the_pixels() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(1)).unwrap();

        let activations = parameters.infer(&[0u8, 51, 255, 102]).unwrap();

        assert_eq!(activations.inputs(), &[0.0, 0.2, 1.0, 0.4][..]);
        assert_eq!(activations.layers_amount(), 3);
        assert_eq!(activations.layer(1).len(), 3);
        assert_eq!(activations.outputs().len(), 2);
    }

    #[test]
    fn should_accept_real_valued_pixels() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(3)).unwrap();

        let from_bytes = parameters.infer(&[10u8, 20, 30, 40]).unwrap();
        let from_reals = parameters.infer(&[10.0_f64, 20.0, 30.0, 40.0]).unwrap();

        assert_eq!(from_bytes, from_reals);
    }

    #[test]
    fn should_refuse_labels_without_an_output_neuron() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(1)).unwrap();
        let activations = parameters.infer(&[0u8; 4]).unwrap();

        assert_eq!(
            parameters.backward(&activations, 2),
            Err(InferenceError::LabelOutOfRange {
                label: 2,
                outputs_amount: 2
            })
        );
    }

    #[test]
    fn should_produce_deltas_with_the_shape_of_the_layers() {
        let parameters =
            NetworkParameters::new_random(&NetworkConfig::default(), &mut StdRng::seed_from_u64(9))
                .unwrap();
        let activations = parameters.infer(&[128u8; 784]).unwrap();

        let deltas = parameters.backward(&activations, 3).unwrap();

        assert_eq!(deltas.output_layer_index(), 3);
        assert_eq!(deltas.layer(1).len(), 16);
        assert_eq!(deltas.layer(2).len(), 16);
        assert_eq!(deltas.layer(3).len(), 10);
    }

    #[test]
    #[should_panic(expected = "invalid layer index")]
    fn should_panic_when_asking_for_the_deltas_of_the_input_layer() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(1)).unwrap();
        let activations = parameters.infer(&[0u8; 4]).unwrap();
        let deltas = parameters.backward(&activations, 0).unwrap();

        deltas.layer(0);
    }

    #[test]
    #[should_panic(expected = "invalid layer index")]
    fn should_panic_when_asking_for_the_deltas_past_the_output_layer() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(1)).unwrap();
        let activations = parameters.infer(&[0u8; 4]).unwrap();
        let deltas = parameters.backward(&activations, 0).unwrap();

        deltas.layer(3);
    }

    #[test]
    fn should_refuse_disconnected_layers() {
        let initializer = ConstantInitializer::new(0.0).into();
        let mut rng = StdRng::seed_from_u64(1);
        let layers = vec![
            Dense::new(4, 3, &initializer, &mut rng),
            Dense::new(2, 2, &initializer, &mut rng),
        ];

        assert!(matches!(
            NetworkParameters::from_layers(layers),
            Err(ParameterError::DisconnectedLayers { layer: 0 })
        ));
    }

    #[test]
    fn should_check_parameters_against_another_topology() {
        let parameters =
            NetworkParameters::new_random(&small_config(), &mut StdRng::seed_from_u64(1)).unwrap();

        assert!(parameters.check_against(&small_config()).is_ok());
        assert!(matches!(
            parameters.check_against(&NetworkConfig::new(vec![4, 5, 2], 0.1)),
            Err(ParameterError::ShapeMismatch {
                layer: 0,
                expected: (4, 5),
                actual: (4, 3)
            })
        ));
        assert!(matches!(
            parameters.check_against(&NetworkConfig::new(vec![4, 3, 3, 2], 0.1)),
            Err(ParameterError::LayerCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
