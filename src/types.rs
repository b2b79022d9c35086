//! A module containing the configuration and error types shared through out digit-net

use std::fmt;

use digit_net_macros::FromForAllUnnamedVariants;
use savefile::SavefileError;

use crate::layers::initializers::{Initializer, InitializerTrait, UniformRandomInitializer};

/// The layer sizes of the classic digit recognizer: 28x28 pixels, two hidden layers of 16
/// neurons and one output neuron per digit.
pub const MNIST_LAYER_SIZES: [usize; 4] = [28 * 28, 16, 16, 10];

/// The learning rate used when none is given.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

#[derive(Debug, Clone)]
/// The topology and the hyper parameters of a network.
///
/// Once a network is created from a config its layer sizes can never change, the config is
/// kept beside the parameters so that loaded parameters can be checked against it.
pub struct NetworkConfig {
    /// The amount of neurons in each layer, starting at the input layer and ending at the output
    /// layer.
    pub layer_sizes: Vec<usize>,
    /// The fixed step that scales every update, it is never decayed.
    pub learning_rate: f64,
    /// How the weights and the biases are drawn when creating a fresh network.
    pub initializer: Initializer,
}

impl NetworkConfig {
    /// Creates a new config using the default initializer, uniform in **(-1, 1)**.
    pub fn new(layer_sizes: Vec<usize>, learning_rate: f64) -> Self {
        NetworkConfig {
            layer_sizes,
            learning_rate,
            initializer: Initializer::default(),
        }
    }

    /// Replaces the initializer of the config.
    pub fn with_initializer(mut self, initializer: impl Into<Initializer>) -> Self {
        self.initializer = initializer.into();
        self
    }

    /// Checks that the config describes a network that can actually be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layer_sizes.len() < 2 {
            return Err(ConfigError::NotEnoughLayers {
                layers_amount: self.layer_sizes.len(),
            });
        }

        if let Some(layer) = self.layer_sizes.iter().position(|size| *size == 0) {
            return Err(ConfigError::EmptyLayer { layer });
        }

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }

        self.initializer.validate()
    }

    /// The size of the input layer.
    pub fn inputs_amount(&self) -> usize {
        self.layer_sizes.first().copied().unwrap_or(0)
    }

    /// The size of the output layer.
    pub fn outputs_amount(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            layer_sizes: MNIST_LAYER_SIZES.to_vec(),
            learning_rate: DEFAULT_LEARNING_RATE,
            initializer: UniformRandomInitializer::new(-1.0..1.0).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The reasons a [NetworkConfig] can be refused.
pub enum ConfigError {
    /// A network needs at least an input and an output layer.
    NotEnoughLayers { layers_amount: usize },
    /// Some layer was configured with zero neurons.
    EmptyLayer { layer: usize },
    /// The learning rate must be finite and positive.
    InvalidLearningRate(f64),
    /// The initializer can't produce numbers, like an empty range or a negative deviation.
    InvalidInitializer(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotEnoughLayers { layers_amount } => write!(
                f,
                "a network needs at least 2 layers but {} were configured",
                layers_amount
            ),
            ConfigError::EmptyLayer { layer } => write!(f, "layer {} has no neurons", layer),
            ConfigError::InvalidLearningRate(rate) => {
                write!(f, "the learning rate {} is not a positive number", rate)
            }
            ConfigError::InvalidInitializer(reason) => {
                write!(f, "invalid initializer: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
/// The errors a single forward or backward pass may run into, all of them caused by handing the
/// network a sample that doesn't fit its topology.
pub enum InferenceError {
    /// The pixel vector is not as long as the input layer, it is never truncated nor padded.
    InputSizeMismatch { expected: usize, actual: usize },
    /// The label does not name any of the output neurons.
    LabelOutOfRange { label: usize, outputs_amount: usize },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::InputSizeMismatch { expected, actual } => write!(
                f,
                "expected {} input values but received {}",
                expected, actual
            ),
            InferenceError::LabelOutOfRange {
                label,
                outputs_amount,
            } => write!(
                f,
                "the label {} is out of range for a network with {} outputs",
                label, outputs_amount
            ),
        }
    }
}

impl std::error::Error for InferenceError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// The errors that can happen when storing, loading or assembling network parameters.
pub enum ParameterError {
    /// Savefile was unable to read or write the file.
    Savefile(SavefileError),
    /// The config the parameters should follow is not valid by itself.
    Config(ConfigError),
    /// A weight matrix or bias vector does not have the size the topology requires.
    ShapeMismatch {
        layer: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// The outputs of a layer don't line up with the inputs of the next one.
    DisconnectedLayers { layer: usize },
    /// The parameters have more or less layers than the topology, input layer included.
    LayerCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::Savefile(err) => write!(f, "unable to persist parameters: {:?}", err),
            ParameterError::Config(err) => write!(f, "{}", err),
            ParameterError::ShapeMismatch {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "layer {} should be {}x{} but is {}x{}",
                layer, expected.0, expected.1, actual.0, actual.1
            ),
            ParameterError::DisconnectedLayers { layer } => write!(
                f,
                "the outputs of layer {} don't match the inputs of layer {}",
                layer,
                layer + 1
            ),
            ParameterError::LayerCountMismatch { expected, actual } => write!(
                f,
                "expected a network of {} layers but the parameters have {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for ParameterError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// The errors that can happen while reading or fetching the IDX archives of a dataset.
pub enum DatasetError {
    /// The archive could not be opened, read or written.
    Io(std::io::Error),
    /// The archive could not be fetched from the mirror.
    Download(reqwest::Error),
    /// The archive does not start with the magic number of its kind.
    InvalidMagicNumber { expected: u32, actual: u32 },
    /// The archive ends before the amount of bytes its header announces.
    Truncated { expected: usize, actual: usize },
    /// The images and the labels archives don't hold the same amount of samples.
    CountMismatch { images: usize, labels: usize },
    /// The pixels can't be split into images of the given size.
    SizeMismatch { image_size: usize, pixels: usize },
    /// A label that is not a digit.
    InvalidLabel { index: usize, label: u8 },
    /// The dimensions multiply into more bytes than can be addressed.
    SizeOverflow { dimensions: Vec<usize> },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "{}", err),
            DatasetError::Download(err) => write!(f, "unable to download the dataset: {}", err),
            DatasetError::InvalidMagicNumber { expected, actual } => write!(
                f,
                "expected the magic number {} but found {}",
                expected, actual
            ),
            DatasetError::Truncated { expected, actual } => write!(
                f,
                "the archive should have {} bytes but only has {}",
                expected, actual
            ),
            DatasetError::CountMismatch { images, labels } => write!(
                f,
                "there are {} images but {} labels",
                images, labels
            ),
            DatasetError::SizeMismatch { image_size, pixels } => write!(
                f,
                "{} pixels can't be split into images of {} pixels",
                pixels, image_size
            ),
            DatasetError::InvalidLabel { index, label } => {
                write!(f, "the label {} of sample {} is not a digit", label, index)
            }
            DatasetError::SizeOverflow { dimensions } => {
                write!(f, "the dimensions {:?} are too large to be addressed", dimensions)
            }
        }
    }
}

impl std::error::Error for DatasetError {}

#[derive(Debug, FromForAllUnnamedVariants)]
/// The errors that can stop a training or an evaluation run.
pub enum TrainingError {
    /// There are no samples, so the network is never touched.
    EmptyDataset,
    /// Some sample does not fit the network.
    Inference(InferenceError),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingError::EmptyDataset => write!(f, "refusing to run on a dataset with no samples"),
            TrainingError::Inference(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TrainingError {}

#[derive(Debug, Clone, Default)]
/// What should be printed while the model is being fitted.
pub struct TrainingVerbosity {
    /// Prints the epoch number when it starts.
    pub show_current_epoch: bool,
    /// Draws a progress bar over the samples of every epoch.
    pub show_epoch_progress: bool,
    /// Prints the rolling average of the cost at every report.
    pub print_loss: bool,
    /// Draws the sample of the report in the terminal together with the outputs of the network
    /// and its label.
    pub show_sample_preview: bool,
}

impl TrainingVerbosity {
    /// Turns every output on.
    pub fn everything() -> Self {
        TrainingVerbosity {
            show_current_epoch: true,
            show_epoch_progress: true,
            print_loss: true,
            show_sample_preview: true,
        }
    }
}

#[derive(Debug, Clone)]
/// A struct that defines the options for fitting a Model.
pub struct TrainingOptions {
    /// The amount of full passes over the dataset.
    pub epochs: usize,
    /// Only trains on the first samples of the dataset when set.
    pub samples_per_epoch: Option<usize>,
    /// How many samples go by between two reports, a report resets the rolling average.
    pub report_every: usize,
    /// How many of the most recent costs are averaged.
    pub rolling_window: usize,
    /// What should be printed through out the training.
    pub verbosity: TrainingVerbosity,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            epochs: 1,
            samples_per_epoch: None,
            report_every: 2000,
            rolling_window: 11,
            verbosity: TrainingVerbosity::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// What happened during a call to fit.
pub struct TrainingSummary {
    /// The amount of training steps taken through out every epoch.
    pub samples_seen: usize,
    /// The mean cost of the samples of each epoch, measured before each update.
    pub epoch_costs: Vec<f64>,
    /// The rolling average of the cost when the training ended.
    pub last_rolling_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
/// How well a network does on a dataset it is not trained with.
pub struct EvaluationReport {
    pub samples: usize,
    /// The amount of samples whose label has the highest score.
    pub correct: usize,
    /// `correct / samples`
    pub accuracy: f64,
    pub mean_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NetworkConfig};
    use crate::layers::initializers::{NormalRandomInitializer, UniformRandomInitializer};

    #[test]
    fn should_accept_the_default_config() {
        let config = NetworkConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.inputs_amount(), 784);
        assert_eq!(config.outputs_amount(), 10);
    }

    #[test]
    fn should_refuse_configs_with_an_unusable_initializer() {
        let empty_interval = NetworkConfig::default()
            .with_initializer(UniformRandomInitializer::new(0.5..0.5));
        let negative_deviation =
            NetworkConfig::default().with_initializer(NormalRandomInitializer::new(0.0, -2.0));

        assert!(matches!(
            empty_interval.validate(),
            Err(ConfigError::InvalidInitializer(_))
        ));
        assert!(matches!(
            negative_deviation.validate(),
            Err(ConfigError::InvalidInitializer(_))
        ));
    }

    #[test]
    fn should_refuse_empty_layers_and_bad_learning_rates() {
        assert_eq!(
            NetworkConfig::new(vec![784, 0, 10], 0.1).validate(),
            Err(ConfigError::EmptyLayer { layer: 1 })
        );
        assert_eq!(
            NetworkConfig::new(vec![784, 10], 0.0).validate(),
            Err(ConfigError::InvalidLearningRate(0.0))
        );
        assert!(NetworkConfig::new(vec![784, 10], f64::NAN).validate().is_err());
    }
}
