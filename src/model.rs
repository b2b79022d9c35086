//! The module that contains the network together with the config it follows, and the loops that
//! train and evaluate it over a whole dataset.

use log::{debug, info};
use rand::RngCore;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::datasets::MnistDataset;
use crate::loss_functions::{cost, one_hot, LossFunction, MeanSquared};
use crate::network::{ActivationRecord, DeltaRecord, NetworkParameters};
use crate::types::{
    ConfigError, EvaluationReport, InferenceError, NetworkConfig, ParameterError,
    TrainingError, TrainingOptions, TrainingSummary,
};
use crate::utils::progress::styled_progress_bar;
use crate::utils::{argmax, render_image, render_outputs, RollingAverage};

const EPOCH_TEMPLATE: &str = "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})";

#[derive(Debug, Clone)]
/// A digit classifier: the parameters of a network and the config they were built from.
///
/// # Example
///
/// ```rust
/// use digit_net::{Model, types::NetworkConfig};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let model = Model::new(NetworkConfig::default(), &mut StdRng::seed_from_u64(0)).unwrap();
/// let digit = model.predict(&[0u8; 784]).unwrap();
///
/// assert!(digit < 10);
/// ```
pub struct Model {
    config: NetworkConfig,
    parameters: NetworkParameters,
}

impl Model {
    /// Creates a model with freshly initialized parameters drawn from **rng**.
    pub fn new(config: NetworkConfig, rng: &mut dyn RngCore) -> Result<Model, ConfigError> {
        let parameters = NetworkParameters::new_random(&config, rng)?;

        Ok(Model { config, parameters })
    }

    /// Wraps existing parameters, they must have the exact topology of the **config**.
    pub fn from_parameters(
        config: NetworkConfig,
        parameters: NetworkParameters,
    ) -> Result<Model, ParameterError> {
        parameters.check_against(&config)?;

        Ok(Model { config, parameters })
    }

    /// Loads parameters saved by [Model::save] and checks them against the **config**.
    pub fn load(config: NetworkConfig, path: &str) -> Result<Model, ParameterError> {
        Model::from_parameters(config, NetworkParameters::load(path)?)
    }

    pub fn save(&self, path: &str) -> Result<(), ParameterError> {
        self.parameters.save(path)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.parameters
    }

    /// See [NetworkParameters::infer].
    pub fn infer<P>(&self, pixels: &[P]) -> Result<ActivationRecord, InferenceError>
    where
        P: Copy + Into<f64>,
    {
        self.parameters.infer(pixels)
    }

    /// See [NetworkParameters::backward].
    pub fn backward(
        &self,
        activations: &ActivationRecord,
        label: usize,
    ) -> Result<DeltaRecord, InferenceError> {
        self.parameters.backward(activations, label)
    }

    /// Applies the deltas with the learning rate of the config.
    pub fn apply(&mut self, activations: &ActivationRecord, deltas: &DeltaRecord) {
        self.parameters
            .apply(activations, deltas, self.config.learning_rate);
    }

    /// The digit with the highest score.
    pub fn predict<P>(&self, pixels: &[P]) -> Result<usize, InferenceError>
    where
        P: Copy + Into<f64>,
    {
        let activations = self.infer(pixels)?;

        // there is always at least one output neuron
        Ok(argmax(activations.outputs()).unwrap_or_default())
    }

    fn step<P>(&mut self, pixels: &[P], label: usize) -> Result<(ActivationRecord, f64), InferenceError>
    where
        P: Copy + Into<f64>,
    {
        let activations = self.infer(pixels)?;
        let deltas = self.backward(&activations, label)?;
        let sample_cost = cost(activations.outputs(), label);
        self.apply(&activations, &deltas);

        Ok((activations, sample_cost))
    }

    /// Takes one gradient descent step on a single sample.
    ///
    /// Returns the cost of the sample measured before the update.
    pub fn train_sample<P>(&mut self, pixels: &[P], label: usize) -> Result<f64, InferenceError>
    where
        P: Copy + Into<f64>,
    {
        self.step(pixels, label).map(|(_, sample_cost)| sample_cost)
    }

    /// Trains the model one sample at a time going through the **dataset** in order, once per
    /// epoch.
    ///
    /// An empty dataset is refused before anything in the network is touched. Every
    /// `report_every` samples the rolling average of the cost is reported, together with the
    /// current sample if asked to, and then reset.
    pub fn fit(
        &mut self,
        dataset: &MnistDataset,
        options: &TrainingOptions,
    ) -> Result<TrainingSummary, TrainingError> {
        let samples_amount = options
            .samples_per_epoch
            .map_or(dataset.len(), |limit| limit.min(dataset.len()));
        if samples_amount == 0 {
            return Err(TrainingError::EmptyDataset);
        }

        let verbosity = &options.verbosity;
        let report_every = options.report_every.max(1);
        let mut rolling_average = RollingAverage::new(options.rolling_window.max(1));
        let mut last_report = None;
        let mut epoch_costs = Vec::with_capacity(options.epochs);
        let mut samples_seen = 0;

        info!(
            "training {:?} on {} samples for {} epochs",
            self.parameters.layer_sizes(),
            samples_amount,
            options.epochs
        );

        for epoch_index in 0..options.epochs {
            if verbosity.show_current_epoch {
                println!("---------------");
                println!("epoch #{}", epoch_index + 1);
            }

            let progress_bar = if verbosity.show_epoch_progress {
                Some(styled_progress_bar(samples_amount as u64, EPOCH_TEMPLATE))
            } else {
                None
            };

            let mut total_cost = 0.0;

            for index in 0..samples_amount {
                let pixels = dataset.image_at(index);
                let label = dataset.label_at(index);
                let (activations, sample_cost) = self.step(pixels, label)?;

                total_cost += sample_cost;
                samples_seen += 1;
                rolling_average.push(sample_cost);

                if samples_seen % report_every == 0 {
                    let average = rolling_average.average();
                    debug!("rolling average cost after {} samples: {:?}", samples_seen, average);

                    let report = || {
                        if verbosity.print_loss {
                            println!(
                                "{} samples seen, rolling average cost of {:.6}",
                                samples_seen,
                                average.unwrap_or_default()
                            );
                        }

                        if verbosity.show_sample_preview {
                            print!("{}", render_image(pixels, dataset.cols()));
                            println!("sample #{}", index);
                            print!("{}", render_outputs(activations.outputs()));
                            println!("label: {}", label);
                        }
                    };

                    match &progress_bar {
                        Some(progress_bar) => progress_bar.suspend(report),
                        None => report(),
                    }

                    last_report = average;
                    rolling_average.reset();
                }

                if let Some(progress_bar) = &progress_bar {
                    progress_bar.inc(1);
                }
            }

            if let Some(progress_bar) = progress_bar {
                progress_bar.finish_and_clear();
            }

            let mean_cost = total_cost / samples_amount as f64;
            info!("epoch #{} finished with a mean cost of {}", epoch_index + 1, mean_cost);
            epoch_costs.push(mean_cost);
        }

        Ok(TrainingSummary {
            samples_seen,
            epoch_costs,
            last_rolling_average: rolling_average.average().or(last_report),
        })
    }

    /// Measures the accuracy and the mean cost of the model on every sample of the **dataset**.
    ///
    /// The samples are inferred in parallel since the model is only read.
    pub fn evaluate(&self, dataset: &MnistDataset) -> Result<EvaluationReport, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let outputs_amount = self.parameters.outputs_amount();
        let results = (0..dataset.len())
            .into_par_iter()
            .map(|index| -> Result<(Vec<f64>, usize), InferenceError> {
                let label = dataset.label_at(index);
                self.parameters.check_label(label)?;
                let activations = self.infer(dataset.image_at(index))?;

                Ok((activations.outputs().to_vec(), label))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let correct = results
            .iter()
            .filter(|(outputs, label)| argmax(outputs) == Some(*label))
            .count();

        let (sample_outputs, labels): (Vec<Vec<f64>>, Vec<usize>) = results.into_iter().unzip();
        let expected_outputs: Vec<Vec<f64>> = labels
            .into_iter()
            .map(|label| one_hot(label, outputs_amount))
            .collect();
        let mean_cost = MeanSquared.average_loss_for_samples(&sample_outputs, &expected_outputs);

        let report = EvaluationReport {
            samples: dataset.len(),
            correct,
            accuracy: correct as f64 / dataset.len() as f64,
            mean_cost,
        };
        info!(
            "evaluated {} samples, {} correct ({:.2}%)",
            report.samples,
            report.correct,
            report.accuracy * 100.0
        );

        Ok(report)
    }
}
