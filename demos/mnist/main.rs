use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use digit_net::{
    datasets::{download, MnistDataset, Split},
    types::{NetworkConfig, TrainingOptions, TrainingVerbosity, MNIST_LAYER_SIZES},
    utils::{render_image, render_outputs},
    Model,
};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Trains and runs a small digit recognizer on MNIST
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Folder holding the MNIST archives
    #[arg(long, default_value = "mnist")]
    data_dir: PathBuf,

    /// File the network parameters are read from and written to
    #[arg(long, default_value = "mnist-network.bin")]
    parameters: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetches the training and testing archives
    Download,
    /// Trains the network on the training split and saves it
    Train {
        #[arg(long, default_value_t = 1)]
        epochs: usize,
        #[arg(long, default_value_t = 0.1)]
        learning_rate: f64,
        /// Seed of a fresh network, ignored when resuming
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Keeps training the saved parameters instead of starting over
        #[arg(long)]
        resume: bool,
        /// Only trains on the first samples of every epoch
        #[arg(long)]
        samples: Option<usize>,
    },
    /// Measures the accuracy of the saved network on the testing split
    Evaluate,
    /// Draws a sample of the testing split together with what the network thinks it is
    Show {
        /// Picks a random sample when missing
        #[arg(long)]
        index: Option<usize>,
    },
}

fn load_model(path: &str, learning_rate: f64) -> Result<Model, Box<dyn Error>> {
    let config = NetworkConfig::new(MNIST_LAYER_SIZES.to_vec(), learning_rate);
    Ok(Model::load(config, path)?)
}

fn train(
    data_dir: &Path,
    parameters: &str,
    options: TrainingOptions,
    learning_rate: f64,
    seed: u64,
    resume: bool,
) -> Result<(), Box<dyn Error>> {
    let dataset = MnistDataset::load_from_dir(data_dir, Split::Train)?;

    let mut model = if resume {
        load_model(parameters, learning_rate)?
    } else {
        let config = NetworkConfig::new(MNIST_LAYER_SIZES.to_vec(), learning_rate);
        Model::new(config, &mut StdRng::seed_from_u64(seed))?
    };

    let summary = model.fit(&dataset, &options)?;
    info!("mean cost per epoch: {:?}", summary.epoch_costs);

    model.save(parameters)?;

    Ok(())
}

fn evaluate(data_dir: &Path, parameters: &str) -> Result<(), Box<dyn Error>> {
    let dataset = MnistDataset::load_from_dir(data_dir, Split::Test)?;
    let model = load_model(parameters, digit_net::types::DEFAULT_LEARNING_RATE)?;

    let report = model.evaluate(&dataset)?;
    println!(
        "{}/{} correct, accuracy of {:.2}% and mean cost of {:.5}",
        report.correct,
        report.samples,
        report.accuracy * 100.0,
        report.mean_cost
    );

    Ok(())
}

fn show(data_dir: &Path, parameters: &str, index: Option<usize>) -> Result<(), Box<dyn Error>> {
    let dataset = MnistDataset::load_from_dir(data_dir, Split::Test)?;
    let model = load_model(parameters, digit_net::types::DEFAULT_LEARNING_RATE)?;

    if dataset.is_empty() {
        return Err("the testing split has no samples".into());
    }

    let index = index.unwrap_or_else(|| rand::thread_rng().gen_range(0..dataset.len()));
    if index >= dataset.len() {
        return Err(format!("there are only {} samples", dataset.len()).into());
    }

    let pixels = dataset.image_at(index);
    let activations = model.infer(pixels)?;

    print!("{}", render_image(pixels, dataset.cols()));
    println!("sample #{}", index);
    print!("{}", render_outputs(activations.outputs()));
    println!("label: {}", dataset.label_at(index));
    println!("prediction: {}", model.predict(pixels)?);

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Download => download(&args.data_dir)?,
        Command::Train {
            epochs,
            learning_rate,
            seed,
            resume,
            samples,
        } => {
            let options = TrainingOptions {
                epochs,
                samples_per_epoch: samples,
                verbosity: TrainingVerbosity::everything(),
                ..TrainingOptions::default()
            };

            train(
                &args.data_dir,
                &args.parameters,
                options,
                learning_rate,
                seed,
                resume,
            )?
        }
        Command::Evaluate => evaluate(&args.data_dir, &args.parameters)?,
        Command::Show { index } => show(&args.data_dir, &args.parameters, index)?,
    }

    Ok(())
}
