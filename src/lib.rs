//! A from scratch **multilayer perceptron** that learns to recognize handwritten digits.
//!
//! The network is a stack of fully connected Sigmoid layers, 784 -> 16 -> 16 -> 10 by default,
//! trained with plain stochastic gradient descent one sample at a time. Every training step is
//! a forward pass ([network::NetworkParameters::infer]), a backward pass computing the deltas of
//! every layer ([network::NetworkParameters::backward]) and an update of the weights and biases
//! ([network::NetworkParameters::apply]).
//!
//! Around that engine the crate can read and download the MNIST archives, store the parameters
//! between runs with savefile and draw samples in a terminal.

pub mod datasets;
pub mod layers;
pub mod loss_functions;
pub mod model;
pub mod network;
pub mod types;
pub mod utils;

pub use model::Model;
pub use network::{ActivationRecord, DeltaRecord, NetworkParameters};
pub use types::NetworkConfig;
