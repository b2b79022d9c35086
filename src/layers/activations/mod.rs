//! The module that contains the activation function of the network.
//!
//! Every layer of the network is squashed by the logistic Sigmoid, there are no other
//! activations.

pub mod sigmoid;

pub use sigmoid::Sigmoid;
