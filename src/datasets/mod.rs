//! The module for the datasets feature of digit-net.
//!
//! Currently contains the following datasets.
//! - MNIST

/// The module containing the MNIST dataset
pub mod mnist;


pub use mnist::{download, MnistDataset, Split};
