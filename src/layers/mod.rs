//! The building blocks of a network: the fully connected layer, its activation and the way its
//! parameters are first drawn.

pub mod activations;
pub mod dense;
pub mod initializers;

pub use dense::Dense;
pub use initializers::Initializer;
