//! The module that contains all the available parameter initializers for digit-net
//!
//! Every initializer draws from a random number generator handed to it, so seeding that
//! generator is enough to get the exact same network twice.

use std::ops::Range;

use digit_net_macros::FromForAllUnnamedVariants;
use rand::RngCore;
use rand_distr::{Distribution, Normal, Uniform};

use crate::types::ConfigError;

/// A trait that is implemented for all of the parameter initializers.
pub trait InitializerTrait
where
    Self: std::fmt::Debug,
{
    /// Generates just one number based on the Initializer's implementation
    fn initialize_0d(&self, rng: &mut dyn RngCore) -> f64;

    /// Checks the initializer is able to generate numbers at all.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Generates a Vec of numbers initialized based on the Initializer's implementation
    fn initialize_1d(&self, count: usize, rng: &mut dyn RngCore) -> Vec<f64> {
        (0..count).map(|_| self.initialize_0d(rng)).collect()
    }

    /// Generates a Matrix of numbers initialized based on the Initializer's implementation
    fn initialize_2d(&self, shape: (usize, usize), rng: &mut dyn RngCore) -> Vec<Vec<f64>> {
        (0..shape.0)
            .map(|_| self.initialize_1d(shape.1, rng))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A Initializer that pretty much just initializes all values of a parameter with a constant
/// value provided by the **new** method
pub struct ConstantInitializer {
    /// The constant that all the parameters will be
    pub constant: f64,
}

impl ConstantInitializer {
    /// Creates a new Constant initializer
    pub fn new(constant: f64) -> Self {
        ConstantInitializer { constant }
    }
}

impl InitializerTrait for ConstantInitializer {
    fn initialize_0d(&self, _: &mut dyn RngCore) -> f64 {
        self.constant
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.constant.is_finite() {
            return Err(ConfigError::InvalidInitializer(format!(
                "the constant {} is not finite",
                self.constant
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A Initializer that generates random numbers in a uniform distribution based on a range
/// provided by the `new` method
pub struct UniformRandomInitializer {
    /// The interval that will be used to limit the uniform distribution
    pub interval: Range<f64>,
}

impl UniformRandomInitializer {
    /// Creates a new Uniform Random initializer
    pub fn new(interval: Range<f64>) -> Self {
        UniformRandomInitializer { interval }
    }
}

impl InitializerTrait for UniformRandomInitializer {
    /// # Panics
    ///
    /// Panics if the interval is empty, which `validate` reports beforehand.
    fn initialize_0d(&self, rng: &mut dyn RngCore) -> f64 {
        let distribution = Uniform::new(self.interval.start, self.interval.end);
        distribution.sample(rng)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (start, end) = (self.interval.start, self.interval.end);
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(ConfigError::InvalidInitializer(format!(
                "the interval {}..{} is empty or not finite",
                start, end
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A Initializer that generates random numbers in a normal distribution based on a **mean** and a
/// **standard deviation** provided by the `new` method
pub struct NormalRandomInitializer {
    /// The mean for the Normal distribution
    pub mean: f64,
    /// The standard deviation for the Normal distribution
    pub standard_deviation: f64,
}

impl NormalRandomInitializer {
    /// Creates a new Normal Random initializer
    pub fn new(mean: f64, standard_deviation: f64) -> Self {
        NormalRandomInitializer {
            mean,
            standard_deviation,
        }
    }
}

impl InitializerTrait for NormalRandomInitializer {
    fn initialize_0d(&self, rng: &mut dyn RngCore) -> f64 {
        match Normal::new(self.mean, self.standard_deviation) {
            Ok(distribution) => distribution.sample(rng),
            // only reachable with the parameters `validate` refuses
            Err(_) => self.mean,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.mean.is_finite()
            || !self.standard_deviation.is_finite()
            || self.standard_deviation < 0.0
        {
            return Err(ConfigError::InvalidInitializer(format!(
                "a normal distribution can't have a mean of {} and a deviation of {}",
                self.mean, self.standard_deviation
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, FromForAllUnnamedVariants)]
/// The enum that contains all of the possible Initializers
pub enum Initializer {
    /// The Constant initializer
    Constant(ConstantInitializer),
    /// The Uniform Random initializer
    UniformRandom(UniformRandomInitializer),
    /// The Normal Random initializer
    NormalRandom(NormalRandomInitializer),
}

impl InitializerTrait for Initializer {
    fn initialize_0d(&self, rng: &mut dyn RngCore) -> f64 {
        match self {
            Initializer::Constant(i) => i.initialize_0d(rng),
            Initializer::UniformRandom(i) => i.initialize_0d(rng),
            Initializer::NormalRandom(i) => i.initialize_0d(rng),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Initializer::Constant(i) => i.validate(),
            Initializer::UniformRandom(i) => i.validate(),
            Initializer::NormalRandom(i) => i.validate(),
        }
    }
}

impl Default for Initializer {
    /// Symmetric around zero, **(-1, 1)**, for both the weights and the biases.
    fn default() -> Self {
        Self::UniformRandom(UniformRandomInitializer::new(-1.0..1.0))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn should_stay_inside_the_uniform_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let initializer = UniformRandomInitializer::new(0.0..1.0);

        let values = initializer.initialize_2d((50, 20), &mut rng);

        assert_eq!(values.len(), 50);
        assert!(values.iter().all(|row| row.len() == 20));
        assert!(values.iter().flatten().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn should_be_reproducible_with_the_same_seed() {
        let initializer = Initializer::default();

        let first = initializer.initialize_1d(100, &mut StdRng::seed_from_u64(42));
        let second = initializer.initialize_1d(100, &mut StdRng::seed_from_u64(42));

        assert_eq!(first, second);
    }

    #[test]
    fn should_refuse_empty_intervals() {
        let initializer: Initializer = UniformRandomInitializer::new(1.0..1.0).into();

        assert!(matches!(
            initializer.validate(),
            Err(ConfigError::InvalidInitializer(_))
        ));
    }

    #[test]
    fn should_refuse_negative_deviations() {
        let initializer: Initializer = NormalRandomInitializer::new(0.0, -1.0).into();

        assert!(initializer.validate().is_err());
    }

    #[test]
    fn should_return_the_mean_when_there_is_no_deviation() {
        let initializer = NormalRandomInitializer::new(0.25, 0.0);

        assert_eq!(initializer.initialize_0d(&mut StdRng::seed_from_u64(1)), 0.25);
    }
}
