//! Just a module with a few utilities that make writing code easier through out digit-net

#[cfg(test)]
pub(crate) mod approx_eq;
pub mod display;
pub mod matrix_operations;
pub(crate) mod progress;
pub mod rolling_average;

pub use display::{render_image, render_outputs};
pub use rolling_average::RollingAverage;

/// The index of the largest value, the first one wins ties.
///
/// Returns None for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, value)| match best {
            Some((_, best_value)) if best_value >= *value => best,
            _ => Some((index, *value)),
        })
        .map(|(index, _)| index)
}

#[test]
fn argmax_should_find_the_index_of_the_largest_value() {
    assert_eq!(argmax(&[0.1, 0.7, 0.3]), Some(1));
    assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
    assert_eq!(argmax(&[]), None);
}
