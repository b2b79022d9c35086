/// Asserts if the vectors **a** and **b** are approximately equal
/// being at most **max_dist** of a difference.
///
/// # Panics
///
/// Panics if the length of both vectors are not equal.
pub(crate) fn assert_approx_equal_distance(a: &[f64], b: &[f64], max_dist: f64) {
    assert_eq!(a.len(), b.len());

    a.iter().zip(b).enumerate().for_each(|(i, (x, y))| {
        assert!(
            (x - y).abs() <= max_dist,
            "values at {} differ by more than {}: {} and {}",
            i,
            max_dist,
            x,
            y
        );
    });
}
