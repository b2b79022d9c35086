//! Dense matrix helpers for the weights of a layer.
//!
//! Matrices are stored as rows, one row per source neuron, so every row has the same length
//! which is called the width here.

pub trait MatrixOperations {
    type Item;

    /// Multiplies the row vector **against** by the matrix, `against^T * M`.
    ///
    /// The result has one value per column.
    fn dot_product(&self, against: &[Self::Item]) -> Vec<Self::Item>;

    /// Multiplies the matrix by the column vector **against**, `M * against`.
    ///
    /// The result has one value per row.
    fn multiply_vector(&self, against: &[Self::Item]) -> Vec<Self::Item>;

    /// Subtracts `factor * rows * columns^T` from the matrix in place.
    fn subtract_scaled_outer_product(
        &mut self,
        rows: &[Self::Item],
        columns: &[Self::Item],
        factor: Self::Item,
    );

    fn get_width(&self) -> usize;

    fn get_height(&self) -> usize;
}

impl MatrixOperations for Vec<Vec<f64>> {
    type Item = f64;

    fn dot_product(&self, against: &[f64]) -> Vec<f64> {
        let width = self.get_width();
        let height = self.get_height();
        assert_eq!(height, against.len());

        let mut result = vec![0.0_f64; width];

        for (row, value) in self.iter().zip(against) {
            for (col, weight) in row.iter().enumerate() {
                result[col] += weight * value;
            }
        }

        result
    }

    fn multiply_vector(&self, against: &[f64]) -> Vec<f64> {
        assert_eq!(self.get_width(), against.len());

        self.iter()
            .map(|row| row.iter().zip(against).map(|(x, y)| x * y).sum::<f64>())
            .collect()
    }

    fn subtract_scaled_outer_product(&mut self, rows: &[f64], columns: &[f64], factor: f64) {
        assert_eq!(self.get_height(), rows.len());
        assert_eq!(self.get_width(), columns.len());

        for (row, row_value) in self.iter_mut().zip(rows) {
            for (cell, column_value) in row.iter_mut().zip(columns) {
                *cell -= factor * row_value * column_value;
            }
        }
    }

    fn get_width(&self) -> usize {
        self.first().map(|row| row.len()).unwrap_or(0)
    }

    fn get_height(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::MatrixOperations;

    fn matrix() -> Vec<Vec<f64>> {
        vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
    }

    #[test]
    fn should_multiply_a_row_vector_by_the_matrix() {
        assert_eq!(matrix().dot_product(&[1.0, -1.0]), vec![-3.0, -3.0, -3.0]);
    }

    #[test]
    fn should_multiply_the_matrix_by_a_column_vector() {
        assert_eq!(matrix().multiply_vector(&[1.0, 0.0, 2.0]), vec![7.0, 16.0]);
    }

    #[test]
    fn should_subtract_the_scaled_outer_product() {
        let mut m = matrix();

        m.subtract_scaled_outer_product(&[1.0, 2.0], &[1.0, 0.0, -1.0], 0.5);

        assert_eq!(m, vec![vec![0.5, 2.0, 3.5], vec![3.0, 5.0, 7.0]]);
    }

    #[test]
    #[should_panic]
    fn should_refuse_vectors_of_the_wrong_size() {
        matrix().dot_product(&[1.0, 2.0, 3.0]);
    }
}
