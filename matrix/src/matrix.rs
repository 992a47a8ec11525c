use rand::Rng;
use std::fmt;

/// A dense row-major matrix of `f64` values.
///
/// Rows of a batch matrix are individual samples; weight matrices map an
/// input width (rows) to an output width (columns). Shape mismatches between
/// operands are programming errors and panic.
#[derive(Clone, Debug)]
pub struct Matrix {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) data: Vec<f64>,
}

impl Matrix {
    #[must_use]
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "Data length must match rows * cols"
        );
        Self { rows, cols, data }
    }

    #[inline(always)]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; cols * rows],
        }
    }

    /// Builds a matrix from equally sized row slices.
    #[must_use]
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let cols = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "Matrix rows must have equal length");
            data.extend_from_slice(row);
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    /// Samples every element uniformly from `-limit..limit`.
    #[must_use]
    pub fn random_uniform<R: Rng>(rows: usize, cols: usize, limit: f64, rng: &mut R) -> Self {
        let data = (0..rows * cols)
            .map(|_| rng.random_range(-limit..limit))
            .collect();

        Self { rows, cols, data }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "Index out of bounds");
        self.data[row * self.cols + col]
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        assert!(row < self.rows, "Row index out of bounds");
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    #[must_use]
    pub fn dot_multiply(&self, other: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, other.rows,
            "Invalid matrix dimensions for multiplication"
        );

        let other_t = other.transpose(); // Transpose for better cache locality
        let mut data = Vec::with_capacity(self.rows * other.cols);

        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            for j in 0..other.cols {
                let col = &other_t.data[j * other.rows..(j + 1) * other.rows];
                let sum: f64 = row.iter().zip(col).map(|(&a, &b)| a * b).sum();
                data.push(sum);
            }
        }

        Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        }
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.rows * self.cols];

        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }

        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let data = self.data.iter().map(|&x| f(x)).collect();

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    #[must_use]
    pub fn add(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a + b)
    }

    #[must_use]
    pub fn subtract(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a - b)
    }

    #[must_use]
    pub fn elementwise_multiply(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a * b)
    }

    #[must_use]
    pub fn elementwise_divide(&self, other: &Matrix) -> Matrix {
        self.zip_with(other, |a, b| a / b)
    }

    #[must_use]
    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Adds a `1 x cols` row vector to every row.
    #[must_use]
    pub fn add_row_vector(&self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows, 1, "Row vector must have exactly one row");
        assert_eq!(self.cols, row.cols, "Matrix columns must match");

        let data = self
            .data
            .chunks_exact(self.cols)
            .flat_map(|chunk| chunk.iter().zip(row.data.iter()).map(|(&a, &b)| a + b))
            .collect();

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    /// Sums every column into a `1 x cols` row vector.
    #[must_use]
    pub fn column_sums(&self) -> Matrix {
        let mut sums = vec![0.0; self.cols];
        for row in self.data.chunks_exact(self.cols) {
            for (sum, &value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }

        Matrix {
            rows: 1,
            cols: self.cols,
            data: sums,
        }
    }

    fn zip_with<F>(&self, other: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.rows, other.rows, "Matrix rows must match");
        assert_eq!(self.cols, other.cols, "Matrix columns must match");

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}

impl From<Vec<f64>> for Matrix {
    fn from(vec: Vec<f64>) -> Self {
        let cols = vec.len();
        Matrix {
            rows: 1,
            cols,
            data: vec,
        }
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks_exact(self.cols.max(1)) {
            for value in row {
                write!(f, "{value:8.4}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_elementwise_multiply() {
        let matrix1 = Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let matrix2 = Matrix::new(2, 2, vec![5.0, 6.0, 7.0, 8.0]);

        let result = matrix1.elementwise_multiply(&matrix2);

        let expected = Matrix::new(2, 2, vec![5.0, 12.0, 21.0, 32.0]);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_elementwise_divide() {
        let matrix1 = matrix![
            8.0, 9.0;
            4.0, 1.0
        ];
        let matrix2 = matrix![
            2.0, 3.0;
            8.0, 4.0
        ];

        let result = matrix1.elementwise_divide(&matrix2);

        let expected = matrix![
            4.0, 3.0;
            0.5, 0.25
        ];
        assert_eq!(result, expected);
    }

    #[test]
    fn test_subtract_same_dimensions() {
        let matrix1 = matrix![
            1.0, 2.0;
            3.0, 4.0
        ];

        let matrix2 = matrix![
            5.0, 6.0;
            7.0, 8.0
        ];

        let result = matrix1.subtract(&matrix2);

        let expected = matrix![
            -4.0, -4.0;
            -4.0, -4.0
        ];

        assert_eq!(result, expected);
    }

    #[test]
    fn test_dot_multiply() {
        let a = matrix![
            1.0, 2.0, 3.0;
            4.0, 5.0, 6.0
        ];
        let b = matrix![
            7.0, 8.0;
            9.0, 10.0;
            11.0, 12.0
        ];

        let result = a.dot_multiply(&b);

        let expected = matrix![
            58.0, 64.0;
            139.0, 154.0
        ];

        assert_eq!(result, expected);
    }

    #[test]
    #[should_panic(expected = "Matrix columns must match")]
    fn test_subtract_different_dimensions() {
        let matrix1 = matrix![
            1.0, 2.0;
            3.0, 4.0
        ];

        let matrix2 = matrix![
            5.0, 6.0, 7.0;
            8.0, 9.0, 10.0
        ];

        let _ = matrix1.subtract(&matrix2);
    }

    #[test]
    fn test_matrix_addition() {
        let a = matrix![
            1.0, 2.0, 3.0;
            4.0, 5.0, 6.0
        ];

        let b = matrix![
            5.0, 6.0, 7.0;
            8.0, 9.0, 10.0
        ];

        let expected = matrix![
            6.0, 8.0, 10.0;
            12.0, 14.0, 16.0
        ];

        assert_eq!(a.add(&b), expected);
    }

    #[test]
    fn test_transpose_non_square() {
        let matrix = matrix![
            1.0, 2.0, 3.0;
            4.0, 5.0, 6.0;
            7.0, 8.0, 9.0;
            10.0, 11.0, 12.0
        ];
        let transposed = matrix.transpose();

        let expected = matrix![
            1.0, 4.0, 7.0, 10.0;
            2.0, 5.0, 8.0, 11.0;
            3.0, 6.0, 9.0, 12.0
        ];
        assert_eq!(transposed, expected);
    }

    #[test]
    fn test_map_square() {
        let matrix = matrix![
            1.0, 2.0;
            3.0, 4.0
        ];

        let transformed = matrix.map(|x| x * x);

        let expected = matrix![
            1.0, 4.0;
            9.0, 16.0
        ];

        assert_eq!(transformed, expected);
    }

    #[test]
    fn test_scale() {
        let matrix = matrix![
            1.0, -2.0;
            3.0, -4.0
        ];

        let expected = matrix![
            0.5, -1.0;
            1.5, -2.0
        ];

        assert_eq!(matrix.scale(0.5), expected);
    }

    #[test]
    fn test_add_row_vector() {
        let matrix = matrix![
            1.0, 2.0, 3.0;
            4.0, 5.0, 6.0
        ];
        let row = matrix![10.0, 20.0, 30.0];

        let result = matrix.add_row_vector(&row);

        let expected = matrix![
            11.0, 22.0, 33.0;
            14.0, 25.0, 36.0
        ];
        assert_eq!(result, expected);
    }

    #[test]
    #[should_panic(expected = "Row vector must have exactly one row")]
    fn test_add_row_vector_rejects_matrix() {
        let matrix = Matrix::zeros(2, 2);
        let not_a_row = Matrix::zeros(2, 2);
        let _ = matrix.add_row_vector(&not_a_row);
    }

    #[test]
    fn test_column_sums() {
        let matrix = matrix![
            1.0, 2.0, 3.0;
            4.0, 5.0, 6.0;
            7.0, 8.0, 9.0
        ];

        let expected = matrix![12.0, 15.0, 18.0];
        assert_eq!(matrix.column_sums(), expected);
    }

    #[test]
    fn test_from_rows() {
        let first = [1.0, 2.0];
        let second = [3.0, 4.0];
        let matrix = Matrix::from_rows(&[&first, &second]);

        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 2);
        assert_eq!(matrix.data(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_vec_is_row_vector() {
        let matrix = Matrix::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(matrix.rows(), 1);
        assert_eq!(matrix.cols(), 3);
    }

    #[test]
    fn test_row_accessor() {
        let matrix = matrix![
            1.0, 2.0;
            3.0, 4.0
        ];
        assert_eq!(matrix.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_random_uniform_bounds_and_determinism() {
        let mut rng = StdRng::seed_from_u64(17);
        let matrix = Matrix::random_uniform(4, 5, 0.25, &mut rng);

        assert!(matrix.data().iter().all(|&x| (-0.25..0.25).contains(&x)));

        let mut rng = StdRng::seed_from_u64(17);
        let again = Matrix::random_uniform(4, 5, 0.25, &mut rng);
        assert_eq!(matrix, again);
    }
}
