/// Builds a [`Matrix`](crate::Matrix) from semicolon-separated rows of
/// `f64` expressions. Intended for tests and small fixtures.
#[macro_export]
macro_rules! matrix {
    ( $( $($val:expr),+ );* $(;)? ) => {
        {
            let mut data = Vec::<f64>::new();
            let mut rows = 0usize;
            let mut cols = 0usize;
            $(
                let row_data = vec![$($val),+];
                if cols == 0 {
                    cols = row_data.len();
                } else if cols != row_data.len() {
                    panic!("Inconsistent number of elements in the matrix rows");
                }
                rows += 1;
                data.extend(row_data);
            )*

            $crate::Matrix::new(rows, cols, data)
        }
    };
}
