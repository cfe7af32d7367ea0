use ndarray::{Array2, ArrayView1};

/// Euclidean distance between two equally sized vectors.
pub fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Pairwise Euclidean distance matrix over the rows of `points`.
///
/// The result is square, exactly symmetric, zero on the diagonal, and
/// indexed by the row order of `points`.
pub fn pairwise_euclidean(points: &Array2<f64>) -> Array2<f64> {
    let n = points.nrows();
    let mut matrix = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(points.row(i), points.row(j));
            matrix[[i, j]] = d;
            matrix[[j, i]] = d;
        }
    }
    matrix
}

/// Row-major flattening, self-pairs included.
pub fn flatten_row_major(matrix: &Array2<f64>) -> Vec<f64> {
    matrix.iter().copied().collect()
}
