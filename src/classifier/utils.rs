use ndarray::Array1;

/// Squared Euclidean distance, accumulated in f64.
///
/// Squared distance is monotonic with true distance, so nearest-neighbor
/// ranking is unchanged and the sqrt is skipped.
pub(crate) fn squared_euclidean(a: &Array1<f32>, b: &Array1<f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum()
}
