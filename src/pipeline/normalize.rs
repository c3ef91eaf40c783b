use ndarray::Array2;

/// Divide the Si signal by the total-ion signal, cell by cell.
///
/// Both arrays come out of the converter, so the reference holds no zeros
/// and they share one shape.
pub fn normalize(primary: &Array2<f64>, reference: &Array2<f64>) -> Array2<f64> {
    debug_assert_eq!(primary.dim(), reference.dim());
    primary / reference
}
