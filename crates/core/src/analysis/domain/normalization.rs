/// Trajectory values scaled by their sum, or the raw values when the sum is zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalization {
    pub values: Vec<f64>,
    pub sum: f64,
    /// `false` when the sum was zero and `values` are the raw input.
    pub applied: bool,
}

/// Divides every value by the sum of all values.
///
/// A zero sum leaves the input unchanged instead of dividing by zero.
pub fn normalize(xs: &[f64]) -> Normalization {
    let sum: f64 = xs.iter().sum();
    if sum == 0.0 {
        log::warn!("sum of x coordinates is zero, using raw values without normalization");
        return Normalization {
            values: xs.to_vec(),
            sum,
            applied: false,
        };
    }
    Normalization {
        values: xs.iter().map(|x| x / sum).collect(),
        sum,
        applied: true,
    }
}
