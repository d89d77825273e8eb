//! Cost and label encoding helpers.
//!
//! The squared cost is a diagnostic only: gradients are derived analytically
//! in the layer code, never from this function.

/// Number of output classes.
pub const NUM_CLASSES: usize = 10;

/// Half the sum of squared differences between `predicted` and `expected`.
///
/// # Panics
///
/// Panics if the two slices have different lengths.
pub fn squared_cost(predicted: &[f64], expected: &[f64]) -> f64 {
    assert_eq!(
        predicted.len(),
        expected.len(),
        "predicted and expected outputs must have the same length"
    );

    let sum: f64 = predicted
        .iter()
        .zip(expected)
        .map(|(p, e)| {
            let error = p - e;
            error * error
        })
        .sum();
    0.5 * sum
}

/// One-hot target vector for `label`.
///
/// # Panics
///
/// Panics if `label >= NUM_CLASSES`. Images validate their label on
/// construction, so this only fires on direct misuse.
pub fn one_hot(label: usize) -> [f64; NUM_CLASSES] {
    assert!(label < NUM_CLASSES, "label {label} out of range");
    let mut encoded = [0.0; NUM_CLASSES];
    encoded[label] = 1.0;
    encoded
}

/// Index of the first strict maximum in `values`.
///
/// Ties resolve to the lowest index. An empty slice, or one where no value
/// compares greater than `f64::MIN` (all NaN), yields 0.
pub fn max_value_index(values: &[f64]) -> usize {
    let mut max_value = f64::MIN;
    let mut index = 0;
    for (i, &value) in values.iter().enumerate() {
        if value > max_value {
            max_value = value;
            index = i;
        }
    }
    index
}
