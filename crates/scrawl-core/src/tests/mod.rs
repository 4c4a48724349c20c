mod class_labels;
mod detect;
mod estimate;
mod materialize;
mod pipeline;

pub(crate) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
