// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Shuffles samples with a seeded RNG and cuts them into three
// splits. The same seed always produces the same split.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// The three dataset splits
#[derive(Debug, Clone)]
pub struct Splits<T> {
    pub train: Vec<T>,
    pub val:   Vec<T>,
    pub test:  Vec<T>,
}

// No T: Default bound
impl<T> Default for Splits<T> {
    fn default() -> Self {
        Self { train: Vec::new(), val: Vec::new(), test: Vec::new() }
    }
}

/// Shuffle `samples` and split by fraction.
///
/// Validation and test sizes are rounded; whatever remains goes to
/// training. Fractions are clamped so the splits never exceed the
/// sample count.
pub fn split_samples<T>(
    mut samples:   Vec<T>,
    val_fraction:  f64,
    test_fraction: f64,
    seed:          u64,
) -> Splits<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total  = samples.len();
    let n_test = ((total as f64) * test_fraction.clamp(0.0, 1.0)).round() as usize;
    let n_test = n_test.min(total);
    let n_val  = ((total as f64) * val_fraction.clamp(0.0, 1.0)).round() as usize;
    let n_val  = n_val.min(total - n_test);

    // split_off(n) keeps [0..n] and returns [n..]
    let test = samples.split_off(total - n_test);
    let val  = samples.split_off(total - n_test - n_val);

    tracing::debug!(
        "Dataset split: {} train, {} validation, {} test",
        samples.len(),
        val.len(),
        test.len(),
    );

    Splits { train: samples, val, test }
}
