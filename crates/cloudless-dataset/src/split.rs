use crate::PrepareError;
use cloudless_core::TrainingExample;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Training/validation partition of the examples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetSplit {
    pub train: Vec<TrainingExample>,
    pub validation: Vec<TrainingExample>,
}

/// Number of validation examples out of `n`, rounded up.
pub fn validation_len(n: usize, train_fraction: f64) -> usize {
    // Absorb representation error so that e.g. 10 * (1 - 0.8) counts as 2.
    let raw = n as f64 * (1.0 - train_fraction);
    ((raw - 1e-9).ceil().max(0.0) as usize).min(n)
}

/// Shuffle `examples` and split them.
///
/// The examples are shuffled with a ChaCha8 stream seeded by `seed`, then
/// a second permutation drawn from a fresh stream with the same seed picks
/// the validation set: its first [`validation_len`] entries. Identical input
/// order and seed always give an identical split.
pub fn shuffle_split(
    examples: &[TrainingExample],
    seed: u64,
    train_fraction: f64,
) -> Result<DatasetSplit, PrepareError> {
    if !(train_fraction > 0.0 && train_fraction <= 1.0) {
        return Err(PrepareError::InvalidFraction(train_fraction));
    }

    let mut shuffled = examples.to_vec();
    shuffled.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let mut order: Vec<usize> = (0..shuffled.len()).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let n_val = validation_len(shuffled.len(), train_fraction);
    let pick = |idx: &[usize]| -> Vec<TrainingExample> {
        idx.iter().map(|&i| shuffled[i].clone()).collect()
    };
    Ok(DatasetSplit {
        validation: pick(&order[..n_val]),
        train: pick(&order[n_val..]),
    })
}
