//! Stratified train/test splitting.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Row indices of a train/test partition, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows so every class keeps roughly `test_fraction` of its rows in
/// the test set. Classes with a single row stay in training.
#[must_use]
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> TrainTestSplit {
    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (row, &class) in labels.iter().enumerate() {
        by_class[class].push(row);
    }

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for mut rows in by_class {
        if rows.is_empty() {
            continue;
        }
        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64 * test_fraction).round() as usize).min(rows.len() - 1);
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    TrainTestSplit { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_stratified_and_complete() {
        let labels: Vec<usize> = (0..100).map(|i| if i < 60 { 0 } else { 1 }).collect();
        let split = stratified_split(&labels, 0.2, 42);

        assert_eq!(split.train.len() + split.test.len(), 100);
        assert_eq!(split.test.iter().filter(|&&r| labels[r] == 0).count(), 12);
        assert_eq!(split.test.iter().filter(|&&r| labels[r] == 1).count(), 8);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        let labels: Vec<usize> = (0..50).map(|i| i % 4).collect();
        assert_eq!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 42));
        assert_ne!(stratified_split(&labels, 0.2, 42), stratified_split(&labels, 0.2, 7));
    }

    #[test]
    fn test_singleton_class_stays_in_training() {
        let labels = vec![0, 0, 0, 0, 0, 1];
        let split = stratified_split(&labels, 0.2, 42);
        assert!(split.train.contains(&5));
        assert_eq!(split.test.len(), 1);
    }
}
