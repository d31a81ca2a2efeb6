//! Seeded, stratified train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::DataError;

/// Row indices of a train/test partition, each sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition rows into disjoint train and test sets, preserving class ratios.
///
/// The test side receives `ceil(test_fraction * n)` rows. They are allocated
/// to classes proportionally to class size: every class gets the floor of its
/// share and the remaining rows go to the classes with the largest remainders.
/// Within a class, rows are picked after a seeded shuffle, so a fixed seed
/// always yields the same partition.
pub fn stratified_split(
    labels: &[f32],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidSplit(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n = labels.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DataError::InvalidSplit(format!(
            "{n} rows cannot be split with test fraction {test_fraction}"
        )));
    }

    // Group rows per class, classes ordered by label value.
    let mut classes: Vec<(f32, Vec<usize>)> = Vec::new();
    for (row, &label) in labels.iter().enumerate() {
        match classes.iter_mut().find(|(l, _)| *l == label) {
            Some((_, rows)) => rows.push(row),
            None => classes.push((label, vec![row])),
        }
    }
    classes.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Proportional allocation with largest remainders.
    let mut alloc: Vec<usize> = Vec::with_capacity(classes.len());
    let mut remainders: Vec<(usize, f64)> = Vec::with_capacity(classes.len());
    for (i, (_, rows)) in classes.iter().enumerate() {
        let exact = n_test as f64 * rows.len() as f64 / n as f64;
        let floor = exact.floor() as usize;
        alloc.push(floor);
        remainders.push((i, exact - floor as f64));
    }
    let mut left = n_test - alloc.iter().sum::<usize>();
    remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    for &(i, _) in remainders.iter().cycle() {
        if left == 0 {
            break;
        }
        if alloc[i] < classes[i].1.len() {
            alloc[i] += 1;
            left -= 1;
        }
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for ((_, rows), &k) in classes.iter_mut().zip(&alloc) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..k]);
        train.extend_from_slice(&rows[k..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pos: usize, neg: usize) -> Vec<f32> {
        let mut v = vec![1.0; pos];
        v.extend(std::iter::repeat_n(0.0, neg));
        v
    }

    #[test]
    fn preserves_class_ratio() {
        let y = labels(70, 30);
        let split = stratified_split(&y, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let test_pos = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_pos, 14);
    }

    #[test]
    fn disjoint_and_complete() {
        let y = labels(13, 8);
        let split = stratified_split(&y, 0.2, 7).unwrap();
        let mut all: Vec<_> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
    }

    #[test]
    fn deterministic_for_seed() {
        let y = labels(40, 25);
        let a = stratified_split(&y, 0.2, 42).unwrap();
        let b = stratified_split(&y, 0.2, 42).unwrap();
        let c = stratified_split(&y, 0.2, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn rejects_degenerate_splits() {
        assert!(stratified_split(&[1.0], 0.2, 0).is_err());
        assert!(stratified_split(&labels(5, 5), 0.0, 0).is_err());
        assert!(stratified_split(&labels(5, 5), 1.0, 0).is_err());
    }
}
