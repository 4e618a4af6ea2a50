/// Core data types: sparse feature vectors, items, pairs, and backing pools.
///
/// Pools own their instances and are never mutated once built. Everything else
/// in the crate refers to pool entries by their 0-based position.
use std::ops::Sub;

/// Sparse feature vector: `(feature_id, value)` entries sorted by id.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureVector {
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Build from unordered entries. Duplicate ids are summed.
    pub fn new(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|&(id, _)| id);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (id, value) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == id => last.1 += value,
                _ => merged.push((id, value)),
            }
        }
        FeatureVector { entries: merged }
    }

    /// Build from a dense slice, skipping zeros.
    pub fn from_dense(values: &[f64]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(id, &v)| (id, v))
            .collect();
        FeatureVector { entries }
    }

    /// Value of feature `id`, zero if absent.
    pub fn get(&self, id: usize) -> f64 {
        self.entries
            .binary_search_by_key(&id, |&(fid, _)| fid)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of stored (non-implicit) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest feature id present, if any.
    pub fn max_feature_id(&self) -> Option<usize> {
        self.entries.last().map(|&(id, _)| id)
    }

    /// Dot product against a dense weight vector. Ids past the end of
    /// `weights` contribute nothing.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|&(id, v)| weights.get(id).map(|w| w * v))
            .sum()
    }

    /// Elementwise `self - other` via a sorted merge.
    pub fn difference(&self, other: &FeatureVector) -> FeatureVector {
        let (a, b) = (&self.entries, &other.entries);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let (ia, va) = a[i];
            let (ib, vb) = b[j];
            if ia == ib {
                out.push((ia, va - vb));
                i += 1;
                j += 1;
            } else if ia < ib {
                out.push((ia, va));
                i += 1;
            } else {
                out.push((ib, -vb));
                j += 1;
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend(b[j..].iter().map(|&(id, v)| (id, -v)));
        FeatureVector { entries: out }
    }
}

impl Sub for &FeatureVector {
    type Output = FeatureVector;

    fn sub(self, rhs: &FeatureVector) -> FeatureVector {
        self.difference(rhs)
    }
}

/// Anything stored in a [`Pool`]: exposes its feature vector.
pub trait Instance {
    fn features(&self) -> &FeatureVector;
}

/// An instance carrying a binary label, usable for classifier training.
pub trait Labeled: Instance {
    fn label(&self) -> bool;
}

/// One original pool entry. Its index is its position in the pool.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub features: FeatureVector,
    /// Ground truth used for pair labels and for evaluation (e.g. average rubric score).
    pub reference_score: f64,
}

impl Instance for Item {
    fn features(&self) -> &FeatureVector {
        &self.features
    }
}

/// An unordered item pair `(first, second)` with `first < second`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub first: usize,
    pub second: usize,
    /// `item[first].features - item[second].features`.
    pub features: FeatureVector,
    /// True iff `first` has a strictly greater reference score.
    pub label: bool,
}

impl Instance for Pair {
    fn features(&self) -> &FeatureVector {
        &self.features
    }
}

impl Labeled for Pair {
    fn label(&self) -> bool {
        self.label
    }
}

/// Immutable backing storage shared by all views over it.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    instances: Vec<T>,
    total_features: usize,
}

impl<T: Instance> Pool<T> {
    /// Panics if any instance uses a feature id `>= total_features`.
    pub fn new(instances: Vec<T>, total_features: usize) -> Self {
        for (idx, inst) in instances.iter().enumerate() {
            if let Some(max_id) = inst.features().max_feature_id() {
                assert!(
                    max_id < total_features,
                    "Pool::new: instance {} uses feature {} but total_features = {}",
                    idx, max_id, total_features
                );
            }
        }
        Pool { instances, total_features }
    }
}

impl<T> Pool<T> {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, index: usize) -> &T {
        &self.instances[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.instances.iter()
    }

    pub fn total_features(&self) -> usize {
        self.total_features
    }
}

impl Pool<Item> {
    /// Reference scores aligned by item index.
    pub fn reference_scores(&self) -> Vec<f64> {
        self.instances.iter().map(|item| item.reference_score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_merges_duplicates() {
        let fv = FeatureVector::new(vec![(3, 1.0), (1, 2.0), (3, 0.5)]);
        assert_eq!(fv.iter().collect::<Vec<_>>(), vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(fv.get(3), 1.5);
        assert_eq!(fv.get(2), 0.0);
    }

    #[test]
    fn test_difference_merges_disjoint_ids() {
        let a = FeatureVector::new(vec![(0, 1.0), (2, 4.0)]);
        let b = FeatureVector::new(vec![(1, 3.0), (2, 1.0), (5, 2.0)]);
        let d = &a - &b;
        assert_eq!(
            d.iter().collect::<Vec<_>>(),
            vec![(0, 1.0), (1, -3.0), (2, 3.0), (5, -2.0)]
        );
    }

    #[test]
    fn test_dot_ignores_ids_past_weights() {
        let fv = FeatureVector::from_dense(&[1.0, 0.0, 2.0]);
        assert_eq!(fv.nnz(), 2);
        assert_eq!(fv.dot(&[0.5, 9.0]), 0.5);
        assert_eq!(fv.dot(&[0.5, 9.0, 1.0]), 2.5);
    }

    #[test]
    #[should_panic(expected = "uses feature 4")]
    fn test_pool_rejects_out_of_range_features() {
        let item = Item {
            features: FeatureVector::new(vec![(4, 1.0)]),
            reference_score: 1.0,
        };
        let _ = Pool::new(vec![item], 3);
    }
}
