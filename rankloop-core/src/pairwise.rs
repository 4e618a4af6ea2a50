/// Pointwise → pairwise reduction.
///
/// Every unordered item pair becomes one binary instance whose features are
/// the item difference and whose label says whether the first item scored
/// strictly higher. Pairs are emitted in pair-id order, so a pair's position
/// in the pool is its `pair_to_id`.
use crate::pair_index::num_pairs;
use crate::types::{Item, Pair, Pool};

/// Materialize all `n(n-1)/2` pairs of `items`. O(n²) time and space.
pub fn build_pairs(items: &Pool<Item>) -> Pool<Pair> {
    let n = items.len();
    let mut pairs = Vec::with_capacity(num_pairs(n));

    for i in 0..n {
        let a = items.get(i);
        for j in (i + 1)..n {
            let b = items.get(j);
            pairs.push(Pair {
                first: i,
                second: j,
                features: &a.features - &b.features,
                // Ties are `false`: "greater" is strict.
                label: a.reference_score > b.reference_score,
            });
        }
    }

    Pool::new(pairs, items.total_features())
}

/// The item pool together with its derived pair pool.
///
/// Views for a run borrow from one `PairwiseDataset`, which keeps the
/// training and unlabeled views provably over the same storage.
#[derive(Debug, Clone)]
pub struct PairwiseDataset {
    items: Pool<Item>,
    pairs: Pool<Pair>,
    reference_scores: Vec<f64>,
}

impl PairwiseDataset {
    pub fn new(items: Pool<Item>) -> Self {
        let pairs = build_pairs(&items);
        let reference_scores = items.reference_scores();
        PairwiseDataset { items, pairs, reference_scores }
    }

    pub fn items(&self) -> &Pool<Item> {
        &self.items
    }

    pub fn pairs(&self) -> &Pool<Pair> {
        &self.pairs
    }

    /// Reference scores aligned by item index.
    pub fn reference_scores(&self) -> &[f64] {
        &self.reference_scores
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }
}
