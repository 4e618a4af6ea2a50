/// Dataset views: reorderable windows over a [`Pool`].
///
/// A view stores original pool indices (never copies of instances) in an
/// ordered `Vec` for iteration and slicing, mirrored by a `HashSet` for O(1)
/// membership. Views never mutate the pool they borrow.
use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::Pool;

pub struct DatasetView<'a, T> {
    pool: &'a Pool<T>,
    indices: Vec<usize>,
    members: HashSet<usize>,
}

impl<'a, T> DatasetView<'a, T> {
    /// Whole-pool view in natural order.
    pub fn new(pool: &'a Pool<T>) -> Self {
        let indices: Vec<usize> = (0..pool.len()).collect();
        let members = indices.iter().copied().collect();
        DatasetView { pool, indices, members }
    }

    /// View with no members.
    pub fn empty(pool: &'a Pool<T>) -> Self {
        DatasetView { pool, indices: Vec::new(), members: HashSet::new() }
    }

    fn from_indices(pool: &'a Pool<T>, indices: Vec<usize>) -> Self {
        let members = indices.iter().copied().collect();
        DatasetView { pool, indices, members }
    }

    /// Sub-view over positions `from..to` of this view's current order.
    pub fn slice(&self, from: usize, to: usize) -> Self {
        assert!(
            from <= to && to <= self.indices.len(),
            "DatasetView::slice: range {}..{} out of bounds for view of size {}",
            from, to, self.indices.len()
        );
        DatasetView::from_indices(self.pool, self.indices[from..to].to_vec())
    }

    /// Permute the order in place. Membership is unchanged.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.indices.shuffle(rng);
    }

    /// Members of `self` absent from `other`. Both must view the same pool.
    ///
    /// The result currently keeps `self`'s order; callers that care about
    /// order should shuffle or sort it themselves.
    pub fn difference(&self, other: &DatasetView<'_, T>) -> DatasetView<'a, T> {
        assert!(
            std::ptr::eq(self.pool, other.pool),
            "DatasetView::difference: views are over different pools"
        );
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|idx| !other.members.contains(idx))
            .collect();
        DatasetView::from_indices(self.pool, indices)
    }

    /// Append an original pool index. Panics if out of range or already present.
    pub fn add_by_index(&mut self, index: usize) {
        assert!(
            index < self.pool.len(),
            "DatasetView::add_by_index: index {} out of range (pool size {})",
            index, self.pool.len()
        );
        let inserted = self.members.insert(index);
        assert!(inserted, "DatasetView::add_by_index: index {} is already in the view", index);
        self.indices.push(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Original indices in current order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// `(original_index, instance)` at `position` in current order.
    pub fn get(&self, position: usize) -> (usize, &'a T) {
        let idx = self.indices[position];
        (idx, self.pool.get(idx))
    }

    pub fn first(&self) -> Option<(usize, &'a T)> {
        self.indices.first().map(|&idx| (idx, self.pool.get(idx)))
    }

    /// Iterate `(original_index, instance)` in current order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a T)> + '_ {
        let pool = self.pool;
        self.indices.iter().map(move |&idx| (idx, pool.get(idx)))
    }

    pub fn pool(&self) -> &'a Pool<T> {
        self.pool
    }
}

impl<T> Clone for DatasetView<'_, T> {
    fn clone(&self) -> Self {
        DatasetView {
            pool: self.pool,
            indices: self.indices.clone(),
            members: self.members.clone(),
        }
    }
}

impl<T> std::fmt::Debug for DatasetView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetView")
            .field("pool_size", &self.pool.len())
            .field("indices", &self.indices)
            .finish()
    }
}
