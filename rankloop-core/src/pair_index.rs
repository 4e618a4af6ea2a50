/// Triangular pair indexing.
///
/// Maps an unordered pair `(i, j)`, `i < j < n`, to its rank in lexicographic
/// order and back, with plain arithmetic instead of an O(n²) lookup table.
/// Row `i` holds the pairs `(i, i+1) .. (i, n-1)`.

/// Number of unordered pairs over `n` items.
pub fn num_pairs(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Id of the first pair in row `i`, i.e. `pair_to_id(i, i + 1, n)`.
fn row_start(i: usize, n: usize) -> usize {
    // i * (2n - i - 1) is always even
    i * (2 * n - i - 1) / 2
}

/// Linear id of the pair `(i, j)`. Panics unless `i < j < n`.
pub fn pair_to_id(i: usize, j: usize, n: usize) -> usize {
    assert!(
        i < j && j < n,
        "pair_to_id: invalid pair ({}, {}) for n = {}",
        i, j, n
    );
    row_start(i, n) + (j - i - 1)
}

/// Linear id of `{a, b}` in either argument order. Panics if `a == b`.
pub fn unordered_pair_to_id(a: usize, b: usize, n: usize) -> usize {
    if a < b {
        pair_to_id(a, b, n)
    } else {
        pair_to_id(b, a, n)
    }
}

/// Inverse of [`pair_to_id`]. Panics unless `id < num_pairs(n)`.
pub fn id_to_pair(id: usize, n: usize) -> (usize, usize) {
    let total = num_pairs(n);
    assert!(
        id < total,
        "id_to_pair: id {} out of range for n = {} ({} pairs)",
        id, n, total
    );

    // Largest row i with row_start(i) <= id, from
    // i^2 - (2n - 1) i + 2 id = 0.
    let b = (2 * n - 1) as f64;
    let disc = b * b - 8.0 * id as f64;
    let estimate = ((b - disc.max(0.0).sqrt()) / 2.0).floor();
    let mut i = (estimate.max(0.0) as usize).min(n - 2);

    // Float error can land one row off in either direction for large n.
    while i > 0 && row_start(i, n) > id {
        i -= 1;
    }
    while i + 1 < n - 1 && row_start(i + 1, n) <= id {
        i += 1;
    }

    let j = id - row_start(i, n) + i + 1;
    (i, j)
}
