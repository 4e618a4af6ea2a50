/// Selection policies: which unlabeled element to promote next.
///
/// Uncertainty is the absolute model margin. Smaller means closer to the
/// decision boundary, so less confident. Ties go to the first candidate in
/// the view's current order.
use rand::Rng;

use crate::classifier::Scorer;
use crate::pair_index::{id_to_pair, unordered_pair_to_id};
use crate::types::{Instance, Item, Pair, Pool};
use crate::view::DatasetView;

/// How the next element is chosen from the unlabeled view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SelectionPolicy {
    /// Least confident element under the current model.
    #[default]
    Uncertainty,
    /// Random baseline.
    Random,
}

/// How an ungraded item's uncertainty is aggregated over the pairs it would
/// form with the graded items (assignment mode, uncertainty policy only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AssignmentScoring {
    /// Sum of |margin| over all would-be pairs.
    #[default]
    TotalMargin,
    /// Smallest |margin| over all would-be pairs.
    NearestMargin,
    /// Pick the least confident unlabeled pair and grade whichever of its
    /// two items are still ungraded.
    LeastConfidentPair,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SelectionPolicy::Uncertainty => "uncertainty",
            SelectionPolicy::Random => "random",
        })
    }
}

impl std::fmt::Display for AssignmentScoring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AssignmentScoring::TotalMargin => "total-margin",
            AssignmentScoring::NearestMargin => "nearest-margin",
            AssignmentScoring::LeastConfidentPair => "least-confident-pair",
        })
    }
}

/// Index of the smallest score; the first one wins ties.
fn argmin_first(scored: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, score) in scored {
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Original index of the candidate with the smallest |margin|.
pub fn least_confident<T: Instance, M: Scorer>(
    candidates: &DatasetView<'_, T>,
    model: &M,
) -> Option<usize> {
    argmin_first(
        candidates
            .iter()
            .map(|(idx, inst)| (idx, model.predict(inst.features()).abs())),
    )
}

/// Shuffle the candidates and return the first original index.
pub fn random_member<T, R: Rng + ?Sized>(
    candidates: &mut DatasetView<'_, T>,
    rng: &mut R,
) -> Option<usize> {
    candidates.shuffle(rng);
    candidates.first().map(|(idx, _)| idx)
}

/// Ungraded item whose would-be pairs with the graded items are least
/// confident in aggregate. Margins are read from the pair pool.
///
/// Only `TotalMargin` and `NearestMargin` apply here (panics otherwise); see
/// [`least_confident_pair_items`] for `LeastConfidentPair`.
pub fn least_confident_item<M: Scorer>(
    ungraded: &DatasetView<'_, Item>,
    graded: &DatasetView<'_, Item>,
    pairs: &Pool<Pair>,
    model: &M,
    scoring: AssignmentScoring,
) -> Option<usize> {
    assert!(
        scoring != AssignmentScoring::LeastConfidentPair,
        "least_confident_item: LeastConfidentPair selects through least_confident_pair_items"
    );
    let n = ungraded.pool().len();
    let pair_margin = |a: usize, b: usize| {
        model.predict(&pairs.get(unordered_pair_to_id(a, b, n)).features).abs()
    };

    argmin_first(ungraded.iter().map(|(candidate, _)| {
        let margins = graded.indices().iter().map(|&other| pair_margin(candidate, other));
        let score = match scoring {
            AssignmentScoring::TotalMargin => margins.sum::<f64>(),
            AssignmentScoring::NearestMargin => margins.fold(f64::INFINITY, f64::min),
            AssignmentScoring::LeastConfidentPair => unreachable!(),
        };
        (candidate, score)
    }))
}

/// Items to grade from the least confident unlabeled pair: one or two,
/// whichever of the pair's items are not yet graded.
pub fn least_confident_pair_items<M: Scorer>(
    unlabeled_pairs: &DatasetView<'_, Pair>,
    graded: &DatasetView<'_, Item>,
    model: &M,
) -> Vec<usize> {
    let Some(pair_id) = least_confident(unlabeled_pairs, model) else {
        return Vec::new();
    };
    let (i, j) = id_to_pair(pair_id, graded.pool().len());
    debug_assert_eq!(
        (i, j),
        {
            let p = unlabeled_pairs.pool().get(pair_id);
            (p.first, p.second)
        }
    );
    [i, j].into_iter().filter(|&idx| !graded.contains(idx)).collect()
}
