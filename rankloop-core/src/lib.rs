/// rankloop-core: active learning for pairwise learning-to-rank.
///
/// Items with features and a reference score → every unordered pair as a
/// difference vector → a loop that labels one pair (or one item) at a time,
/// refits a linear model, and measures how well the model orders the whole pool.
/// No IO beyond the `Write` you hand to a metrics log.
///
/// Pairs are never looked up through an n×n table: [`pair_index`] maps an
/// unordered pair to its position in the pair pool and back in O(1).
///
/// # Quick start
///
/// ```rust
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use rankloop_core::{
///     ActiveLearner, ControllerConfig, FeatureVector, Item, MetricsRow, PairwiseDataset, Pool,
///     SgdClassifier,
/// };
///
/// let items: Vec<Item> = (0..6)
///     .map(|i| Item {
///         features: FeatureVector::from_dense(&[i as f64, 1.0]),
///         reference_score: i as f64,
///     })
///     .collect();
/// let data = PairwiseDataset::new(Pool::new(items, 2));
///
/// let config = ControllerConfig { num_seeds: 2, max_train_size: 8, ..ControllerConfig::pairwise() };
/// let mut learner =
///     ActiveLearner::new(&data, config, SgdClassifier::default(), StdRng::seed_from_u64(7)).unwrap();
///
/// let mut rows: Vec<MetricsRow> = Vec::new();
/// let iterations = learner.run(&mut rows).unwrap();
/// assert_eq!(iterations, 6);
/// assert_eq!(learner.training_view().len(), 8);
///
/// for row in &rows {
///     println!("{} pairs: tau-b {:.3}", row.training_size, row.metrics.tau_b);
/// }
/// ```

pub mod classifier;
pub mod constants;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod pair_index;
pub mod pairwise;
pub mod rank_correlation;
pub mod selection;
pub mod types;
pub mod view;

// Re-export primary public API at crate root.
pub use classifier::{Classifier, LinearModel, Scorer, SgdClassifier, SgdOptions};
pub use controller::{ActiveLearner, ControllerConfig, Mode, Phase};
pub use error::{Error, Result};
pub use metrics::{CsvLog, MetricsLog, MetricsRow};
pub use pair_index::{id_to_pair, num_pairs, pair_to_id, unordered_pair_to_id};
pub use pairwise::{build_pairs, PairwiseDataset};
pub use rank_correlation::{evaluate, RankCorrelation, RankMetrics};
pub use selection::{AssignmentScoring, SelectionPolicy};
pub use types::{FeatureVector, Instance, Item, Labeled, Pair, Pool};
pub use view::DatasetView;
