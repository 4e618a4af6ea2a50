/// Active learning controller.
///
/// One loop, parameterized by [`Mode`] and [`SelectionPolicy`]. Each
/// iteration fits a fresh model on the labeled pairs, scores every item with
/// it, logs rank agreement against the reference scores, and promotes one
/// unlabeled element into the training set.
///
/// Seeding happens in [`ActiveLearner::new`]; afterwards the learner is
/// [`Phase::Iterating`] until the cap or the pool is exhausted, then
/// [`Phase::Done`].
use log::{debug, info};
use rand::Rng;

use crate::classifier::{Classifier, Scorer};
use crate::constants::{
    DEFAULT_ASSIGNMENT_MAX_TRAIN_SIZE, DEFAULT_ASSIGNMENT_SEEDS, DEFAULT_PAIRWISE_MAX_TRAIN_SIZE,
    DEFAULT_PAIRWISE_SEEDS,
};
use crate::error::{Error, Result};
use crate::metrics::{MetricsLog, MetricsRow};
use crate::pair_index::unordered_pair_to_id;
use crate::pairwise::PairwiseDataset;
use crate::rank_correlation::evaluate;
use crate::selection::{
    least_confident, least_confident_item, least_confident_pair_items, random_member,
    AssignmentScoring, SelectionPolicy,
};
use crate::types::{Item, Pair};
use crate::view::DatasetView;

/// What the oracle labels in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Mode {
    /// One pairwise preference per step.
    #[default]
    Pairwise,
    /// One whole item (a graded assignment) per step, which labels every pair
    /// it forms with the items graded so far.
    Assignment,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::Pairwise => "pairwise",
            Mode::Assignment => "assignment",
        })
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerConfig {
    pub mode: Mode,
    pub policy: SelectionPolicy,
    /// Seed pairs (pairwise) or seed items (assignment).
    pub num_seeds: usize,
    /// Cap on labeled pairs (pairwise) or graded items (assignment).
    pub max_train_size: usize,
    /// Shuffle the pool before carving out seeds.
    pub shuffle: bool,
    pub assignment_scoring: AssignmentScoring,
}

impl ControllerConfig {
    /// Defaults for `mode`.
    pub fn for_mode(mode: Mode) -> Self {
        let (num_seeds, max_train_size) = match mode {
            Mode::Pairwise => (DEFAULT_PAIRWISE_SEEDS, DEFAULT_PAIRWISE_MAX_TRAIN_SIZE),
            Mode::Assignment => (DEFAULT_ASSIGNMENT_SEEDS, DEFAULT_ASSIGNMENT_MAX_TRAIN_SIZE),
        };
        ControllerConfig {
            mode,
            policy: SelectionPolicy::default(),
            num_seeds,
            max_train_size,
            shuffle: true,
            assignment_scoring: AssignmentScoring::default(),
        }
    }

    pub fn pairwise() -> Self {
        Self::for_mode(Mode::Pairwise)
    }

    pub fn assignment() -> Self {
        Self::for_mode(Mode::Assignment)
    }

    /// Smallest usable seed count: one pair, or two items (one pair).
    fn min_seeds(&self) -> usize {
        match self.mode {
            Mode::Pairwise => 1,
            Mode::Assignment => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Iterating,
    Done,
}

/// Item-level bookkeeping for assignment mode.
struct Grading<'a> {
    /// All items, in the (possibly shuffled) order seeds were drawn from.
    order: DatasetView<'a, Item>,
    graded: DatasetView<'a, Item>,
}

pub struct ActiveLearner<'a, C: Classifier, R: Rng> {
    data: &'a PairwiseDataset,
    config: ControllerConfig,
    classifier: C,
    rng: R,

    /// Every pair, in seed-selection order.
    all_pairs: DatasetView<'a, Pair>,
    /// Labeled pairs. Disjoint from `unlabeled_view()` by construction.
    train: DatasetView<'a, Pair>,
    /// `Some` in assignment mode.
    grading: Option<Grading<'a>>,

    phase: Phase,
    iterations: usize,
}

impl<'a, C: Classifier, R: Rng> ActiveLearner<'a, C, R> {
    /// Validate `config` and seed the training set.
    pub fn new(
        data: &'a PairwiseDataset,
        config: ControllerConfig,
        classifier: C,
        mut rng: R,
    ) -> Result<Self> {
        let num_items = data.num_items();
        if num_items < 2 {
            return Err(Error::PoolTooSmall { items: num_items });
        }
        if config.num_seeds < config.min_seeds() {
            return Err(Error::TooFewSeeds {
                mode: config.mode,
                num_seeds: config.num_seeds,
                minimum: config.min_seeds(),
            });
        }
        let (available, unit) = match config.mode {
            Mode::Pairwise => (data.pairs().len(), "pairs"),
            Mode::Assignment => (num_items, "items"),
        };
        if config.num_seeds > available {
            return Err(Error::TooManySeeds {
                mode: config.mode,
                num_seeds: config.num_seeds,
                available,
                unit,
            });
        }
        if config.max_train_size < config.num_seeds {
            return Err(Error::CapBelowSeeds {
                max_train_size: config.max_train_size,
                num_seeds: config.num_seeds,
            });
        }

        let mut all_pairs = DatasetView::new(data.pairs());
        let mut learner = match config.mode {
            Mode::Pairwise => {
                if config.shuffle {
                    all_pairs.shuffle(&mut rng);
                }
                let train = all_pairs.slice(0, config.num_seeds);
                ActiveLearner {
                    data,
                    config,
                    classifier,
                    rng,
                    all_pairs,
                    train,
                    grading: None,
                    phase: Phase::Iterating,
                    iterations: 0,
                }
            }
            Mode::Assignment => {
                // The pair view stays in pair-id order; seeds come from the item order.
                let mut order = DatasetView::new(data.items());
                if config.shuffle {
                    order.shuffle(&mut rng);
                }
                let grading = Grading { order, graded: DatasetView::empty(data.items()) };
                ActiveLearner {
                    data,
                    config,
                    classifier,
                    rng,
                    train: DatasetView::empty(data.pairs()),
                    all_pairs,
                    grading: Some(grading),
                    phase: Phase::Iterating,
                    iterations: 0,
                }
            }
        };

        let num_seeds = learner.config.num_seeds;
        let seed_items: Vec<usize> = learner
            .grading
            .as_ref()
            .map(|g| g.order.indices()[..num_seeds].to_vec())
            .unwrap_or_default();
        for item in seed_items {
            learner.grade(item);
        }

        if !learner.should_continue() {
            learner.phase = Phase::Done;
        }
        Ok(learner)
    }

    fn should_continue(&self) -> bool {
        let cap = self.config.max_train_size;
        match &self.grading {
            None => self.train.len() < cap && self.train.len() < self.all_pairs.len(),
            Some(g) => g.graded.len() < cap && g.graded.len() < g.order.len(),
        }
    }

    /// Label `item` and every pair it forms with the items graded before it.
    fn grade(&mut self, item: usize) {
        let n = self.data.num_items();
        let grading = self
            .grading
            .as_mut()
            .expect("grade() is only reachable in assignment mode");
        for &other in grading.graded.indices() {
            self.train.add_by_index(unordered_pair_to_id(other, item, n));
        }
        grading.graded.add_by_index(item);
    }

    /// One iteration: fit, score, evaluate, select, promote.
    /// Returns the iteration's metrics, or `None` once done.
    pub fn step(&mut self) -> Option<MetricsRow> {
        if self.phase == Phase::Done || !self.should_continue() {
            self.phase = Phase::Done;
            return None;
        }

        let model = self.classifier.fit(&self.train, &mut self.rng);

        // Items are scored by their own vector even though the model was fit
        // on differences: w·x orders items the same way w·(x_i - x_j) orders pairs.
        let system_scores: Vec<f64> = self
            .data
            .items()
            .iter()
            .map(|item| model.predict(&item.features))
            .collect();
        let metrics = evaluate(&system_scores, self.data.reference_scores());
        let row = MetricsRow {
            training_size: self.train.len(),
            labeled_items: self.grading.as_ref().map(|g| g.graded.len()),
            metrics,
        };
        debug!(
            "iteration {}: {} training pairs, gamma {:.4}, tau-b {:.4}, ndpm {:.4}",
            self.iterations, row.training_size, metrics.gamma, metrics.tau_b, metrics.ndpm
        );

        match self.config.mode {
            Mode::Pairwise => {
                let pair = self.select_pair(&model);
                self.train.add_by_index(pair);
            }
            Mode::Assignment => {
                for item in self.select_items(&model) {
                    self.grade(item);
                }
            }
        }

        self.iterations += 1;
        if !self.should_continue() {
            self.phase = Phase::Done;
        }
        Some(row)
    }

    fn select_pair(&mut self, model: &C::Model) -> usize {
        let mut unlabeled = self.unlabeled_view();
        let picked = match self.config.policy {
            SelectionPolicy::Uncertainty => least_confident(&unlabeled, model),
            SelectionPolicy::Random => random_member(&mut unlabeled, &mut self.rng),
        };
        picked.expect("loop condition guarantees an unlabeled pair")
    }

    fn select_items(&mut self, model: &C::Model) -> Vec<usize> {
        let scoring = self.config.assignment_scoring;
        let policy = self.config.policy;
        let grading = self
            .grading
            .as_ref()
            .expect("select_items() is only reachable in assignment mode");
        let mut ungraded = grading.order.difference(&grading.graded);

        let picked: Vec<usize> = match (policy, scoring) {
            (SelectionPolicy::Random, _) => {
                random_member(&mut ungraded, &mut self.rng).into_iter().collect()
            }
            (SelectionPolicy::Uncertainty, AssignmentScoring::LeastConfidentPair) => {
                least_confident_pair_items(&self.unlabeled_view(), &grading.graded, model)
            }
            (SelectionPolicy::Uncertainty, _) => {
                least_confident_item(&ungraded, &grading.graded, self.data.pairs(), model, scoring)
                    .into_iter()
                    .collect()
            }
        };
        assert!(!picked.is_empty(), "loop condition guarantees an ungraded item");
        picked
    }

    /// Drive [`step`](Self::step) to completion, appending every row to `log`.
    /// Returns the number of iterations run.
    pub fn run<L: MetricsLog>(&mut self, log: &mut L) -> Result<usize> {
        info!(
            "starting {} active learning ({} policy): {} items, {} pairs, {} seed {}",
            self.config.mode,
            self.config.policy,
            self.data.num_items(),
            self.data.pairs().len(),
            self.config.num_seeds,
            match self.config.mode {
                Mode::Pairwise => "pairs",
                Mode::Assignment => "items",
            },
        );

        let mut rows = 0;
        while let Some(row) = self.step() {
            log.append(&row)?;
            rows += 1;
        }
        log.finish()?;

        info!(
            "done after {} iterations: {} training pairs{}",
            rows,
            self.train.len(),
            self.graded_items()
                .map(|g| format!(", {} graded items", g.len()))
                .unwrap_or_default(),
        );
        Ok(rows)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn training_view(&self) -> &DatasetView<'a, Pair> {
        &self.train
    }

    /// Pairs not yet labeled: the complement of the training view.
    pub fn unlabeled_view(&self) -> DatasetView<'a, Pair> {
        self.all_pairs.difference(&self.train)
    }

    /// Graded items (assignment mode only).
    pub fn graded_items(&self) -> Option<&DatasetView<'a, Item>> {
        self.grading.as_ref().map(|g| &g.graded)
    }

    /// Items not yet graded (assignment mode only).
    pub fn ungraded_items(&self) -> Option<DatasetView<'a, Item>> {
        self.grading.as_ref().map(|g| g.order.difference(&g.graded))
    }
}
