/// Linear binary classifier trained with hinge-loss SGD.
///
/// The active learning loop only needs two things from a classifier: fit on a
/// labeled view, and predict a real-valued margin for any feature vector.
/// [`Classifier`] and [`Scorer`] are that seam; [`SgdClassifier`] is the
/// implementation the CLI uses.
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{
    SGD_CONVERGENCE_THRESHOLD, SGD_L2_REGULARIZER, SGD_LEARNING_RATE, SGD_MAX_EPOCHS,
    SGD_MIN_WEIGHT_SCALE,
};
use crate::types::{FeatureVector, Labeled};
use crate::view::DatasetView;

/// A fitted model: maps a feature vector to a signed margin.
pub trait Scorer {
    fn predict(&self, features: &FeatureVector) -> f64;
}

/// Fits a fresh [`Scorer`] from a labeled training view.
pub trait Classifier {
    type Model: Scorer;

    fn fit<T: Labeled, R: Rng + ?Sized>(
        &self,
        training: &DatasetView<'_, T>,
        rng: &mut R,
    ) -> Self::Model;
}

/// Dense linear model `w·x + b`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn zeros(dims: usize) -> Self {
        LinearModel { weights: vec![0.0; dims], bias: 0.0 }
    }
}

impl Scorer for LinearModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.weights) + self.bias
    }
}

/// SGD hyperparameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SgdOptions {
    /// Initial step size η₀.
    pub learning_rate: f64,
    /// L2 penalty λ on the weights (not the bias).
    pub l2_regularizer: f64,
    pub max_epochs: usize,
    /// Stop once mean epoch loss changes by less than this.
    pub convergence_threshold: f64,
    /// Learn an unregularized bias term.
    pub bias: bool,
}

impl Default for SgdOptions {
    fn default() -> Self {
        SgdOptions {
            learning_rate: SGD_LEARNING_RATE,
            l2_regularizer: SGD_L2_REGULARIZER,
            max_epochs: SGD_MAX_EPOCHS,
            convergence_threshold: SGD_CONVERGENCE_THRESHOLD,
            bias: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SgdClassifier {
    pub options: SgdOptions,
}

impl SgdClassifier {
    pub fn new(options: SgdOptions) -> Self {
        SgdClassifier { options }
    }
}

/// Weights stored as `scale * raw` so L2 shrinkage is O(1) per step.
struct ScaledWeights {
    raw: Vec<f64>,
    scale: f64,
}

impl ScaledWeights {
    fn dot(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.raw) * self.scale
    }

    fn shrink(&mut self, factor: f64) {
        self.scale *= factor;
        if self.scale < SGD_MIN_WEIGHT_SCALE {
            self.rescale();
        }
    }

    fn add(&mut self, features: &FeatureVector, step: f64) {
        for (id, value) in features.iter() {
            if let Some(w) = self.raw.get_mut(id) {
                *w += step * value / self.scale;
            }
        }
    }

    fn rescale(&mut self) {
        for w in &mut self.raw {
            *w *= self.scale;
        }
        self.scale = 1.0;
    }

    fn into_dense(mut self) -> Vec<f64> {
        self.rescale();
        self.raw
    }
}

impl SgdClassifier {
    /// Fit, also returning how many epochs ran before convergence or the
    /// epoch limit.
    pub fn fit_with_epochs<T: Labeled, R: Rng + ?Sized>(
        &self,
        training: &DatasetView<'_, T>,
        rng: &mut R,
    ) -> (LinearModel, usize) {
        let opts = &self.options;
        let dims = training.pool().total_features();
        if training.is_empty() {
            return (LinearModel::zeros(dims), 0);
        }

        let mut weights = ScaledWeights { raw: vec![0.0; dims], scale: 1.0 };
        let mut bias = 0.0;
        let mut order: Vec<usize> = (0..training.len()).collect();
        let mut t = 0usize;
        let mut prev_loss = f64::INFINITY;

        let mut epochs_run = 0;

        for epoch in 0..opts.max_epochs {
            epochs_run += 1;
            order.shuffle(rng);
            let mut total_loss = 0.0;

            for &pos in &order {
                let (_, inst) = training.get(pos);
                let y = if inst.label() { 1.0 } else { -1.0 };
                let eta = opts.learning_rate / (1.0 + opts.learning_rate * opts.l2_regularizer * t as f64);
                t += 1;

                let margin = y * (weights.dot(inst.features()) + bias);
                if opts.l2_regularizer > 0.0 {
                    weights.shrink(1.0 - eta * opts.l2_regularizer);
                }
                if margin < 1.0 {
                    total_loss += 1.0 - margin;
                    weights.add(inst.features(), eta * y);
                    if opts.bias {
                        bias += eta * y;
                    }
                }
            }

            let mean_loss = total_loss / order.len() as f64;
            trace!("sgd epoch {}: mean hinge loss {:.6}", epoch, mean_loss);
            if (prev_loss - mean_loss).abs() < opts.convergence_threshold {
                break;
            }
            prev_loss = mean_loss;
        }

        (LinearModel { weights: weights.into_dense(), bias }, epochs_run)
    }
}

impl Classifier for SgdClassifier {
    type Model = LinearModel;

    fn fit<T: Labeled, R: Rng + ?Sized>(
        &self,
        training: &DatasetView<'_, T>,
        rng: &mut R,
    ) -> LinearModel {
        self.fit_with_epochs(training, rng).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairwise::build_pairs;
    use crate::types::{Item, Pair, Pool};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Reference scores are a permutation of `0..n` carried by feature 0;
    /// feature 1 is an unrelated parity flag.
    fn scored_items(n: usize) -> Pool<Item> {
        let items = (0..n)
            .map(|i| {
                let score = ((i * 7) % n) as f64;
                Item {
                    features: FeatureVector::from_dense(&[score / n as f64, (i % 2) as f64 * 0.1]),
                    reference_score: score,
                }
            })
            .collect();
        Pool::new(items, 2)
    }

    #[test]
    fn test_empty_training_gives_zero_model() {
        let pairs = build_pairs(&scored_items(4));
        let view = DatasetView::empty(&pairs);
        let model = SgdClassifier::default().fit(&view, &mut StdRng::seed_from_u64(0));
        assert_eq!(model, LinearModel::zeros(2));
        assert_eq!(model.predict(&FeatureVector::from_dense(&[3.0, 1.0])), 0.0);
    }

    #[test]
    fn test_learns_separable_pairwise_preference() {
        let items = scored_items(12);
        let pairs = build_pairs(&items);
        let view = DatasetView::new(&pairs);
        let model = SgdClassifier::default().fit(&view, &mut StdRng::seed_from_u64(3));

        let correct = view
            .iter()
            .filter(|(_, p)| (model.predict(&p.features) > 0.0) == p.label)
            .count();
        assert!(correct as f64 / view.len() as f64 > 0.85, "{} of {}", correct, view.len());

        // higher-scored items get higher margins on their own vectors
        let by_score = |target: f64| {
            items.iter().find(|it| it.reference_score == target).map(|it| model.predict(&it.features))
        };
        assert!(by_score(11.0) > by_score(0.0));
    }

    #[test]
    fn test_fit_is_deterministic_per_seed() {
        let pairs = build_pairs(&scored_items(8));
        let view = DatasetView::new(&pairs);
        let clf = SgdClassifier::default();
        let a = clf.fit(&view, &mut StdRng::seed_from_u64(11));
        let b = clf.fit(&view, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    /// Plain SGD with the L2 shrink applied to every weight at every step.
    /// Also returns how often a lazily kept scale would have been folded back.
    fn eager_sgd(
        view: &DatasetView<'_, Pair>,
        opts: &SgdOptions,
        rng: &mut StdRng,
    ) -> (LinearModel, usize) {
        let mut weights = vec![0.0; view.pool().total_features()];
        let mut bias = 0.0;
        let mut order: Vec<usize> = (0..view.len()).collect();
        let mut t = 0usize;
        let mut prev_loss = f64::INFINITY;
        let mut scale = 1.0;
        let mut folds = 0;

        for _ in 0..opts.max_epochs {
            order.shuffle(rng);
            let mut total_loss = 0.0;
            for &pos in &order {
                let (_, pair) = view.get(pos);
                let y = if pair.label { 1.0 } else { -1.0 };
                let eta = opts.learning_rate
                    / (1.0 + opts.learning_rate * opts.l2_regularizer * t as f64);
                t += 1;

                let margin = y * (pair.features.dot(&weights) + bias);
                let factor = 1.0 - eta * opts.l2_regularizer;
                for w in &mut weights {
                    *w *= factor;
                }
                scale *= factor;
                if scale < SGD_MIN_WEIGHT_SCALE {
                    scale = 1.0;
                    folds += 1;
                }
                if margin < 1.0 {
                    total_loss += 1.0 - margin;
                    for (id, value) in pair.features.iter() {
                        weights[id] += eta * y * value;
                    }
                    bias += eta * y;
                }
            }
            let mean_loss = total_loss / order.len() as f64;
            if (prev_loss - mean_loss).abs() < opts.convergence_threshold {
                break;
            }
            prev_loss = mean_loss;
        }
        (LinearModel { weights, bias }, folds)
    }

    #[test]
    fn test_scaled_weights_fold_back_below_min_scale() {
        let mut w = ScaledWeights { raw: vec![2.0, -4.0], scale: 1.0 };
        w.shrink(1e-5);
        assert_eq!(w.scale, 1e-5);
        w.add(&FeatureVector::from_dense(&[1e-5, 0.0]), 1.0);
        w.shrink(1e-5);
        // 1e-10 < SGD_MIN_WEIGHT_SCALE: folded into raw
        assert_eq!(w.scale, 1.0);
        let dense = w.into_dense();
        assert!((dense[0] - (2e-10 + 1e-10)).abs() < 1e-20, "{:?}", dense);
        assert!((dense[1] + 4e-10).abs() < 1e-20, "{:?}", dense);
    }

    #[test]
    fn test_heavy_l2_matches_eager_shrinkage() {
        // learning_rate * l2 just under 1: the scale drops to ~1e-8 on the
        // first step and crosses the fold-back threshold about ten steps later
        let opts = SgdOptions {
            learning_rate: 1.0,
            l2_regularizer: 1.0 - 1e-8,
            max_epochs: 5,
            ..SgdOptions::default()
        };
        let pairs = build_pairs(&scored_items(6));
        let view = DatasetView::new(&pairs);

        let lazy = SgdClassifier::new(opts.clone()).fit(&view, &mut StdRng::seed_from_u64(21));
        let (eager, folds) = eager_sgd(&view, &opts, &mut StdRng::seed_from_u64(21));

        assert!(folds >= 1, "scale never crossed the fold-back threshold");
        for (a, b) in lazy.weights.iter().zip(&eager.weights) {
            assert!((a - b).abs() <= 1e-9 * (1.0 + b.abs()), "lazy {a} vs eager {b}");
        }
        assert!((lazy.bias - eager.bias).abs() <= 1e-9 * (1.0 + eager.bias.abs()));
    }

    #[test]
    fn test_stops_early_once_hinge_loss_is_zero() {
        // one pair, far apart: epoch 1 updates, epoch 2 has zero loss,
        // epoch 3 sees no change and stops
        let items = Pool::new(
            vec![
                Item { features: FeatureVector::from_dense(&[10.0]), reference_score: 1.0 },
                Item { features: FeatureVector::from_dense(&[0.0]), reference_score: 0.0 },
            ],
            1,
        );
        let pairs = build_pairs(&items);
        let view = DatasetView::new(&pairs);
        let clf = SgdClassifier::default();

        let (model, epochs) = clf.fit_with_epochs(&view, &mut StdRng::seed_from_u64(1));
        assert_eq!(epochs, 3);
        assert!(epochs < clf.options.max_epochs);
        assert!(model.predict(&pairs.get(0).features) >= 1.0);
    }

    #[test]
    fn test_no_bias_when_disabled() {
        let pairs = build_pairs(&scored_items(6));
        let view = DatasetView::new(&pairs);
        let clf = SgdClassifier::new(SgdOptions { bias: false, ..SgdOptions::default() });
        let model = clf.fit(&view, &mut StdRng::seed_from_u64(5));
        assert_eq!(model.bias, 0.0);
    }
}
