/// Seed pairs carved from the shuffled pair pool in pairwise mode.
pub const DEFAULT_PAIRWISE_SEEDS: usize = 1;

/// Pairwise mode stops once this many pairs are labeled.
pub const DEFAULT_PAIRWISE_MAX_TRAIN_SIZE: usize = 1000;

/// Items graded up front in assignment mode. Every pair among them is labeled,
/// so the seed training set has `C(5, 2) = 10` pairs.
pub const DEFAULT_ASSIGNMENT_SEEDS: usize = 5;

/// Assignment mode stops once this many items are graded. The cap counts
/// items, not pairs: 50 graded items already imply 1225 labeled pairs.
pub const DEFAULT_ASSIGNMENT_MAX_TRAIN_SIZE: usize = 50;

/// Initial SGD step size. Decays as `η₀ / (1 + η₀·λ·t)`.
pub const SGD_LEARNING_RATE: f64 = 0.5;

/// L2 penalty on the weight vector.
pub const SGD_L2_REGULARIZER: f64 = 1e-7;

/// Upper bound on passes over the training view per fit.
pub const SGD_MAX_EPOCHS: usize = 50;

/// Fit stops early once the mean hinge loss moves less than this between epochs.
pub const SGD_CONVERGENCE_THRESHOLD: f64 = 1e-6;

/// Below this the lazily-scaled weight vector is folded back to scale 1.0
/// to keep the raw weights from blowing up.
pub const SGD_MIN_WEIGHT_SCALE: f64 = 1e-9;
