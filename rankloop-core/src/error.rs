/// Errors surfaced to callers before or while a run executes.
///
/// Misuse of the indexer or of dataset views (out-of-range indices, duplicate
/// insertions) is a bug in the caller and panics instead.

use thiserror::Error;

use crate::controller::Mode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pool has {items} items; at least 2 are needed to form a pair")]
    PoolTooSmall { items: usize },

    #[error("{mode} mode needs num_seeds >= {minimum}, got {num_seeds}")]
    TooFewSeeds { mode: Mode, num_seeds: usize, minimum: usize },

    #[error("num_seeds = {num_seeds} exceeds the {available} {unit} available in {mode} mode")]
    TooManySeeds { mode: Mode, num_seeds: usize, available: usize, unit: &'static str },

    #[error("max_train_size = {max_train_size} is below num_seeds = {num_seeds}")]
    CapBelowSeeds { max_train_size: usize, num_seeds: usize },

    #[error("failed to write metrics: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
