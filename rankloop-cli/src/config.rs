/// Config file loading and creation for the rankloop CLI.
///
/// Config defaults to ./rankloop.toml. Every field is optional and CLI flags
/// override file values. Section names follow the experiment's config tables:
/// `[active-learning]` for pairwise mode, `[active-learning-assign]` for
/// assignment mode.
use anyhow::{bail, Context, Result};
use rankloop_core::{AssignmentScoring, Mode, SelectionPolicy, SgdOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "rankloop.toml";

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RankloopConfig {
    pub dataset: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub policy: Option<SelectionPolicy>,
    pub seed: Option<u64>,
    pub shuffle: Option<bool>,
    #[serde(default)]
    pub active_learning: LoopSection,
    #[serde(default)]
    pub active_learning_assign: AssignSection,
    #[serde(default)]
    pub sgd: SgdSection,
}

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoopSection {
    pub num_seeds: Option<usize>,
    pub max_train_size: Option<usize>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AssignSection {
    pub num_seeds: Option<usize>,
    pub max_train_size: Option<usize>,
    pub scoring: Option<AssignmentScoring>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SgdSection {
    pub learning_rate: Option<f64>,
    pub l2_regularizer: Option<f64>,
    pub max_epochs: Option<usize>,
    pub convergence_threshold: Option<f64>,
    pub bias: Option<bool>,
}

impl RankloopConfig {
    /// Seed count and cap from the section matching `mode`.
    pub fn loop_settings(&self, mode: Mode) -> (Option<usize>, Option<usize>) {
        match mode {
            Mode::Pairwise => (self.active_learning.num_seeds, self.active_learning.max_train_size),
            Mode::Assignment => (
                self.active_learning_assign.num_seeds,
                self.active_learning_assign.max_train_size,
            ),
        }
    }

    /// `[sgd]` over the built-in defaults.
    pub fn sgd_options(&self) -> SgdOptions {
        let defaults = SgdOptions::default();
        SgdOptions {
            learning_rate: self.sgd.learning_rate.unwrap_or(defaults.learning_rate),
            l2_regularizer: self.sgd.l2_regularizer.unwrap_or(defaults.l2_regularizer),
            max_epochs: self.sgd.max_epochs.unwrap_or(defaults.max_epochs),
            convergence_threshold: self
                .sgd
                .convergence_threshold
                .unwrap_or(defaults.convergence_threshold),
            bias: self.sgd.bias.unwrap_or(defaults.bias),
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# rankloop configuration
# All values here can be overridden by CLI flags.

# libsvm file: one item per line, \"<score> <id>:<value> ...\"
# dataset = \"data/essays.svm\"

# Where the per-iteration CSV goes (default: results-<mode>-<policy>.csv)
# output = \"results.csv\"

# \"pairwise\" labels one pair per step, \"assignment\" grades one item per step
# mode = \"pairwise\"

# \"uncertainty\" or \"random\"
# policy = \"uncertainty\"

# RNG seed. If unset, one is drawn and logged.
# seed = 42

# Shuffle the pool before taking seeds
# shuffle = true

[active-learning]
# Seed pairs
# num-seeds = 1
# Stop after this many labeled pairs
# max-train-size = 1000

[active-learning-assign]
# Seed items; every pair among them is labeled
# num-seeds = 5
# Stop after this many graded items
# max-train-size = 50
# \"total-margin\", \"nearest-margin\" or \"least-confident-pair\"
# scoring = \"total-margin\"

[sgd]
# learning-rate = 0.5
# l2-regularizer = 1e-7
# max-epochs = 50
# convergence-threshold = 1e-6
# bias = true
";

/// Load config from a file path. Returns default (all None) if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<RankloopConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RankloopConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read config at {}", path.display())),
    }
}

/// Write the commented default config to `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}
