/// Rank agreement between a system scoring and a reference scoring.
///
/// All three measures come from one O(n²) pass over item pairs.
use crate::pair_index::num_pairs;

/// Goodman–Kruskal γ, Kendall τ-b, and NDPM for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankMetrics {
    pub gamma: f64,
    pub tau_b: f64,
    /// 0 = perfect agreement, 1 = fully reversed.
    pub ndpm: f64,
}

/// Pair counts between two aligned score sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankCorrelation {
    concordant: u64,
    discordant: u64,
    /// Tied in the system scores only.
    system_ties: u64,
    /// Tied in the reference scores only.
    reference_ties: u64,
    joint_ties: u64,
}

impl RankCorrelation {
    /// Panics unless both sequences have the same length of at least 2.
    pub fn new(system: &[f64], reference: &[f64]) -> Self {
        assert_eq!(
            system.len(),
            reference.len(),
            "RankCorrelation::new: {} system scores vs {} reference scores",
            system.len(),
            reference.len()
        );
        assert!(
            system.len() >= 2,
            "RankCorrelation::new: need at least 2 scores, got {}",
            system.len()
        );

        let mut counts = RankCorrelation::default();
        let n = system.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let ds = system[i] - system[j];
                let dr = reference[i] - reference[j];
                match (ds == 0.0, dr == 0.0) {
                    (true, true) => counts.joint_ties += 1,
                    (true, false) => counts.system_ties += 1,
                    (false, true) => counts.reference_ties += 1,
                    (false, false) if (ds > 0.0) == (dr > 0.0) => counts.concordant += 1,
                    (false, false) => counts.discordant += 1,
                }
            }
        }
        debug_assert_eq!(counts.total() as usize, num_pairs(n));
        counts
    }

    fn total(&self) -> u64 {
        self.concordant + self.discordant + self.system_ties + self.reference_ties + self.joint_ties
    }

    pub fn gamma(&self) -> f64 {
        let c = self.concordant as f64;
        let d = self.discordant as f64;
        if c + d == 0.0 {
            0.0
        } else {
            (c - d) / (c + d)
        }
    }

    pub fn tau_b(&self) -> f64 {
        let c = self.concordant as f64;
        let d = self.discordant as f64;
        // pairs untied in the system / in the reference
        let untied_system = c + d + self.reference_ties as f64;
        let untied_reference = c + d + self.system_ties as f64;
        let denom = (untied_system * untied_reference).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            (c - d) / denom
        }
    }

    /// Normalized distance-based performance measure against the reference
    /// ordering: contradictions count 2, system ties count 1.
    pub fn ndpm(&self) -> f64 {
        let ordered_by_reference = (self.concordant + self.discordant + self.system_ties) as f64;
        if ordered_by_reference == 0.0 {
            return 0.0;
        }
        (2.0 * self.discordant as f64 + self.system_ties as f64) / (2.0 * ordered_by_reference)
    }

    pub fn metrics(&self) -> RankMetrics {
        RankMetrics { gamma: self.gamma(), tau_b: self.tau_b(), ndpm: self.ndpm() }
    }
}

/// Evaluate `system` scores against `reference` scores (aligned by item index).
pub fn evaluate(system: &[f64], reference: &[f64]) -> RankMetrics {
    RankCorrelation::new(system, reference).metrics()
}
