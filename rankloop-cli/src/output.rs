/// Output formatting: run summary as text or JSON.
use rankloop_core::{MetricsRow, Mode, SelectionPolicy};
use serde::Serialize;
use std::path::Path;

use crate::dataset::ScoreSummary;

#[derive(Serialize)]
pub struct RunSummary<'a> {
    pub mode: Mode,
    pub policy: SelectionPolicy,
    pub seed: u64,
    pub items: usize,
    pub pairs: usize,
    pub iterations: usize,
    pub output: &'a Path,
    /// Metrics of the last iteration, if any ran.
    pub last: Option<MetricsRow>,
}

/// Print the run summary as a short terminal report.
pub fn print_table(summary: &RunSummary) {
    println!(
        "{} active learning, {} policy (seed {})",
        summary.mode, summary.policy, summary.seed
    );
    println!("{} items, {} pairs", summary.items, summary.pairs);
    println!();

    match &summary.last {
        Some(row) => {
            let graded_header = if row.labeled_items.is_some() { " | Graded" } else { "" };
            println!("Training pairs{graded_header} |   Gamma |   Tau-b |    NDPM");
            let graded = row
                .labeled_items
                .map(|g| format!(" | {g:>6}"))
                .unwrap_or_default();
            println!(
                "{:>14}{} | {:>7.4} | {:>7.4} | {:>7.4}",
                row.training_size, graded, row.metrics.gamma, row.metrics.tau_b, row.metrics.ndpm,
            );
        }
        None => println!("No iterations ran: the seed set already meets the cap."),
    }

    println!(
        "\n{} iterations, results written to {}",
        summary.iterations,
        summary.output.display(),
    );
}

/// Print the run summary as JSON.
pub fn print_json(summary: &RunSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

pub fn print_score_summary(summary: &ScoreSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{} items", summary.count);
        println!("mean {:.4} ± {:.4}", summary.mean, summary.std_dev);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankloop_core::RankMetrics;

    #[test]
    fn test_json_shape() {
        let output = Path::new("results-assignment-uncertainty.csv");
        let summary = RunSummary {
            mode: Mode::Assignment,
            policy: SelectionPolicy::Uncertainty,
            seed: 3,
            items: 10,
            pairs: 45,
            iterations: 4,
            output,
            last: Some(MetricsRow {
                training_size: 28,
                labeled_items: Some(8),
                metrics: RankMetrics { gamma: 0.5, tau_b: 0.25, ndpm: 0.125 },
            }),
        };
        let value: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["mode"], "assignment");
        assert_eq!(value["policy"], "uncertainty");
        assert_eq!(value["last"]["labeled_items"], 8);
        assert_eq!(value["last"]["metrics"]["tau_b"], 0.25);
        assert_eq!(value["output"], "results-assignment-uncertainty.csv");
    }
}
