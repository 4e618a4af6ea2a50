/// Per-iteration metrics rows and the sinks that record them.
use std::io::Write;

use crate::error::Result;
use crate::rank_correlation::RankMetrics;

/// One controller iteration's evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsRow {
    /// Labeled pairs the model was fit on.
    pub training_size: usize,
    /// Graded items (assignment mode only).
    pub labeled_items: Option<usize>,
    pub metrics: RankMetrics,
}

/// Append-only destination for metrics rows.
pub trait MetricsLog {
    fn append(&mut self, row: &MetricsRow) -> Result<()>;

    /// Called once after the last row.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl MetricsLog for Vec<MetricsRow> {
    fn append(&mut self, row: &MetricsRow) -> Result<()> {
        self.push(*row);
        Ok(())
    }
}

/// Comma-separated log. Each row is flushed as soon as it is written.
pub struct CsvLog<W: Write> {
    writer: W,
    with_labeled_items: bool,
}

impl<W: Write> CsvLog<W> {
    /// Writes the header immediately. `with_labeled_items` adds the
    /// `num-graded` column used by assignment mode.
    pub fn new(mut writer: W, with_labeled_items: bool) -> Result<Self> {
        if with_labeled_items {
            writeln!(writer, "training-size,num-graded,gamma,tau-b,NDPM")?;
        } else {
            writeln!(writer, "training-size,gamma,tau-b,NDPM")?;
        }
        writer.flush()?;
        Ok(CsvLog { writer, with_labeled_items })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsLog for CsvLog<W> {
    fn append(&mut self, row: &MetricsRow) -> Result<()> {
        let m = &row.metrics;
        if self.with_labeled_items {
            let graded = row.labeled_items.unwrap_or(0);
            writeln!(self.writer, "{},{},{},{},{}", row.training_size, graded, m.gamma, m.tau_b, m.ndpm)?;
        } else {
            writeln!(self.writer, "{},{},{},{}", row.training_size, m.gamma, m.tau_b, m.ndpm)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
