/// Rubric-grade CSV: per-rubric histograms and composite scores.
///
/// Each row is `id,questions,answers,quality,analysis,clarity,application`
/// with one letter grade per rubric. The first line is a header.
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};

pub const RUBRICS: [&str; 6] =
    ["questions", "answers", "quality", "analysis", "clarity", "application"];

/// Grade levels, lowest first.
pub const LEVELS: [(char, &str); 5] = [
    ('N', "Novice"),
    ('B', "Beginner"),
    ('C', "Competent"),
    ('P', "Proficient"),
    ('E', "Expert"),
];

/// N=1 ... E=5.
pub fn grade_score(grade: &str) -> Option<f64> {
    let mut chars = grade.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    LEVELS
        .iter()
        .position(|&(l, _)| l == letter)
        .map(|level| (level + 1) as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedRow {
    pub id: u64,
    /// Level index (0 = N) per rubric, in [`RUBRICS`] order.
    pub levels: [usize; 6],
}

impl GradedRow {
    /// Mean of the six grades on the 1–5 scale.
    pub fn composite(&self) -> f64 {
        self.levels.iter().map(|&l| (l + 1) as f64).sum::<f64>() / RUBRICS.len() as f64
    }
}

fn parse_row(line: &str) -> Result<GradedRow> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 1 + RUBRICS.len() {
        return Err(anyhow!("expected {} fields, got {}", 1 + RUBRICS.len(), fields.len()));
    }
    let id = fields[0]
        .parse()
        .map_err(|_| anyhow!("invalid id \"{}\"", fields[0]))?;

    let mut levels = [0; 6];
    for (slot, (field, rubric)) in levels.iter_mut().zip(fields[1..].iter().zip(RUBRICS)) {
        let score = grade_score(field).ok_or_else(|| {
            anyhow!("invalid {rubric} grade \"{field}\" (expected N, B, C, P or E)")
        })?;
        *slot = score as usize - 1;
    }
    Ok(GradedRow { id, levels })
}

/// Parse the CSV body, skipping the header line and blank lines.
pub fn parse_rubric_csv(reader: impl BufRead) -> Result<Vec<GradedRow>> {
    let mut rows = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        if line_idx == 0 || line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(&line).with_context(|| format!("Line {line_no}"))?);
    }
    Ok(rows)
}

/// `counts[rubric][level]`.
pub fn histograms(rows: &[GradedRow]) -> [[usize; 5]; 6] {
    let mut counts = [[0; 5]; 6];
    for row in rows {
        for (rubric, &level) in row.levels.iter().enumerate() {
            counts[rubric][level] += 1;
        }
    }
    counts
}

pub fn print_histograms(rows: &[GradedRow]) {
    let total = rows.len();
    for (rubric, counts) in RUBRICS.iter().zip(histograms(rows)) {
        println!("Histogram for {rubric} ({total})");
        for ((_, name), count) in LEVELS.iter().zip(counts) {
            let fraction = if total == 0 { 0.0 } else { count as f64 / total as f64 };
            println!("{:<12}{:.4} ({})", format!("{name}:"), fraction, count);
        }
        println!();
    }
}

/// One `id,score` line per row, with a header.
pub fn write_scores(rows: &[GradedRow], mut out: impl Write) -> std::io::Result<()> {
    writeln!(out, "id,score")?;
    for row in rows {
        writeln!(out, "{},{}", row.id, row.composite())?;
    }
    out.flush()
}
