/// libsvm dataset loading.
///
/// One item per line: `<score> <id>:<value> ...`. Feature ids are 1-based in
/// the file and 0-based in memory. `#` starts a comment; blank lines are skipped.
use anyhow::{anyhow, bail, Context, Result};
use rankloop_core::{FeatureVector, Item, Pool};
use std::io::BufRead;
use std::path::Path;

/// Parse a libsvm document. Dimensionality is the largest feature id seen.
pub fn parse_libsvm(reader: impl BufRead) -> Result<Pool<Item>> {
    let mut items = Vec::new();
    let mut total_features = 0;

    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let item = parse_line(content).with_context(|| format!("Line {line_no}: \"{content}\""))?;
        if let Some(max_id) = item.features.max_feature_id() {
            total_features = total_features.max(max_id + 1);
        }
        items.push(item);
    }

    Ok(Pool::new(items, total_features))
}

fn parse_line(content: &str) -> Result<Item> {
    let mut tokens = content.split_whitespace();
    let score_token = tokens.next().ok_or_else(|| anyhow!("missing score"))?;
    let reference_score: f64 = score_token
        .parse()
        .map_err(|_| anyhow!("invalid score \"{score_token}\""))?;

    let mut entries = Vec::new();
    for token in tokens {
        let (id, value) = token
            .split_once(':')
            .ok_or_else(|| anyhow!("expected <id>:<value>, got \"{token}\""))?;
        let id: usize = id.parse().map_err(|_| anyhow!("invalid feature id \"{id}\""))?;
        if id == 0 {
            bail!("feature ids start at 1, got 0");
        }
        let value: f64 = value
            .parse()
            .map_err(|_| anyhow!("invalid value \"{value}\" for feature {id}"))?;
        entries.push((id - 1, value));
    }

    Ok(Item { features: FeatureVector::new(entries), reference_score })
}

pub fn load_libsvm(path: &Path) -> Result<Pool<Item>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;
    parse_libsvm(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse dataset {}", path.display()))
}

/// Count, mean and sample standard deviation of a set of scores.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

pub fn summarize(scores: &[f64]) -> ScoreSummary {
    let count = scores.len();
    if count == 0 {
        return ScoreSummary { count, mean: 0.0, std_dev: 0.0 };
    }
    let mean = scores.iter().sum::<f64>() / count as f64;
    let std_dev = if count < 2 {
        0.0
    } else {
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    };
    ScoreSummary { count, mean, std_dev }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_basic() {
        let text = "3 1:0.5 4:2\n# header comment\n\n1.5 2:1 # trailing\n";
        let pool = parse_libsvm(text.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.total_features(), 4);

        let first = pool.get(0);
        assert_eq!(first.reference_score, 3.0);
        assert_eq!(first.features.get(0), 0.5);
        assert_eq!(first.features.get(3), 2.0);
        assert_eq!(pool.get(1).features.get(1), 1.0);
    }

    #[test]
    fn test_item_without_features() {
        let pool = parse_libsvm("2\n1 1:1\n".as_bytes()).unwrap();
        assert!(pool.get(0).features.is_empty());
        assert_eq!(pool.total_features(), 1);
    }

    #[test]
    fn test_errors_name_the_line() {
        let err = parse_libsvm("1 1:1\nabc 2:1\n".as_bytes()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Line 2"), "{msg}");
        assert!(msg.contains("invalid score"), "{msg}");

        let err = parse_libsvm("1 0:1\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("start at 1"));

        let err = parse_libsvm("1 3\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("<id>:<value>"));

        let err = parse_libsvm("1 2:x\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid value"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "4 1:1 2:1").unwrap();
        writeln!(file, "2 3:1").unwrap();
        let pool = load_libsvm(file.path()).unwrap();
        assert_eq!(pool.reference_scores(), vec![4.0, 2.0]);

        let missing = load_libsvm(Path::new("/definitely/not/here.svm")).unwrap_err();
        assert!(missing.to_string().contains("Failed to open dataset"));
    }

    #[test]
    fn test_summarize() {
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.count, 8);
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        assert_eq!(summarize(&[]).count, 0);
        assert_eq!(summarize(&[3.0]).std_dev, 0.0);
    }
}
