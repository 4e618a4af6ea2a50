mod config;
mod dataset;
mod output;
mod rubric;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rankloop_core::{
    ActiveLearner, AssignmentScoring, ControllerConfig, CsvLog, MetricsLog, MetricsRow, Mode,
    PairwiseDataset, SelectionPolicy, SgdClassifier,
};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::output::RunSummary;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "rankloop", version, about = "Simulate active learning-to-rank over a scored item pool")]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the active learning loop and write per-iteration metrics to CSV
    Run(RunArgs),
    /// Create a commented default config file
    Init {
        /// Where to write it (default: ./rankloop.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Histograms and composite scores for a rubric-grade CSV
    Rubric(RubricArgs),
    /// Mean and standard deviation of the reference scores in a dataset
    Describe(DescribeArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Path to config file (default: ./rankloop.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// libsvm dataset: "<score> <id>:<value> ..." per line
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// CSV output path (default: results-<mode>-<policy>.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// "pairwise" or "assignment"
    #[arg(long)]
    mode: Option<String>,

    /// "uncertainty" or "random"
    #[arg(long)]
    policy: Option<String>,

    /// Assignment-mode uncertainty: "total-margin", "nearest-margin" or "least-confident-pair"
    #[arg(long)]
    scoring: Option<String>,

    /// Seed pairs (pairwise) or seed items (assignment)
    #[arg(long)]
    num_seeds: Option<usize>,

    /// Cap on labeled pairs (pairwise) or graded items (assignment)
    #[arg(long)]
    max_train_size: Option<usize>,

    /// RNG seed. Drawn at random and logged if not given.
    #[arg(long)]
    seed: Option<u64>,

    /// Take seeds in file order instead of shuffling first
    #[arg(long)]
    no_shuffle: bool,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct RubricArgs {
    /// CSV with a header and rows of id plus six letter grades
    #[arg(long)]
    input: PathBuf,

    /// Write "id,score" composite scores here
    #[arg(long)]
    scores_out: Option<PathBuf>,
}

#[derive(Parser)]
struct DescribeArgs {
    #[arg(long)]
    dataset: PathBuf,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_mode(value: &str) -> Result<Mode> {
    match value {
        "pairwise" => Ok(Mode::Pairwise),
        "assignment" => Ok(Mode::Assignment),
        other => anyhow::bail!("Unknown mode \"{other}\". Use \"pairwise\" or \"assignment\"."),
    }
}

fn parse_policy(value: &str) -> Result<SelectionPolicy> {
    match value {
        "uncertainty" => Ok(SelectionPolicy::Uncertainty),
        "random" => Ok(SelectionPolicy::Random),
        other => anyhow::bail!("Unknown policy \"{other}\". Use \"uncertainty\" or \"random\"."),
    }
}

fn parse_scoring(value: &str) -> Result<AssignmentScoring> {
    match value {
        "total-margin" => Ok(AssignmentScoring::TotalMargin),
        "nearest-margin" => Ok(AssignmentScoring::NearestMargin),
        "least-confident-pair" => Ok(AssignmentScoring::LeastConfidentPair),
        other => anyhow::bail!(
            "Unknown scoring \"{other}\". Use \"total-margin\", \"nearest-margin\" or \"least-confident-pair\"."
        ),
    }
}

/// Writes rows through to the CSV and keeps the last one for the summary.
struct TrackingLog<W: Write> {
    csv: CsvLog<W>,
    last: Option<MetricsRow>,
}

impl<W: Write> MetricsLog for TrackingLog<W> {
    fn append(&mut self, row: &MetricsRow) -> rankloop_core::Result<()> {
        self.last = Some(*row);
        self.csv.append(row)
    }

    fn finish(&mut self) -> rankloop_core::Result<()> {
        self.csv.finish()
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Run(args) => run_active_learning(args),
        Commands::Init { path } => init_config(path),
        Commands::Rubric(args) => run_rubric(args),
        Commands::Describe(args) => run_describe(args),
    };

    if let Err(e) = result {
        bail(format!("{e:#}"));
    }
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    config::create_default_config(&path)?;
    println!("Created config at {}", path.display());
    println!("Edit it to set your dataset, mode, etc.");
    Ok(())
}

fn run_active_learning(args: RunArgs) -> Result<()> {
    // Load config file, merge with CLI args (CLI wins)
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let cfg = config::load_config(&config_path)?;

    let mode = match args.mode.as_deref() {
        Some(value) => parse_mode(value)?,
        None => cfg.mode.unwrap_or_default(),
    };
    let policy = match args.policy.as_deref() {
        Some(value) => parse_policy(value)?,
        None => cfg.policy.unwrap_or_default(),
    };
    let assignment_scoring = match args.scoring.as_deref() {
        Some(value) => parse_scoring(value)?,
        None => cfg.active_learning_assign.scoring.unwrap_or_default(),
    };

    let dataset_path = match args.dataset.clone().or_else(|| cfg.dataset.clone()) {
        Some(path) => path,
        None => anyhow::bail!(
            "No dataset specified. Pass --dataset or set it in {}",
            config_path.display()
        ),
    };
    let output_path = args
        .output
        .clone()
        .or_else(|| cfg.output.clone())
        .unwrap_or_else(|| PathBuf::from(format!("results-{mode}-{policy}.csv")));

    let defaults = ControllerConfig::for_mode(mode);
    let (cfg_seeds, cfg_cap) = cfg.loop_settings(mode);
    let controller_config = ControllerConfig {
        mode,
        policy,
        num_seeds: args.num_seeds.or(cfg_seeds).unwrap_or(defaults.num_seeds),
        max_train_size: args.max_train_size.or(cfg_cap).unwrap_or(defaults.max_train_size),
        shuffle: !args.no_shuffle && cfg.shuffle.unwrap_or(defaults.shuffle),
        assignment_scoring,
    };

    let seed = args.seed.or(cfg.seed).unwrap_or_else(|| rand::rng().random());

    let pool = dataset::load_libsvm(&dataset_path)?;
    info!(
        "loaded {} items with {} features from {}",
        pool.len(),
        pool.total_features(),
        dataset_path.display()
    );
    let data = PairwiseDataset::new(pool);
    info!("seed {seed}");

    let classifier = SgdClassifier::new(cfg.sgd_options());
    let mut learner =
        ActiveLearner::new(&data, controller_config, classifier, StdRng::seed_from_u64(seed))
            .context("Invalid active learning configuration")?;

    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let csv = CsvLog::new(BufWriter::new(file), mode == Mode::Assignment)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    let mut log = TrackingLog { csv, last: None };

    let iterations = learner
        .run(&mut log)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let summary = RunSummary {
        mode,
        policy,
        seed,
        items: data.num_items(),
        pairs: data.pairs().len(),
        iterations,
        output: &output_path,
        last: log.last,
    };
    if args.json {
        output::print_json(&summary)?;
    } else {
        output::print_table(&summary);
    }
    Ok(())
}

fn run_rubric(args: RubricArgs) -> Result<()> {
    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let rows = rubric::parse_rubric_csv(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    rubric::print_histograms(&rows);
    let composites: Vec<f64> = rows.iter().map(|r| r.composite()).collect();
    output::print_score_summary(&dataset::summarize(&composites), false)?;

    if let Some(path) = &args.scores_out {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        rubric::write_scores(&rows, BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("wrote {} composite scores to {}", rows.len(), path.display());
    }
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<()> {
    let pool = dataset::load_libsvm(&args.dataset)?;
    output::print_score_summary(&dataset::summarize(&pool.reference_scores()), args.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["rankloop", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            _ => unreachable!(),
        }
    }

    fn write_dataset(dir: &std::path::Path, n: usize) -> PathBuf {
        let path = dir.join("data.svm");
        let body: String = (0..n)
            .map(|i| format!("{} 1:{} 2:{}\n", (i * 3) % n, i, i % 2))
            .collect();
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_mode("assignment").unwrap(), Mode::Assignment);
        assert_eq!(parse_policy("random").unwrap(), SelectionPolicy::Random);
        assert_eq!(parse_scoring("nearest-margin").unwrap(), AssignmentScoring::NearestMargin);
        assert!(parse_mode("pairs").unwrap_err().to_string().contains("Unknown mode"));
        assert!(parse_policy("greedy").is_err());
        assert!(parse_scoring("max").is_err());
    }

    #[test]
    fn test_cli_flags() {
        let args = run_args(&["--dataset", "d.svm", "--num-seeds", "3", "--no-shuffle", "--seed", "9"]);
        assert_eq!(args.dataset, Some(PathBuf::from("d.svm")));
        assert_eq!(args.num_seeds, Some(3));
        assert_eq!(args.seed, Some(9));
        assert!(args.no_shuffle);
        assert!(!args.json);
    }

    #[test]
    fn test_pairwise_run_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path(), 6);
        let out = dir.path().join("out.csv");
        let cfg = dir.path().join("missing.toml");

        let args = run_args(&[
            "--config", cfg.to_str().unwrap(),
            "--dataset", data.to_str().unwrap(),
            "--output", out.to_str().unwrap(),
            "--num-seeds", "2",
            "--max-train-size", "5",
            "--seed", "1",
        ]);
        run_active_learning(args).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "training-size,gamma,tau-b,NDPM");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2,"));
        assert!(lines[3].starts_with("4,"));
    }

    #[test]
    fn test_no_shuffle_seeds_from_file_order() {
        // One seed pair and a cap of two: the single row comes from a model fit
        // on pair (0, 1) alone, so it cannot depend on the RNG seed.
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path(), 5);
        let cfg = dir.path().join("missing.toml");

        let first_row = |seed: &str| {
            let out = dir.path().join(format!("out-{seed}.csv"));
            run_active_learning(run_args(&[
                "--config", cfg.to_str().unwrap(),
                "--dataset", data.to_str().unwrap(),
                "--output", out.to_str().unwrap(),
                "--num-seeds", "1",
                "--max-train-size", "2",
                "--no-shuffle",
                "--seed", seed,
            ]))
            .unwrap();
            let text = std::fs::read_to_string(&out).unwrap();
            let lines: Vec<String> = text.lines().map(str::to_string).collect();
            assert_eq!(lines.len(), 2);
            lines[1].clone()
        };

        let row = first_row("1");
        assert!(row.starts_with("1,"));
        assert_eq!(row, first_row("2"));
        assert_eq!(row, first_row("3"));
    }

    #[test]
    fn test_assignment_run_uses_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path(), 7);
        let out = dir.path().join("assign.csv");
        let cfg = dir.path().join("rankloop.toml");
        std::fs::write(
            &cfg,
            format!(
                "dataset = {:?}\noutput = {:?}\nmode = \"assignment\"\nseed = 5\n\n[active-learning-assign]\nnum-seeds = 3\nmax-train-size = 5\n",
                data.to_str().unwrap(),
                out.to_str().unwrap(),
            ),
        )
        .unwrap();

        run_active_learning(run_args(&["--config", cfg.to_str().unwrap()])).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "training-size,num-graded,gamma,tau-b,NDPM");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("3,3,"));
        assert!(lines[2].starts_with("6,4,"));
    }

    #[test]
    fn test_config_errors_surface_before_output_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_dataset(dir.path(), 4);
        let out = dir.path().join("never.csv");
        let cfg = dir.path().join("missing.toml");

        let err = run_active_learning(run_args(&[
            "--config", cfg.to_str().unwrap(),
            "--dataset", data.to_str().unwrap(),
            "--output", out.to_str().unwrap(),
            "--num-seeds", "7",
        ]))
        .unwrap_err();
        assert!(format!("{err:#}").contains("exceeds"));
        assert!(!out.exists());

        let err = run_active_learning(run_args(&["--config", cfg.to_str().unwrap()])).unwrap_err();
        assert!(err.to_string().contains("No dataset specified"));
    }
}
