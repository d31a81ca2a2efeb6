//! Train the loan approval pipeline end to end.
//!
//! Examples:
//! - Defaults (reads `loans.csv`, writes `loan_model.bin` and `loan_explainer.bin`):
//!   `cargo run --release --bin train_loans`
//!
//! - With a config file and overrides:
//!   `cargo run --release --bin train_loans -- --config run.toml --data loans.csv --trees 200`
//!
//! Set `RUST_LOG=debug` to see per-round training logs.

use std::path::PathBuf;
use std::process::ExitCode;

use loanboost::logging;
use loanboost::pipeline::{PipelineConfig, run_training};
use loanboost::utils::error_report;

#[derive(Debug, thiserror::Error)]
enum ArgError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("invalid value `{value}` for {flag}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("unknown argument `{0}` (try --help)")]
    Unknown(String),
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    model: Option<PathBuf>,
    explainer: Option<PathBuf>,
    trees: Option<u32>,
    depth: Option<u32>,
    learning_rate: Option<f32>,
    test_fraction: Option<f64>,
    seed: Option<u64>,
    threads: Option<usize>,
    top_k: Option<usize>,
    help: bool,
}

fn value(it: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, ArgError> {
    it.next().ok_or(ArgError::MissingValue(flag))
}

fn parsed<T: std::str::FromStr>(it: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<T, ArgError> {
    let raw = value(it, flag)?;
    raw.parse().map_err(|_| ArgError::InvalidValue { flag, value: raw })
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, ArgError> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(value(&mut it, "--config")?)),
            "--data" => args.data = Some(PathBuf::from(value(&mut it, "--data")?)),
            "--model" => args.model = Some(PathBuf::from(value(&mut it, "--model")?)),
            "--explainer" => args.explainer = Some(PathBuf::from(value(&mut it, "--explainer")?)),
            "--trees" => args.trees = Some(parsed(&mut it, "--trees")?),
            "--depth" => args.depth = Some(parsed(&mut it, "--depth")?),
            "--learning-rate" => args.learning_rate = Some(parsed(&mut it, "--learning-rate")?),
            "--test-fraction" => args.test_fraction = Some(parsed(&mut it, "--test-fraction")?),
            "--seed" => args.seed = Some(parsed(&mut it, "--seed")?),
            "--threads" => args.threads = Some(parsed(&mut it, "--threads")?),
            "--top" => args.top_k = Some(parsed(&mut it, "--top")?),
            "--help" | "-h" => args.help = true,
            _ => return Err(ArgError::Unknown(arg)),
        }
    }
    Ok(args)
}

fn print_help() {
    eprintln!(
        "train_loans\n\n  Input / output:\n    --config <path>         TOML run configuration\n    --data <path>           loan CSV (default: loans.csv)\n    --model <path>          pipeline artifact (default: loan_model.bin)\n    --explainer <path>      explainer artifact (default: loan_explainer.bin)\n\n  Training:\n    --trees <n>\n    --depth <d>\n    --learning-rate <eta>\n    --threads <n>           0 = auto, 1 = sequential\n\n  Evaluation:\n    --test-fraction <f>     (default: 0.2)\n    --seed <u64>            split seed (default: 42)\n    --top <k>               features listed in the importance summary\n"
    );
}

/// Flags override the config file, which overrides defaults.
fn build_config(args: Args) -> loanboost::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(v) = args.data {
        config.data_path = v;
    }
    if let Some(v) = args.model {
        config.model_path = v;
    }
    if let Some(v) = args.explainer {
        config.explainer_path = v;
    }
    if let Some(v) = args.trees {
        config.booster.n_trees = v;
    }
    if let Some(v) = args.depth {
        config.booster.max_depth = v;
    }
    if let Some(v) = args.learning_rate {
        config.booster.learning_rate = v;
    }
    if let Some(v) = args.test_fraction {
        config.test_fraction = v;
    }
    if let Some(v) = args.seed {
        config.seed = v;
    }
    if let Some(v) = args.threads {
        config.booster.n_threads = v;
    }
    if let Some(v) = args.top_k {
        config.top_k = v;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("warning: {e}");
    }

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", error_report(&e));
            return ExitCode::from(2);
        }
    };
    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let result = build_config(args).and_then(|config| run_training(&config));
    match result {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", error_report(&e));
            ExitCode::FAILURE
        }
    }
}
