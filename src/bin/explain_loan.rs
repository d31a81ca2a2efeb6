//! Explain the decision for a single loan application.
//!
//! Examples:
//! - Fields on the command line:
//!   `cargo run --bin explain_loan -- --model loan_model.bin Gender=Male Married=Yes Dependents=0 \
//!    Education=Graduate Self_Employed=No ApplicantIncome=5849 CoapplicantIncome=0 \
//!    LoanAmount=128 Loan_Amount_Term=360 Credit_History=1 Property_Area=Urban`
//!
//! - Every row of a CSV with the training header (label and id columns are ignored):
//!   `cargo run --bin explain_loan -- --csv application.csv --json`

use std::path::PathBuf;
use std::process::ExitCode;

use loanboost::data::{Record, load_csv};
use loanboost::explainability::{Explanation, LoanDecision, TreeExplainer};
use loanboost::io::load_explainer;
use loanboost::utils::error_report;
use loanboost::{FittedPipeline, Parallelism, logging};

#[derive(Debug, thiserror::Error)]
enum ArgError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("invalid value `{value}` for {flag}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("unknown argument `{0}` (try --help)")]
    Unknown(String),
    #[error("give either --csv or Field=value pairs")]
    NoInput,
}

#[derive(Debug)]
struct Args {
    model: PathBuf,
    explainer: Option<PathBuf>,
    csv: Option<PathBuf>,
    pairs: Vec<String>,
    top_k: usize,
    json: bool,
    help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            model: PathBuf::from("loan_model.bin"),
            explainer: None,
            csv: None,
            pairs: Vec::new(),
            top_k: 5,
            json: false,
            help: false,
        }
    }
}

fn value(it: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, ArgError> {
    it.next().ok_or(ArgError::MissingValue(flag))
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, ArgError> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--model" => args.model = PathBuf::from(value(&mut it, "--model")?),
            "--explainer" => args.explainer = Some(PathBuf::from(value(&mut it, "--explainer")?)),
            "--csv" => args.csv = Some(PathBuf::from(value(&mut it, "--csv")?)),
            "--top" => {
                let raw = value(&mut it, "--top")?;
                args.top_k = raw
                    .parse()
                    .map_err(|_| ArgError::InvalidValue { flag: "--top", value: raw })?;
            }
            "--json" => args.json = true,
            "--help" | "-h" => args.help = true,
            _ if arg.contains('=') && !arg.starts_with("--") => args.pairs.push(arg),
            _ => return Err(ArgError::Unknown(arg)),
        }
    }
    if !args.help && args.csv.is_none() == args.pairs.is_empty() {
        return Err(ArgError::NoInput);
    }
    Ok(args)
}

fn print_help() {
    eprintln!(
        "explain_loan\n\n  --model <path>       pipeline artifact (default: loan_model.bin)\n  --explainer <path>   explainer artifact (default: derived from the model)\n  --csv <path>         explain every row of a CSV\n  --top <k>            decision factors to list (default: 5)\n  --json               also print the explanation as JSON\n  Field=value ...      one application given inline\n"
    );
}

fn run(args: Args) -> loanboost::Result<()> {
    let pipeline = FittedPipeline::load(&args.model)?;
    let explainer: TreeExplainer = match &args.explainer {
        Some(path) => load_explainer(path)?,
        None => pipeline.explainer()?,
    };

    let schema = pipeline.preprocessor().schema();
    let explanations: Vec<Explanation> = match &args.csv {
        Some(path) => {
            let data = load_csv(path, schema)?;
            data.ensure_not_empty()?;
            let encoded = pipeline.transform(&data)?;
            explainer.explain_batch(encoded.matrix.view(), Parallelism::from_threads(0))?
        }
        None => {
            let record = Record::parse_pairs(schema, args.pairs.iter().map(String::as_str))?;
            vec![explainer.explain_record(pipeline.preprocessor(), &record)?]
        }
    };

    for (i, explanation) in explanations.iter().enumerate() {
        if explanations.len() > 1 {
            println!("=== Application {} ===", i + 1);
        }
        let decision = LoanDecision::from_explanation(explanation, args.top_k);
        println!("{decision}");
        println!("Explanation (log-odds):");
        println!("{explanation}");
        if args.json {
            match explanation.to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "could not render explanation as JSON"),
            }
        }
        println!();
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = logging::init_with_default("warn") {
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

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_report(&e));
            ExitCode::FAILURE
        }
    }
}
