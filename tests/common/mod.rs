//! Synthetic loan tables for integration tests.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use loanboost::data::{Dataset, DatasetSchema, read_csv};
use loanboost::model::GBDTConfig;

pub const HEADER: &str = "Loan_ID,Gender,Married,Dependents,Education,Self_Employed,\
ApplicantIncome,CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area,Loan_Status";

/// How the label is derived from a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelRule {
    /// `Y` exactly when `Credit_History == 1`.
    CreditHistory,
    /// Mostly credit history, with income and area shifting the odds.
    Noisy,
}

/// `n` loan applications as CSV text.
///
/// With `missing` set, roughly one row in ten has an empty `LoanAmount`,
/// `Gender` or `Self_Employed` cell.
pub fn loans_csv(n: usize, seed: u64, rule: LabelRule, missing: bool) -> String {
    const GENDER: [&str; 2] = ["Male", "Female"];
    const MARRIED: [&str; 2] = ["Yes", "No"];
    const DEPENDENTS: [&str; 4] = ["0", "1", "2", "3+"];
    const EDUCATION: [&str; 2] = ["Graduate", "Not Graduate"];
    const AREA: [&str; 3] = ["Urban", "Rural", "Semiurban"];

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut out = String::from(HEADER);
    out.push('\n');

    for i in 0..n {
        let credit = if rng.gen_range(0.0..1.0) < 0.75 { 1 } else { 0 };
        let income = rng.gen_range(1500..12000);
        let coincome = if rng.gen_range(0.0..1.0) < 0.5 { 0 } else { rng.gen_range(500..4000) };
        let amount = rng.gen_range(40..400);
        let area = AREA[rng.gen_range(0..AREA.len())];

        let approved = match rule {
            LabelRule::CreditHistory => credit == 1,
            LabelRule::Noisy => {
                let mut score = if credit == 1 { 0.8 } else { 0.15 };
                if area == "Semiurban" {
                    score += 0.1;
                }
                if income > 9000 {
                    score += 0.05;
                }
                rng.gen_range(0.0..1.0) < score
            }
        };

        let blank = |rng: &mut Xoshiro256PlusPlus, value: String| {
            if missing && rng.gen_range(0..10) == 0 {
                String::new()
            } else {
                value
            }
        };
        let gender_idx = rng.gen_range(0..2);
        let gender = blank(&mut rng, GENDER[gender_idx].to_string());
        let self_employed_draw = rng.gen_range(0..5);
        let self_employed = blank(&mut rng, if self_employed_draw == 0 { "Yes" } else { "No" }.to_string());
        let amount = blank(&mut rng, amount.to_string());

        let _ = writeln!(
            out,
            "LP{:06},{gender},{},{},{},{self_employed},{income},{coincome},{amount},360,{credit},{area},{}",
            i + 1,
            MARRIED[rng.gen_range(0..2)],
            DEPENDENTS[rng.gen_range(0..4)],
            EDUCATION[rng.gen_range(0..2)],
            if approved { "Y" } else { "N" },
        );
    }
    out
}

pub fn loans(n: usize, seed: u64, rule: LabelRule, missing: bool) -> Dataset {
    read_csv(loans_csv(n, seed, rule, missing).as_bytes(), &DatasetSchema::loans()).unwrap()
}

/// Write CSV text into `dir` and return its path.
pub fn write_csv(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Small booster for fast tests.
pub fn quick_config(n_trees: u32) -> GBDTConfig {
    GBDTConfig::builder().n_trees(n_trees).max_depth(4).build().unwrap()
}
