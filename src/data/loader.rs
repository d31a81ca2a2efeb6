//! CSV loading.
//!
//! The header is validated against the schema before any row is read: every
//! column the schema requires must be present, extra columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{DataError, Dataset, DatasetSchema, SchemaError};

/// Tokens treated as a missing cell (compared case-insensitively).
const MISSING_TOKENS: [&str; 4] = ["", "na", "nan", "null"];

/// Returns true if a raw cell denotes a missing value.
pub fn is_missing_token(raw: &str) -> bool {
    let raw = raw.trim();
    MISSING_TOKENS.iter().any(|t| raw.eq_ignore_ascii_case(t))
}

/// Load a CSV file from disk.
pub fn load_csv(path: impl AsRef<Path>, schema: &DatasetSchema) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_csv(file, schema)?;
    tracing::info!(
        path = %path.display(),
        rows = dataset.n_rows(),
        "loaded dataset"
    );
    Ok(dataset)
}

/// Read a CSV table with a header row.
pub fn read_csv<R: Read>(reader: R, schema: &DatasetSchema) -> Result<Dataset, DataError> {
    schema.validate()?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let position = |column: &str| -> Result<usize, SchemaError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: column.to_string(),
            })
    };

    let numeric_idx = schema
        .numeric
        .iter()
        .map(|c| position(c.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let categorical_idx = schema
        .categorical
        .iter()
        .map(|c| position(c.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let label_idx = schema.label.as_deref().map(position).transpose()?;
    let id_idx = schema.id.as_deref().map(position).transpose()?;

    let mut numeric: Vec<Vec<Option<f64>>> = vec![Vec::new(); numeric_idx.len()];
    let mut categorical: Vec<Vec<Option<String>>> = vec![Vec::new(); categorical_idx.len()];
    let mut labels = label_idx.map(|_| Vec::new());
    let mut ids = id_idx.map(|_| Vec::new());

    let mut record = StringRecord::new();
    let mut row = 0usize;
    while rdr.read_record(&mut record)? {
        for ((col, &idx), name) in numeric.iter_mut().zip(&numeric_idx).zip(&schema.numeric) {
            col.push(parse_number(cell(&record, idx), name, row)?);
        }
        for (col, &idx) in categorical.iter_mut().zip(&categorical_idx) {
            col.push(parse_category(cell(&record, idx)));
        }
        if let (Some(col), Some(idx)) = (labels.as_mut(), label_idx) {
            col.push(parse_category(cell(&record, idx)));
        }
        if let (Some(col), Some(idx)) = (ids.as_mut(), id_idx) {
            col.push(parse_category(cell(&record, idx)));
        }
        row += 1;
    }

    if row == 0 {
        return Err(DataError::Empty);
    }

    let dataset = Dataset::from_columns(schema.clone(), numeric, categorical, labels, ids)?;
    Ok(dataset)
}

#[inline]
fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn parse_number(raw: &str, column: &str, row: usize) -> Result<Option<f64>, SchemaError> {
    if is_missing_token(raw) {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| SchemaError::InvalidNumber {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        })
}

fn parse_category(raw: &str) -> Option<String> {
    if is_missing_token(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Loan_ID,Gender,Married,Dependents,Education,Self_Employed,ApplicantIncome,CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area,Loan_Status
LP001002,Male,No,0,Graduate,No,5849,0,,360,1,Urban,Y
LP001003,Male,Yes,1,Graduate,No,4583,1508,128,360,1,Rural,N
LP001005,NA,Yes,0,Graduate,Yes,3000,0,66,360,null,Urban,Y
";

    #[test]
    fn reads_loan_table() {
        let ds = read_csv(SAMPLE.as_bytes(), &DatasetSchema::loans()).unwrap();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(
            ds.numeric_column("LoanAmount").unwrap(),
            &[None, Some(128.0), Some(66.0)]
        );
        assert_eq!(ds.categorical_column("Gender").unwrap()[2], None);
        assert_eq!(ds.numeric_column("Credit_History").unwrap()[2], None);
        assert_eq!(ds.ids().unwrap()[0].as_deref(), Some("LP001002"));
        assert_eq!(ds.labels().unwrap()[1].as_deref(), Some("N"));
    }

    #[test]
    fn missing_required_column() {
        let csv = "Loan_ID,Gender\nLP1,Male\n";
        let err = read_csv(csv.as_bytes(), &DatasetSchema::loans()).unwrap_err();
        assert!(matches!(
            err,
            DataError::Schema(SchemaError::MissingColumn { .. })
        ));
    }

    #[test]
    fn unparsable_number_reports_row() {
        let schema = DatasetSchema::new(vec!["x".into()], vec!["c".into()]);
        let csv = "x,c\n1,a\noops,b\n";
        let err = read_csv(csv.as_bytes(), &schema).unwrap_err();
        match err {
            DataError::Schema(SchemaError::InvalidNumber { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_is_empty() {
        let schema = DatasetSchema::new(vec!["x".into()], vec![]);
        let err = read_csv("x\n".as_bytes(), &schema).unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn missing_tokens() {
        for token in ["", " ", "NA", "na", "NaN", "NULL", "null"] {
            assert!(is_missing_token(token), "{token:?}");
        }
        assert!(!is_missing_token("0"));
        assert!(!is_missing_token("None"));
    }
}
