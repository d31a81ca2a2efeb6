//! Column-major loan table.

use std::fmt;

use super::{DataError, DatasetSchema, Record, SchemaError, Value};

/// In-memory table of loan applications.
///
/// Columns are stored per schema role. Numeric and categorical cells are
/// `Option`s so a missing value can never be confused with a real one.
/// All columns have exactly [`n_rows`](Self::n_rows) entries.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    schema: DatasetSchema,
    numeric: Vec<Vec<Option<f64>>>,
    categorical: Vec<Vec<Option<String>>>,
    labels: Option<Vec<Option<String>>>,
    ids: Option<Vec<Option<String>>>,
    n_rows: usize,
}

impl Dataset {
    /// Build a table from columns laid out in schema order.
    ///
    /// `labels` / `ids` must be provided exactly when the schema names a
    /// label / id column.
    pub fn from_columns(
        schema: DatasetSchema,
        numeric: Vec<Vec<Option<f64>>>,
        categorical: Vec<Vec<Option<String>>>,
        labels: Option<Vec<Option<String>>>,
        ids: Option<Vec<Option<String>>>,
    ) -> Result<Self, SchemaError> {
        schema.validate()?;

        if numeric.len() != schema.numeric.len() {
            return Err(SchemaError::LengthMismatch {
                column: "<numeric columns>".to_string(),
                expected: schema.numeric.len(),
                got: numeric.len(),
            });
        }
        if categorical.len() != schema.categorical.len() {
            return Err(SchemaError::LengthMismatch {
                column: "<categorical columns>".to_string(),
                expected: schema.categorical.len(),
                got: categorical.len(),
            });
        }
        if schema.label.is_some() && labels.is_none() {
            return Err(SchemaError::NoLabel);
        }
        if let (Some(id), None) = (&schema.id, &ids) {
            return Err(SchemaError::MissingColumn { column: id.clone() });
        }

        let n_rows = numeric
            .first()
            .map(Vec::len)
            .or_else(|| categorical.first().map(Vec::len))
            .unwrap_or(0);

        let check = |column: &str, len: usize| {
            if len == n_rows {
                Ok(())
            } else {
                Err(SchemaError::LengthMismatch {
                    column: column.to_string(),
                    expected: n_rows,
                    got: len,
                })
            }
        };
        for (name, col) in schema.numeric.iter().zip(&numeric) {
            check(name, col.len())?;
        }
        for (name, col) in schema.categorical.iter().zip(&categorical) {
            check(name, col.len())?;
        }
        if let (Some(name), Some(col)) = (&schema.label, &labels) {
            check(name, col.len())?;
        }
        if let (Some(name), Some(col)) = (&schema.id, &ids) {
            check(name, col.len())?;
        }

        Ok(Self {
            labels: if schema.label.is_some() { labels } else { None },
            ids: if schema.id.is_some() { ids } else { None },
            schema,
            numeric,
            categorical,
            n_rows,
        })
    }

    /// Build a feature-only table from records.
    ///
    /// Every record must carry every feature field of the schema; label and
    /// identifier are ignored.
    pub fn from_records(schema: &DatasetSchema, records: &[Record]) -> Result<Self, SchemaError> {
        let schema = schema.features_only();

        let numeric = schema
            .numeric
            .iter()
            .map(|name| {
                records
                    .iter()
                    .map(|r| r.numeric_field(name))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let categorical = schema
            .categorical
            .iter()
            .map(|name| {
                records
                    .iter()
                    .map(|r| r.categorical_field(name))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut dataset = Self::from_columns(schema, numeric, categorical, None, None)?;
        dataset.n_rows = records.len();
        Ok(dataset)
    }

    /// The table schema.
    #[inline]
    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Returns true if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Numeric column by name.
    pub fn numeric_column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.schema
            .numeric
            .iter()
            .position(|c| c == name)
            .map(|i| self.numeric[i].as_slice())
    }

    /// Categorical column by name.
    pub fn categorical_column(&self, name: &str) -> Option<&[Option<String>]> {
        self.schema
            .categorical
            .iter()
            .position(|c| c == name)
            .map(|i| self.categorical[i].as_slice())
    }

    /// Mutable numeric column by name.
    pub(crate) fn numeric_column_mut(&mut self, name: &str) -> Option<&mut Vec<Option<f64>>> {
        let i = self.schema.numeric.iter().position(|c| c == name)?;
        Some(&mut self.numeric[i])
    }

    /// Mutable categorical column by name.
    pub(crate) fn categorical_column_mut(&mut self, name: &str) -> Option<&mut Vec<Option<String>>> {
        let i = self.schema.categorical.iter().position(|c| c == name)?;
        Some(&mut self.categorical[i])
    }

    /// Label column, if the table carries one.
    pub fn labels(&self) -> Option<&[Option<String>]> {
        self.labels.as_deref()
    }

    /// Identifier column, if the table carries one.
    pub fn ids(&self) -> Option<&[Option<String>]> {
        self.ids.as_deref()
    }

    /// Copy of the selected rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        fn pick<T: Clone>(col: &[T], rows: &[usize]) -> Vec<T> {
            rows.iter().map(|&r| col[r].clone()).collect()
        }

        Self {
            schema: self.schema.clone(),
            numeric: self.numeric.iter().map(|c| pick(c, rows)).collect(),
            categorical: self.categorical.iter().map(|c| pick(c, rows)).collect(),
            labels: self.labels.as_ref().map(|c| pick(c, rows)),
            ids: self.ids.as_ref().map(|c| pick(c, rows)),
            n_rows: rows.len(),
        }
    }

    /// Feature values of one row as a [`Record`].
    pub fn record(&self, row: usize) -> Record {
        let mut record = Record::new();
        for (name, col) in self.schema.numeric.iter().zip(&self.numeric) {
            let value = col[row].map_or(Value::Missing, Value::Number);
            record.set(name.clone(), value);
        }
        for (name, col) in self.schema.categorical.iter().zip(&self.categorical) {
            let value = col[row].clone().map_or(Value::Missing, Value::Category);
            record.set(name.clone(), value);
        }
        record
    }

    /// Missing cells per column, in table order.
    pub fn missing_counts(&self) -> MissingCounts {
        let count_opt = |col: &[Option<String>]| col.iter().filter(|v| v.is_none()).count();

        let mut counts = Vec::with_capacity(self.schema.required_columns().len());
        if let (Some(name), Some(col)) = (&self.schema.id, &self.ids) {
            counts.push((name.clone(), count_opt(col)));
        }
        for (name, col) in self.schema.numeric.iter().zip(&self.numeric) {
            counts.push((name.clone(), col.iter().filter(|v| v.is_none()).count()));
        }
        for (name, col) in self.schema.categorical.iter().zip(&self.categorical) {
            counts.push((name.clone(), count_opt(col)));
        }
        if let (Some(name), Some(col)) = (&self.schema.label, &self.labels) {
            counts.push((name.clone(), count_opt(col)));
        }
        MissingCounts { counts }
    }

    /// Fail with [`DataError::Empty`] if the table has no rows.
    pub fn ensure_not_empty(&self) -> Result<(), DataError> {
        if self.is_empty() {
            Err(DataError::Empty)
        } else {
            Ok(())
        }
    }
}

/// Per-column missing-cell counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MissingCounts {
    counts: Vec<(String, usize)>,
}

impl MissingCounts {
    /// Count for one column.
    pub fn get(&self, column: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, n)| *n)
    }

    /// Total missing cells across all columns.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    /// Iterate `(column, count)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, n)| (name.as_str(), *n))
    }
}

impl fmt::Display for MissingCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.counts.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, n) in &self.counts {
            writeln!(f, "{name:<width$} {n:>6}")?;
        }
        Ok(())
    }
}
