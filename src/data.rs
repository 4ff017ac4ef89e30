use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

use crate::error::{DashboardError, Result};

pub const TERM_COLUMNS: [&str; 3] = ["Term_1", "Term_2", "Term_3"];
pub const TARGET_COLUMN: &str = "Term_3";

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnValues::Categorical(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Column-oriented view of the student CSV, in file order.
#[derive(Debug, Clone)]
pub struct StudentTable {
    columns: Vec<Column>,
    rows: usize,
}

pub fn load_students<P: AsRef<Path>>(path: P) -> Result<StudentTable> {
    let file = std::fs::File::open(path.as_ref())?;
    StudentTable::from_reader(file)
}

impl StudentTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

        for result in rdr.records() {
            let record = result?;
            for (i, field) in record.iter().enumerate() {
                cells[i].push(field.trim().to_string());
            }
        }

        let rows = cells.first().map(Vec::len).unwrap_or(0);
        if rows == 0 {
            return Err(DashboardError::EmptyTable);
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| Column {
                name,
                values: infer_values(raw),
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DashboardError::MissingColumn(name.to_string()))
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match &self.column(name)?.values {
            ColumnValues::Numeric(values) => Ok(values),
            ColumnValues::Categorical(_) => Err(DashboardError::NotNumeric(name.to_string())),
        }
    }

    /// Distinct cell values with their counts, most frequent first. Ties keep
    /// the order in which the values first appear.
    pub fn value_counts(&self, name: &str) -> Result<Vec<(String, usize)>> {
        let labels: Vec<String> = match &self.column(name)?.values {
            ColumnValues::Categorical(values) => values.clone(),
            ColumnValues::Numeric(values) => values.iter().map(|v| v.to_string()).collect(),
        };

        let mut counts: Vec<(String, usize)> = Vec::new();
        for label in labels {
            match counts.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }
        // stable sort keeps first-appearance order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }
}

fn infer_values(raw: Vec<String>) -> ColumnValues {
    let parsed: Option<Vec<f64>> = raw.iter().map(|cell| cell.parse::<f64>().ok()).collect();
    match parsed {
        Some(values) => ColumnValues::Numeric(values),
        None => ColumnValues::Categorical(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
gender,age,Pstatus,Term_1,Term_2,Term_3
F,17,T,10,11,12
M,16,A,8,9,7
F,18,T,15,16,17
";

    #[test]
    fn infers_numeric_and_categorical_columns() {
        let table = StudentTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.column("gender").unwrap().values.is_categorical());
        assert_eq!(table.numeric("age").unwrap(), &[17.0, 16.0, 18.0]);
        assert_eq!(table.numeric("Term_3").unwrap(), &[12.0, 7.0, 17.0]);
    }

    #[test]
    fn numeric_on_text_column_is_an_error() {
        let table = StudentTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(matches!(table.numeric("gender"), Err(DashboardError::NotNumeric(_))));
        assert!(matches!(table.numeric("Term_4"), Err(DashboardError::MissingColumn(_))));
    }

    #[test]
    fn value_counts_orders_by_frequency() {
        let table = StudentTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let counts = table.value_counts("gender").unwrap();
        assert_eq!(counts, vec![("F".to_string(), 2), ("M".to_string(), 1)]);
    }

    #[test]
    fn header_only_file_is_empty_table() {
        let err = StudentTable::from_reader("Term_1,Term_2,Term_3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyTable));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = StudentTable::from_reader("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Csv(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_students("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, DashboardError::Io(_)));
    }
}
