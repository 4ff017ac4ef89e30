use ndarray::{Array1, Array2};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::{ColumnValues, StudentTable};
use crate::error::{DashboardError, Result};

/// Maps the distinct strings of a column to `0..n` in sorted order.
#[derive(Debug, Clone, Serialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let mut classes: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    /// Resolves a display label such as "Female" against the fitted classes:
    /// a case-insensitive full match wins, then a one-letter class equal to
    /// the label's initial ("F").
    pub fn code_for_label(&self, label: &str) -> Option<usize> {
        if let Some(i) = self.classes.iter().position(|c| c.eq_ignore_ascii_case(label)) {
            return Some(i);
        }
        let initial = label.chars().next()?;
        self.classes.iter().position(|c| {
            let mut chars = c.chars();
            matches!((chars.next(), chars.next()), (Some(ch), None) if ch.eq_ignore_ascii_case(&initial))
        })
    }
}

/// Numeric view of the table ready for regression.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub target: Array1<f64>,
    pub encoders: BTreeMap<String, LabelEncoder>,
}

pub fn encode(table: &StudentTable, target: &str) -> Result<EncodedDataset> {
    let target_values = Array1::from_vec(table.numeric(target)?.to_vec());

    let mut feature_names = Vec::new();
    let mut encoders = BTreeMap::new();
    let mut flat_columns: Vec<Vec<f64>> = Vec::new();

    for column in table.columns().iter().filter(|c| c.name != target) {
        let encoded = match &column.values {
            ColumnValues::Numeric(values) => values.clone(),
            ColumnValues::Categorical(values) => {
                let encoder = LabelEncoder::fit(values);
                let codes = values
                    .iter()
                    .map(|v| encoder.transform(v).map(|code| code as f64))
                    .collect::<Option<Vec<f64>>>()
                    .ok_or_else(|| DashboardError::Model(format!("unencodable value in {}", column.name)))?;
                log::debug!("encoded {} with classes {:?}", column.name, encoder.classes());
                encoders.insert(column.name.clone(), encoder);
                codes
            }
        };
        feature_names.push(column.name.clone());
        flat_columns.push(encoded);
    }

    if feature_names.is_empty() {
        return Err(DashboardError::Model("no feature columns besides the target".to_string()));
    }

    let rows = table.len();
    let cols = feature_names.len();
    let features = Array2::from_shape_fn((rows, cols), |(r, c)| flat_columns[c][r]);

    Ok(EncodedDataset {
        feature_names,
        features,
        target: target_values,
        encoders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_sorted_and_deduplicated() {
        let encoder = LabelEncoder::fit(&["yes", "no", "yes", "maybe"]);
        assert_eq!(encoder.classes(), &["maybe", "no", "yes"]);
        assert_eq!(encoder.transform("no"), Some(1));
        assert_eq!(encoder.transform("never"), None);
    }

    #[test]
    fn labels_resolve_by_name_or_initial() {
        let yes_no = LabelEncoder::fit(&["yes", "no"]);
        assert_eq!(yes_no.code_for_label("Yes"), Some(1));
        assert_eq!(yes_no.code_for_label("No"), Some(0));

        let gender = LabelEncoder::fit(&["M", "F"]);
        assert_eq!(gender.code_for_label("Female"), Some(0));
        assert_eq!(gender.code_for_label("Male"), Some(1));

        let status = LabelEncoder::fit(&["Together", "Apart"]);
        assert_eq!(status.code_for_label("together"), Some(1));
        assert_eq!(status.code_for_label("Separated"), None);
    }

    #[test]
    fn encode_drops_target_and_keeps_column_order() {
        let csv = "gender,Term_3,age,internet\nM,12,17,yes\nF,9,16,no\nF,15,18,yes\n";
        let table = StudentTable::from_reader(csv.as_bytes()).unwrap();
        let dataset = encode(&table, "Term_3").unwrap();

        assert_eq!(dataset.feature_names, vec!["gender", "age", "internet"]);
        assert_eq!(dataset.target.to_vec(), vec![12.0, 9.0, 15.0]);
        assert_eq!(dataset.features.row(0).to_vec(), vec![1.0, 17.0, 1.0]);
        assert_eq!(dataset.features.row(1).to_vec(), vec![0.0, 16.0, 0.0]);
        assert!(dataset.encoders.contains_key("gender"));
        assert!(!dataset.encoders.contains_key("age"));
    }

    #[test]
    fn categorical_target_is_rejected() {
        let csv = "age,Term_3\n17,A\n16,B\n";
        let table = StudentTable::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(encode(&table, "Term_3"), Err(DashboardError::NotNumeric(_))));
    }
}
