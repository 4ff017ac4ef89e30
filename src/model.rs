use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{DashboardError, Result};
use crate::preprocess::EncodedDataset;

#[derive(Debug, Serialize, Clone)]
pub struct ModelInfo {
    pub algorithm: String,
    pub target: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub r2: f64,
    pub mean_absolute_error: f64,
    pub rmse: f64,
    pub intercept: f64,
    pub coefficients: Vec<Coefficient>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Coefficient {
    pub feature: String,
    pub weight: f64,
}

/// A single aligned input row together with the training columns that were
/// absent from the caller's input and defaulted to zero.
#[derive(Debug, Clone)]
pub struct AlignedRow {
    pub values: Array1<f64>,
    pub zero_filled: Vec<String>,
}

/// Shuffles `0..n_rows` with a seeded RNG and cuts off the test share.
/// The test side gets `ceil(test_size * n_rows)` rows.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DashboardError::Model(format!("test size {test_size} is not in (0, 1)")));
    }

    let n_test = (test_size * n_rows as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(DashboardError::Model(format!(
            "cannot split {n_rows} rows with test size {test_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Indices of the columns that stay linearly independent once centred.
/// Constant columns and columns spanned by earlier ones are left out.
fn independent_columns(x: &Array2<f64>) -> Vec<usize> {
    let mut basis: Vec<Array1<f64>> = Vec::new();
    let mut kept = Vec::new();

    for (j, column) in x.columns().into_iter().enumerate() {
        let centre = column.mean().unwrap_or(0.0);
        let mut v = column.mapv(|value| value - centre);
        let norm = v.dot(&v).sqrt();
        let scale = column.iter().fold(1.0f64, |acc, value| acc.max(value.abs()));
        if norm <= 1e-9 * scale * (x.nrows() as f64).sqrt() {
            continue;
        }

        // modified Gram-Schmidt against the columns already kept
        for b in &basis {
            let projection = b.dot(&v);
            v.scaled_add(-projection, b);
        }
        let residual = v.dot(&v).sqrt();
        if residual > 1e-8 * norm {
            v /= residual;
            basis.push(v);
            kept.push(j);
        }
    }
    kept
}

/// Ordinary least squares model for the final-term grade, fitted once.
pub struct GradeModel {
    feature_names: Vec<String>,
    intercept: f64,
    params: Array1<f64>,
    info: ModelInfo,
}

impl GradeModel {
    /// Fits on the training split. Columns that carry no independent signal
    /// in the training rows are left out of the solve and weighted 0.
    pub fn fit(dataset: &EncodedDataset, target: &str, test_size: f64, seed: u64) -> Result<Self> {
        let (train_idx, test_idx) = train_test_split(dataset.features.nrows(), test_size, seed)?;

        let x_train = dataset.features.select(Axis(0), &train_idx);
        let y_train = dataset.target.select(Axis(0), &train_idx);
        let x_test = dataset.features.select(Axis(0), &test_idx);
        let y_test = dataset.target.select(Axis(0), &test_idx);

        let kept = independent_columns(&x_train);
        let mut params = Array1::zeros(dataset.feature_names.len());
        let intercept = if kept.is_empty() {
            y_train.mean().unwrap_or(0.0)
        } else {
            let fitted = LinearRegression::new().fit(&Dataset::new(x_train.select(Axis(1), &kept), y_train))?;
            for (&j, &weight) in kept.iter().zip(fitted.params().iter()) {
                params[j] = weight;
            }
            fitted.intercept()
        };

        let dropped: Vec<&String> = (0..dataset.feature_names.len())
            .filter(|j| !kept.contains(j))
            .map(|j| &dataset.feature_names[j])
            .collect();
        if !dropped.is_empty() {
            log::warn!("No independent variation in {:?}, weighted 0", dropped);
        }

        let mut model = Self {
            feature_names: dataset.feature_names.clone(),
            intercept,
            params,
            info: ModelInfo {
                algorithm: "Ordinary Least Squares".to_string(),
                target: target.to_string(),
                train_rows: train_idx.len(),
                test_rows: test_idx.len(),
                r2: f64::NAN,
                mean_absolute_error: f64::NAN,
                rmse: f64::NAN,
                intercept,
                coefficients: Vec::new(),
            },
        };
        model.evaluate(&x_test, &y_test)?;
        Ok(model)
    }

    fn predict_rows(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.params) + self.intercept
    }

    fn evaluate(&mut self, x_test: &Array2<f64>, y_test: &Array1<f64>) -> Result<()> {
        let predictions = self.predict_rows(x_test);

        // r2 is undefined for a constant held-out target
        self.info.r2 = predictions.r2(y_test).unwrap_or(f64::NAN);
        self.info.mean_absolute_error = predictions.mean_absolute_error(y_test)?;
        self.info.rmse = predictions.mean_squared_error(y_test)?.sqrt();
        self.info.coefficients = self
            .feature_names
            .iter()
            .zip(self.params.iter())
            .map(|(feature, &weight)| Coefficient {
                feature: feature.clone(),
                weight,
            })
            .collect();
        Ok(())
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Reindexes `input` against the training columns. Unknown keys are
    /// ignored; missing columns become 0.
    pub fn align(&self, input: &HashMap<String, f64>) -> AlignedRow {
        let mut zero_filled = Vec::new();
        let values = self
            .feature_names
            .iter()
            .map(|name| match input.get(name) {
                Some(&v) => v,
                None => {
                    zero_filled.push(name.clone());
                    0.0
                }
            })
            .collect::<Array1<f64>>();

        if !zero_filled.is_empty() {
            log::debug!("prediction input missing {:?}, filled with 0", zero_filled);
        }
        AlignedRow { values, zero_filled }
    }

    /// Raw (unrounded) grade for one input row.
    pub fn predict(&self, input: &HashMap<String, f64>) -> Result<f64> {
        let row = self.align(input);
        let n = row.values.len();
        let x = row.values.into_shape((1, n))?;
        self.predict_rows(&x)
            .get(0)
            .copied()
            .ok_or_else(|| DashboardError::Model("empty prediction".to_string()))
    }

    pub fn coefficients(&self) -> &[Coefficient] {
        &self.info.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn params(&self) -> &Array1<f64> {
        &self.params
    }
}
