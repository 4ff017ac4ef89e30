use serde::Serialize;

use crate::data::{StudentTable, TARGET_COLUMN, TERM_COLUMNS};
use crate::error::Result;
use crate::prediction::{PASS_MARK, TOP_MARK};

#[derive(Serialize, Clone, Debug)]
pub struct Summary {
    pub total_students: usize,
    pub overall_average: f64,
    pub passed_students: usize,
    pub top_performers: usize,
}

#[derive(Serialize, Clone, Debug)]
pub struct TermStats {
    pub term: String,
    pub average: f64,
    pub pass_rate: f64,
    pub failed: usize,
    pub top_performers: usize,
}

/// Min, quartiles and max of one term, for the box plot.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FiveNumber {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Serialize, Clone, Debug)]
pub struct TermSeries {
    pub label: String,
    pub values: Vec<f64>,
    pub spread: FiveNumber,
}

#[derive(Serialize, Clone, Debug)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Serialize, Clone, Debug)]
pub struct DashboardData {
    pub summary: Summary,
    pub terms: Vec<TermStats>,
}

#[derive(Serialize, Clone, Debug)]
pub struct AnalysisData {
    pub term_series: Vec<TermSeries>,
    pub final_grade_histogram: Vec<Bin>,
    pub average_trend: Vec<(String, f64)>,
    pub pass_rates: Vec<(String, f64)>,
    pub gender_counts: Vec<(String, usize)>,
    pub age_histogram: Vec<Bin>,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// One decimal, half-way cases to the even digit.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

fn count_where(values: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    values.iter().filter(|&&v| pred(v)).count()
}

/// Share of values at or above the pass mark, as a percentage.
pub fn pass_rate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    count_where(values, |v| v >= PASS_MARK) as f64 / values.len() as f64 * 100.0
}

pub fn term_label(column: &str) -> String {
    column.replace('_', " ")
}

/// Linear-interpolated quantile of sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn five_number(values: &[f64]) -> FiveNumber {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    FiveNumber {
        min: quantile(&sorted, 0.0),
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: quantile(&sorted, 1.0),
    }
}

/// Equal-width bins of `width` starting at floor(min).
pub fn histogram(values: &[f64], width: f64) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || width <= 0.0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min).floor();
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n_bins = (((max - min) / width).floor() as usize) + 1;

    let mut bins: Vec<Bin> = (0..n_bins)
        .map(|i| Bin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in finite {
        let i = (((v - min) / width).floor() as usize).min(n_bins - 1);
        bins[i].count += 1;
    }
    bins
}

pub fn dashboard_data(table: &StudentTable) -> Result<DashboardData> {
    let mut terms = Vec::with_capacity(TERM_COLUMNS.len());
    let mut term_means = Vec::with_capacity(TERM_COLUMNS.len());

    for column in TERM_COLUMNS {
        let values = table.numeric(column)?;
        let avg = mean(values);
        term_means.push(avg);
        terms.push(TermStats {
            term: term_label(column),
            average: round1(avg),
            pass_rate: round1(pass_rate(values)),
            failed: count_where(values, |v| v < PASS_MARK),
            top_performers: count_where(values, |v| v >= TOP_MARK),
        });
    }

    let final_term = table.numeric(TARGET_COLUMN)?;
    let summary = Summary {
        total_students: table.len(),
        overall_average: round1(mean(&term_means)),
        passed_students: count_where(final_term, |v| v >= PASS_MARK),
        top_performers: count_where(final_term, |v| v >= TOP_MARK),
    };

    Ok(DashboardData { summary, terms })
}

pub fn analysis_data(table: &StudentTable) -> Result<AnalysisData> {
    let mut term_series = Vec::new();
    let mut average_trend = Vec::new();
    let mut pass_rates = Vec::new();

    for column in TERM_COLUMNS {
        let values = table.numeric(column)?;
        let label = term_label(column);
        average_trend.push((label.clone(), mean(values)));
        pass_rates.push((label.clone(), pass_rate(values)));
        term_series.push(TermSeries {
            label,
            values: values.to_vec(),
            spread: five_number(values),
        });
    }

    // Demographic columns are optional; their charts are left empty when absent.
    let gender_counts = table.value_counts("gender").unwrap_or_default();
    let age_histogram = table
        .numeric("age")
        .map(|ages| histogram(ages, 1.0))
        .unwrap_or_default();

    Ok(AnalysisData {
        term_series,
        final_grade_histogram: histogram(table.numeric(TARGET_COLUMN)?, 1.0),
        average_trend,
        pass_rates,
        gender_counts,
        age_histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADES: &str = "\
gender,age,Term_1,Term_2,Term_3
F,17,10,11,12
M,16,8,9,7
F,18,15,16,17
M,17,12,10,9
";

    fn table() -> StudentTable {
        StudentTable::from_reader(GRADES.as_bytes()).unwrap()
    }

    #[test]
    fn summary_counts_and_average() {
        let data = dashboard_data(&table()).unwrap();
        assert_eq!(data.summary.total_students, 4);
        // term means 11.25, 11.5, 11.25
        assert_eq!(data.summary.overall_average, 11.3);
        assert_eq!(data.summary.passed_students, 2);
        assert_eq!(data.summary.top_performers, 1);
    }

    #[test]
    fn term_stats_follow_pass_and_top_marks() {
        let data = dashboard_data(&table()).unwrap();
        let term_1 = &data.terms[0];
        assert_eq!(term_1.term, "Term 1");
        // mean is exactly 11.25
        assert_eq!(term_1.average, 11.2);
        assert_eq!(term_1.pass_rate, 75.0);
        assert_eq!(term_1.failed, 1);
        assert_eq!(term_1.top_performers, 1);
    }

    #[test]
    fn one_decimal_rounding_goes_to_even() {
        assert_eq!(round1(11.25), 11.2);
        assert_eq!(round1(11.35), 11.4);
        assert_eq!(round1(6.25), 6.2);
        assert_eq!(round1(11.26), 11.3);
    }

    #[test]
    fn missing_term_column_is_reported() {
        let table = StudentTable::from_reader("Term_1,Term_2\n1,2\n".as_bytes()).unwrap();
        assert!(dashboard_data(&table).is_err());
    }

    #[test]
    fn five_number_summary_interpolates() {
        let spread = five_number(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(spread, FiveNumber { min: 1.0, q1: 2.0, median: 3.0, q3: 4.0, max: 5.0 });
        assert_eq!(five_number(&[4.0, 1.0]).median, 2.5);
    }

    #[test]
    fn histogram_uses_unit_bins() {
        let bins = histogram(&[16.0, 17.0, 17.0, 18.0], 1.0);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 2, 1]);
        assert_eq!(bins[0].start, 16.0);
    }

    #[test]
    fn analysis_includes_demographics() {
        let data = analysis_data(&table()).unwrap();
        assert_eq!(data.gender_counts.len(), 2);
        assert_eq!(data.age_histogram.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(data.pass_rates[2].1, 50.0);
    }
}
