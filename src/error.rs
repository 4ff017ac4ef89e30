use std::fmt;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// All errors that can occur while loading, training or serving.
#[derive(Debug)]
pub enum DashboardError {
    /// Bad environment configuration, caught before any data is read.
    InvalidConfig(String),
    /// The student CSV could not be opened or read.
    Io(std::io::Error),
    /// The student CSV is not well-formed.
    Csv(csv::Error),
    /// The CSV has a header but no data rows.
    EmptyTable,
    /// A column the dashboard or the model depends on is absent.
    MissingColumn(String),
    /// A column exists but holds text where numbers are required.
    NotNumeric(String),
    /// Split or fit could not be carried out.
    Model(String),
    /// A prediction form value is outside its accepted range.
    InvalidInput(String),
    /// Chart rendering failed.
    Chart(String),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Csv(e) => write!(f, "malformed csv: {e}"),
            Self::EmptyTable => write!(f, "student table has no rows"),
            Self::MissingColumn(name) => write!(f, "missing column: {name}"),
            Self::NotNumeric(name) => write!(f, "column {name} is not numeric"),
            Self::Model(msg) => write!(f, "model error: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Chart(msg) => write!(f, "chart error: {msg}"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<linfa_linear::LinearError<f64>> for DashboardError {
    fn from(e: linfa_linear::LinearError<f64>) -> Self {
        Self::Model(e.to_string())
    }
}

impl From<linfa::Error> for DashboardError {
    fn from(e: linfa::Error) -> Self {
        Self::Model(e.to_string())
    }
}

impl From<ndarray::ShapeError> for DashboardError {
    fn from(e: ndarray::ShapeError) -> Self {
        Self::Model(e.to_string())
    }
}
