use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot open {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no header row found in {path}")]
    HeaderParse { path: String },
    #[error("csv parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum PairError {
    #[error("invalid join pair {spec:?}: expected \"input_col,ref_col\"")]
    InvalidPairSpec { spec: String },
    #[error("join column {column:?} not found in {table} header")]
    ColumnReference {
        column: String,
        table: &'static str,
    },
    #[error("no join pair found between the input and reference headers")]
    NoJoinPairs,
}

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error(
        "no similarity backend available: build with the rapidfuzz feature or an edit-distance fallback (editdist/damerau)"
    )]
    NoBackend,
    #[error("the {scorer} scorer requires the rapidfuzz backend, which is not available")]
    UnsupportedScorer { scorer: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("add-field column {column:?} not found in reference header")]
    ColumnReference { column: String },
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
