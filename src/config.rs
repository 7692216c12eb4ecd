use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::similarity::ScorerKind;

/// Text normalization applied to both sides of every comparison.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Lower-case both values before scoring.
    pub fold_case: bool,
    /// Trim and collapse whitespace runs to a single space before scoring.
    pub fold_whitespace: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            fold_case: true,
            fold_whitespace: true,
        }
    }
}

/// Full configuration for one matching run.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MatchConfig {
    pub input_path: String,
    pub reference_path: String,
    /// Minimum average score for a candidate match, inclusive, in [0,100].
    pub threshold: f64,
    /// Explicit "input_col,ref_col" pair specs; empty means resolve from headers.
    pub join_pairs: Vec<String>,
    pub infer_pairs: bool,
    /// Header name similarity required to infer a pair, in [0,1].
    pub infer_threshold: f64,
    /// Reference columns carried into both outputs.
    pub add_fields: Vec<String>,
    pub show_score: bool,
    pub scorer: ScorerKind,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    pub output_clean: String,
    pub output_ambiguous: Option<String>,
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "threshold",
                reason: format!("{} not in 0..=100", self.threshold),
            });
        }
        if !(0.0..=1.0).contains(&self.infer_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "infer_threshold",
                reason: format!("{} not in 0..=1", self.infer_threshold),
            });
        }
        if self.output_clean.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_clean",
                reason: "must not be empty".into(),
            });
        }
        if let Some(ref path) = self.output_ambiguous {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "output_ambiguous",
                    reason: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}
