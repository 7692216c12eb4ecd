use clap::{ArgAction, Parser};

use crate::config::{MatchConfig, NormalizeConfig};
use crate::error::ConfigError;
use crate::similarity::ScorerKind;

#[derive(Parser, Debug)]
#[command(
    name = "fuzzy-join",
    version,
    about = "Fuzzy join of two delimited tables",
    disable_help_subcommand = true,
    after_help = "Example:\n  fuzzy-join input.csv ref.csv -j \"col1,col_ref1\" -j \"col2,col_ref2\" \\\n      -a \"field_to_add\" -o output_clean.csv"
)]
pub struct Cli {
    /// Input table path
    #[arg(value_name = "INPUT_FILE")]
    pub input_file: String,
    /// Reference table path
    #[arg(value_name = "REFERENCE_FILE")]
    pub reference_file: String,
    /// Minimum average score for a match, 0-100 (env: FUZZY_JOIN_THRESHOLD)
    #[arg(short = 't', long, env = "FUZZY_JOIN_THRESHOLD", default_value_t = 85.0)]
    pub threshold: f64,
    /// Infer join pairs from similar column names
    #[arg(short = 'i', long)]
    pub infer_pairs: bool,
    /// Header name similarity (0-1) required to infer a pair
    #[arg(short = 'I', long, default_value_t = 0.7)]
    pub infer_threshold: f64,
    /// Clean output path (env: FUZZY_JOIN_OUTPUT_CLEAN)
    #[arg(
        short = 'o',
        long,
        env = "FUZZY_JOIN_OUTPUT_CLEAN",
        default_value = "clean_matches.csv"
    )]
    pub output_clean: String,
    /// Ambiguous output path; when omitted, ambiguous rows are not written
    #[arg(short = 'u', long)]
    pub output_ambiguous: Option<String>,
    /// Join pair in the form input_col,ref_col. Can be repeated.
    #[arg(short = 'j', long = "join-pair", value_name = "PAIR")]
    pub join_pair: Vec<String>,
    /// Reference field to add to the outputs. Can be repeated.
    #[arg(short = 'a', long = "add-field", value_name = "FIELD")]
    pub add_field: Vec<String>,
    /// Include avg_score in outputs
    #[arg(short = 's', long)]
    pub show_score: bool,
    /// Fuzzy matching algorithm to use
    #[arg(long, value_enum, default_value_t = ScorerKind::Ratio)]
    pub scorer: ScorerKind,
    /// Disable whitespace normalization (no trimming or space reduction)
    #[arg(long)]
    pub raw_whitespace: bool,
    /// Enable case sensitive comparison (do not convert to lower-case)
    #[arg(long)]
    pub raw_case: bool,
    /// Increase verbosity (e.g., -v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Suppress all output except errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    pub fn to_match_config(&self) -> Result<MatchConfig, ConfigError> {
        let config = MatchConfig {
            input_path: self.input_file.clone(),
            reference_path: self.reference_file.clone(),
            threshold: self.threshold,
            join_pairs: self.join_pair.iter().map(|p| p.trim().to_string()).collect(),
            infer_pairs: self.infer_pairs,
            infer_threshold: self.infer_threshold,
            add_fields: self.add_field.iter().map(|f| f.trim().to_string()).collect(),
            show_score: self.show_score,
            scorer: self.scorer,
            normalize: NormalizeConfig {
                fold_case: !self.raw_case,
                fold_whitespace: !self.raw_whitespace,
            },
            output_clean: self.output_clean.clone(),
            output_ambiguous: self.output_ambiguous.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
