//! Similarity backend selection and per-pair scoring.
//!
//! Backends form a preference ladder compiled in through cargo features:
//! the rapidfuzz crate first, then strsim edit-distance fallbacks. Scores
//! are normalized to [0,100]; an undefined score (two empty values under an
//! edit-distance backend) is `None` and poisons the whole candidate.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::NormalizeConfig;
use crate::error::ScorerError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Overall string similarity, order-sensitive.
    Ratio,
    /// Robust to word reordering and subset containment.
    TokenSetRatio,
}

impl ScorerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ratio => "ratio",
            Self::TokenSetRatio => "token_set_ratio",
        }
    }
}

impl std::fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimilarityBackend {
    RapidFuzz,
    Levenshtein,
    DamerauLevenshtein,
}

impl SimilarityBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RapidFuzz => "rapidfuzz",
            Self::Levenshtein => "levenshtein",
            Self::DamerauLevenshtein => "damerau_levenshtein",
        }
    }
}

/// First usable backend in preference order.
pub fn select_backend() -> Result<SimilarityBackend, ScorerError> {
    if cfg!(feature = "rapidfuzz") {
        return Ok(SimilarityBackend::RapidFuzz);
    }
    if cfg!(feature = "editdist") {
        return Ok(SimilarityBackend::Levenshtein);
    }
    if cfg!(feature = "damerau") {
        return Ok(SimilarityBackend::DamerauLevenshtein);
    }
    Err(ScorerError::NoBackend)
}

/// A reusable per-row-pair scorer for a fixed backend, mode, and
/// normalization. Normalization flags are explicit configuration, applied
/// identically to both sides of every comparison.
#[derive(Debug, Clone)]
pub struct Scorer {
    backend: SimilarityBackend,
    kind: ScorerKind,
    normalize: NormalizeConfig,
}

impl Scorer {
    pub fn new(kind: ScorerKind, normalize: NormalizeConfig) -> Result<Self, ScorerError> {
        let backend = select_backend()?;
        Self::with_backend(backend, kind, normalize)
    }

    /// Pin a specific backend instead of taking the ladder's first choice.
    pub fn with_backend(
        backend: SimilarityBackend,
        kind: ScorerKind,
        normalize: NormalizeConfig,
    ) -> Result<Self, ScorerError> {
        if kind == ScorerKind::TokenSetRatio && backend != SimilarityBackend::RapidFuzz {
            return Err(ScorerError::UnsupportedScorer {
                scorer: kind.as_str().to_string(),
            });
        }
        if backend == SimilarityBackend::RapidFuzz && !cfg!(feature = "rapidfuzz") {
            return Err(ScorerError::NoBackend);
        }
        Ok(Self {
            backend,
            kind,
            normalize,
        })
    }

    pub fn backend(&self) -> SimilarityBackend {
        self.backend
    }

    pub fn kind(&self) -> ScorerKind {
        self.kind
    }

    /// Apply the configured case/whitespace folding to one value.
    pub fn normalize(&self, value: &str) -> String {
        let folded = if self.normalize.fold_whitespace {
            value.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            value.to_string()
        };
        if self.normalize.fold_case {
            folded.to_lowercase()
        } else {
            folded
        }
    }

    /// Score one (reference value, input value) pair in [0,100], or `None`
    /// when the backend cannot define a score for the pair.
    pub fn score_pair(&self, reference: &str, input: &str) -> Option<f64> {
        let a = self.normalize(reference);
        let b = self.normalize(input);
        match self.backend {
            SimilarityBackend::RapidFuzz => rapidfuzz_pair(self.kind, &a, &b),
            SimilarityBackend::Levenshtein => {
                editdist_norm(strsim::levenshtein(&a, &b), max_chars(&a, &b))
            }
            SimilarityBackend::DamerauLevenshtein => {
                editdist_norm(strsim::damerau_levenshtein(&a, &b), max_chars(&a, &b))
            }
        }
    }

    /// Arithmetic mean over join pairs: sum of per-pair scores divided by
    /// the pair count. Any undefined pair score makes the candidate
    /// undefined.
    pub fn score_candidate<'a, I>(&self, value_pairs: I) -> Option<f64>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (reference, input) in value_pairs {
            sum += self.score_pair(reference, input)?;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(sum / count as f64)
    }
}

fn max_chars(a: &str, b: &str) -> usize {
    a.chars().count().max(b.chars().count())
}

/// `(1 - distance / max_len) * 100`; undefined when both sides are empty.
fn editdist_norm(distance: usize, max_len: usize) -> Option<f64> {
    if max_len == 0 {
        return None;
    }
    Some((1.0 - distance as f64 / max_len as f64) * 100.0)
}

#[cfg(feature = "rapidfuzz")]
fn rapidfuzz_pair(kind: ScorerKind, a: &str, b: &str) -> Option<f64> {
    Some(match kind {
        ScorerKind::Ratio => ratio_pct(a, b),
        ScorerKind::TokenSetRatio => token_set_ratio_pct(a, b),
    })
}

#[cfg(not(feature = "rapidfuzz"))]
fn rapidfuzz_pair(_kind: ScorerKind, _a: &str, _b: &str) -> Option<f64> {
    // Unreachable through the constructors; they refuse the backend.
    None
}

#[cfg(feature = "rapidfuzz")]
fn ratio_pct(a: &str, b: &str) -> f64 {
    // rapidfuzz 0.5 returns a normalized similarity in [0,1]; this crate's
    // contract (and every other backend) is [0,100], so scale to percent.
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Token-set similarity: compare the sorted token intersection against each
/// side's intersection-plus-remainder string and take the best ratio. Equal
/// token sets and subset containment both score 100.
#[cfg(feature = "rapidfuzz")]
fn token_set_ratio_pct(a: &str, b: &str) -> f64 {
    use std::collections::BTreeSet;

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return ratio_pct(a, b);
    }

    let sect = join_tokens(tokens_a.intersection(&tokens_b));
    let combined_a = concat_tokens(&sect, join_tokens(tokens_a.difference(&tokens_b)));
    let combined_b = concat_tokens(&sect, join_tokens(tokens_b.difference(&tokens_a)));

    let mut best = ratio_pct(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best
            .max(ratio_pct(&sect, &combined_a))
            .max(ratio_pct(&sect, &combined_b));
    }
    best
}

#[cfg(feature = "rapidfuzz")]
fn join_tokens<'a, I: Iterator<Item = &'a &'a str>>(tokens: I) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

#[cfg(feature = "rapidfuzz")]
fn concat_tokens(sect: &str, rest: String) -> String {
    if sect.is_empty() {
        rest
    } else if rest.is_empty() {
        sect.to_string()
    } else {
        format!("{sect} {rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer(kind: ScorerKind) -> Scorer {
        Scorer::new(kind, NormalizeConfig::default()).unwrap()
    }

    fn edit_scorer(normalize: NormalizeConfig) -> Scorer {
        Scorer::with_backend(SimilarityBackend::Levenshtein, ScorerKind::Ratio, normalize)
            .unwrap()
    }

    #[test]
    fn identical_values_score_100() {
        let s = scorer(ScorerKind::Ratio);
        assert_eq!(s.score_pair("Rome", "rome"), Some(100.0));
    }

    #[test]
    fn scores_stay_in_range() {
        let s = scorer(ScorerKind::Ratio);
        for (a, b) in [("rome", "milan"), ("", "x"), ("abc", "abc"), ("a", "")] {
            let score = s.score_pair(a, b).unwrap();
            assert!((0.0..=100.0).contains(&score), "{a} vs {b} -> {score}");
        }
    }

    #[cfg(feature = "rapidfuzz")]
    #[test]
    fn token_set_handles_word_subset() {
        let s = scorer(ScorerKind::TokenSetRatio);
        let token_set = s.score_pair("Reggio Calabria", "Reggio di Calabria").unwrap();
        assert_eq!(token_set, 100.0);

        let plain = scorer(ScorerKind::Ratio)
            .score_pair("Reggio Calabria", "Reggio di Calabria")
            .unwrap();
        assert!(token_set > plain);
    }

    #[cfg(feature = "rapidfuzz")]
    #[test]
    fn token_set_never_below_ratio() {
        let pairs = [
            ("fuzzy was a bear", "fuzzy fuzzy was a bear"),
            ("rome city", "city rome"),
            ("milan", "milano"),
        ];
        for (a, b) in pairs {
            let ratio = scorer(ScorerKind::Ratio).score_pair(a, b).unwrap();
            let token_set = scorer(ScorerKind::TokenSetRatio).score_pair(a, b).unwrap();
            assert!(token_set >= ratio, "{a} vs {b}: {token_set} < {ratio}");
        }
    }

    #[test]
    fn whitespace_folding_changes_score() {
        let folded = scorer(ScorerKind::Ratio);
        assert_eq!(folded.score_pair("Rome   City", "  Rome City  "), Some(100.0));

        let raw = Scorer::new(
            ScorerKind::Ratio,
            NormalizeConfig {
                fold_case: true,
                fold_whitespace: false,
            },
        )
        .unwrap();
        let score = raw.score_pair("Rome   City", "  Rome City  ").unwrap();
        assert!(score < 100.0);
    }

    #[test]
    fn raw_case_is_sensitive() {
        let raw = Scorer::new(
            ScorerKind::Ratio,
            NormalizeConfig {
                fold_case: false,
                fold_whitespace: true,
            },
        )
        .unwrap();
        let score = raw.score_pair("ROME", "rome").unwrap();
        assert!(score < 100.0);
    }

    #[test]
    fn editdist_normalization() {
        let s = edit_scorer(NormalizeConfig::default());
        // kitten -> sitting: distance 3, max len 7
        let expected = (1.0 - 3.0 / 7.0) * 100.0;
        let score = s.score_pair("kitten", "sitting").unwrap();
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn editdist_empty_both_sides_is_undefined() {
        let s = edit_scorer(NormalizeConfig::default());
        assert_eq!(s.score_pair("", ""), None);
        assert_eq!(s.score_pair("   ", " "), None);
    }

    #[test]
    fn damerau_counts_transposition_once() {
        let s = Scorer::with_backend(
            SimilarityBackend::DamerauLevenshtein,
            ScorerKind::Ratio,
            NormalizeConfig::default(),
        )
        .unwrap();
        // "abcd" vs "abdc": one transposition, max len 4
        let expected = (1.0 - 1.0 / 4.0) * 100.0;
        let score = s.score_pair("abcd", "abdc").unwrap();
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn token_set_requires_rapidfuzz_backend() {
        let err = Scorer::with_backend(
            SimilarityBackend::Levenshtein,
            ScorerKind::TokenSetRatio,
            NormalizeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScorerError::UnsupportedScorer { .. }));
    }

    #[test]
    fn candidate_average_is_sum_over_count() {
        let s = edit_scorer(NormalizeConfig::default());
        let avg = s
            .score_candidate([("rome", "rome"), ("kitten", "sitting")])
            .unwrap();
        let expected = (100.0 + (1.0 - 3.0 / 7.0) * 100.0) / 2.0;
        assert!((avg - expected).abs() < 1e-9);
    }

    #[test]
    fn undefined_pair_poisons_candidate() {
        let s = edit_scorer(NormalizeConfig::default());
        assert_eq!(s.score_candidate([("rome", "rome"), ("", "")]), None);
    }
}
