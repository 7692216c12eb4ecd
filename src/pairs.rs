//! Join pair resolution: explicit specs, exact header matches, fuzzy inference.

use std::collections::HashSet;

use strsim::normalized_levenshtein;

use crate::error::PairError;

/// A pinned (input column, reference column) used for similarity comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinPair {
    pub input: String,
    pub reference: String,
}

impl JoinPair {
    /// Parse an explicit `"input_col,ref_col"` spec. Surrounding whitespace
    /// and quote characters are stripped from both names.
    pub fn parse(spec: &str) -> Result<Self, PairError> {
        let invalid = || PairError::InvalidPairSpec {
            spec: spec.to_string(),
        };
        let (input, reference) = spec.split_once(',').ok_or_else(invalid)?;
        let input = strip_quotes(input);
        let reference = strip_quotes(reference);
        if input.is_empty() || reference.is_empty() || reference.contains(',') {
            return Err(invalid());
        }
        Ok(Self {
            input: input.to_string(),
            reference: reference.to_string(),
        })
    }
}

fn strip_quotes(name: &str) -> &str {
    name.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Case-insensitive similarity ratio between two header names, in [0,1].
fn header_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Resolve the ordered join pair list for one run.
///
/// Explicit pairs win outright. Otherwise exact (case-sensitive) header name
/// matches pair first; with `infer` on, each remaining input column is paired
/// with the most similar unconsumed reference column whose ratio reaches
/// `infer_threshold`. Each reference column is consumed at most once and the
/// first-encountered column keeps a tied best ratio.
pub fn resolve_join_pairs(
    explicit: &[String],
    input_header: &[String],
    ref_header: &[String],
    infer: bool,
    infer_threshold: f64,
) -> Result<Vec<JoinPair>, PairError> {
    let mut pairs: Vec<JoinPair> = Vec::new();

    if !explicit.is_empty() {
        for spec in explicit {
            pairs.push(JoinPair::parse(spec)?);
        }
    } else {
        for col in input_header {
            if ref_header.contains(col) {
                pairs.push(JoinPair {
                    input: col.clone(),
                    reference: col.clone(),
                });
            }
        }
        if infer {
            let mut consumed: HashSet<String> =
                pairs.iter().map(|p| p.reference.clone()).collect();
            for input_col in input_header {
                if pairs.iter().any(|p| &p.input == input_col) {
                    continue;
                }
                let mut best: Option<(&String, f64)> = None;
                for ref_col in ref_header {
                    if consumed.contains(ref_col) {
                        continue;
                    }
                    let ratio = header_ratio(input_col, ref_col);
                    if best.map_or(true, |(_, s)| ratio > s) {
                        best = Some((ref_col, ratio));
                    }
                }
                if let Some((ref_col, ratio)) = best {
                    if ratio >= infer_threshold {
                        consumed.insert(ref_col.clone());
                        pairs.push(JoinPair {
                            input: input_col.clone(),
                            reference: ref_col.clone(),
                        });
                    }
                }
            }
        }
    }

    let mut seen = HashSet::new();
    pairs.retain(|p| seen.insert(p.clone()));

    for pair in &pairs {
        if !input_header.contains(&pair.input) {
            return Err(PairError::ColumnReference {
                column: pair.input.clone(),
                table: "input",
            });
        }
        if !ref_header.contains(&pair.reference) {
            return Err(PairError::ColumnReference {
                column: pair.reference.clone(),
                table: "reference",
            });
        }
    }

    if pairs.is_empty() {
        return Err(PairError::NoJoinPairs);
    }
    Ok(pairs)
}

/// Sorted distinct input-side join columns.
pub fn input_columns(pairs: &[JoinPair]) -> Vec<String> {
    let mut cols: Vec<String> = pairs.iter().map(|p| p.input.clone()).collect();
    cols.sort();
    cols.dedup();
    cols
}

/// Sorted distinct reference-side join columns.
pub fn reference_columns(pairs: &[JoinPair]) -> Vec<String> {
    let mut cols: Vec<String> = pairs.iter().map(|p| p.reference.clone()).collect();
    cols.sort();
    cols.dedup();
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn explicit_pair_used_verbatim() {
        let pairs = resolve_join_pairs(
            &["a,x".into()],
            &headers(&["a", "b"]),
            &headers(&["x", "y"]),
            false,
            0.7,
        )
        .unwrap();
        assert_eq!(
            pairs,
            vec![JoinPair {
                input: "a".into(),
                reference: "x".into()
            }]
        );
    }

    #[test]
    fn explicit_pair_strips_quotes_and_spaces() {
        let pair = JoinPair::parse(" \"city\" , 'City Name' ").unwrap();
        assert_eq!(pair.input, "city");
        assert_eq!(pair.reference, "City Name");
    }

    #[test]
    fn malformed_spec_rejected() {
        assert!(matches!(
            JoinPair::parse("no_comma_here"),
            Err(PairError::InvalidPairSpec { .. })
        ));
        assert!(matches!(
            JoinPair::parse("a,"),
            Err(PairError::InvalidPairSpec { .. })
        ));
    }

    #[test]
    fn exact_header_matches_pair_first() {
        let pairs = resolve_join_pairs(
            &[],
            &headers(&["id", "city", "other"]),
            &headers(&["city", "code"]),
            false,
            0.7,
        )
        .unwrap();
        assert_eq!(
            pairs,
            vec![JoinPair {
                input: "city".into(),
                reference: "city".into()
            }]
        );
    }

    #[test]
    fn inference_finds_similar_names() {
        // regio <-> regione, comu <-> comune
        let pairs = resolve_join_pairs(
            &[],
            &headers(&["regio", "comu", "other"]),
            &headers(&["regione", "comune", "other_ref"]),
            true,
            0.6,
        )
        .unwrap();
        assert!(pairs.contains(&JoinPair {
            input: "regio".into(),
            reference: "regione".into()
        }));
        assert!(pairs.contains(&JoinPair {
            input: "comu".into(),
            reference: "comune".into()
        }));
    }

    #[test]
    fn inference_is_case_insensitive() {
        // No exact case-sensitive match, but the lower-cased ratio is 1.0.
        let pairs = resolve_join_pairs(&[], &headers(&["CITY"]), &headers(&["city"]), true, 0.7)
            .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].reference, "city");
    }

    #[test]
    fn reference_column_consumed_once() {
        // Both input columns resemble "name"; only the first may take it.
        let pairs = resolve_join_pairs(
            &[],
            &headers(&["namex", "namey"]),
            &headers(&["name"]),
            true,
            0.5,
        )
        .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].input, "namex");
    }

    #[test]
    fn disjoint_headers_without_inference_fail() {
        let err = resolve_join_pairs(
            &[],
            &headers(&["a", "b"]),
            &headers(&["x", "y"]),
            false,
            0.7,
        )
        .unwrap_err();
        assert!(matches!(err, PairError::NoJoinPairs));
    }

    #[test]
    fn unknown_explicit_column_is_column_reference_error() {
        let err = resolve_join_pairs(
            &["missing,x".into()],
            &headers(&["a"]),
            &headers(&["x"]),
            false,
            0.7,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PairError::ColumnReference { table: "input", .. }
        ));
    }

    #[test]
    fn duplicate_pairs_deduplicated() {
        let pairs = resolve_join_pairs(
            &["a,x".into(), "a,x".into()],
            &headers(&["a"]),
            &headers(&["x"]),
            false,
            0.7,
        )
        .unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn distinct_columns_sorted() {
        let pairs = vec![
            JoinPair {
                input: "b".into(),
                reference: "z".into(),
            },
            JoinPair {
                input: "a".into(),
                reference: "z".into(),
            },
        ];
        assert_eq!(input_columns(&pairs), vec!["a", "b"]);
        assert_eq!(reference_columns(&pairs), vec!["z"]);
    }
}
