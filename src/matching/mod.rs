//! Match resolution core: candidate generation, ranking, classification.

use rayon::prelude::*;

use crate::error::PairError;
use crate::models::{InputRecord, InputTable, Table};
use crate::pairs::{self, JoinPair};
use crate::similarity::Scorer;

/// One scored (input row, reference row) combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub input_id: usize,
    /// Ordinal of the reference row in file order (0-based).
    pub ref_index: usize,
    /// Mean of the per-pair similarity scores, in [0,100].
    pub avg_score: f64,
}

/// A candidate with its 1-based rank within its input row's partition.
/// Ties share a rank (RANK semantics, not row numbering).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub candidate: ScoredCandidate,
    pub rank: usize,
}

/// Classification of one input row after ranking.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// No candidate reached the threshold.
    Unmatched,
    /// Exactly one candidate at rank 1.
    Clean(ScoredCandidate),
    /// Two or more candidates tied at rank 1, best first by reference order.
    Ambiguous(Vec<ScoredCandidate>),
}

impl MatchOutcome {
    /// The candidate a clean output row carries: the unique best match, or
    /// for an ambiguous row its deterministic representative (the tied
    /// candidate with the lowest reference ordinal).
    pub fn representative(&self) -> Option<&ScoredCandidate> {
        match self {
            Self::Unmatched => None,
            Self::Clean(c) => Some(c),
            Self::Ambiguous(tied) => tied.first(),
        }
    }
}

/// Pluggable candidate generation. The default is the full cross product;
/// a blocking or indexed generator can be substituted without changing
/// scoring, ranking, or output semantics.
pub trait CandidateGenerator {
    /// Produce scored candidates ordered by (input_id, ref_index).
    /// Candidates with an undefined score are skipped.
    fn generate(
        &self,
        input: &InputTable,
        reference: &Table,
        pair_indices: &[(usize, usize)],
        scorer: &Scorer,
    ) -> Vec<ScoredCandidate>;
}

/// Scores every surviving input row against every reference row.
/// O(|input| x |reference|); correct but quadratic, which is the documented
/// scalability limit of the default configuration.
pub struct CrossJoin;

impl CandidateGenerator for CrossJoin {
    fn generate(
        &self,
        input: &InputTable,
        reference: &Table,
        pair_indices: &[(usize, usize)],
        scorer: &Scorer,
    ) -> Vec<ScoredCandidate> {
        // collect preserves the source order, so the result is deterministic.
        input
            .records
            .par_iter()
            .flat_map_iter(|record| {
                reference.rows.iter().enumerate().filter_map(move |(ref_index, ref_row)| {
                    let values = pair_indices
                        .iter()
                        .map(|&(input_col, ref_col)| {
                            (ref_row[ref_col].as_str(), record.values[input_col].as_str())
                        });
                    scorer.score_candidate(values).map(|avg_score| ScoredCandidate {
                        input_id: record.input_id,
                        ref_index,
                        avg_score,
                    })
                })
            })
            .collect()
    }
}

/// Reduce a loaded input table to its join columns and assign input ids.
///
/// Rows where any join column is empty are excluded entirely before id
/// assignment; the exclusion count is returned so callers can surface it.
pub fn prepare_input(
    table: &Table,
    join_pairs: &[JoinPair],
) -> Result<(InputTable, usize), PairError> {
    let columns = pairs::input_columns(join_pairs);
    let mut column_indices = Vec::with_capacity(columns.len());
    for column in &columns {
        let idx = table
            .column_index(column)
            .ok_or_else(|| PairError::ColumnReference {
                column: column.clone(),
                table: "input",
            })?;
        column_indices.push(idx);
    }

    let mut records = Vec::new();
    let mut excluded = 0usize;
    for row in &table.rows {
        if column_indices.iter().any(|&i| row[i].is_empty()) {
            excluded += 1;
            continue;
        }
        let values = column_indices.iter().map(|&i| row[i].clone()).collect();
        records.push(InputRecord {
            input_id: records.len() + 1,
            values,
        });
    }
    Ok((InputTable { columns, records }, excluded))
}

/// Resolve (input column, reference column) name pairs to value indices:
/// input side into `InputTable::columns`, reference side into the
/// reference header.
pub fn pair_indices(
    input: &InputTable,
    reference: &Table,
    join_pairs: &[JoinPair],
) -> Result<Vec<(usize, usize)>, PairError> {
    join_pairs
        .iter()
        .map(|pair| {
            let input_col =
                input
                    .column_index(&pair.input)
                    .ok_or_else(|| PairError::ColumnReference {
                        column: pair.input.clone(),
                        table: "input",
                    })?;
            let ref_col = reference.column_index(&pair.reference).ok_or_else(|| {
                PairError::ColumnReference {
                    column: pair.reference.clone(),
                    table: "reference",
                }
            })?;
            Ok((input_col, ref_col))
        })
        .collect()
}

/// Assign RANK-style ranks within one input row's candidates, ordered by
/// avg_score descending with the reference ordinal as the deterministic
/// tiebreak.
pub fn rank_candidates(mut candidates: Vec<ScoredCandidate>) -> Vec<RankedCandidate> {
    candidates.sort_by(|a, b| {
        b.avg_score
            .partial_cmp(&a.avg_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.ref_index.cmp(&b.ref_index))
    });
    let mut ranked: Vec<RankedCandidate> = Vec::with_capacity(candidates.len());
    for (position, candidate) in candidates.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if prev.candidate.avg_score == candidate.avg_score => prev.rank,
            _ => position + 1,
        };
        ranked.push(RankedCandidate { candidate, rank });
    }
    ranked
}

/// Score, filter, rank, and classify every input row.
///
/// Returns one outcome per record of `input`, in record order.
pub fn resolve_matches(
    input: &InputTable,
    reference: &Table,
    join_pairs: &[JoinPair],
    scorer: &Scorer,
    threshold: f64,
    generator: &dyn CandidateGenerator,
) -> Result<Vec<MatchOutcome>, PairError> {
    let indices = pair_indices(input, reference, join_pairs)?;
    let candidates = generator.generate(input, reference, &indices, scorer);

    // Candidates arrive grouped by input_id; slice out each partition.
    let mut outcomes = Vec::with_capacity(input.records.len());
    let mut cursor = 0usize;
    for record in &input.records {
        let start = cursor;
        while cursor < candidates.len() && candidates[cursor].input_id == record.input_id {
            cursor += 1;
        }
        let surviving: Vec<ScoredCandidate> = candidates[start..cursor]
            .iter()
            .copied()
            .filter(|c| c.avg_score >= threshold)
            .collect();
        outcomes.push(classify(surviving));
    }
    Ok(outcomes)
}

fn classify(candidates: Vec<ScoredCandidate>) -> MatchOutcome {
    let ranked = rank_candidates(candidates);
    let mut top: Vec<ScoredCandidate> = ranked
        .into_iter()
        .take_while(|r| r.rank == 1)
        .map(|r| r.candidate)
        .collect();
    match top.len() {
        0 => MatchOutcome::Unmatched,
        1 => MatchOutcome::Clean(top.remove(0)),
        _ => MatchOutcome::Ambiguous(top),
    }
}
