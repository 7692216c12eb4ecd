//! One-shot run orchestration: wiring the pipeline stages together.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::MatchConfig;
use crate::export::{self, Projection};
use crate::matching::{self, CrossJoin, MatchOutcome};
use crate::pairs;
use crate::similarity::Scorer;
use crate::table;

/// Counters and context for one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub input_rows: usize,
    pub excluded_rows: usize,
    pub reference_rows: usize,
    pub clean_matches: usize,
    pub ambiguous_inputs: usize,
    pub unmatched: usize,
    pub backend: &'static str,
    pub ambiguous_written: bool,
    pub elapsed: Duration,
}

/// Execute a full fuzzy join run: resolve pairs, score the cross product,
/// classify every input row, and write the clean/ambiguous outputs.
pub fn run(config: &MatchConfig) -> Result<RunSummary> {
    config.validate()?;
    let started = Instant::now();

    // Both inputs must be readable before any matching work starts.
    let input_header = table::read_header(&config.input_path)
        .with_context(|| format!("reading input header from {}", config.input_path))?;
    let ref_header = table::read_header(&config.reference_path)
        .with_context(|| format!("reading reference header from {}", config.reference_path))?;

    let join_pairs = pairs::resolve_join_pairs(
        &config.join_pairs,
        &input_header,
        &ref_header,
        config.infer_pairs,
        config.infer_threshold,
    )?;
    info!(
        "resolved {} join pair(s): {}",
        join_pairs.len(),
        join_pairs
            .iter()
            .map(|p| format!("{} -> {}", p.input, p.reference))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let scorer = Scorer::new(config.scorer, config.normalize)?;
    info!(
        "similarity backend: {} ({} scorer)",
        scorer.backend().name(),
        scorer.kind()
    );

    let input_full = table::load_table(&config.input_path)
        .with_context(|| format!("loading input table {}", config.input_path))?;
    let reference = table::load_table(&config.reference_path)
        .with_context(|| format!("loading reference table {}", config.reference_path))?;

    let (input, excluded_rows) = matching::prepare_input(&input_full, &join_pairs)?;
    if excluded_rows > 0 {
        warn!("excluded {excluded_rows} input row(s) with empty join key columns");
    }
    info!(
        "matching {} input row(s) against {} reference row(s)",
        input.records.len(),
        reference.row_count()
    );

    let outcomes = matching::resolve_matches(
        &input,
        &reference,
        &join_pairs,
        &scorer,
        config.threshold,
        &CrossJoin,
    )?;

    let projection = Projection::new(
        &join_pairs,
        &config.add_fields,
        config.show_score,
        &reference,
    )?;
    export::write_clean(
        &config.output_clean,
        &projection,
        &input,
        &reference,
        &outcomes,
    )
    .with_context(|| format!("writing clean output {}", config.output_clean))?;

    let ambiguous_written = match &config.output_ambiguous {
        Some(path) => export::write_ambiguous(path, &projection, &input, &reference, &outcomes)
            .with_context(|| format!("writing ambiguous output {path}"))?,
        None => false,
    };

    let mut clean_matches = 0usize;
    let mut ambiguous_inputs = 0usize;
    let mut unmatched = 0usize;
    for outcome in &outcomes {
        match outcome {
            MatchOutcome::Clean(_) => clean_matches += 1,
            MatchOutcome::Ambiguous(_) => ambiguous_inputs += 1,
            MatchOutcome::Unmatched => unmatched += 1,
        }
    }

    let summary = RunSummary {
        input_rows: input.records.len(),
        excluded_rows,
        reference_rows: reference.row_count(),
        clean_matches,
        ambiguous_inputs,
        unmatched,
        backend: scorer.backend().name(),
        ambiguous_written,
        elapsed: started.elapsed(),
    };

    info!("fuzzy join complete in {:.2?}", summary.elapsed);
    info!(
        "{} clean, {} ambiguous, {} unmatched",
        summary.clean_matches, summary.ambiguous_inputs, summary.unmatched
    );
    info!("clean matches saved to: {}", config.output_clean);
    if let Some(path) = &config.output_ambiguous {
        if summary.ambiguous_written {
            warn!("ambiguous records found, check file: {path}");
        } else {
            info!("no ambiguous records found");
        }
    }
    Ok(summary)
}
