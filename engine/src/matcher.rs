use regex::RegexBuilder;
use std::time::{Duration, Instant};

use crate::error::EngineError;
use crate::index::InvertedIndex;

/// Compiled-pattern size cap; oversized patterns fail at compile time
/// instead of consuming unbounded memory.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Terms scanned between deadline checks.
const BUDGET_CHECK_INTERVAL: usize = 1024;

/// Evaluate `pattern` against every distinct vocabulary term.
///
/// Matching runs over the index key set, never over raw document text, so
/// cost is bounded by vocabulary size. The whole scan runs under `budget`
/// wall-clock time; exceeding it aborts with `PatternTimeout` rather than
/// monopolizing the caller. Matches are unanchored and case-insensitive.
/// The returned terms are sorted for deterministic downstream output.
pub fn match_vocabulary(
    index: &InvertedIndex,
    pattern: &str,
    budget: Duration,
) -> Result<Vec<String>, EngineError> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| EngineError::InvalidPattern(e.to_string()))?;

    let start = Instant::now();
    let mut matched = Vec::new();
    for (scanned, term) in index.terms().enumerate() {
        if scanned % BUDGET_CHECK_INTERVAL == 0 && start.elapsed() >= budget {
            return Err(EngineError::PatternTimeout);
        }
        if re.is_match(term) {
            matched.push(term.clone());
        }
    }
    matched.sort();
    Ok(matched)
}
