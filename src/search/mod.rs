// src/search/mod.rs
pub mod fuzz;

use serde::Serialize;
use tracing::debug;

use crate::table::CanonicalTable;

pub use fuzz::weighted_ratio;

/// One ranked candidate identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub identity: String,
    pub score: u8,
}

/// Rank the distinct identities of `table` against `query`.
///
/// Highest score first; equal scores keep the order in which identities first
/// appear in the table. Candidates scoring 0 are dropped, so a query that
/// matches nothing yields an empty list. At most `limit` results.
pub fn fuzzy_search_names(table: &CanonicalTable, query: &str, limit: usize) -> Vec<MatchResult> {
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<MatchResult> = table
        .unique_identities()
        .into_iter()
        .filter_map(|name| {
            let score = weighted_ratio(query, name);
            (score > 0).then(|| MatchResult {
                identity: name.to_string(),
                score,
            })
        })
        .collect();

    // stable: ties stay in first-appearance order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);

    debug!(query, matches = scored.len(), "fuzzy search");
    scored
}
