//! Memory ranking and prompt context building.

use crate::types::MemoryRecord;
use std::collections::HashSet;

/// Words shorter than this carry too little signal to match on.
const MIN_TERM_LEN: usize = 3;

/// Lowercased alphanumeric terms of `text`, used for keyword matching.
pub fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

fn overlap(query: &HashSet<String>, content: &str) -> usize {
    terms(content).intersection(query).count()
}

/// Order `records` for injection into a prompt and keep at most `limit`.
///
/// Without a usable query, records come newest first. With one, only records
/// sharing at least one term with the query are kept, ordered by number of
/// shared terms, then importance, then recency.
pub fn rank(mut records: Vec<MemoryRecord>, query: Option<&str>, limit: usize) -> Vec<MemoryRecord> {
    let query_terms = query.map(terms).unwrap_or_default();

    if query_terms.is_empty() {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    } else {
        let mut scored: Vec<(usize, MemoryRecord)> = records
            .into_iter()
            .map(|m| (overlap(&query_terms, &m.content), m))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| {
                    b.importance
                        .partial_cmp(&a.importance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        records = scored.into_iter().map(|(_, m)| m).collect();
    }

    records.truncate(limit);
    records
}

/// Render memories as a system-prompt block, or `None` when there are none.
pub fn format_memory_block(memories: &[MemoryRecord]) -> Option<String> {
    if memories.is_empty() {
        return None;
    }

    let lines: Vec<String> = memories.iter().map(|m| format!("- {}", m.content)).collect();
    Some(format!(
        "Relevant memories from previous conversations:\n{}",
        lines.join("\n")
    ))
}
