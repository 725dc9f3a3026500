use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Document, DocumentMetadata, ScoredDocument};

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Jaccard similarity of the lowercase whitespace-separated word sets of `a` and `b`.
pub fn similarity(a: &str, b: &str) -> f64 {
    jaccard(&word_set(a), &word_set(b))
}

/// Scores every document against `query` and returns the `k` closest.
///
/// Ties keep corpus order.
pub fn rank(documents: &[Document], query: &str, k: usize) -> Vec<ScoredDocument> {
    let query_words = word_set(query);

    let mut scored: Vec<ScoredDocument> = documents
        .iter()
        .map(|doc| ScoredDocument {
            id: doc.id.clone(),
            content: doc.content.clone(),
            metadata: DocumentMetadata {
                category: doc.category.clone(),
                url: doc.url.clone(),
                source: doc.source.clone(),
            },
            distance: 1.0 - jaccard(&query_words, &word_set(&doc.content)),
        })
        .collect();

    scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Renders hits as `[CATEGORY]\ncontent` blocks for the prompt.
pub fn render_context(hits: &[ScoredDocument]) -> String {
    hits.iter()
        .map(|hit| format!("[{}]\n{}", hit.metadata.category.to_uppercase(), hit.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
