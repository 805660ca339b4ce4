//! Retrieval path: embed the query, rank stored chunks, filter by score.
//!
//! Retrieval is independent of ingestion: it only reads the store. The
//! minimum-score filter is applied here, on the scores the store returns,
//! so the store itself stays a pure top-k ranker.

use anyhow::Result;

use crate::config::Config;
use crate::store::{SearchHit, VectorStore};

/// Retrieve up to `k` chunks relevant to `query`, dropping hits below
/// `min_score`. An empty or blank query yields no results without
/// touching the embedding provider.
pub async fn retrieve(
    store: &VectorStore,
    query: &str,
    k: usize,
    min_score: f32,
) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut hits = store.search(query, k).await?;
    hits.retain(|h| h.score >= min_score);
    Ok(hits)
}

/// CLI entry point: run a search and print ranked results.
pub async fn run_search(
    config: &Config,
    store: &VectorStore,
    query: &str,
    limit: Option<usize>,
    min_score: Option<f32>,
) -> Result<()> {
    let k = limit.unwrap_or(config.retrieval.top_k);
    let min_score = min_score.unwrap_or(config.retrieval.min_score);

    let hits = retrieve(store, query, k, min_score).await?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let system = hit.metadata.system.as_deref().unwrap_or("-");
        println!(
            "{}. [{:.2}] {} / {} / {} ({})",
            i + 1,
            hit.score,
            hit.metadata.category,
            system,
            hit.metadata.title,
            hit.metadata.version
        );
        println!("    source: {}", hit.metadata.source_path);
        let excerpt: String = hit.text.chars().take(240).collect();
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " "));
        println!("    doc: {}", hit.metadata.doc_id);
        println!();
    }

    Ok(())
}
