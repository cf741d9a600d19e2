use rayon::prelude::*;
use serde::Serialize;

use crate::error::{RecommendError, Result};
use crate::index::{CorpusIndex, RecipeId, SparseVector};

/// Default number of results when the caller does not ask for a count.
pub const DEFAULT_TOP_K: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub recipe_id: RecipeId,
    pub title: String,
    pub ingredients_text: String,
    pub similarity: f32,
}

/// Clamp a requested result count into `[1, corpus_size]`.
pub fn clamp_top_k(top_k: i64, corpus_size: usize) -> usize {
    if corpus_size == 0 {
        return 0;
    }
    top_k.clamp(1, corpus_size as i64) as usize
}

/// Cosine similarity of `query` against every row, in corpus order.
pub fn score(index: &CorpusIndex, query: &SparseVector) -> Vec<f32> {
    if query.is_empty() {
        return vec![0.0; index.len()];
    }
    index.matrix().par_iter().map(|row| row.dot(query)).collect()
}

/// Rank the corpus against `query_text` and return the best `top_k` recipes.
///
/// Ties keep corpus order. A query with no known tokens scores 0.0 everywhere
/// and therefore returns the head of the corpus.
pub fn recommend(index: &CorpusIndex, query_text: &str, top_k: i64) -> Result<Vec<RankedResult>> {
    if index.is_empty() {
        return Err(RecommendError::EmptyCorpus);
    }
    let query = index.vectorize(query_text);
    let scores = score(index, &query);

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // stable: equal scores stay in corpus order
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let k = clamp_top_k(top_k, index.len());
    let records = index.records();
    Ok(order
        .into_iter()
        .take(k)
        .map(|pos| {
            let record = &records[pos];
            RankedResult {
                recipe_id: record.id,
                title: record.title.clone(),
                ingredients_text: record.ingredients_text.clone(),
                similarity: scores[pos].clamp(0.0, 1.0),
            }
        })
        .collect())
}
