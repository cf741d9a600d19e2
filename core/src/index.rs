use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RecommendError, Result};
use crate::tokenizer::{normalize_text, tokenize};

pub type TermId = u32;
pub type RecipeId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// Ordinal position in the loaded corpus.
    pub id: RecipeId,
    pub title: String,
    /// Lowercased, whitespace-normalized ingredient list.
    pub ingredients_text: String,
}

impl RecipeRecord {
    pub fn new(id: RecipeId, title: impl Into<String>, ingredients: &str) -> Self {
        Self { id, title: title.into(), ingredients_text: normalize_text(ingredients) }
    }
}

/// Sparse weighted vector stored as parallel arrays sorted by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<TermId>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn empty() -> Self { Self::default() }

    fn from_sorted(entries: Vec<(TermId, f32)>) -> Self {
        let (indices, values) = entries.into_iter().unzip();
        Self { indices, values }
    }

    pub fn len(&self) -> usize { self.indices.len() }

    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|w| w * w).sum::<f32>().sqrt()
    }

    /// Dot product by merging the two sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TfScheme {
    /// Raw occurrence count.
    #[default]
    Raw,
    /// 1 + ln(count)
    Sublinear,
}

/// How term frequency and inverse document frequency are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub tf: TfScheme,
    /// ln((1 + n) / (1 + df)) + 1 when set, ln(n / df) + 1 otherwise.
    pub smooth_idf: bool,
}

impl Default for WeightingConfig {
    fn default() -> Self { Self { tf: TfScheme::Raw, smooth_idf: true } }
}

impl WeightingConfig {
    fn tf(&self, count: u32) -> f32 {
        match self.tf {
            TfScheme::Raw => count as f32,
            TfScheme::Sublinear => {
                if count > 0 { 1.0 + (count as f32).ln() } else { 0.0 }
            }
        }
    }

    fn idf(&self, num_docs: u32, df: u32) -> f32 {
        let df = df.max(1) as f32;
        let n = num_docs as f32;
        if self.smooth_idf {
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        } else {
            (n / df).ln() + 1.0
        }
    }
}

/// Token to column mapping. Columns are dense and assigned in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<String>,
    lookup: HashMap<String, TermId>,
}

impl Vocabulary {
    /// Rebuild from terms listed in column order. Returns `None` on duplicates.
    pub fn from_terms(terms: Vec<String>) -> Option<Self> {
        let mut lookup = HashMap::with_capacity(terms.len());
        for (id, term) in terms.iter().enumerate() {
            if lookup.insert(term.clone(), id as TermId).is_some() {
                return None;
            }
        }
        Some(Self { terms, lookup })
    }

    fn insert(&mut self, term: String) -> TermId {
        if let Some(&tid) = self.lookup.get(&term) {
            return tid;
        }
        let tid = self.terms.len() as TermId;
        self.terms.push(term.clone());
        self.lookup.insert(term, tid);
        tid
    }

    pub fn get(&self, term: &str) -> Option<TermId> { self.lookup.get(term).copied() }

    pub fn term(&self, id: TermId) -> Option<&str> { self.terms.get(id as usize).map(String::as_str) }

    pub fn terms(&self) -> &[String] { &self.terms }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Per-column document frequency and the IDF derived from it at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeights {
    pub df: Vec<u32>,
    pub idf: Vec<f32>,
    pub config: WeightingConfig,
}

impl TermWeights {
    pub fn idf(&self, id: TermId) -> Option<f32> { self.idf.get(id as usize).copied() }

    /// tf * idf per column, L2-normalized. An empty count map yields the zero vector.
    fn weigh(&self, counts: &HashMap<TermId, u32>) -> SparseVector {
        let mut entries: Vec<(TermId, f32)> = counts
            .iter()
            .map(|(&tid, &count)| (tid, self.config.tf(count) * self.idf[tid as usize]))
            .collect();
        entries.sort_unstable_by_key(|&(tid, _)| tid);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() { *w /= norm; }
        }
        SparseVector::from_sorted(entries)
    }
}

/// Fitted recipe corpus: records, vocabulary, term weights and one unit-length
/// row vector per record. Read-only once built.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    records: Vec<RecipeRecord>,
    vocabulary: Vocabulary,
    weights: TermWeights,
    matrix: Vec<SparseVector>,
}

impl CorpusIndex {
    /// Fit with the default weighting (raw tf, smoothed idf).
    pub fn build(corpus: impl IntoIterator<Item = RecipeRecord>) -> Result<Self> {
        Self::build_with(corpus, WeightingConfig::default())
    }

    pub fn build_with(corpus: impl IntoIterator<Item = RecipeRecord>, config: WeightingConfig) -> Result<Self> {
        let records: Vec<RecipeRecord> = corpus
            .into_iter()
            .filter(|r| !r.ingredients_text.trim().is_empty())
            .collect();
        if records.is_empty() {
            return Err(RecommendError::EmptyCorpus);
        }
        if records.windows(2).any(|w| w[0].id >= w[1].id) {
            return Err(RecommendError::InvalidInput("recipe ids must increase in corpus order".into()));
        }

        let mut vocabulary = Vocabulary::default();
        let mut df: Vec<u32> = Vec::new();
        let mut doc_counts: Vec<HashMap<TermId, u32>> = Vec::with_capacity(records.len());
        for record in &records {
            let tokens = tokenize(&record.ingredients_text);
            if tokens.is_empty() {
                return Err(RecommendError::EmptyDocument { recipe_id: record.id });
            }
            let mut counts: HashMap<TermId, u32> = HashMap::new();
            for token in tokens {
                let tid = vocabulary.insert(token);
                if df.len() <= tid as usize { df.resize(tid as usize + 1, 0); }
                let count = counts.entry(tid).or_insert(0);
                if *count == 0 { df[tid as usize] += 1; }
                *count += 1;
            }
            doc_counts.push(counts);
        }

        let num_docs = records.len() as u32;
        let idf = df.iter().map(|&d| config.idf(num_docs, d)).collect();
        let weights = TermWeights { df, idf, config };
        let matrix = doc_counts.iter().map(|counts| weights.weigh(counts)).collect();

        tracing::debug!(num_docs, num_terms = vocabulary.len(), "fitted corpus index");
        Ok(Self { records, vocabulary, weights, matrix })
    }

    /// Assemble an index from previously fitted parts. Callers check consistency.
    pub(crate) fn from_parts(
        records: Vec<RecipeRecord>,
        vocabulary: Vocabulary,
        weights: TermWeights,
        matrix: Vec<SparseVector>,
    ) -> Self {
        Self { records, vocabulary, weights, matrix }
    }

    /// Project text into the fitted space. Unknown tokens are dropped; text with
    /// no known tokens maps to the zero vector.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(tid) = self.vocabulary.get(&token) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        self.weights.weigh(&counts)
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).and_then(|tid| self.weights.idf(tid))
    }

    pub fn records(&self) -> &[RecipeRecord] { &self.records }

    /// Lookup by id; ids are strictly increasing in corpus order.
    pub fn record(&self, id: RecipeId) -> Option<&RecipeRecord> {
        self.records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|pos| &self.records[pos])
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn weights(&self) -> &TermWeights { &self.weights }

    pub fn matrix(&self) -> &[SparseVector] { &self.matrix }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Vec<RecipeRecord> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RecipeRecord::new(i as RecipeId, format!("Recipe {i}"), t))
            .collect()
    }

    #[test]
    fn vocabulary_is_dense_in_first_seen_order() {
        let index = CorpusIndex::build(corpus(&["chicken rice", "beef rice", "low-fat milk"])).unwrap();
        let vocab = index.vocabulary();
        assert_eq!(vocab.terms(), &["chicken", "rice", "beef", "low-fat", "milk"]);
        for (i, term) in vocab.terms().iter().enumerate() {
            assert_eq!(vocab.get(term), Some(i as TermId));
        }
        assert_eq!(index.matrix().len(), 3);
    }

    #[test]
    fn idf_does_not_increase_with_document_frequency() {
        let index = CorpusIndex::build(corpus(&["salt pepper egg", "salt pepper", "salt flour"])).unwrap();
        let salt = index.idf("salt").unwrap();
        let pepper = index.idf("pepper").unwrap();
        let egg = index.idf("egg").unwrap();
        assert!(salt <= pepper && pepper <= egg);
        assert!(salt > 0.0);
    }

    #[test]
    fn unsmoothed_idf_stays_positive_for_universal_terms() {
        let config = WeightingConfig { tf: TfScheme::Sublinear, smooth_idf: false };
        let index = CorpusIndex::build_with(corpus(&["salt egg", "salt"]), config).unwrap();
        assert!((index.idf("salt").unwrap() - 1.0).abs() < 1e-6);
        assert!(index.matrix().iter().all(|row| (row.norm() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn rows_are_unit_length() {
        let index = CorpusIndex::build(corpus(&["egg egg flour", "sugar", "egg sugar butter"])).unwrap();
        for row in index.matrix() {
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn unknown_tokens_are_dropped() {
        let index = CorpusIndex::build(corpus(&["chicken rice", "beef noodles"])).unwrap();
        assert!(index.vectorize("truffle saffron").is_empty());
        let v = index.vectorize("chicken truffle");
        assert_eq!(v.indices, vec![index.vocabulary().get("chicken").unwrap()]);
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn vectorize_leaves_model_untouched() {
        let index = CorpusIndex::build(corpus(&["chicken rice", "beef noodles"])).unwrap();
        let terms_before = index.vocabulary().len();
        let weights_before = index.weights().clone();
        let first = index.vectorize("dragonfruit chicken");
        let second = index.vectorize("dragonfruit chicken");
        assert_eq!(first, second);
        assert_eq!(index.vocabulary().len(), terms_before);
        assert_eq!(index.weights(), &weights_before);
        assert_eq!(index.vocabulary().get("dragonfruit"), None);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert_eq!(CorpusIndex::build(Vec::new()).unwrap_err(), RecommendError::EmptyCorpus);
        assert_eq!(CorpusIndex::build(corpus(&["", "   "])).unwrap_err(), RecommendError::EmptyCorpus);
    }

    #[test]
    fn blank_records_are_excluded_before_fit() {
        let index = CorpusIndex::build(corpus(&["egg", "", "milk"])).unwrap();
        let ids: Vec<RecipeId> = index.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(index.record(1).is_none());
    }

    #[test]
    fn record_lookup_skips_excluded_ids() {
        let index = CorpusIndex::build(corpus(&["egg", "", "milk", "flour"])).unwrap();
        assert_eq!(index.record(0).unwrap().ingredients_text, "egg");
        assert_eq!(index.record(2).unwrap().ingredients_text, "milk");
        assert_eq!(index.record(3).unwrap().ingredients_text, "flour");
        assert!(index.record(1).is_none());
        assert!(index.record(7).is_none());
    }

    #[test]
    fn out_of_order_ids_are_rejected() {
        let records = vec![RecipeRecord::new(1, "b", "milk"), RecipeRecord::new(0, "a", "egg")];
        assert!(matches!(CorpusIndex::build(records), Err(RecommendError::InvalidInput(_))));
        let dupes = vec![RecipeRecord::new(0, "a", "egg"), RecipeRecord::new(0, "b", "milk")];
        assert!(matches!(CorpusIndex::build(dupes), Err(RecommendError::InvalidInput(_))));
    }

    #[test]
    fn tokenless_document_fails_fit() {
        let err = CorpusIndex::build(corpus(&["egg", "!!! ,,"])).unwrap_err();
        assert_eq!(err, RecommendError::EmptyDocument { recipe_id: 1 });
    }

    #[test]
    fn sparse_dot_matches_shared_columns() {
        let a = SparseVector::from_sorted(vec![(0, 0.6), (2, 0.8)]);
        let b = SparseVector::from_sorted(vec![(1, 1.0), (2, 0.5)]);
        assert!((a.dot(&b) - 0.4).abs() < 1e-6);
        assert_eq!(a.dot(&SparseVector::empty()), 0.0);
    }
}
