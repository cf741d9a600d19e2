//! Ingredient-text recipe recommendation: a TF-IDF corpus index over recipe
//! ingredient lists and a deterministic cosine top-k ranker on top of it.

pub mod dataset;
pub mod error;
pub mod index;
pub mod persist;
pub mod recommend;
pub mod tokenizer;

pub use error::RecommendError;
pub use index::{
    CorpusIndex, RecipeId, RecipeRecord, SparseVector, TermId, TermWeights, TfScheme, Vocabulary,
    WeightingConfig,
};
pub use recommend::{recommend, RankedResult, DEFAULT_TOP_K};
