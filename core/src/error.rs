use thiserror::Error;

use crate::RecipeId;

/// Failures raised by index fitting and recommendation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("corpus has no usable recipes")]
    EmptyCorpus,
    #[error("recipe {recipe_id} has no tokens in its ingredient text")]
    EmptyDocument { recipe_id: RecipeId },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
