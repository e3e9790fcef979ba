//! Recommenders: collaborative filtering over search-term vectors and
//! content-based keyword scoring, with a bounded TTL'd read cache.

mod cache;
mod collaborative;
mod content;

pub use cache::RecommendationCache;
pub use collaborative::{cosine_similarity, CollaborativeRecommender, POPULAR_TERMS_CAP};
pub use content::{
    extract_keywords, score_against, ContentBasedRecommender, AUTHOR_WEIGHT, DESCRIPTION_WEIGHT,
    GENRE_WEIGHT, MIN_TOKEN_LEN, POPULARITY_BOOST, TITLE_WEIGHT,
};
