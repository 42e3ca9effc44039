//! Article catalog: the seeded newsroom content plus per-principal
//! engagement state, and the feed query engine that drives listings.

mod article;
mod catalog;
mod feed;

pub use article::{
    read_time_for, Article, ArticleStatus, Comment, CredibilityLevel, NewArticle,
    ARTICLE_CATEGORIES,
};
pub use catalog::{seed_articles, ArticleCatalog, LikeState};
pub use feed::{ArticleSummary, FeedQuery, FeedSlice, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
