use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::article::{Article, ArticleStatus, CredibilityLevel};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most viewed first.
    #[default]
    Trending,
    /// Newest first.
    Recent,
    /// Highest credibility score first.
    Relevance,
}

/// Feed request as it arrives from the query string. Everything is optional;
/// the default is the trending view of the whole catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    /// Exact category match. Absent or "All" means no category filter.
    pub category: Option<String>,
    pub credibility: Option<CredibilityLevel>,
    /// Case-insensitive substring match over title and excerpt.
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Card-sized projection of an article for feed listings; the body stays
/// behind the article endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub organization: Option<String>,
    pub image: String,
    pub category: String,
    pub credibility: CredibilityLevel,
    pub credibility_score: u8,
    pub read_time: String,
    pub views: u64,
    pub comment_count: u64,
    pub published_at: DateTime<Utc>,
    pub featured: bool,
}

impl From<&Article> for ArticleSummary {
    fn from(a: &Article) -> Self {
        ArticleSummary {
            id: a.id.clone(),
            title: a.title.clone(),
            excerpt: a.excerpt.clone(),
            author: a.author.clone(),
            organization: a.organization.clone(),
            image: a.image.clone(),
            category: a.category.clone(),
            credibility: a.credibility,
            credibility_score: a.credibility_score,
            read_time: a.read_time.clone(),
            views: a.views,
            comment_count: a.comment_count,
            published_at: a.published_at,
            featured: a.featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedSlice {
    pub articles: Vec<ArticleSummary>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Filter, sort, and paginate. Only published articles are listed; pending
/// submissions never appear in a feed.
pub fn run_query(articles: &[Article], query: &FeedQuery) -> FeedSlice {
    let search = query
        .search
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();
    let category = query.category.as_deref().filter(|c| *c != "All");

    let mut matched: Vec<&Article> = articles
        .iter()
        .filter(|a| a.status == ArticleStatus::Published)
        .filter(|a| category.is_none_or(|c| a.category == c))
        .filter(|a| query.credibility.is_none_or(|level| a.credibility == level))
        .filter(|a| {
            search.is_empty()
                || a.title.to_lowercase().contains(&search)
                || a.excerpt.to_lowercase().contains(&search)
        })
        .collect();

    match query.sort {
        SortOrder::Trending => {
            matched.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| id_order(a, b)))
        }
        SortOrder::Recent => matched.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| id_order(a, b))
        }),
        SortOrder::Relevance => matched.sort_by(|a, b| {
            b.credibility_score
                .cmp(&a.credibility_score)
                .then_with(|| id_order(a, b))
        }),
    }

    let total = matched.len();
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    FeedSlice {
        articles: matched[start..end].iter().map(|a| (*a).into()).collect(),
        total,
        page,
        page_size,
    }
}

/// Stable tie-break so equal sort keys keep a deterministic order.
fn id_order(a: &Article, b: &Article) -> std::cmp::Ordering {
    let na = a.id.parse::<u64>().unwrap_or(u64::MAX);
    let nb = b.id.parse::<u64>().unwrap_or(u64::MAX);
    na.cmp(&nb).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::seed_articles;

    fn ids(slice: &FeedSlice) -> Vec<&str> {
        slice.articles.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn trending_is_the_default_and_ranks_by_views() {
        let articles = seed_articles();
        let slice = run_query(&articles, &FeedQuery::default());
        assert_eq!(slice.total, 8);
        assert_eq!(ids(&slice), vec!["7", "8", "1", "3", "2", "5", "4", "6"]);
    }

    #[test]
    fn recent_ranks_by_publish_time() {
        let articles = seed_articles();
        let query = FeedQuery {
            sort: SortOrder::Recent,
            ..FeedQuery::default()
        };
        assert_eq!(
            ids(&run_query(&articles, &query)),
            vec!["1", "2", "3", "4", "5", "6", "7", "8"]
        );
    }

    #[test]
    fn relevance_ranks_by_credibility_score() {
        let articles = seed_articles();
        let query = FeedQuery {
            sort: SortOrder::Relevance,
            ..FeedQuery::default()
        };
        assert_eq!(
            ids(&run_query(&articles, &query)),
            vec!["8", "1", "3", "2", "6", "5", "4", "7"]
        );
    }

    #[test]
    fn category_filter_is_exact_and_all_is_transparent() {
        let articles = seed_articles();
        let science = FeedQuery {
            category: Some("Science".to_string()),
            sort: SortOrder::Recent,
            ..FeedQuery::default()
        };
        assert_eq!(ids(&run_query(&articles, &science)), vec!["3", "8"]);

        let all = FeedQuery {
            category: Some("All".to_string()),
            ..FeedQuery::default()
        };
        assert_eq!(run_query(&articles, &all).total, 8);

        let lowercase = FeedQuery {
            category: Some("science".to_string()),
            ..FeedQuery::default()
        };
        assert_eq!(run_query(&articles, &lowercase).total, 0);
    }

    #[test]
    fn credibility_filter_matches_the_badge() {
        let articles = seed_articles();
        let fake = FeedQuery {
            credibility: Some(CredibilityLevel::Fake),
            ..FeedQuery::default()
        };
        assert_eq!(ids(&run_query(&articles, &fake)), vec!["7"]);

        let verified = FeedQuery {
            credibility: Some(CredibilityLevel::Verified),
            ..FeedQuery::default()
        };
        assert_eq!(run_query(&articles, &verified).total, 6);
    }

    #[test]
    fn search_spans_title_and_excerpt_case_insensitively() {
        let articles = seed_articles();
        let query = FeedQuery {
            search: Some("CLIMATE".to_string()),
            sort: SortOrder::Recent,
            ..FeedQuery::default()
        };
        assert_eq!(ids(&run_query(&articles, &query)), vec!["1"]);

        let excerpt_hit = FeedQuery {
            search: Some("telescope".to_string()),
            ..FeedQuery::default()
        };
        assert_eq!(ids(&run_query(&articles, &excerpt_hit)), vec!["8"]);

        let miss = FeedQuery {
            search: Some("zebra".to_string()),
            ..FeedQuery::default()
        };
        assert_eq!(run_query(&articles, &miss).total, 0);
    }

    #[test]
    fn pagination_clamps_and_reports_totals() {
        let articles = seed_articles();
        let page_one = FeedQuery {
            sort: SortOrder::Recent,
            page_size: Some(3),
            ..FeedQuery::default()
        };
        let slice = run_query(&articles, &page_one);
        assert_eq!(ids(&slice), vec!["1", "2", "3"]);
        assert_eq!(slice.total, 8);

        let page_three = FeedQuery {
            sort: SortOrder::Recent,
            page: Some(3),
            page_size: Some(3),
            ..FeedQuery::default()
        };
        assert_eq!(ids(&run_query(&articles, &page_three)), vec!["7", "8"]);

        let beyond = FeedQuery {
            page: Some(99),
            ..FeedQuery::default()
        };
        let empty = run_query(&articles, &beyond);
        assert!(empty.articles.is_empty());
        assert_eq!(empty.total, 8);

        let oversized = FeedQuery {
            page_size: Some(500),
            ..FeedQuery::default()
        };
        assert_eq!(run_query(&articles, &oversized).page_size, MAX_PAGE_SIZE);
    }
}
