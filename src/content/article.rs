use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trust classification attached to every article. Scores come from an
/// external verification pipeline; this crate only buckets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredibilityLevel {
    Verified,
    Questionable,
    Fake,
}

impl CredibilityLevel {
    pub const VERIFIED_MIN: u8 = 70;
    pub const QUESTIONABLE_MIN: u8 = 40;

    pub fn from_score(score: u8) -> CredibilityLevel {
        if score >= Self::VERIFIED_MIN {
            CredibilityLevel::Verified
        } else if score >= Self::QUESTIONABLE_MIN {
            CredibilityLevel::Questionable
        } else {
            CredibilityLevel::Fake
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredibilityLevel::Verified => "verified",
            CredibilityLevel::Questionable => "questionable",
            CredibilityLevel::Fake => "fake",
        }
    }
}

/// Publication state. Journalist submissions tied to an organization wait
/// for review; everything else goes straight out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Published,
    PendingReview,
}

/// Categories a submission may use. The feed additionally accepts the
/// pseudo-category "All", which is a filter value, not a category.
pub const ARTICLE_CATEGORIES: &[&str] = &[
    "Politics",
    "Technology",
    "Science",
    "Health",
    "Environment",
    "Economy",
    "Sports",
    "Entertainment",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// Raw authored HTML. Sanitized at the serving boundary, never here.
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    pub image: String,
    pub category: String,
    pub credibility: CredibilityLevel,
    pub credibility_score: u8,
    pub read_time: String,
    pub views: u64,
    pub comment_count: u64,
    pub likes: u64,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub featured: bool,
    pub status: ArticleStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub author_avatar: Option<String>,
    /// Plain text; tag-stripped before it is stored.
    pub content: String,
    pub likes: u64,
    pub posted_at: DateTime<Utc>,
}

/// Article submission as it arrives from the authoring form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub featured_image: Option<String>,
}

/// Estimate a read time from the text of the body, at a couple hundred
/// words a minute.
pub fn read_time_for(content: &str) -> String {
    let words = crate::sanitize::sanitize_text(content)
        .split_whitespace()
        .count();
    let minutes = (words / 200).max(1);
    format!("{minutes} min read")
}
