use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::identity::{Principal, Role};
use crate::tprintln;

use super::article::{
    read_time_for, Article, ArticleStatus, Comment, CredibilityLevel, NewArticle,
    ARTICLE_CATEGORIES,
};
use super::feed::{run_query, FeedQuery, FeedSlice};

/// Outcome of a like toggle: the caller's new state and the adjusted count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u64,
}

struct CatalogState {
    articles: Vec<Article>,
    comments: HashMap<String, Vec<Comment>>,
    /// principal ids currently liking each article
    liked_by: HashMap<String, HashSet<String>>,
    /// article ids bookmarked per principal
    bookmarks: HashMap<String, HashSet<String>>,
    /// principals who reported each article, deduplicated
    reporters: HashMap<String, HashSet<String>>,
    next_article_id: u64,
}

/// In-memory article store. Seeded from fixtures at startup; all engagement
/// (likes, bookmarks, comments, reports) mutates real state and reports real
/// failures instead of pretending unknown ids succeeded.
pub struct ArticleCatalog {
    state: RwLock<CatalogState>,
}

impl ArticleCatalog {
    pub fn new(articles: Vec<Article>) -> Self {
        let next_article_id = articles
            .iter()
            .filter_map(|a| a.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        ArticleCatalog {
            state: RwLock::new(CatalogState {
                articles,
                comments: HashMap::new(),
                liked_by: HashMap::new(),
                bookmarks: HashMap::new(),
                reporters: HashMap::new(),
                next_article_id,
            }),
        }
    }

    /// Catalog pre-loaded with the demo newsroom data.
    pub fn with_seed_data() -> Self {
        let catalog = ArticleCatalog::new(seed_articles());
        {
            let mut state = catalog.state.write();
            state.comments.insert("1".to_string(), seed_comments());
        }
        catalog
    }

    /// Look up one article. The returned copy carries the live like count.
    pub fn get(&self, id: &str) -> AppResult<Article> {
        let state = self.state.read();
        let article = find(&state, id)?;
        Ok(with_live_counts(&state, article))
    }

    /// Every article in the catalog, live counts applied.
    pub fn all(&self) -> Vec<Article> {
        let state = self.state.read();
        state
            .articles
            .iter()
            .map(|a| with_live_counts(&state, a))
            .collect()
    }

    pub fn feed(&self, query: &FeedQuery) -> FeedSlice {
        let state = self.state.read();
        run_query(&state.articles, query)
    }

    /// Count a read of an article. Returns the updated total.
    pub fn record_view(&self, id: &str) -> AppResult<u64> {
        let mut state = self.state.write();
        let idx = position(&state, id)?;
        state.articles[idx].views += 1;
        Ok(state.articles[idx].views)
    }

    /// Flip the caller's like on an article.
    pub fn toggle_like(&self, id: &str, principal_id: &str) -> AppResult<LikeState> {
        let mut state = self.state.write();
        let base = find(&state, id)?.likes;
        let likers = state.liked_by.entry(id.to_string()).or_default();
        let liked = if likers.remove(principal_id) {
            false
        } else {
            likers.insert(principal_id.to_string());
            true
        };
        Ok(LikeState {
            liked,
            likes: base + state.liked_by.get(id).map_or(0, |s| s.len() as u64),
        })
    }

    /// Flip a bookmark; returns whether the article is bookmarked now.
    pub fn toggle_bookmark(&self, id: &str, principal_id: &str) -> AppResult<bool> {
        let mut state = self.state.write();
        find(&state, id)?;
        let marks = state.bookmarks.entry(principal_id.to_string()).or_default();
        if marks.remove(id) {
            Ok(false)
        } else {
            marks.insert(id.to_string());
            Ok(true)
        }
    }

    /// Articles the principal has bookmarked, in catalog order.
    pub fn bookmarks_for(&self, principal_id: &str) -> Vec<Article> {
        let state = self.state.read();
        let Some(marks) = state.bookmarks.get(principal_id) else {
            return Vec::new();
        };
        state
            .articles
            .iter()
            .filter(|a| marks.contains(&a.id))
            .map(|a| with_live_counts(&state, a))
            .collect()
    }

    /// Record a report against an article, once per principal. Returns the
    /// number of distinct reporters.
    pub fn report(&self, id: &str, principal_id: &str) -> AppResult<u64> {
        let mut state = self.state.write();
        find(&state, id)?;
        let reporters = state.reporters.entry(id.to_string()).or_default();
        reporters.insert(principal_id.to_string());
        let total = reporters.len() as u64;
        tprintln!("content.report article={} reporters={}", id, total);
        Ok(total)
    }

    /// Comments on an article, newest first.
    pub fn comments(&self, id: &str) -> AppResult<Vec<Comment>> {
        let state = self.state.read();
        find(&state, id)?;
        let mut list = state.comments.get(id).cloned().unwrap_or_default();
        list.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(list)
    }

    /// Attach a comment. The text is reduced to plain text before storage;
    /// a comment that is empty once markup is stripped is rejected.
    pub fn add_comment(&self, id: &str, author: &Principal, text: &str) -> AppResult<Comment> {
        let content = crate::sanitize::sanitize_text(text);
        if content.trim().is_empty() {
            return Err(AppError::user("COMMENT_EMPTY", "comment text is required"));
        }
        let mut state = self.state.write();
        let idx = position(&state, id)?;
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author: author.name.clone(),
            author_avatar: author.profile.avatar.clone(),
            content: content.trim().to_string(),
            likes: 0,
            posted_at: Utc::now(),
        };
        state.articles[idx].comment_count += 1;
        state
            .comments
            .entry(id.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    /// Accept a submission from the authoring form. Journalists attached to
    /// an organization go through review; admins and independents publish
    /// directly.
    pub fn publish(&self, new: NewArticle, author: &Principal) -> AppResult<Article> {
        let title = new.title.trim();
        let content = new.content.trim();
        let category = new.category.trim();
        if title.is_empty() || content.is_empty() || category.is_empty() {
            return Err(AppError::user(
                "ART_FIELDS",
                "Please fill in all required fields",
            ));
        }
        if !ARTICLE_CATEGORIES.contains(&category) {
            return Err(AppError::user(
                "ART_CATEGORY",
                format!("unknown category: {category}"),
            ));
        }
        let status = if author.role == Role::Journalist && author.profile.organization.is_some() {
            ArticleStatus::PendingReview
        } else {
            ArticleStatus::Published
        };
        let excerpt = if new.excerpt.trim().is_empty() {
            derive_excerpt(content)
        } else {
            new.excerpt.trim().to_string()
        };
        // new submissions start mid-scale until the verification pipeline
        // scores them
        let score = 50;
        let mut state = self.state.write();
        let id = state.next_article_id.to_string();
        state.next_article_id += 1;
        let article = Article {
            id: id.clone(),
            title: title.to_string(),
            excerpt,
            content: content.to_string(),
            author: author.name.clone(),
            author_avatar: author.profile.avatar.clone(),
            organization: author.profile.organization.clone(),
            image: new.featured_image.unwrap_or_default(),
            category: category.to_string(),
            credibility: CredibilityLevel::from_score(score),
            credibility_score: score,
            read_time: read_time_for(content),
            views: 0,
            comment_count: 0,
            likes: 0,
            published_at: Utc::now(),
            featured: false,
            status,
        };
        state.articles.push(article.clone());
        tprintln!(
            "content.publish article={} author={} status={:?}",
            id,
            author.email,
            status
        );
        Ok(article)
    }

    pub fn len(&self) -> usize {
        self.state.read().articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().articles.is_empty()
    }
}

fn find<'a>(state: &'a CatalogState, id: &str) -> AppResult<&'a Article> {
    state
        .articles
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| AppError::not_found("ART404", format!("article {id} not found")))
}

fn position(state: &CatalogState, id: &str) -> AppResult<usize> {
    state
        .articles
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| AppError::not_found("ART404", format!("article {id} not found")))
}

fn with_live_counts(state: &CatalogState, article: &Article) -> Article {
    let mut out = article.clone();
    out.likes += state.liked_by.get(&article.id).map_or(0, |s| s.len() as u64);
    out
}

fn derive_excerpt(content: &str) -> String {
    let text = crate::sanitize::sanitize_text(content);
    let mut excerpt: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if excerpt.len() > 160 {
        excerpt.truncate(
            excerpt
                .char_indices()
                .take_while(|(i, _)| *i <= 157)
                .last()
                .map_or(0, |(i, c)| i + c.len_utf8()),
        );
        excerpt.push_str("...");
    }
    excerpt
}

fn seeded_at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn seed_comments() -> Vec<Comment> {
    vec![
        Comment {
            id: Uuid::new_v4().to_string(),
            author: "Michael Chen".to_string(),
            author_avatar: Some(
                "https://images.unsplash.com/photo-1599566150163-29194dcaad36?w=50".to_string(),
            ),
            content: "This is incredible news! Finally some real action on climate change."
                .to_string(),
            likes: 45,
            posted_at: seeded_at("2026-01-15T10:00:00Z"),
        },
        Comment {
            id: Uuid::new_v4().to_string(),
            author: "Emily Watson".to_string(),
            author_avatar: Some(
                "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=50".to_string(),
            ),
            content: "I hope countries actually follow through on their commitments this time."
                .to_string(),
            likes: 32,
            posted_at: seeded_at("2026-01-15T09:00:00Z"),
        },
        Comment {
            id: Uuid::new_v4().to_string(),
            author: "David Park".to_string(),
            author_avatar: Some(
                "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=50".to_string(),
            ),
            content: "The economic implications are concerning, but we need to act now."
                .to_string(),
            likes: 18,
            posted_at: seeded_at("2026-01-15T08:00:00Z"),
        },
    ]
}

/// Demo newsroom fixtures. Timestamps are fixed so feed ordering is stable
/// across runs.
pub fn seed_articles() -> Vec<Article> {
    vec![
        Article {
            id: "1".to_string(),
            title: "Global Climate Summit Reaches Historic Agreement on Emissions".to_string(),
            excerpt: "World leaders have agreed on unprecedented measures to reduce carbon emissions by 60% before 2040, marking a pivotal moment in the fight against climate change.".to_string(),
            content: r#"<p>World leaders have agreed on unprecedented measures to reduce carbon emissions by 60% before 2040, marking a pivotal moment in the fight against climate change.</p>
<p>The agreement, reached after two weeks of intense negotiations in Geneva, represents the most ambitious climate action plan ever adopted by the international community. Representatives from 195 countries signed the accord, which includes binding commitments and enforcement mechanisms.</p>
<h2>Key Points of the Agreement</h2>
<p>The new framework establishes several groundbreaking provisions:</p>
<ul>
<li>A 60% reduction in global carbon emissions by 2040</li>
<li>$500 billion annual fund for developing nations</li>
<li>Phase-out of coal power by 2035 in developed nations</li>
<li>Mandatory emissions reporting for all major corporations</li>
</ul>
<p>"This is a watershed moment for humanity," said UN Secretary-General in a press conference following the signing ceremony. "For the first time, we have a truly global commitment to address the climate crisis with the urgency it demands."</p>
<h2>Implementation Challenges</h2>
<p>While the agreement has been widely praised, experts note that implementation will be challenging. Several major industrial nations have expressed concerns about the economic impact of such rapid decarbonization.</p>
<p>However, environmental groups and climate scientists have largely welcomed the accord as a necessary step toward limiting global warming to 1.5 degrees Celsius above pre-industrial levels.</p>"#.to_string(),
            author: "Sarah Mitchell".to_string(),
            author_avatar: Some("https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=100".to_string()),
            organization: Some("Climate Watch Network".to_string()),
            image: "https://images.unsplash.com/photo-1569163139599-0f4517e36f51?w=1200".to_string(),
            category: "Environment".to_string(),
            credibility: CredibilityLevel::Verified,
            credibility_score: 98,
            read_time: "8 min read".to_string(),
            views: 45200,
            comment_count: 342,
            likes: 1250,
            published_at: seeded_at("2026-01-15T10:00:00Z"),
            featured: true,
            status: ArticleStatus::Published,
        },
        Article {
            id: "2".to_string(),
            title: "Tech Giants Face New Regulations Over Data Privacy".to_string(),
            excerpt: "Major technology companies will be required to implement stricter data protection measures under new legislation.".to_string(),
            content: r#"<p>Major technology companies will be required to implement stricter data protection measures under new legislation passed this week.</p>
<p>The sweeping reforms, which affect all companies handling personal data of EU citizens, mandate transparent data collection practices and give users greater control over their information.</p>
<h2>What's Changing</h2>
<p>The new regulations include:</p>
<ul>
<li>Mandatory opt-in for data collection</li>
<li>Right to delete all personal data</li>
<li>Real-time data breach notifications</li>
<li>Penalties up to 4% of global revenue for violations</li>
</ul>
<p>Industry leaders have expressed mixed reactions, with some praising the move while others warn of compliance costs and implementation challenges.</p>
<p>"User privacy must be the top priority in the digital age," said a spokesperson for the regulatory body. "These measures ensure that companies put users first."</p>"#.to_string(),
            author: "James Chen".to_string(),
            author_avatar: Some("https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=100".to_string()),
            organization: Some("Tech Insider".to_string()),
            image: "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?w=1200".to_string(),
            category: "Technology".to_string(),
            credibility: CredibilityLevel::Verified,
            credibility_score: 95,
            read_time: "5 min read".to_string(),
            views: 28100,
            comment_count: 156,
            likes: 892,
            published_at: seeded_at("2026-01-15T08:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
        Article {
            id: "3".to_string(),
            title: "Breakthrough in Renewable Energy Storage Technology".to_string(),
            excerpt: "Scientists announce a major advancement in battery technology that could revolutionize solar and wind power storage capabilities.".to_string(),
            content: r#"<p>A team of researchers has developed a revolutionary battery technology that could dramatically improve energy storage for renewable sources.</p>
<p>The new lithium-silicon batteries can store 50% more energy than conventional lithium-ion batteries while costing 30% less to produce.</p>
<h2>Technical Innovation</h2>
<p>The breakthrough involves a novel electrode design that prevents degradation and extends battery life to over 10,000 charge cycles.</p>
<p>Key advantages include:</p>
<ul>
<li>50% higher energy density</li>
<li>30% lower production costs</li>
<li>Extended lifespan to 15+ years</li>
<li>Faster charging capabilities</li>
</ul>
<p>"This could be the key to making renewable energy truly viable at scale," said Dr. Emily Watson, lead researcher on the project.</p>
<p>Commercial production is expected to begin within 18 months, with major energy companies already expressing interest.</p>"#.to_string(),
            author: "Dr. Emily Watson".to_string(),
            author_avatar: Some("https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=100".to_string()),
            organization: Some("Science Daily".to_string()),
            image: "https://images.unsplash.com/photo-1509391366360-2e959784a276?w=1200".to_string(),
            category: "Science".to_string(),
            credibility: CredibilityLevel::Verified,
            credibility_score: 97,
            read_time: "6 min read".to_string(),
            views: 31500,
            comment_count: 89,
            likes: 756,
            published_at: seeded_at("2026-01-15T07:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
        Article {
            id: "4".to_string(),
            title: "Economic Report Claims Unprecedented Growth Figures".to_string(),
            excerpt: "Recent claims about economic growth figures are under scrutiny as experts question the methodology used in the analysis.".to_string(),
            content: r#"<p>A recently released economic report claiming record-breaking growth has drawn criticism from economists who question its methodology.</p>
<p>The report, published by an independent think tank, suggests GDP growth of 8.5% - significantly higher than official government figures of 3.2%.</p>
<h2>Methodology Concerns</h2>
<p>Several prominent economists have raised concerns about:</p>
<ul>
<li>Selective data sampling</li>
<li>Unverified primary sources</li>
<li>Lack of peer review</li>
<li>Potential conflicts of interest</li>
</ul>
<p>"The numbers simply don't add up when compared to established economic indicators," stated a professor of economics at a major university.</p>
<p>The organization behind the report has defended its findings but has yet to release its raw data for independent verification.</p>
<p>Financial markets have largely ignored the report, with analysts recommending caution until the claims can be properly validated.</p>"#.to_string(),
            author: "Michael Rivera".to_string(),
            author_avatar: Some("https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=100".to_string()),
            organization: None,
            image: "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?w=1200".to_string(),
            category: "Economy".to_string(),
            credibility: CredibilityLevel::Questionable,
            credibility_score: 45,
            read_time: "4 min read".to_string(),
            views: 18700,
            comment_count: 234,
            likes: 423,
            published_at: seeded_at("2026-01-15T06:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
        Article {
            id: "5".to_string(),
            title: "New Study Reveals Impact of Social Media on Mental Health".to_string(),
            excerpt: "Research conducted across multiple countries shows significant correlations between social media usage and mental well-being.".to_string(),
            content: r#"<p>Research conducted across multiple countries shows significant correlations between social media usage and mental well-being.</p>
<p>The study followed participants over three years and found that moderated use paired with offline social contact showed the best outcomes. The authors caution against drawing causal conclusions and call for further longitudinal work.</p>"#.to_string(),
            author: "Dr. Lisa Park".to_string(),
            author_avatar: None,
            organization: Some("Health Research Institute".to_string()),
            image: "https://images.unsplash.com/photo-1611162616305-c69b3fa7fbe0?w=1200".to_string(),
            category: "Health".to_string(),
            credibility: CredibilityLevel::Verified,
            credibility_score: 92,
            read_time: "7 min read".to_string(),
            views: 22400,
            comment_count: 178,
            likes: 0,
            published_at: seeded_at("2026-01-15T05:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
        Article {
            id: "6".to_string(),
            title: "International Sports Federation Announces Major Rule Changes".to_string(),
            excerpt: "The governing body has approved significant modifications to competition rules that will take effect next season.".to_string(),
            content: r#"<p>The governing body has approved significant modifications to competition rules that will take effect next season.</p>
<p>Officials say the changes are intended to improve player safety and speed up play. Team representatives were consulted throughout the drafting process, and a transition period will run through the first half of the season.</p>"#.to_string(),
            author: "Carlos Martinez".to_string(),
            author_avatar: None,
            organization: Some("Sports Network".to_string()),
            image: "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=1200".to_string(),
            category: "Sports".to_string(),
            credibility: CredibilityLevel::Verified,
            credibility_score: 94,
            read_time: "4 min read".to_string(),
            views: 15800,
            comment_count: 67,
            likes: 0,
            published_at: seeded_at("2026-01-15T04:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
        Article {
            id: "7".to_string(),
            title: "Viral Claim About Vaccine Side Effects Debunked".to_string(),
            excerpt: "Fact-checkers have thoroughly investigated and disproven widespread claims about vaccine complications circulating online.".to_string(),
            content: r#"<p>Fact-checkers have thoroughly investigated and disproven widespread claims about vaccine complications circulating online.</p>
<p>The viral posts misrepresent a retracted preprint and attribute quotes to researchers who never made them. Health authorities in three countries issued statements correcting the record, and the original posts have been labeled as misleading on major platforms.</p>"#.to_string(),
            author: "Medical Review Team".to_string(),
            author_avatar: None,
            organization: Some("FactCheck Central".to_string()),
            image: "https://images.unsplash.com/photo-1584483766114-2cea6facdf57?w=1200".to_string(),
            category: "Health".to_string(),
            credibility: CredibilityLevel::Fake,
            credibility_score: 8,
            read_time: "5 min read".to_string(),
            views: 89200,
            comment_count: 1245,
            likes: 0,
            published_at: seeded_at("2026-01-15T03:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
        Article {
            id: "8".to_string(),
            title: "Space Agency Confirms New Exoplanet Discovery".to_string(),
            excerpt: "Astronomers have identified a potentially habitable planet in a nearby star system using advanced telescope technology.".to_string(),
            content: r#"<p>Astronomers have identified a potentially habitable planet in a nearby star system using advanced telescope technology.</p>
<p>The planet sits within its star's habitable zone and shows spectral signatures consistent with a water-bearing atmosphere. Follow-up observations are scheduled for later this year to refine mass and orbital estimates.</p>"#.to_string(),
            author: "Dr. Robert Chang".to_string(),
            author_avatar: None,
            organization: Some("Space Exploration Center".to_string()),
            image: "https://images.unsplash.com/photo-1446776811953-b23d57bd21aa?w=1200".to_string(),
            category: "Science".to_string(),
            credibility: CredibilityLevel::Verified,
            credibility_score: 99,
            read_time: "6 min read".to_string(),
            views: 52100,
            comment_count: 298,
            likes: 0,
            published_at: seeded_at("2026-01-15T02:00:00Z"),
            featured: false,
            status: ArticleStatus::Published,
        },
    ]
}
