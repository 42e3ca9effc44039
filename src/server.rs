//!
//! TruthTrack HTTP server
//! ----------------------
//! Axum-based HTTP API over the identity store and the article catalog.
//!
//! Responsibilities:
//! - Session management with a simple cookie + CSRF token model.
//! - Login/logout endpoints backed by the `identity` module.
//! - Feed, article, and engagement endpoints delegating to the catalog.
//! - Role-guarded authoring and dashboard routes; failed guards answer with
//!   a redirect, not an error page.
//! - Every piece of article or comment text is sanitized on the way out.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use getrandom::getrandom;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::content::{Article, ArticleCatalog, ArticleStatus, Comment, FeedQuery, NewArticle};
use crate::error::AppError;
use crate::identity::{
    check_access, resolve_dashboard, Access, AccessPolicy, Dashboard, DashboardRoute, Principal,
    Role, SessionStore,
};
use crate::sanitize::{sanitize_html, sanitize_text};

const SESSION_COOKIE: &str = "truthtrack_session";

/// Shared server state injected into all handlers.
///
/// Holds the single-slot session store, the article catalog, the session id
/// currently bound to the signed-in principal, and per-session CSRF tokens.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub catalog: Arc<ArticleCatalog>,
    /// Session id minted by the most recent login; older cookies go stale.
    pub active_sid: Arc<RwLock<Option<String>>>,
    /// Session id -> CSRF token mapping
    pub csrf_tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl AppState {
    pub fn new(session: SessionStore, catalog: ArticleCatalog) -> Self {
        AppState {
            session: Arc::new(session),
            catalog: Arc::new(catalog),
            active_sid: Arc::new(RwLock::new(None)),
            csrf_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message(),
        }));
        (status, body).into_response()
    }
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

fn set_session_cookie(sid: &str) -> HeaderValue {
    // Secure, HttpOnly cookie scoped to path / with SameSite=Strict
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE, sid
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn random_hex(len_bytes: usize) -> String {
    let mut bytes = vec![0u8; len_bytes];
    let _ = getrandom(&mut bytes);
    let mut out = String::with_capacity(len_bytes * 2);
    use std::fmt::Write as _;
    for b in &bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Resolve the principal for a request: the cookie must carry the session id
/// of the latest login, and the slot must still be occupied.
async fn current_principal(state: &AppState, headers: &HeaderMap) -> Option<Principal> {
    let sid = parse_cookie(headers, SESSION_COOKIE)?;
    let active = state.active_sid.read().await;
    if active.as_deref() != Some(sid.as_str()) {
        return None;
    }
    state.session.current_principal()
}

async fn validate_csrf(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(sid) = parse_cookie(headers, SESSION_COOKIE) else {
        return false;
    };
    let Some(provided) = headers
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
    else {
        return false;
    };
    let cmap = state.csrf_tokens.read().await;
    match cmap.get(&sid) {
        Some(expected) => expected == &provided,
        None => false,
    }
}

fn csrf_rejection() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"status":"forbidden","error":"invalid csrf"})),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"status":"unauthorized"})),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> Response {
    if !state.session.login(&payload.email, &payload.password) {
        // invalid credentials are an expected outcome, not a server fault
        return unauthorized();
    }
    let sid = random_hex(16);
    let csrf = random_hex(32);
    {
        let mut active = state.active_sid.write().await;
        *active = Some(sid.clone());
    }
    {
        let mut cmap = state.csrf_tokens.write().await;
        // a fresh login invalidates tokens from earlier sessions
        cmap.clear();
        cmap.insert(sid.clone(), csrf.clone());
    }
    let principal = state.session.current_principal();
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", set_session_cookie(&sid));
    (
        StatusCode::OK,
        headers,
        Json(json!({"status":"ok","csrf": csrf,"principal": principal})),
    )
        .into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !validate_csrf(&state, &headers).await {
        return csrf_rejection();
    }
    if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
        let mut active = state.active_sid.write().await;
        if active.as_deref() == Some(sid.as_str()) {
            *active = None;
            state.session.logout();
        }
        let mut cmap = state.csrf_tokens.write().await;
        cmap.remove(&sid);
    }
    let mut h = HeaderMap::new();
    h.insert("Set-Cookie", clear_session_cookie());
    (StatusCode::OK, h, Json(json!({"status":"ok"}))).into_response()
}

async fn whoami(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_principal(&state, &headers).await {
        Some(p) => Json(json!({"authenticated": true, "principal": p})).into_response(),
        None => Json(json!({"authenticated": false})).into_response(),
    }
}

async fn get_csrf(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) else {
        return unauthorized();
    };
    let cmap = state.csrf_tokens.read().await;
    match cmap.get(&sid) {
        Some(token) => Json(json!({"csrf": token})).into_response(),
        None => unauthorized(),
    }
}

async fn feed(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    let mut slice = state.catalog.feed(&query);
    // Cards are a render surface too; titles and excerpts leave as plain text.
    for card in &mut slice.articles {
        card.title = sanitize_text(&card.title);
        card.excerpt = sanitize_text(&card.excerpt);
    }
    Json(slice).into_response()
}

/// Article body and comment text cross the render boundary here, so this is
/// where sanitization is applied. Nothing downstream sees the raw content.
fn article_response(article: &Article) -> serde_json::Value {
    let mut value = json!(article);
    value["content"] = json!(sanitize_html(&article.content));
    value["title"] = json!(sanitize_text(&article.title));
    value["excerpt"] = json!(sanitize_text(&article.excerpt));
    value
}

fn comment_response(comment: &Comment) -> serde_json::Value {
    let mut value = json!(comment);
    value["content"] = json!(sanitize_text(&comment.content));
    value
}

async fn article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let mut article = state.catalog.get(&id)?;
    article.views = state.catalog.record_view(&id)?;
    let comments = state.catalog.comments(&id)?;
    Ok(Json(json!({
        "article": article_response(&article),
        "comments": comments.iter().map(comment_response).collect::<Vec<_>>(),
    }))
    .into_response())
}

async fn like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(principal) = current_principal(&state, &headers).await else {
        return Ok(unauthorized());
    };
    if !validate_csrf(&state, &headers).await {
        return Ok(csrf_rejection());
    }
    let state_change = state.catalog.toggle_like(&id, &principal.id)?;
    Ok(Json(json!({"status":"ok","liked": state_change.liked, "likes": state_change.likes})).into_response())
}

async fn bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(principal) = current_principal(&state, &headers).await else {
        return Ok(unauthorized());
    };
    if !validate_csrf(&state, &headers).await {
        return Ok(csrf_rejection());
    }
    let bookmarked = state.catalog.toggle_bookmark(&id, &principal.id)?;
    Ok(Json(json!({"status":"ok","bookmarked": bookmarked})).into_response())
}

async fn report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(principal) = current_principal(&state, &headers).await else {
        return Ok(unauthorized());
    };
    if !validate_csrf(&state, &headers).await {
        return Ok(csrf_rejection());
    }
    let reports = state.catalog.report(&id, &principal.id)?;
    Ok(Json(json!({"status":"ok","reports": reports})).into_response())
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    text: String,
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CommentPayload>,
) -> Result<Response, AppError> {
    let Some(principal) = current_principal(&state, &headers).await else {
        return Ok(unauthorized());
    };
    if !validate_csrf(&state, &headers).await {
        return Ok(csrf_rejection());
    }
    let comment = state.catalog.add_comment(&id, &principal, &payload.text)?;
    Ok((StatusCode::CREATED, Json(json!({"status":"ok","comment": comment}))).into_response())
}

/// Authoring roles for article submission.
const AUTHORING_ROLES: &[Role] = &[Role::Journalist, Role::Admin];

async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewArticle>,
) -> Result<Response, AppError> {
    let principal = current_principal(&state, &headers).await;
    match check_access(AccessPolicy::RequiresRole(AUTHORING_ROLES), principal.as_ref()) {
        Access::Granted => {}
        Access::RedirectLogin => return Ok(Redirect::to("/login").into_response()),
        Access::RedirectHome => return Ok(Redirect::to("/").into_response()),
    }
    if !validate_csrf(&state, &headers).await {
        return Ok(csrf_rejection());
    }
    // a granted check implies a principal
    let Some(author) = principal else {
        return Ok(unauthorized());
    };
    let article = state.catalog.publish(payload, &author)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"status":"ok","article": article_response(&article)})),
    )
        .into_response())
}

async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let principal = current_principal(&state, &headers).await;
    match resolve_dashboard(principal.as_ref()) {
        DashboardRoute::RedirectLogin => Redirect::to("/login").into_response(),
        DashboardRoute::RedirectHome => Redirect::to("/").into_response(),
        DashboardRoute::View(dash) => {
            let Some(p) = principal else {
                return Redirect::to("/login").into_response();
            };
            Json(json!({
                "dashboard": dash.view_id(),
                "principal": p,
                "stats": dashboard_stats(&state, dash, &p),
            }))
            .into_response()
        }
    }
}

/// Per-role headline stats. Live numbers where the catalog has them, fixture
/// numbers for the parts of the product that do not exist server-side yet.
fn dashboard_stats(state: &AppState, dash: Dashboard, principal: &Principal) -> serde_json::Value {
    match dash {
        Dashboard::Reader => {
            let bookmarks = state.catalog.bookmarks_for(&principal.id).len();
            json!([
                {"label": "Articles Read", "value": "142", "change": "+12 this week"},
                {"label": "Comments Made", "value": "28", "change": "+3 this week"},
                {"label": "Bookmarks", "value": bookmarks.to_string(), "change": "+5 this week"},
                {"label": "Reading Time", "value": "24h", "change": "+2h this week"},
            ])
        }
        Dashboard::Journalist => json!([
            {"label": "Total Articles", "value": "47", "change": "+3 this month"},
            {"label": "Total Views", "value": "125.4K", "change": "+15% vs last month"},
            {"label": "Engagement Rate", "value": "8.2%", "change": "+2.1%"},
            {"label": "Revenue", "value": "$2,450", "change": "+$350 this month"},
        ]),
        Dashboard::Organization => json!([
            {"label": "Team Members", "value": "12", "change": "+2 this month"},
            {"label": "Total Articles", "value": "156", "change": "+18 this month"},
            {"label": "Total Views", "value": "1.2M", "change": "+25% vs last month"},
            {"label": "Revenue", "value": "$15,240", "change": "+$2,100 this month"},
        ]),
        Dashboard::Admin => json!([
            {"label": "Total Users", "value": "45,230", "change": "+1,230 this month"},
            {"label": "Total Articles", "value": "12,450", "change": "+450 this month"},
            {"label": "Pending Reports", "value": "23", "change": "-5 today"},
            {"label": "Active Organizations", "value": "156", "change": "+8 this month"},
        ]),
    }
}

async fn admin_overview(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let principal = current_principal(&state, &headers).await;
    match check_access(AccessPolicy::RequiresRole(&[Role::Admin]), principal.as_ref()) {
        Access::Granted => {}
        Access::RedirectLogin => return Redirect::to("/login").into_response(),
        Access::RedirectHome => return Redirect::to("/").into_response(),
    }
    let articles = state.catalog.all();
    let published = articles
        .iter()
        .filter(|a| a.status == ArticleStatus::Published)
        .count();
    let pending = articles.len() - published;
    let total_comments: u64 = articles.iter().map(|a| a.comment_count).sum();
    let total_views: u64 = articles.iter().map(|a| a.views).sum();
    Json(json!({
        "status": "ok",
        "articles": articles.len(),
        "published": published,
        "pending_review": pending,
        "total_comments": total_comments,
        "total_views": total_views,
    }))
    .into_response()
}

/// Landing payload: the product blurb and the marketing stat blocks.
async fn index() -> Response {
    Json(json!({
        "name": "TruthTrack",
        "tagline": "Truth in Every Story",
        "description": "TruthTrack uses advanced AI to detect fake news and combat misinformation. Stay informed with verified content from credible journalists worldwide.",
        "stats": [
            {"value": "99.2%", "label": "Detection Accuracy"},
            {"value": "50K+", "label": "Verified Articles"},
            {"value": "10K+", "label": "Active Journalists"},
            {"value": "2M+", "label": "Informed Readers"},
        ],
    }))
    .into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status":"not_found"})),
    )
        .into_response()
}

/// Mount all routes over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/csrf", get(get_csrf))
        .route("/me", get(whoami))
        .route("/feed", get(feed))
        .route("/articles", post(create_article))
        .route("/articles/{id}", get(article))
        .route("/articles/{id}/like", post(like))
        .route("/articles/{id}/bookmark", post(bookmark))
        .route("/articles/{id}/report", post(report))
        .route("/articles/{id}/comments", post(add_comment))
        .route("/dashboard", get(dashboard))
        .route("/admin/overview", get(admin_overview))
        .fallback(not_found)
        .with_state(state)
}

fn log_startup_inventory(state: &AppState) {
    info!(
        target: "startup",
        "TruthTrack starting. catalog_articles={}, registered_identities={}",
        state.catalog.len(),
        state.session.registered()
    );
}

/// Start the TruthTrack HTTP server bound to the given port.
///
/// Seeds the demo catalog and test identities, mounts all routes, and
/// serves until the process is stopped.
pub async fn run_with_port(http_port: u16) -> anyhow::Result<()> {
    let state = AppState::new(
        SessionStore::with_test_users(),
        ArticleCatalog::with_seed_data(),
    );
    log_startup_inventory(&state);

    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("bind failed on {}: {}", addr, e);
        e
    })?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    let port = std::env::var("TRUTHTRACK_HTTP_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8080);
    run_with_port(port).await
}
