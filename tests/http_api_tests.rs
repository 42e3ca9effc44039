//! End-to-end HTTP API tests: a real server on an ephemeral localhost port
//! driven by a real client. Covers the cookie + CSRF session flow, the
//! role-guarded routes answering with redirects, engagement endpoints, and
//! sanitization applied to everything on the way out.

use serde_json::{json, Value};
use tokio::task::JoinHandle;

use truthtrack::content::ArticleCatalog;
use truthtrack::identity::SessionStore;
use truthtrack::server::{router, AppState};

// Start the HTTP server on an ephemeral port. Caller aborts the handle to
// stop the server.
async fn start_server() -> (JoinHandle<()>, String) {
    let state = AppState::new(
        SessionStore::with_test_users(),
        ArticleCatalog::with_seed_data(),
    );
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind 127.0.0.1:0");
    let port = listener.local_addr().expect("local addr").port();
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("http server task error: {e:?}");
        }
    });
    (handle, format!("http://127.0.0.1:{port}"))
}

// Redirects stay visible to the tests; the cookie is carried by hand because
// the session cookie is marked Secure and the test transport is plain http.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

/// Log in and return the session cookie pair and the CSRF token.
async fn login(client: &reqwest::Client, base: &str, email: &str, password: &str) -> (String, String) {
    let resp = client
        .post(format!("{base}/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status().as_u16(), 200, "login {email}");
    let cookie = resp
        .headers()
        .get("set-cookie")
        .expect("set-cookie header")
        .to_str()
        .expect("cookie str")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string();
    let body: Value = resp.json().await.expect("login body");
    let csrf = body["csrf"].as_str().expect("csrf token").to_string();
    (cookie, csrf)
}

fn sample_submission() -> Value {
    json!({
        "title": "Reservoir Levels Recover After Wet Winter",
        "content": "<p>Storage is back to the seasonal average.</p>",
        "category": "Environment",
    })
}

#[tokio::test]
async fn login_logout_round_trip() {
    let (handle, base) = start_server().await;
    let client = client();

    // Wrong password is a 401, not an error page
    let resp = client
        .post(format!("{base}/login"))
        .json(&json!({"email": "reader@test.com", "password": "wrong"}))
        .send()
        .await
        .expect("bad login");
    assert_eq!(resp.status().as_u16(), 401);

    let (cookie, csrf) = login(&client, &base, "reader@test.com", "reader123").await;

    let me: Value = client
        .get(format!("{base}/me"))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("me")
        .json()
        .await
        .expect("me body");
    assert_eq!(me["authenticated"], json!(true));
    assert_eq!(me["principal"]["email"], json!("reader@test.com"));
    assert_eq!(me["principal"]["role"], json!("viewer"));

    let resp = client
        .post(format!("{base}/logout"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .send()
        .await
        .expect("logout");
    assert_eq!(resp.status().as_u16(), 200);

    let me: Value = client
        .get(format!("{base}/me"))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("me after logout")
        .json()
        .await
        .expect("me body");
    assert_eq!(me["authenticated"], json!(false));

    handle.abort();
}

#[tokio::test]
async fn a_fresh_login_invalidates_the_previous_cookie() {
    let (handle, base) = start_server().await;
    let client = client();

    let (reader_cookie, _) = login(&client, &base, "reader@test.com", "reader123").await;
    let (admin_cookie, _) = login(&client, &base, "admin@test.com", "admin123").await;

    let stale: Value = client
        .get(format!("{base}/me"))
        .header("Cookie", &reader_cookie)
        .send()
        .await
        .expect("stale me")
        .json()
        .await
        .expect("stale body");
    assert_eq!(stale["authenticated"], json!(false));

    let live: Value = client
        .get(format!("{base}/me"))
        .header("Cookie", &admin_cookie)
        .send()
        .await
        .expect("live me")
        .json()
        .await
        .expect("live body");
    assert_eq!(live["principal"]["role"], json!("admin"));

    handle.abort();
}

#[tokio::test]
async fn mutations_require_the_csrf_token() {
    let (handle, base) = start_server().await;
    let client = client();
    let (cookie, csrf) = login(&client, &base, "reader@test.com", "reader123").await;

    // No token, wrong token, then the real one
    let resp = client
        .post(format!("{base}/articles/1/like"))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("like without token");
    assert_eq!(resp.status().as_u16(), 403);

    let resp = client
        .post(format!("{base}/articles/1/like"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", "bogus")
        .send()
        .await
        .expect("like with bogus token");
    assert_eq!(resp.status().as_u16(), 403);

    let body: Value = client
        .post(format!("{base}/articles/1/like"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .send()
        .await
        .expect("like")
        .json()
        .await
        .expect("like body");
    assert_eq!(body["liked"], json!(true));
    assert_eq!(body["likes"], json!(1251));

    // Liking again takes it back
    let body: Value = client
        .post(format!("{base}/articles/1/like"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .send()
        .await
        .expect("unlike")
        .json()
        .await
        .expect("unlike body");
    assert_eq!(body["liked"], json!(false));
    assert_eq!(body["likes"], json!(1250));

    handle.abort();
}

#[tokio::test]
async fn feed_filters_sort_and_paginate_over_http() {
    let (handle, base) = start_server().await;
    let client = client();

    let feed: Value = client
        .get(format!("{base}/feed"))
        .send()
        .await
        .expect("feed")
        .json()
        .await
        .expect("feed body");
    assert_eq!(feed["total"], json!(8));
    assert_eq!(feed["page"], json!(1));
    assert_eq!(feed["page_size"], json!(10));
    // Default order is trending, most viewed first
    assert_eq!(feed["articles"][0]["id"], json!("7"));
    // Summaries never carry the body
    assert!(feed["articles"][0].get("content").is_none());

    let health: Value = client
        .get(format!("{base}/feed?category=Health"))
        .send()
        .await
        .expect("health feed")
        .json()
        .await
        .expect("health body");
    assert_eq!(health["total"], json!(2));
    assert_eq!(health["articles"][0]["id"], json!("7"));
    assert_eq!(health["articles"][1]["id"], json!("5"));

    let page2: Value = client
        .get(format!("{base}/feed?sort=recent&page_size=3&page=2"))
        .send()
        .await
        .expect("page 2")
        .json()
        .await
        .expect("page body");
    let ids: Vec<&str> = page2["articles"]
        .as_array()
        .expect("articles array")
        .iter()
        .map(|a| a["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["4", "5", "6"]);
    assert_eq!(page2["total"], json!(8));

    let fake: Value = client
        .get(format!("{base}/feed?credibility=fake"))
        .send()
        .await
        .expect("fake feed")
        .json()
        .await
        .expect("fake body");
    assert_eq!(fake["total"], json!(1));
    assert_eq!(fake["articles"][0]["credibility"], json!("fake"));

    handle.abort();
}

#[tokio::test]
async fn article_reads_count_views_and_serve_comments_newest_first() {
    let (handle, base) = start_server().await;
    let client = client();

    let first: Value = client
        .get(format!("{base}/articles/1"))
        .send()
        .await
        .expect("article")
        .json()
        .await
        .expect("article body");
    assert_eq!(first["article"]["views"], json!(45201));
    assert!(first["article"]["content"]
        .as_str()
        .expect("content")
        .contains("<p>"));
    let comments = first["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0]["author"], json!("Michael Chen"));

    let second: Value = client
        .get(format!("{base}/articles/1"))
        .send()
        .await
        .expect("article again")
        .json()
        .await
        .expect("article body");
    assert_eq!(second["article"]["views"], json!(45202));

    handle.abort();
}

#[tokio::test]
async fn hostile_submissions_are_served_clean() {
    let (handle, base) = start_server().await;
    let client = client();
    let (cookie, csrf) = login(&client, &base, "journalist@test.com", "journalist123").await;

    let resp = client
        .post(format!("{base}/articles"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .json(&json!({
            "title": "Totally <script>alert(1)</script> Legit",
            "content": "<p onclick=\"pwn()\">Read</p><script>steal()</script><a href=\"javascript:alert(1)\">src</a>",
            "category": "Technology",
        }))
        .send()
        .await
        .expect("submit");
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.expect("submit body");
    let article = &body["article"];
    // Journalist submissions with an organization wait for review
    assert_eq!(article["status"], json!("pending_review"));
    let content = article["content"].as_str().expect("content");
    assert!(!content.contains("script"), "served content: {content}");
    assert!(!content.contains("onclick"));
    assert!(!content.contains("javascript:"));
    assert!(content.contains("<p>Read</p>"));
    let title = article["title"].as_str().expect("title");
    assert!(!title.contains('<'));

    // The stored copy is served just as clean
    let id = article["id"].as_str().expect("id");
    let fetched: Value = client
        .get(format!("{base}/articles/{id}"))
        .send()
        .await
        .expect("fetch")
        .json()
        .await
        .expect("fetch body");
    let content = fetched["article"]["content"].as_str().expect("content");
    assert!(!content.contains("script"));

    // Admin submissions publish straight into the feed, so the cards have to
    // come out as clean as the article route serves them
    let (cookie, csrf) = login(&client, &base, "admin@test.com", "admin123").await;
    let resp = client
        .post(format!("{base}/articles"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .json(&json!({
            "title": "Totally <script>alert(1)</script> Legit",
            "excerpt": "tricked <img src=x onerror=alert(2)> you",
            "content": "<p>Body</p>",
            "category": "Technology",
        }))
        .send()
        .await
        .expect("admin submit");
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.expect("admin submit body");
    assert_eq!(body["article"]["status"], json!("published"));
    let id = body["article"]["id"].as_str().expect("id").to_string();

    let feed: Value = client
        .get(format!("{base}/feed?sort=recent"))
        .send()
        .await
        .expect("feed")
        .json()
        .await
        .expect("feed body");
    let cards = feed["articles"].as_array().expect("articles");
    let card = cards
        .iter()
        .find(|c| c["id"] == id.as_str())
        .expect("published submission listed in the feed");
    let title = card["title"].as_str().expect("card title");
    assert!(
        !title.contains('<') && !title.contains("alert"),
        "feed title: {title}"
    );
    assert!(title.contains("Totally") && title.contains("Legit"));
    let excerpt = card["excerpt"].as_str().expect("card excerpt");
    assert!(
        !excerpt.contains('<') && !excerpt.contains("onerror") && !excerpt.contains("alert"),
        "feed excerpt: {excerpt}"
    );
    assert!(excerpt.contains("tricked") && excerpt.contains("you"));

    handle.abort();
}

#[tokio::test]
async fn authoring_and_admin_routes_redirect_unauthorized_callers() {
    let (handle, base) = start_server().await;
    let client = client();

    // Signed out: both guarded routes bounce to login
    let resp = client
        .post(format!("{base}/articles"))
        .json(&sample_submission())
        .send()
        .await
        .expect("anon submit");
    assert_eq!(resp.status().as_u16(), 303);
    assert_eq!(resp.headers()["location"], "/login");

    let resp = client
        .get(format!("{base}/admin/overview"))
        .send()
        .await
        .expect("anon overview");
    assert_eq!(resp.status().as_u16(), 303);
    assert_eq!(resp.headers()["location"], "/login");

    // A reader is authenticated but still not allowed to author
    let (cookie, csrf) = login(&client, &base, "reader@test.com", "reader123").await;
    let resp = client
        .post(format!("{base}/articles"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .json(&sample_submission())
        .send()
        .await
        .expect("reader submit");
    assert_eq!(resp.status().as_u16(), 303);
    assert_eq!(resp.headers()["location"], "/login");

    // The admin gets the live totals
    let (cookie, _) = login(&client, &base, "admin@test.com", "admin123").await;
    let overview: Value = client
        .get(format!("{base}/admin/overview"))
        .header("Cookie", &cookie)
        .send()
        .await
        .expect("admin overview")
        .json()
        .await
        .expect("overview body");
    assert_eq!(overview["articles"], json!(8));
    assert_eq!(overview["published"], json!(8));
    assert_eq!(overview["pending_review"], json!(0));

    handle.abort();
}

#[tokio::test]
async fn dashboard_dispatch_over_http() {
    let (handle, base) = start_server().await;
    let client = client();

    let resp = client
        .get(format!("{base}/dashboard"))
        .send()
        .await
        .expect("anon dashboard");
    assert_eq!(resp.status().as_u16(), 303);
    assert_eq!(resp.headers()["location"], "/login");

    for (email, password, view) in [
        ("reader@test.com", "reader123", "reader-dashboard"),
        ("journalist@test.com", "journalist123", "journalist-dashboard"),
        ("org@test.com", "org123", "organization-dashboard"),
        ("admin@test.com", "admin123", "admin-dashboard"),
    ] {
        let (cookie, _) = login(&client, &base, email, password).await;
        let body: Value = client
            .get(format!("{base}/dashboard"))
            .header("Cookie", &cookie)
            .send()
            .await
            .expect("dashboard")
            .json()
            .await
            .expect("dashboard body");
        assert_eq!(body["dashboard"], json!(view), "for {email}");
        assert!(body["stats"].is_object() || body["stats"].is_array());
    }

    handle.abort();
}

#[tokio::test]
async fn missing_articles_and_routes_are_json_404s() {
    let (handle, base) = start_server().await;
    let client = client();

    let resp = client
        .get(format!("{base}/articles/999"))
        .send()
        .await
        .expect("missing article");
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["status"], json!("error"));
    assert_eq!(body["code"], json!("ART404"));

    let resp = client
        .get(format!("{base}/no/such/route"))
        .send()
        .await
        .expect("missing route");
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.expect("fallback body");
    assert_eq!(body["status"], json!("not_found"));

    handle.abort();
}

#[tokio::test]
async fn comments_are_stored_and_served_as_plain_text() {
    let (handle, base) = start_server().await;
    let client = client();
    let (cookie, csrf) = login(&client, &base, "reader@test.com", "reader123").await;

    let resp = client
        .post(format!("{base}/articles/1/comments"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .json(&json!({"text": "<b>bold</b> take, honestly"}))
        .send()
        .await
        .expect("comment");
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.expect("comment body");
    assert_eq!(body["comment"]["content"], json!("bold take, honestly"));
    assert_eq!(body["comment"]["author"], json!("John Reader"));

    // Tag-only input collapses to nothing and is rejected
    let resp = client
        .post(format!("{base}/articles/1/comments"))
        .header("Cookie", &cookie)
        .header("x-csrf-token", &csrf)
        .json(&json!({"text": "<p>   </p>"}))
        .send()
        .await
        .expect("empty comment");
    assert_eq!(resp.status().as_u16(), 400);

    handle.abort();
}
