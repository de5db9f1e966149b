//! API integration tests against a running server.
//!
//! Expects `LIBRIS_BOOTSTRAP__ADMIN_USERNAME=admin` and
//! `LIBRIS_BOOTSTRAP__ADMIN_PASSWORD=adminpassword` so that a staff superuser exists.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

/// Log in and return the access token
async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login/", BASE_URL))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"]["access"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "adminpassword").await
}

/// Register a fresh member and return its access token
async fn member_token(client: &Client) -> String {
    let username = unique("reader");
    let response = client
        .post(format!("{}/auth/register/", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "correct-horse"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    login(client, &username, "correct-horse").await
}

async fn create_author(client: &Client, token: &str, name: &str) -> i64 {
    let response = client
        .post(format!("{}/authors/create/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"]["id"].as_i64().expect("No author ID")
}

async fn create_book(client: &Client, token: &str, title: &str, author: i64) -> i64 {
    let response = client
        .post(format!("{}/books/create/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "title": title, "author": author }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["available"], true);
    body["data"]["id"].as_i64().expect("No book ID")
}

async fn borrow(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/books/borrow/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_login_and_me() {
    let client = Client::new();
    let token = member_token(&client).await;

    let response = client
        .get(format!("{}/auth/me/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["username"].as_str().unwrap().starts_with("reader_"));
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_username_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "whatever-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["username"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_create_author() {
    let client = Client::new();
    let token = member_token(&client).await;

    let response = client
        .post(format!("{}/authors/create/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Forbidden" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_fourth_borrow_is_refused() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let member = member_token(&client).await;

    let author = create_author(&client, &admin, &unique("author")).await;
    let mut books = Vec::new();
    for i in 0..4 {
        books.push(create_book(&client, &admin, &format!("Volume {}", i), author).await);
    }

    for book in &books[..3] {
        let response = borrow(&client, &member, *book).await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["book"]["available"], false);
    }

    let response = borrow(&client, &member, books[3]).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "You cannot borrow more than 3 books at a time");
}

#[tokio::test]
#[ignore]
async fn test_borrowed_book_is_unavailable_to_others() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let first = member_token(&client).await;
    let second = member_token(&client).await;

    let author = create_author(&client, &admin, &unique("author")).await;
    let book = create_book(&client, &admin, "Single Copy", author).await;

    assert_eq!(borrow(&client, &first, book).await.status(), 200);

    let response = borrow(&client, &second, book).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "This book is not available for borrowing");
}

#[tokio::test]
#[ignore]
async fn test_return_of_book_not_held() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let member = member_token(&client).await;

    let author = create_author(&client, &admin, &unique("author")).await;
    let book = create_book(&client, &admin, "Never Borrowed", author).await;

    let response = client
        .post(format!("{}/books/return/", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({ "book_id": book }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "You have not borrowed this book");
}

#[tokio::test]
#[ignore]
async fn test_borrow_then_return_restores_availability() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let member = member_token(&client).await;

    let author = create_author(&client, &admin, &unique("author")).await;
    let book = create_book(&client, &admin, "Round Trip", author).await;

    assert_eq!(borrow(&client, &member, book).await.status(), 200);

    let response = client
        .post(format!("{}/books/return/", BASE_URL))
        .bearer_auth(&member)
        .json(&json!({ "book_id": book }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["available"], true);
    assert!(body["book"]["last_borrowed_date"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_search_intersects_filters() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let member = member_token(&client).await;

    let author_name = unique("Searchable");
    let author = create_author(&client, &admin, &author_name).await;
    let lent = create_book(&client, &admin, "Rust in Action", author).await;
    create_book(&client, &admin, "Rust for Rustaceans", author).await;
    create_book(&client, &admin, "Gardening", author).await;

    assert_eq!(borrow(&client, &member, lent).await.status(), 200);

    let response = client
        .get(format!("{}/search-filter/", BASE_URL))
        .query(&[("title", "rust"), ("author", author_name.as_str()), ("available", "true")])
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    let books = body.as_array().expect("array");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Rust for Rustaceans");
}

#[tokio::test]
#[ignore]
async fn test_statistics_for_staff() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .get(format!("{}/library/statistics/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let total = body["total_books"].as_i64().unwrap();
    let available = body["available_books"].as_i64().unwrap();
    let borrowed = body["borrowed_books"].as_i64().unwrap();
    assert_eq!(total, available + borrowed);
}

/// Fire every borrow at once and collect the status codes
async fn borrow_concurrently(client: &Client, requests: Vec<(String, i64)>) -> Vec<u16> {
    let mut tasks = tokio::task::JoinSet::new();
    for (token, book_id) in requests {
        let client = client.clone();
        tasks.spawn(async move { borrow(&client, &token, book_id).await.status().as_u16() });
    }

    let mut statuses = Vec::new();
    while let Some(status) = tasks.join_next().await {
        statuses.push(status.expect("borrow task panicked"));
    }
    statuses
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_one_book_have_one_winner() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let author = create_author(&client, &admin, &unique("author")).await;
    let book = create_book(&client, &admin, "Contested Copy", author).await;

    let mut requests = Vec::new();
    for _ in 0..8 {
        requests.push((member_token(&client).await, book));
    }

    let statuses = borrow_concurrently(&client, requests).await;

    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1);
    assert!(statuses.iter().all(|s| *s == 200 || *s == 400));

    let response = client
        .get(format!("{}/borrowers/", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let holders = body
        .as_array()
        .expect("array")
        .iter()
        .filter(|b| {
            b["books_borrowed"]
                .as_array()
                .map(|held| held.iter().any(|h| h["id"] == book))
                .unwrap_or(false)
        })
        .count();
    assert_eq!(holders, 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_respect_the_limit() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let member = member_token(&client).await;

    let author = create_author(&client, &admin, &unique("author")).await;
    let mut requests = Vec::new();
    for i in 0..4 {
        let book = create_book(&client, &admin, &format!("Parallel {}", i), author).await;
        requests.push((member.clone(), book));
    }

    let statuses = borrow_concurrently(&client, requests).await;

    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 3);
    assert_eq!(statuses.iter().filter(|s| **s == 400).count(), 1);
}
