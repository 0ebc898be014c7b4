//! API integration tests against a running server

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:3000/api/v1";

/// Suffix keeping names and ISBNs unique across runs against the same database
fn unique_suffix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_micros() as u64
        % 1_000_000_000
}

/// Build a valid ISBN-13 from nine varying digits
fn unique_isbn() -> String {
    let body = format!("978{:09}", unique_suffix());
    let sum: u32 = body
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    format!("{}{}", body, (10 - sum % 10) % 10)
}

async fn create_author(client: &Client) -> Value {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({
            "firstName": "Live",
            "lastName": format!("Author{}", unique_suffix())
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
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
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_list_authors() {
    let client = Client::new();

    let response = client
        .get(format!("{}/authors?page=1&limit=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["limit"], 5);
}

#[tokio::test]
#[ignore]
async fn test_author_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/authors/2147483647", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_author() {
    let client = Client::new();
    let author = create_author(&client).await;

    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({
            "firstName": author["firstName"],
            "lastName": author["lastName"]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_create_book_with_invalid_isbn() {
    let client = Client::new();
    let author = create_author(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Broken",
            "isbn": "not-an-isbn",
            "authorId": author["id"]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_book_lifecycle() {
    let client = Client::new();
    let author = create_author(&client).await;
    let author_id = author["id"].as_i64().expect("No author id");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Live Book",
            "isbn": unique_isbn(),
            "authorId": author_id
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book id");
    assert_eq!(book["author"]["id"], author_id);

    // An author with books is protected from deletion
    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .patch(format!("{}/books/{}", BASE_URL, book_id))
        .json(&json!({ "genre": "Testing" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["genre"], "Testing");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}
