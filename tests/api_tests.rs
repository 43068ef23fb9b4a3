//! API integration tests
//!
//! These drive a running server (with its database) end to end.
//! Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// Register a fresh account and return (username, token)
async fn register_and_login(client: &Client, role: &str) -> (String, String) {
    let suffix = unique_suffix();
    let username = format!("{}_{}", role, suffix);
    let email = format!("{}@example.com", username);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "SecretoFuerte123",
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "SecretoFuerte123"
        }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    (username, token)
}

/// Create an author and a book owned by it, returning the book id
async fn create_book(client: &Client, librarian_token: &str) -> i64 {
    let suffix = unique_suffix();

    let response = client
        .post(format!("{}/authors", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian_token))
        .json(&json!({
            "first_name": "Gabriel",
            "last_name": format!("Autor {}", suffix)
        }))
        .send()
        .await
        .expect("Failed to create author");
    assert_eq!(response.status(), 201);
    let author: Value = response.json().await.expect("Failed to parse author");

    let isbn = format!("97800{:08}", suffix % 100_000_000);
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian_token))
        .json(&json!({
            "title": format!("Libro {}", suffix),
            "author_id": author["id"],
            "isbn": isbn
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), 201);

    let book: Value = response.json().await.expect("Failed to parse book");
    assert_eq!(book["state"], "available");
    book["id"].as_i64().expect("No book id")
}

async fn book_state(client: &Client, book_id: i64) -> String {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to fetch book");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse book");
    body["state"].as_str().expect("No state").to_string()
}

async fn borrow(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send loan request")
}

async fn reserve(client: &Client, token: &str, book_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send reservation request")
}

#[tokio::test]
#[ignore]
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
async fn test_login_with_email() {
    let client = Client::new();
    let (username, _) = register_and_login(&client, "reader").await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": format!("{}@example.com", username),
            "password": "SecretoFuerte123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["username"], username.as_str());
}

#[tokio::test]
#[ignore]
async fn test_unauthenticated_loan_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_reader_cannot_create_books() {
    let client = Client::new();
    let (_, reader) = register_and_login(&client, "reader").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .json(&json!({
            "title": "Forbidden",
            "author_id": 1,
            "isbn": "9780000000000"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

/// End-to-end lifecycle: loan -> reserve -> return fulfills the reservation
/// and the book becomes available again.
#[tokio::test]
#[ignore]
async fn test_loan_reservation_lifecycle() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;
    let (_, reader_a) = register_and_login(&client, "reader").await;
    let (_, reader_b) = register_and_login(&client, "reader").await;

    let book_id = create_book(&client, &librarian).await;

    // A borrows the available book
    let response = borrow(&client, &reader_a, book_id).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse loan");
    let loan_id = loan["id"].as_i64().expect("No loan id");
    assert_eq!(book_state(&client, book_id).await, "loaned");

    // A second loan on a loaned book must fail
    let response = borrow(&client, &reader_b, book_id).await;
    assert_eq!(response.status(), 409);
    assert_eq!(book_state(&client, book_id).await, "loaned");

    // B queues a reservation while the book is out
    let response = reserve(&client, &reader_b, book_id).await;
    assert_eq!(response.status(), 201);

    // A duplicate active reservation by the same user is rejected
    let response = reserve(&client, &reader_b, book_id).await;
    assert_eq!(response.status(), 409);

    // Only librarians can take returns
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", reader_a))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 403);

    // The return flips the book back to available and fulfills B's reservation
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse return");
    assert_eq!(body["reservation_fulfilled"], true);
    assert_eq!(book_state(&client, book_id).await, "available");

    // Returning twice is rejected
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 409);

    // B's reservation shows as fulfilled and no longer active
    let response = client
        .get(format!("{}/reservations/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader_b))
        .send()
        .await
        .expect("Failed to fetch reservations");
    let reservations: Vec<Value> = response.json().await.expect("Failed to parse reservations");
    let mine = reservations
        .iter()
        .find(|r| r["book_id"].as_i64() == Some(book_id))
        .expect("Reservation missing");
    assert_eq!(mine["fulfilled"], true);
    assert_eq!(mine["is_active"], false);
}

/// Among several active reservations, exactly the oldest one is fulfilled.
#[tokio::test]
#[ignore]
async fn test_oldest_reservation_wins() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;
    let (_, holder) = register_and_login(&client, "reader").await;
    let (first_user, first) = register_and_login(&client, "reader").await;
    let (_, second) = register_and_login(&client, "reader").await;

    let book_id = create_book(&client, &librarian).await;

    let response = borrow(&client, &holder, book_id).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse loan");
    let loan_id = loan["id"].as_i64().expect("No loan id");

    assert_eq!(reserve(&client, &first, book_id).await.status(), 201);
    assert_eq!(reserve(&client, &second, book_id).await.status(), 201);

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());

    // The earliest reservation is fulfilled...
    let response = client
        .get(format!("{}/reservations/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", first))
        .send()
        .await
        .expect("Failed to fetch reservations");
    let reservations: Vec<Value> = response.json().await.expect("Failed to parse reservations");
    assert!(
        reservations
            .iter()
            .any(|r| r["book_id"].as_i64() == Some(book_id) && r["fulfilled"] == true),
        "reservation of {} should be fulfilled",
        first_user
    );

    // ...the later one stays active
    let response = client
        .get(format!("{}/reservations/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", second))
        .send()
        .await
        .expect("Failed to fetch reservations");
    let reservations: Vec<Value> = response.json().await.expect("Failed to parse reservations");
    assert!(reservations
        .iter()
        .any(|r| r["book_id"].as_i64() == Some(book_id)
            && r["fulfilled"] == false
            && r["is_active"] == true));
}

#[tokio::test]
#[ignore]
async fn test_reserving_available_book_rejected() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;
    let (_, reader) = register_and_login(&client, "reader").await;

    let book_id = create_book(&client, &librarian).await;

    let response = reserve(&client, &reader, book_id).await;
    assert_eq!(response.status(), 409);
}

/// A manually flagged overdue loan imposes a sanction on any further loan,
/// whatever book is targeted, and leaves that book untouched.
#[tokio::test]
#[ignore]
async fn test_sanction_blocks_new_loans() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;
    let (_, reader) = register_and_login(&client, "reader").await;

    let book_x = create_book(&client, &librarian).await;
    let book_y = create_book(&client, &librarian).await;

    let response = borrow(&client, &reader, book_x).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse loan");
    let loan_id = loan["id"].as_i64().expect("No loan id");

    // Librarian flags the open loan as overdue
    let response = client
        .post(format!("{}/loans/{}/overdue", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send overdue request");
    assert!(response.status().is_success());

    // The sanction blocks a loan on a different, available book
    let response = borrow(&client, &reader, book_y).await;
    assert_eq!(response.status(), 422);
    assert_eq!(book_state(&client, book_y).await, "available");

    // After the return the sanction lifts
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send return request");
    assert!(response.status().is_success());

    let response = borrow(&client, &reader, book_y).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_loan_due_date_follows_policy() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;
    let (_, reader) = register_and_login(&client, "reader").await;

    let book_id = create_book(&client, &librarian).await;

    let response = borrow(&client, &reader, book_id).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse loan");

    let due_date = loan["due_date"].as_str().expect("No due date");
    let due_date = chrono::DateTime::parse_from_rfc3339(due_date).expect("Bad due date");
    let days = (due_date.with_timezone(&chrono::Utc) - chrono::Utc::now()).num_days();
    assert!((13..=14).contains(&days), "due in {} days", days);
}

#[tokio::test]
#[ignore]
async fn test_reports_are_librarian_only() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;
    let (_, reader) = register_and_login(&client, "reader").await;

    let response = client
        .get(format!("{}/reports/loans.csv", BASE_URL))
        .header("Authorization", format!("Bearer {}", reader))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/reports/loans.csv", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read body");
    assert!(body.starts_with("Book,User,LoanDate,DueDate,ReturnDate,Overdue"));
}

#[tokio::test]
#[ignore]
async fn test_stats_endpoint() {
    let client = Client::new();
    let (_, librarian) = register_and_login(&client, "librarian").await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", librarian))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_number());
    assert!(body["active_loans"].is_number());
    assert!(body["loans_per_month"].is_array());
    assert!(body["top_books"].is_array());
}
