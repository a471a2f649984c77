//! `/authors`, `/categories` and `/publishers` through the full router

mod common;

use axum::http::StatusCode;
use common::{book_body, create, delete, fixtures, get, login, post, put, test_app};
use serde_json::json;

#[tokio::test]
async fn test_author_crud() {
    let app = test_app();
    let token = login(&app).await;

    let (status, created) = post(
        &app,
        "/authors",
        Some(&token),
        json!({ "first_name": "Iain", "last_name": "Banks" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Author created successfully.");
    let id = created["data"]["id"].as_i64().unwrap();
    let uri = format!("/authors/{id}");

    let (status, updated) = put(
        &app,
        &uri,
        Some(&token),
        json!({ "first_name": "Iain M.", "last_name": "Banks" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["first_name"], "Iain M.");

    let (status, fetched) = get(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["first_name"], "Iain M.");

    let (status, deleted) = delete(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Author deleted successfully.");

    let (status, missing) = get(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["message"], "Author not found.");
}

#[tokio::test]
async fn test_author_validation() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = post(
        &app,
        "/authors",
        Some(&token),
        json!({ "first_name": "   ", "last_name": "x".repeat(101) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["first_name"].is_string());
    assert!(body["errors"]["last_name"].is_string());
}

#[tokio::test]
async fn test_category_name_conflicts() {
    let app = test_app();
    let token = login(&app).await;
    let first = create(&app, &token, "/categories", json!({ "name": "Poetry" })).await;
    let second = create(&app, &token, "/categories", json!({ "name": "Drama" })).await;

    let (status, body) = post(&app, "/categories", Some(&token), json!({ "name": "Poetry" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category with this name already exists.");

    // Renaming onto another category's name conflicts, keeping its own does not
    let (status, _) = put(
        &app,
        &format!("/categories/{second}"),
        Some(&token),
        json!({ "name": "Poetry" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = put(
        &app,
        &format!("/categories/{first}"),
        Some(&token),
        json!({ "name": "Poetry" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category updated successfully.");
}

#[tokio::test]
async fn test_publisher_name_conflicts() {
    let app = test_app();
    let token = login(&app).await;
    create(&app, &token, "/publishers", json!({ "name": "Tor" })).await;

    let (status, body) = post(&app, "/publishers", Some(&token), json!({ "name": "Tor" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Publisher with this name already exists.");
}

#[tokio::test]
async fn test_publisher_with_books_cannot_be_deleted() {
    let app = test_app();
    let token = login(&app).await;
    let fixtures = fixtures(&app, &token).await;
    let book = create(&app, &token, "/books", book_body("Dispossessed", 1974, &fixtures)).await;
    let uri = format!("/publishers/{}", fixtures.publisher_id);

    let (status, _) = delete(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    delete(&app, &format!("/books/{book}"), Some(&token)).await;
    let (status, body) = delete(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Publisher deleted successfully.");
}

#[tokio::test]
async fn test_deleting_category_unlinks_books() {
    let app = test_app();
    let token = login(&app).await;
    let fixtures = fixtures(&app, &token).await;
    let book = create(&app, &token, "/books", book_body("Earthsea", 1968, &fixtures)).await;

    let (status, _) = delete(
        &app,
        &format!("/categories/{}", fixtures.category_id),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, &format!("/books/{book}"), None).await;
    assert_eq!(body["data"]["categories"], json!([]));
}

#[tokio::test]
async fn test_related_books_are_listed() {
    let app = test_app();
    let token = login(&app).await;
    let fixtures = fixtures(&app, &token).await;
    let book = create(&app, &token, "/books", book_body("Tehanu", 1990, &fixtures)).await;

    let (_, body) = get(
        &app,
        &format!("/publishers/{}", fixtures.publisher_id),
        Some(&token),
    )
    .await;
    assert_eq!(body["data"]["books"][0]["id"], book);
    assert_eq!(body["data"]["books"][0]["title"], "Tehanu");
}

#[tokio::test]
async fn test_list_categories_sorted_and_searched() {
    let app = test_app();
    let token = login(&app).await;
    for name in ["Horror", "History", "Humor", "Poetry"] {
        create(&app, &token, "/categories", json!({ "name": name })).await;
    }

    let (status, body) = get(&app, "/categories?sort=name&search=h&limit=2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["History", "Horror"]);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(body["meta"]["hasNext"], true);
    assert_eq!(body["meta"]["hasPrevious"], false);
}

#[tokio::test]
async fn test_name_sort_ignores_case() {
    let app = test_app();
    let token = login(&app).await;
    for name in ["Zebra", "apple", "Mango"] {
        create(&app, &token, "/categories", json!({ "name": name })).await;
    }

    let (_, body) = get(&app, "/categories?sort=name", Some(&token)).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["apple", "Mango", "Zebra"]);

    let (_, body) = get(&app, "/categories?sort=-name", Some(&token)).await;
    assert_eq!(body["data"][0]["name"], "Zebra");
}
