mod common;

use axum::http::{Method, StatusCode};
use common::{date, days, TestApp};
use serde_json::json;

#[tokio::test]
async fn room_type_crud_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/room-types",
            Some(json!({
                "inv_type_code": "A",
                "name": "Forest view twin",
                "total_rooms": 10,
                "hotel_id": "2436"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["hotel_name"], json!("霧繞"));
    let id = body["data"]["id"].as_i64().expect("id");

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/room-types/{}", id),
            Some(json!({ "name": "Forest view double", "total_rooms": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_rooms"], json!(12));

    let (status, body) = app.json(Method::GET, "/room-types?hotel_id=2436", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["name"], json!("Forest view double"));

    let (status, _) = app
        .json(Method::DELETE, &format!("/room-types/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.json(Method::GET, "/room-types", None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn duplicate_room_type_conflicts() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/room-types",
            Some(json!({
                "inv_type_code": "A",
                "name": "Again",
                "total_rooms": 4,
                "hotel_id": "2436"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Conflict"));

    // Same code in another hotel is a different room type
    let (status, _) = app
        .json(
            Method::POST,
            "/room-types",
            Some(json!({
                "inv_type_code": "A",
                "name": "Other hotel",
                "total_rooms": 4,
                "hotel_id": "2799"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn invalid_payload_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/room-types",
            Some(json!({
                "inv_type_code": "A",
                "name": "Negative",
                "total_rooms": -1,
                "hotel_id": "2436"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Bad Request"));
}

#[tokio::test]
async fn unknown_room_type_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .json(
            Method::PUT,
            "/room-types/999",
            Some(json!({ "name": "Ghost", "total_rooms": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::DELETE, "/room-types/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_refused_while_inventory_exists() {
    let app = TestApp::new().await;
    let room_type = app.seed_room_type("A", "2436", 10).await;
    app.seed_inventory("A", "2436", &days(date("2024-01-08"), 5, 3, "OPEN"))
        .await;

    let (status, body) = app
        .json(Method::DELETE, &format!("/room-types/{}", room_type.id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let message = body["message"].as_str().expect("message");
    assert!(message.contains("5 inventory records"), "{}", message);

    // Still listed
    let (_, body) = app.json(Method::GET, "/room-types", None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn delete_is_refused_while_statistics_exist() {
    let app = TestApp::new().await;
    let room_type = app.seed_room_type("B", "2799", 6).await;
    app.seed_statistics("B", "2799", date("2024-01-08"), 50.0).await;

    let (status, body) = app
        .json(Method::DELETE, &format!("/room-types/{}", room_type.id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("1 weekly statistics records"));
}
