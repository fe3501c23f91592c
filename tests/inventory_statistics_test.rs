mod common;

use axum::http::{Method, StatusCode};
use common::{date, days, TestApp};
use serde_json::{json, Value};

fn rate(value: &Value) -> f64 {
    value.as_f64().expect("numeric rate")
}

#[tokio::test]
async fn fetch_stores_days_and_logs_the_call() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.source
        .respond("2436", "A", days(date("2024-01-08"), 7, 6, "OPEN"));

    let (status, body) = app
        .json(
            Method::POST,
            "/fetch-inventory/A?start_date=2024-01-08&end_date=2024-01-14&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], json!(true));
    assert_eq!(body["data"]["records_stored"], json!(7));

    // Refetching overwrites instead of duplicating
    app.source
        .respond("2436", "A", days(date("2024-01-08"), 7, 2, "OPEN"));
    let (status, body) = app
        .json(
            Method::POST,
            "/fetch-inventory/A?start_date=2024-01-08&end_date=2024-01-14&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records_stored"], json!(7));

    let (status, body) = app.json(Method::GET, "/api-calls", None).await;
    assert_eq!(status, StatusCode::OK);
    let calls = body["data"].as_array().expect("calls");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["target"], json!("2436-A"));
    assert_eq!(calls[0]["success"], json!(true));

    let (status, body) = app
        .json(
            Method::POST,
            "/calculate-weekly-statistics/A?week_start_date=2024-01-08&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    // Quantity 2 of 10 rooms every day
    assert_eq!(rate(&body["data"]["actual_occupancy_rate"]), 80.0);
}

#[tokio::test]
async fn failed_fetch_is_audited_and_reported_as_bad_gateway() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.source.fail("2436", "A", "upstream timed out");

    let (status, body) = app
        .json(
            Method::POST,
            "/fetch-inventory/A?start_date=2024-01-08&end_date=2024-01-14&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("upstream timed out"));

    let (_, body) = app.json(Method::GET, "/api-calls?limit=5", None).await;
    let calls = body["data"].as_array().expect("calls");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["success"], json!(false));
    assert!(calls[0]["error_message"]
        .as_str()
        .unwrap()
        .contains("upstream timed out"));
}

#[tokio::test]
async fn fetch_all_continues_past_failures() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_room_type("B", "2799", 8).await;
    app.source
        .respond("2436", "A", days(date("2024-01-08"), 3, 5, "OPEN"));
    app.source.fail("2799", "B", "bad credentials");

    let (status, body) = app
        .json(
            Method::POST,
            "/fetch-all-inventory?start_date=2024-01-08&end_date=2024-01-10",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let outcomes = body["data"].as_array().expect("outcomes");
    assert_eq!(outcomes.len(), 2);

    let failed: Vec<&Value> = outcomes
        .iter()
        .filter(|o| o["success"] == json!(false))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["inv_type_code"], json!("B"));
}

#[tokio::test]
async fn fetch_rejects_malformed_and_reversed_dates() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/fetch-inventory/A?start_date=2024-13-01&end_date=2024-01-14&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("start_date"));

    let (status, _) = app
        .json(
            Method::POST,
            "/fetch-all-inventory?start_date=2024-01-14&end_date=2024-01-08",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weekly_statistics_split_actual_and_total_occupancy() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    let mut week = days(date("2024-01-08"), 5, 6, "OPEN");
    week.extend(days(date("2024-01-13"), 2, 10, "CLOSE"));
    app.seed_inventory("A", "2436", &week).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/calculate-weekly-statistics/A?week_start_date=2024-01-08&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["week_end_date"], json!("2024-01-14"));
    assert_eq!(rate(&stats["actual_occupancy_rate"]), 40.0);
    assert_eq!(rate(&stats["actual_vacancy_rate"]), 60.0);
    assert_eq!(rate(&stats["total_occupancy_rate"]), 28.57);
    assert_eq!(rate(&stats["total_vacancy_rate"]), 71.43);
    assert_eq!(stats["total_available_days"], json!(5));
    assert_eq!(stats["total_days"], json!(7));
    assert_eq!(stats["hotel_name"], json!("霧繞"));
    assert_eq!(stats["room_type_name"], json!("Room A"));
}

#[tokio::test]
async fn recalculating_a_week_is_idempotent() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_inventory("A", "2436", &days(date("2024-01-08"), 7, 7, "OPEN"))
        .await;

    let uri = "/calculate-weekly-statistics/A?week_start_date=2024-01-08&hotel_id=2436";
    let (_, first) = app.json(Method::POST, uri, None).await;
    let (status, second) = app.json(Method::POST, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"], second["data"]);

    let (status, body) = app
        .json(
            Method::GET,
            "/weekly-statistics?inv_type_code=A&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rate(&rows[0]["actual_occupancy_rate"]), 30.0);
}

#[tokio::test]
async fn calculating_without_inventory_is_not_found() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;

    let (status, _) = app
        .json(
            Method::POST,
            "/calculate-weekly-statistics/A?week_start_date=2024-01-08&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.json(Method::GET, "/weekly-statistics", None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn calculating_with_a_bad_week_start_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/calculate-weekly-statistics/A?week_start_date=08-01-2024&hotel_id=2436",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("week_start_date"));
}

#[tokio::test]
async fn listing_with_weeks_keeps_the_most_recent_weeks() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;
    app.seed_room_type("B", "2799", 10).await;
    for (week, rate) in [("2024-01-01", 10.0), ("2024-01-08", 20.0), ("2024-01-15", 30.0)] {
        app.seed_statistics("A", "2436", date(week), rate).await;
        app.seed_statistics("B", "2799", date(week), rate + 1.0).await;
    }

    let (status, body) = app
        .json(Method::GET, "/weekly-statistics?weeks=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let weeks: Vec<&str> = body["data"]
        .as_array()
        .expect("rows")
        .iter()
        .map(|row| row["week_start_date"].as_str().unwrap())
        .collect();
    assert_eq!(
        weeks,
        vec!["2024-01-15", "2024-01-15", "2024-01-08", "2024-01-08"]
    );

    // Without filters only the newest week of each room type is returned
    let (_, body) = app.json(Method::GET, "/weekly-statistics", None).await;
    let rows = body["data"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["week_start_date"] == json!("2024-01-15")));

    let (status, _) = app
        .json(Method::GET, "/weekly-statistics?weeks=53", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_required_parameters_use_the_error_body() {
    let app = TestApp::new().await;
    app.seed_room_type("A", "2436", 10).await;

    for uri in [
        "/fetch-inventory/A?start_date=2024-01-01&end_date=2024-01-07",
        "/calculate-weekly-statistics/A?hotel_id=2436",
    ] {
        let (status, body) = app.json(Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["kind"], json!("validation"), "{}", uri);
        assert!(body["timestamp"].is_string(), "{}", uri);
    }
}
