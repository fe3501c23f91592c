#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use dashmap::DashMap;
use hotel_inventory_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{inventory_record, room_type, weekly_statistics},
    errors::ServiceError,
    services::channel_manager::{AvailabilityDay, InventorySource},
    AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

/// Channel manager stand-in answering from scripted per-room-type responses.
///
/// Room types without a script answer with no availability.
#[derive(Default)]
pub struct ScriptedSource {
    responses: DashMap<(String, String), Result<Vec<AvailabilityDay>, String>>,
}

impl ScriptedSource {
    pub fn respond(&self, hotel_id: &str, inv_type_code: &str, days: Vec<AvailabilityDay>) {
        self.responses
            .insert((hotel_id.to_string(), inv_type_code.to_string()), Ok(days));
    }

    pub fn fail(&self, hotel_id: &str, inv_type_code: &str, message: &str) {
        self.responses.insert(
            (hotel_id.to_string(), inv_type_code.to_string()),
            Err(message.to_string()),
        );
    }
}

#[async_trait]
impl InventorySource for ScriptedSource {
    async fn fetch_availability(
        &self,
        hotel_id: &str,
        inv_type_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, ServiceError> {
        let key = (hotel_id.to_string(), inv_type_code.to_string());
        match self.responses.get(&key).map(|entry| entry.value().clone()) {
            Some(Ok(days)) => Ok(days
                .into_iter()
                .filter(|day| day.date >= start && day.date <= end)
                .collect()),
            Some(Err(message)) => Err(ServiceError::ExternalApiError(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// `count` consecutive days starting at `start`, all with the same quantity and status
pub fn days(start: NaiveDate, count: i64, quantity: i32, status: &str) -> Vec<AvailabilityDay> {
    (0..count)
        .map(|offset| AvailabilityDay {
            date: start + Duration::days(offset),
            quantity,
            status: status.to_string(),
        })
        .collect()
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub source: Arc<ScriptedSource>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_000,
            "development".to_string(),
        );
        // One connection keeps every query on the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.weekly_update.fetch_horizon_days = 14;
        cfg.weekly_update.weeks_back = 1;
        cfg.weekly_update.weeks_ahead = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let source = Arc::new(ScriptedSource::default());
        let state = AppState::new(Arc::new(pool), cfg, source.clone());
        let router = app_router(state.clone(), CorsLayer::permissive());

        Self {
            router,
            state,
            source,
        }
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON body.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is not JSON")
        };
        (status, value)
    }

    pub async fn seed_room_type(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        total_rooms: i32,
    ) -> room_type::Model {
        let now = Utc::now();
        room_type::ActiveModel {
            inv_type_code: Set(inv_type_code.to_string()),
            hotel_id: Set(hotel_id.to_string()),
            name: Set(format!("Room {}", inv_type_code)),
            total_rooms: Set(total_rooms),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed room type")
    }

    pub async fn seed_inventory(&self, inv_type_code: &str, hotel_id: &str, days: &[AvailabilityDay]) {
        for day in days {
            inventory_record::ActiveModel {
                inv_type_code: Set(inv_type_code.to_string()),
                hotel_id: Set(hotel_id.to_string()),
                date: Set(day.date),
                quantity: Set(day.quantity),
                status: Set(day.status.clone()),
                ..Default::default()
            }
            .insert(self.state.db.as_ref())
            .await
            .expect("seed inventory day");
        }
    }

    /// Stores a weekly statistics row with the given actual occupancy
    pub async fn seed_statistics(
        &self,
        inv_type_code: &str,
        hotel_id: &str,
        week_start: NaiveDate,
        actual_occupancy_rate: f64,
    ) -> weekly_statistics::Model {
        weekly_statistics::ActiveModel {
            inv_type_code: Set(inv_type_code.to_string()),
            hotel_id: Set(hotel_id.to_string()),
            week_start_date: Set(week_start),
            week_end_date: Set(week_start + Duration::days(6)),
            actual_occupancy_rate: Set(actual_occupancy_rate),
            actual_vacancy_rate: Set(100.0 - actual_occupancy_rate),
            total_occupancy_rate: Set(actual_occupancy_rate),
            total_vacancy_rate: Set(100.0 - actual_occupancy_rate),
            total_rooms: Set(10),
            total_available_days: Set(7),
            total_days: Set(7),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed weekly statistics")
    }
}
