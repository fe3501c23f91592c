use crate::{errors::ServiceError, ApiResponse};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Wire format of every date accepted in a path or query string
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query string extractor whose rejections use the standard error body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Response for work handed to a background task
pub fn accepted_response<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    let mut body = ApiResponse::success(data);
    body.message = Some(message.into());
    (StatusCode::ACCEPTED, Json(body)).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// Parses a `YYYY-MM-DD` parameter, naming the field in the error
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        ServiceError::ValidationError(format!(
            "{} must be a YYYY-MM-DD date, got '{}': {}",
            field, value, e
        ))
    })
}

/// Ordered pair of dates, rejecting `start > end`
pub fn parse_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let start_date = parse_date("start_date", start)?;
    let end_date = parse_date("end_date", end)?;
    if start_date > end_date {
        return Err(ServiceError::ValidationError(format!(
            "start_date {} is after end_date {}",
            start_date, end_date
        )));
    }
    Ok((start_date, end_date))
}

/// Local calendar date used as "today" by reports and snapshots
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[test]
    fn dates_must_be_iso() {
        assert_eq!(
            parse_date("week_start_date", "2024-01-08").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert_matches!(
            parse_date("week_start_date", "08/01/2024"),
            Err(ServiceError::ValidationError(msg)) if msg.contains("week_start_date")
        );
        assert_matches!(
            parse_date("from_date", "2024-02-30"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_matches!(
            parse_date_range("2024-01-10", "2024-01-01"),
            Err(ServiceError::ValidationError(_))
        );
        assert!(parse_date_range("2024-01-01", "2024-01-01").is_ok());
    }

    #[rstest]
    #[case("2024-01-08")]
    #[case(" 2024-01-08 ")]
    fn surrounding_whitespace_is_ignored(#[case] raw: &str) {
        assert_eq!(
            parse_date("start_date", raw).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
    }

    #[rstest]
    #[case("")]
    #[case("2024-1-8x")]
    #[case("20240108")]
    #[case("2024-13-01")]
    fn malformed_dates_name_the_field(#[case] raw: &str) {
        assert_matches!(
            parse_date("end_date", raw),
            Err(ServiceError::ValidationError(msg)) if msg.starts_with("end_date")
        );
    }
}
