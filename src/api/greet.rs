//! `POST /greet`: the hello-world exercise.

use axum::{routing::post, Router};
use serde::Deserialize;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::Json;
use super::validation::validate_text;
use crate::db::MessageResponse;

const ADULT_AGE: i64 = 18;

#[derive(Debug, Deserialize)]
pub struct GreetRequest {
    pub name: String,
    pub age: i64,
}

async fn greet(Json(req): Json<GreetRequest>) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_text("Name", &req.name));
    if req.age < 0 {
        errors.add("age", "Age cannot be negative");
    }
    errors.finish()?;

    let stage = if req.age < ADULT_AGE { "a minor" } else { "an adult" };
    Ok(Json(MessageResponse::new(format!(
        "Hello {}! You're {}.",
        req.name.trim(),
        stage
    ))))
}

pub fn router() -> Router {
    Router::new().route("/greet", post(greet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn call(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        send(&router(), json_request(Method::POST, "/greet", None, body)).await
    }

    #[tokio::test]
    async fn test_minor_and_adult() {
        let (status, body) = call(json!({"name": "Ann", "age": 17})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello Ann! You're a minor.");

        let (_, body) = call(json!({"name": "Ann", "age": 18})).await;
        assert_eq!(body["message"], "Hello Ann! You're an adult.");
    }

    #[tokio::test]
    async fn test_blank_name_and_negative_age_are_422() {
        let (status, body) = call(json!({"name": "  ", "age": 5})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["details"]["name"].is_array());

        let (status, body) = call(json!({"name": "Ann", "age": -1})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["message"], "Age cannot be negative");
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let (status, _) = call(json!({"name": "Ann"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
