//! Request helpers for router tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Drive one request through the router and decode the body as JSON.
/// Non-JSON bodies come back as a JSON string, empty ones as null.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    builder(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    builder(method, uri, token).body(Body::empty()).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    empty_request(Method::GET, uri, token)
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}&password={}", username, password)))
        .unwrap()
}

pub async fn register_user(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, json_request(Method::POST, "/register", None, body)).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(app, login_request(username, password)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    register_as(app, username, password, json!({})).await
}

/// Register with extra body fields (role, full_name...) and log in.
pub async fn register_as(app: &Router, username: &str, password: &str, extra: Value) -> String {
    let mut body = json!({"username": username, "password": password});
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let (status, res) = register_user(app, body).await;
    assert_eq!(status, StatusCode::OK, "register failed: {res}");
    login(app, username, password).await
}
