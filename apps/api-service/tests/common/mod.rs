//! 結合テスト共通のリクエストヘルパー

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

/// レスポンスのステータス・ヘッダー・JSON ボディ
pub struct TestResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Value,
}

impl TestResponse {
    /// `{ "data": ... }` エンベロープの中身
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri, None).await
}

pub async fn post(router: &Router, uri: &str, body: Value) -> TestResponse {
    send(router, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::POST, uri, None).await
}

pub async fn patch(router: &Router, uri: &str, body: Value) -> TestResponse {
    send(router, Method::PATCH, uri, Some(body)).await
}

/// `invalid_params` のフィールド名一覧
pub fn invalid_param_names(response: &TestResponse) -> Vec<String> {
    response.body["invalid_params"]
        .as_array()
        .map(|params| {
            params
                .iter()
                .filter_map(|p| p["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
