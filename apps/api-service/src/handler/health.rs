//! # ヘルスチェックと API ルート
//!
//! ```text
//! GET /health  → {"status": "healthy", "version": "0.1.0"}
//! GET /api     → エンドポイント一覧
//! ```

use axum::Json;
use nailbook_shared::HealthResponse;
use serde::Serialize;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// API ルートのレスポンス
#[derive(Debug, Serialize)]
pub struct ApiRootResponse {
    pub message:   &'static str,
    pub version:   &'static str,
    pub endpoints: ApiEndpoints,
}

#[derive(Debug, Serialize)]
pub struct ApiEndpoints {
    pub services:     &'static str,
    pub booking:      &'static str,
    pub contact:      &'static str,
    pub newsletter:   &'static str,
    pub testimonials: &'static str,
    pub gallery:      &'static str,
}

/// 公開エンドポイントの一覧を返す
pub async fn api_root() -> Json<ApiRootResponse> {
    Json(ApiRootResponse {
        message:   "NaildbyBola API",
        version:   "1.0",
        endpoints: ApiEndpoints {
            services:     "/api/services",
            booking:      "/api/booking",
            contact:      "/api/contact",
            newsletter:   "/api/newsletter",
            testimonials: "/api/testimonials",
            gallery:      "/api/gallery",
        },
    })
}
