//! # ニュースレターハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/newsletter` - 有効な購読者一覧
//! - `POST /api/newsletter` - 購読（新規・再開は 201、購読中なら 200）
//! - `GET /api/newsletter/{id}` - 購読者詳細
//! - `POST /api/newsletter/{id}/unsubscribe` - 購読解除

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use nailbook_domain::newsletter::{NewsletterSubscriber, SubscriberId};
use nailbook_shared::{ApiResponse, StatusMessage};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, ValidatedJson},
    usecase::{NewsletterUseCaseImpl, SubscribeInput},
};

/// ニュースレター API の共有状態
pub struct NewsletterState {
    pub usecase: NewsletterUseCaseImpl,
}

/// 購読リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub name:  Option<String>,
}

/// 購読者 DTO
#[derive(Debug, Serialize)]
pub struct SubscriberDto {
    pub id:            SubscriberId,
    pub email:         String,
    pub name:          String,
    pub is_active:     bool,
    pub subscribed_at: String,
}

impl From<&NewsletterSubscriber> for SubscriberDto {
    fn from(subscriber: &NewsletterSubscriber) -> Self {
        Self {
            id:            subscriber.id(),
            email:         subscriber.email().to_string(),
            name:          subscriber
                .name()
                .map(|n| n.as_str().to_string())
                .unwrap_or_default(),
            is_active:     subscriber.is_active(),
            subscribed_at: subscriber.subscribed_at().to_rfc3339(),
        }
    }
}

/// GET /api/newsletter
pub async fn list_subscribers(
    State(state): State<Arc<NewsletterState>>,
) -> Result<impl IntoResponse, ApiError> {
    let subscribers = state.usecase.list().await?;

    let items: Vec<SubscriberDto> = subscribers.iter().map(SubscriberDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/newsletter
///
/// 冪等な購読。ウェルカムメールは新規購読と再開の時だけスケジュールされる。
pub async fn subscribe(
    State(state): State<Arc<NewsletterState>>,
    ValidatedJson(req): ValidatedJson<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .usecase
        .subscribe(SubscribeInput {
            email: req.email,
            name:  req.name,
        })
        .await?;

    let status = if outcome.decision.sends_welcome() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ApiResponse::new(SubscriberDto::from(&outcome.subscriber))),
    ))
}

/// GET /api/newsletter/{id}
pub async fn get_subscriber(
    State(state): State<Arc<NewsletterState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriber = state.usecase.get(SubscriberId::new(id)).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(SubscriberDto::from(&subscriber)))))
}

/// POST /api/newsletter/{id}/unsubscribe
pub async fn unsubscribe(
    State(state): State<Arc<NewsletterState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.unsubscribe(SubscriberId::new(id)).await?;

    Ok((StatusCode::OK, Json(StatusMessage::new("Successfully unsubscribed"))))
}
