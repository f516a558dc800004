//! # お問い合わせハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/contact` - お問い合わせ一覧（`is_read` で絞り込み）
//! - `POST /api/contact` - お問い合わせ送信
//! - `GET /api/contact/{id}` - お問い合わせ詳細
//! - `POST /api/contact/{id}/mark_read` - 既読にする

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use nailbook_domain::contact::{ContactMessage, ContactMessageId, SubjectType};
use nailbook_shared::{ApiResponse, StatusMessage};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    usecase::{ContactUseCaseImpl, CreateContactInput},
};

/// お問い合わせ API の共有状態
pub struct ContactState {
    pub usecase: ContactUseCaseImpl,
}

/// お問い合わせ送信リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    pub name:         String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email:        String,
    pub phone:        Option<String>,
    #[serde(default)]
    pub subject_type: SubjectType,
    pub subject:      String,
    pub message:      String,
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub is_read: Option<bool>,
}

/// お問い合わせ DTO
#[derive(Debug, Serialize)]
pub struct ContactMessageDto {
    pub id:                 ContactMessageId,
    pub name:               String,
    pub email:              String,
    pub phone:              String,
    pub subject_type:       SubjectType,
    pub subject_type_label: &'static str,
    pub subject:            String,
    pub message:            String,
    pub is_read:            bool,
    pub created_at:         String,
    pub updated_at:         String,
}

impl From<ContactMessage> for ContactMessageDto {
    fn from(message: ContactMessage) -> Self {
        Self {
            id:                 message.id,
            name:               message.name.into_string(),
            email:              message.email.into_string(),
            phone:              message.phone.map(|p| p.to_string()).unwrap_or_default(),
            subject_type:       message.subject_type,
            subject_type_label: message.subject_type.label(),
            subject:            message.subject.into_string(),
            message:            message.message,
            is_read:            message.is_read,
            created_at:         message.created_at.to_rfc3339(),
            updated_at:         message.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/contact
pub async fn list_contact_messages(
    State(state): State<Arc<ContactState>>,
    ApiQuery(query): ApiQuery<ContactListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.usecase.list(query.is_read).await?;

    let items: Vec<ContactMessageDto> = messages.into_iter().map(ContactMessageDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/contact
///
/// 保存後に管理者への通知をスケジュールして 201 を返す。
pub async fn create_contact_message(
    State(state): State<Arc<ContactState>>,
    ValidatedJson(req): ValidatedJson<CreateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateContactInput {
        name:         req.name,
        email:        req.email,
        phone:        req.phone,
        subject_type: req.subject_type,
        subject:      req.subject,
        message:      req.message,
    };

    let saved = state.usecase.create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ContactMessageDto::from(saved))),
    ))
}

/// GET /api/contact/{id}
pub async fn get_contact_message(
    State(state): State<Arc<ContactState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.usecase.get(ContactMessageId::new(id)).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(ContactMessageDto::from(message)))))
}

/// POST /api/contact/{id}/mark_read
pub async fn mark_contact_message_read(
    State(state): State<Arc<ContactState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.mark_read(ContactMessageId::new(id)).await?;

    Ok((StatusCode::OK, Json(StatusMessage::new("Message marked as read"))))
}
