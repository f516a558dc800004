//! # 予約ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/booking` - 予約一覧（`status` で絞り込み）
//! - `POST /api/booking` - 予約リクエスト作成
//! - `GET /api/booking/{id}` - 予約詳細
//! - `PATCH /api/booking/{id}` - 部分更新（備考・希望日時・ステータス）
//! - `POST /api/booking/{id}/confirm` - 予約確定

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use nailbook_domain::{
    booking::{BookingId, BookingStatus, TimeSlot},
    service::ServiceId,
};
use nailbook_shared::{ApiResponse, StatusMessage};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::service::ServiceDto;
use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    usecase::{BookingUseCaseImpl, BookingWithService, CreateBookingInput, UpdateBookingInput},
};

/// 予約 API の共有状態
pub struct BookingState {
    pub usecase: BookingUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 予約作成リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub customer_name:  String,
    #[validate(email(message = "Enter a valid email address."))]
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(alias = "service")]
    pub service_id:     i64,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    #[serde(default)]
    pub notes:          String,
}

/// 予約の部分更新リクエスト
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    pub notes:          Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub status:         Option<BookingStatus>,
}

/// 一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
}

/// 予約 DTO
///
/// メニューは入れ子で返す。メニューが削除されている場合、
/// `service`・`total_duration`・`estimated_end_time` は `null` になる。
#[derive(Debug, Serialize)]
pub struct BookingDto {
    pub id:                 BookingId,
    pub customer_name:      String,
    pub customer_email:     String,
    pub customer_phone:     String,
    pub service_id:         ServiceId,
    pub service:            Option<ServiceDto>,
    pub preferred_date:     NaiveDate,
    pub preferred_time:     TimeSlot,
    pub notes:              String,
    pub status:             BookingStatus,
    pub total_duration:     Option<i32>,
    pub estimated_end_time: Option<String>,
    pub created_at:         String,
    pub updated_at:         String,
}

impl From<BookingWithService> for BookingDto {
    fn from(BookingWithService { booking, service }: BookingWithService) -> Self {
        let total_duration = service.as_ref().map(|s| booking.total_duration(s));
        let estimated_end_time = service
            .as_ref()
            .map(|s| booking.estimated_end_time(s).format("%Y-%m-%dT%H:%M:%S").to_string());

        Self {
            id: booking.id(),
            customer_name: booking.customer_name().as_str().to_string(),
            customer_email: booking.customer_email().to_string(),
            customer_phone: booking.customer_phone().to_string(),
            service_id: booking.service_id(),
            service: service.map(ServiceDto::from),
            preferred_date: booking.preferred_date(),
            preferred_time: booking.preferred_time(),
            notes: booking.notes().to_string(),
            status: booking.status(),
            total_duration,
            estimated_end_time,
            created_at: booking.created_at().to_rfc3339(),
            updated_at: booking.updated_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /api/booking
pub async fn list_bookings(
    State(state): State<Arc<BookingState>>,
    ApiQuery(query): ApiQuery<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.usecase.list(query.status).await?;

    let items: Vec<BookingDto> = bookings.into_iter().map(BookingDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/booking
///
/// 予約を `pending` で保存し、管理者への通知をスケジュールして 201 を返す。
/// メール送信の成否はレスポンスに影響しない。
pub async fn create_booking(
    State(state): State<Arc<BookingState>>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateBookingInput {
        customer_name:  req.customer_name,
        customer_email: req.customer_email,
        customer_phone: req.customer_phone,
        service_id:     req.service_id,
        preferred_date: req.preferred_date,
        preferred_time: req.preferred_time,
        notes:          req.notes,
    };

    let created = state.usecase.create(input).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(BookingDto::from(created)))))
}

/// GET /api/booking/{id}
pub async fn get_booking(
    State(state): State<Arc<BookingState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.usecase.get(BookingId::new(id)).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(BookingDto::from(booking)))))
}

/// PATCH /api/booking/{id}
pub async fn update_booking(
    State(state): State<Arc<BookingState>>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateBookingInput {
        notes:          req.notes,
        preferred_date: req.preferred_date,
        preferred_time: req.preferred_time,
        status:         req.status,
    };

    let updated = state.usecase.update(BookingId::new(id), input).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(BookingDto::from(updated)))))
}

/// POST /api/booking/{id}/confirm
pub async fn confirm_booking(
    State(state): State<Arc<BookingState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.usecase.confirm(BookingId::new(id)).await?;

    Ok((StatusCode::OK, Json(StatusMessage::new("Booking confirmed"))))
}
