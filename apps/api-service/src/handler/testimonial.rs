//! # お客様の声ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/testimonials` - 承認済み一覧（`service_category`, `is_featured`, `rating`）
//! - `POST /api/testimonials` - 投稿（承認待ちで保存）
//! - `GET /api/testimonials/{id}` - 承認済みの詳細

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use nailbook_domain::{
    service::ServiceCategory,
    testimonial::{Rating, Testimonial, TestimonialFilter, TestimonialId},
};
use nailbook_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    usecase::{CreateTestimonialInput, TestimonialUseCaseImpl},
};

pub struct TestimonialState {
    pub usecase: TestimonialUseCaseImpl,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestimonialRequest {
    pub client_name:      String,
    #[validate(url(message = "Enter a valid URL."))]
    pub client_photo:     Option<String>,
    pub service_category: ServiceCategory,
    pub rating:           i64,
    pub review_text:      String,
}

#[derive(Debug, Deserialize)]
pub struct TestimonialListQuery {
    pub service_category: Option<ServiceCategory>,
    pub is_featured:      Option<bool>,
    pub rating:           Option<i64>,
}

impl TryFrom<TestimonialListQuery> for TestimonialFilter {
    type Error = ApiError;

    fn try_from(query: TestimonialListQuery) -> Result<Self, Self::Error> {
        let rating = query
            .rating
            .map(Rating::new)
            .transpose()
            .map_err(|e| e.at("rating"))?;

        Ok(Self {
            service_category: query.service_category,
            is_featured: query.is_featured,
            rating,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TestimonialDto {
    pub id:               TestimonialId,
    pub client_name:      String,
    pub client_photo:     Option<String>,
    pub service_category: ServiceCategory,
    pub rating:           Rating,
    pub stars_display:    String,
    pub review_text:      String,
    pub is_featured:      bool,
    pub created_at:       String,
}

impl From<Testimonial> for TestimonialDto {
    fn from(testimonial: Testimonial) -> Self {
        Self {
            id:               testimonial.id,
            client_name:      testimonial.client_name.into_string(),
            client_photo:     testimonial.client_photo,
            service_category: testimonial.service_category,
            stars_display:    testimonial.rating.stars_display(),
            rating:           testimonial.rating,
            review_text:      testimonial.review_text,
            is_featured:      testimonial.is_featured,
            created_at:       testimonial.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/testimonials
pub async fn list_testimonials(
    State(state): State<Arc<TestimonialState>>,
    ApiQuery(query): ApiQuery<TestimonialListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TestimonialFilter::try_from(query)?;
    let testimonials = state.usecase.list(&filter).await?;

    let items: Vec<TestimonialDto> = testimonials.into_iter().map(TestimonialDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/testimonials
pub async fn create_testimonial(
    State(state): State<Arc<TestimonialState>>,
    ValidatedJson(req): ValidatedJson<CreateTestimonialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateTestimonialInput {
        client_name:      req.client_name,
        client_photo:     req.client_photo,
        service_category: req.service_category,
        rating:           req.rating,
        review_text:      req.review_text,
    };

    let created = state.usecase.create(input).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(TestimonialDto::from(created)))))
}

/// GET /api/testimonials/{id}
pub async fn get_testimonial(
    State(state): State<Arc<TestimonialState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let testimonial = state.usecase.get(TestimonialId::new(id)).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(TestimonialDto::from(testimonial)))))
}
