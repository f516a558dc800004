//! # ギャラリーハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/gallery` - 公開中の画像一覧（`category`, `is_featured`）
//! - `POST /api/gallery` - 画像登録（サムネイルは非同期で生成）
//! - `GET /api/gallery/{id}` - 画像詳細

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use nailbook_domain::gallery::{GalleryCategory, GalleryFilter, GalleryImage, GalleryImageId};
use nailbook_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    usecase::{GalleryUseCaseImpl, RegisterGalleryImageInput},
};

pub struct GalleryState {
    pub usecase: GalleryUseCaseImpl,
}

/// 画像登録リクエスト
///
/// `image` は保存先 CDN の URL。アップロード自体はこの API の外で行う。
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterGalleryImageRequest {
    pub title:            String,
    #[serde(default)]
    pub description:      String,
    pub category:         GalleryCategory,
    #[validate(url(message = "Enter a valid URL."))]
    pub image:            String,
    #[validate(url(message = "Enter a valid URL."))]
    pub comparison_image: Option<String>,
    #[serde(default)]
    pub is_featured:      bool,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub sort_order:       i32,
}

#[derive(Debug, Deserialize)]
pub struct GalleryListQuery {
    pub category:    Option<GalleryCategory>,
    pub is_featured: Option<bool>,
}

impl From<GalleryListQuery> for GalleryFilter {
    fn from(query: GalleryListQuery) -> Self {
        Self {
            category:    query.category,
            is_featured: query.is_featured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GalleryImageDto {
    pub id:               GalleryImageId,
    pub title:            String,
    pub description:      String,
    pub category:         GalleryCategory,
    pub image:            String,
    pub comparison_image: Option<String>,
    pub thumbnail:        Option<String>,
    pub is_featured:      bool,
    pub sort_order:       i32,
    pub created_at:       String,
}

impl From<GalleryImage> for GalleryImageDto {
    fn from(image: GalleryImage) -> Self {
        Self {
            id:               image.id,
            title:            image.title.into_string(),
            description:      image.description,
            category:         image.category,
            image:            image.image,
            comparison_image: image.comparison_image,
            thumbnail:        image.thumbnail,
            is_featured:      image.is_featured,
            sort_order:       image.sort_order,
            created_at:       image.created_at.to_rfc3339(),
        }
    }
}

/// GET /api/gallery
pub async fn list_gallery_images(
    State(state): State<Arc<GalleryState>>,
    ApiQuery(query): ApiQuery<GalleryListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let images = state.usecase.list(&query.into()).await?;

    let items: Vec<GalleryImageDto> = images.into_iter().map(GalleryImageDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/gallery
///
/// サムネイル生成を待たずに 201 を返す。レスポンスの `thumbnail` は常に `null`。
pub async fn register_gallery_image(
    State(state): State<Arc<GalleryState>>,
    ValidatedJson(req): ValidatedJson<RegisterGalleryImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterGalleryImageInput {
        title:            req.title,
        description:      req.description,
        category:         req.category,
        image:            req.image,
        comparison_image: req.comparison_image,
        is_featured:      req.is_featured,
        sort_order:       req.sort_order,
    };

    let image = state.usecase.register(input).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(GalleryImageDto::from(image)))))
}

/// GET /api/gallery/{id}
pub async fn get_gallery_image(
    State(state): State<Arc<GalleryState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state.usecase.get(GalleryImageId::new(id)).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(GalleryImageDto::from(image)))))
}
