//! # 施術メニューハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/services` - 有効なメニュー一覧（`category`, `is_featured`, `search`, `ordering`）
//! - `GET /api/services/{id}` - メニュー詳細

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use nailbook_domain::service::{
    Price,
    Service,
    ServiceCategory,
    ServiceFilter,
    ServiceId,
    ServiceOrdering,
};
use nailbook_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extract::{ApiPath, ApiQuery},
    usecase::ServiceUseCaseImpl,
};

/// 施術メニュー API の共有状態
pub struct ServiceState {
    pub usecase: ServiceUseCaseImpl,
}

/// 一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ServiceListQuery {
    pub category:    Option<ServiceCategory>,
    pub is_featured: Option<bool>,
    pub search:      Option<String>,
    pub ordering:    Option<String>,
}

impl From<ServiceListQuery> for ServiceFilter {
    fn from(query: ServiceListQuery) -> Self {
        Self {
            category:    query.category,
            is_featured: query.is_featured,
            search:      query.search.filter(|s| !s.trim().is_empty()),
            ordering:    query
                .ordering
                .as_deref()
                .map(ServiceOrdering::parse)
                .unwrap_or_default(),
        }
    }
}

/// 施術メニュー DTO
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDto {
    pub id:               ServiceId,
    pub name:             String,
    pub category:         ServiceCategory,
    pub description:      String,
    /// `"4500.00"` 形式
    pub price:            Price,
    pub duration_minutes: i32,
    pub duration_display: String,
    pub is_featured:      bool,
    pub is_active:        bool,
    pub image:            Option<String>,
    pub second_image:     Option<String>,
    pub created_at:       String,
    pub updated_at:       String,
}

impl From<Service> for ServiceDto {
    fn from(service: Service) -> Self {
        Self {
            duration_display: service.duration_display(),
            id:               service.id,
            name:             service.name,
            category:         service.category,
            description:      service.description,
            price:            service.price,
            duration_minutes: service.duration_minutes,
            is_featured:      service.is_featured,
            is_active:        service.is_active,
            image:            service.image,
            second_image:     service.second_image,
            created_at:       service.created_at.to_rfc3339(),
            updated_at:       service.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/services
pub async fn list_services(
    State(state): State<Arc<ServiceState>>,
    ApiQuery(query): ApiQuery<ServiceListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let services = state.usecase.list(&query.into()).await?;

    let items: Vec<ServiceDto> = services.into_iter().map(ServiceDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// GET /api/services/{id}
pub async fn get_service(
    State(state): State<Arc<ServiceState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.usecase.get(ServiceId::new(id)).await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(ServiceDto::from(service)))))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, ServiceOrdering::CategoryThenName)]
    #[case(Some("-price"), ServiceOrdering::Price { descending: true })]
    #[case(Some("unknown"), ServiceOrdering::CategoryThenName)]
    fn test_orderingパラメータを並び順に変換する(
        #[case] ordering: Option<&str>,
        #[case] expected: ServiceOrdering,
    ) {
        let query = ServiceListQuery {
            ordering: ordering.map(str::to_string),
            ..Default::default()
        };

        assert_eq!(ServiceFilter::from(query).ordering, expected);
    }

    #[test]
    fn test_空の検索語は絞り込みに使わない() {
        let query = ServiceListQuery {
            search: Some("  ".to_string()),
            ..Default::default()
        };

        assert_eq!(ServiceFilter::from(query).search, None);
    }
}
