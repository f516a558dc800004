//! # TestimonialRepository
//!
//! お客様の声の永続化を担当するリポジトリ。
//! 公開 API で参照できるのは承認済みのものだけ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nailbook_domain::{
    DomainError,
    service::ServiceCategory,
    testimonial::{NewTestimonial, Rating, Testimonial, TestimonialFilter, TestimonialId},
    value_objects::PersonName,
};
use sqlx::{FromRow, PgPool};

use crate::error::{InfraError, corrupted};

#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    /// 未承認・非注目の状態で登録する
    async fn insert(
        &self,
        testimonial: &NewTestimonial,
        now: DateTime<Utc>,
    ) -> Result<Testimonial, InfraError>;

    /// 承認済みのものを ID で検索する
    async fn find_approved_by_id(
        &self,
        id: TestimonialId,
    ) -> Result<Option<Testimonial>, InfraError>;

    /// 承認済みのものを注目 → 評価の降順 → 作成日時の降順で取得する
    async fn find_approved(
        &self,
        filter: &TestimonialFilter,
    ) -> Result<Vec<Testimonial>, InfraError>;
}

/// PostgreSQL 実装の TestimonialRepository
#[derive(Debug, Clone)]
pub struct PostgresTestimonialRepository {
    pool: PgPool,
}

impl PostgresTestimonialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TestimonialRow {
    id:               i64,
    client_name:      String,
    client_photo:     Option<String>,
    service_category: String,
    rating:           i16,
    review_text:      String,
    is_featured:      bool,
    is_approved:      bool,
    created_at:       DateTime<Utc>,
    updated_at:       DateTime<Utc>,
}

impl TryFrom<TestimonialRow> for Testimonial {
    type Error = InfraError;

    fn try_from(row: TestimonialRow) -> Result<Self, Self::Error> {
        Ok(Testimonial {
            id:               TestimonialId::new(row.id),
            client_name:      PersonName::new(row.client_name)
                .map_err(corrupted::<DomainError>("client_name"))?,
            client_photo:     row.client_photo,
            service_category: row
                .service_category
                .parse::<ServiceCategory>()
                .map_err(corrupted("service_category"))?,
            rating:           Rating::new(i64::from(row.rating))
                .map_err(corrupted::<DomainError>("rating"))?,
            review_text:      row.review_text,
            is_featured:      row.is_featured,
            is_approved:      row.is_approved,
            created_at:       row.created_at,
            updated_at:       row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, client_name, client_photo, service_category, rating, review_text, \
                       is_featured, is_approved, created_at, updated_at";

#[async_trait]
impl TestimonialRepository for PostgresTestimonialRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(
        &self,
        testimonial: &NewTestimonial,
        now: DateTime<Utc>,
    ) -> Result<Testimonial, InfraError> {
        let category: &'static str = testimonial.service_category.into();
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            r#"
            INSERT INTO testimonials (
                client_name, client_photo, service_category, rating, review_text,
                is_featured, is_approved, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, $6, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(testimonial.client_name.as_str())
        .bind(testimonial.client_photo.as_deref())
        .bind(category)
        .bind(i16::from(testimonial.rating.value()))
        .bind(&testimonial.review_text)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Testimonial::try_from(row)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_approved_by_id(
        &self,
        id: TestimonialId,
    ) -> Result<Option<Testimonial>, InfraError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            "SELECT {COLUMNS} FROM testimonials WHERE id = $1 AND is_approved = TRUE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Testimonial::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_approved(
        &self,
        filter: &TestimonialFilter,
    ) -> Result<Vec<Testimonial>, InfraError> {
        let category: Option<&'static str> = filter.service_category.map(Into::into);
        let rows = sqlx::query_as::<_, TestimonialRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM testimonials
            WHERE is_approved = TRUE
              AND ($1::text IS NULL OR service_category = $1)
              AND ($2::boolean IS NULL OR is_featured = $2)
              AND ($3::smallint IS NULL OR rating = $3)
            ORDER BY is_featured DESC, rating DESC, created_at DESC, id DESC
            "#
        ))
        .bind(category)
        .bind(filter.is_featured)
        .bind(filter.rating.map(|r| i16::from(r.value())))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Testimonial::try_from).collect()
    }
}
