//! # GalleryImageRepository
//!
//! ギャラリー画像の永続化を担当するリポジトリ。
//! サムネイル URL は登録後のフックが [`GalleryImageRepository::set_thumbnail`] で書き込む。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nailbook_domain::{
    DomainError,
    gallery::{
        GalleryCategory,
        GalleryFilter,
        GalleryImage,
        GalleryImageId,
        GalleryTitle,
        NewGalleryImage,
    },
};
use sqlx::{FromRow, PgPool};

use crate::error::{InfraError, corrupted};

#[async_trait]
pub trait GalleryImageRepository: Send + Sync {
    async fn insert(
        &self,
        image: &NewGalleryImage,
        now: DateTime<Utc>,
    ) -> Result<GalleryImage, InfraError>;

    /// 公開中の画像を ID で検索する
    async fn find_active_by_id(
        &self,
        id: GalleryImageId,
    ) -> Result<Option<GalleryImage>, InfraError>;

    /// 公開中の画像を表示順の降順 → 注目 → 作成日時の降順で取得する
    async fn find_active(&self, filter: &GalleryFilter) -> Result<Vec<GalleryImage>, InfraError>;

    /// サムネイル URL を設定する。対象行が無い場合は `Ok(false)`
    async fn set_thumbnail(
        &self,
        id: GalleryImageId,
        thumbnail: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の GalleryImageRepository
#[derive(Debug, Clone)]
pub struct PostgresGalleryImageRepository {
    pool: PgPool,
}

impl PostgresGalleryImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GalleryImageRow {
    id:               i64,
    title:            String,
    description:      String,
    category:         String,
    image:            String,
    comparison_image: Option<String>,
    thumbnail:        Option<String>,
    is_featured:      bool,
    is_active:        bool,
    sort_order:       i32,
    created_at:       DateTime<Utc>,
    updated_at:       DateTime<Utc>,
}

impl TryFrom<GalleryImageRow> for GalleryImage {
    type Error = InfraError;

    fn try_from(row: GalleryImageRow) -> Result<Self, Self::Error> {
        Ok(GalleryImage {
            id:               GalleryImageId::new(row.id),
            title:            GalleryTitle::new(row.title)
                .map_err(corrupted::<DomainError>("title"))?,
            description:      row.description,
            category:         row
                .category
                .parse::<GalleryCategory>()
                .map_err(corrupted("category"))?,
            image:            row.image,
            comparison_image: row.comparison_image,
            thumbnail:        row.thumbnail,
            is_featured:      row.is_featured,
            is_active:        row.is_active,
            sort_order:       row.sort_order,
            created_at:       row.created_at,
            updated_at:       row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, title, description, category, image, comparison_image, thumbnail, \
                       is_featured, is_active, sort_order, created_at, updated_at";

#[async_trait]
impl GalleryImageRepository for PostgresGalleryImageRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(
        &self,
        image: &NewGalleryImage,
        now: DateTime<Utc>,
    ) -> Result<GalleryImage, InfraError> {
        let category: &'static str = image.category.into();
        let row = sqlx::query_as::<_, GalleryImageRow>(&format!(
            r#"
            INSERT INTO gallery_images (
                title, description, category, image, comparison_image,
                is_featured, is_active, sort_order, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(image.title.as_str())
        .bind(&image.description)
        .bind(category)
        .bind(&image.image)
        .bind(image.comparison_image.as_deref())
        .bind(image.is_featured)
        .bind(image.sort_order)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        GalleryImage::try_from(row)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_active_by_id(
        &self,
        id: GalleryImageId,
    ) -> Result<Option<GalleryImage>, InfraError> {
        let row = sqlx::query_as::<_, GalleryImageRow>(&format!(
            "SELECT {COLUMNS} FROM gallery_images WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(GalleryImage::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_active(&self, filter: &GalleryFilter) -> Result<Vec<GalleryImage>, InfraError> {
        let category: Option<&'static str> = filter.category.map(Into::into);
        let rows = sqlx::query_as::<_, GalleryImageRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM gallery_images
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR category = $1)
              AND ($2::boolean IS NULL OR is_featured = $2)
            ORDER BY sort_order DESC, is_featured DESC, created_at DESC, id DESC
            "#
        ))
        .bind(category)
        .bind(filter.is_featured)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GalleryImage::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn set_thumbnail(
        &self,
        id: GalleryImageId,
        thumbnail: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let result =
            sqlx::query("UPDATE gallery_images SET thumbnail = $2, updated_at = $3 WHERE id = $1")
                .bind(id.as_i64())
                .bind(thumbnail)
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
