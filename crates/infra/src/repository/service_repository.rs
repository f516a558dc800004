//! # ServiceRepository
//!
//! 施術メニューの読み取りを担当するリポジトリ。
//! メニューの作成・編集は管理画面の責務で、この API からは参照のみ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nailbook_domain::service::{
    Price,
    Service,
    ServiceCategory,
    ServiceFilter,
    ServiceId,
    ServiceOrdering,
};
use sqlx::{FromRow, PgPool};

use crate::error::{InfraError, corrupted};

/// 施術メニューリポジトリトレイト
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// ID で検索する（無効なメニューも返す）
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, InfraError>;

    /// 有効なメニューを絞り込み条件・並び順に従って取得する
    async fn find_active(&self, filter: &ServiceFilter) -> Result<Vec<Service>, InfraError>;
}

/// PostgreSQL 実装の ServiceRepository
#[derive(Debug, Clone)]
pub struct PostgresServiceRepository {
    pool: PgPool,
}

impl PostgresServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ServiceRow {
    id:               i64,
    name:             String,
    category:         String,
    description:      String,
    price_minor:      i64,
    duration_minutes: i32,
    is_featured:      bool,
    is_active:        bool,
    image:            Option<String>,
    second_image:     Option<String>,
    created_at:       DateTime<Utc>,
    updated_at:       DateTime<Utc>,
}

impl TryFrom<ServiceRow> for Service {
    type Error = InfraError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(Service {
            id:               ServiceId::new(row.id),
            name:             row.name,
            category:         row
                .category
                .parse::<ServiceCategory>()
                .map_err(corrupted("category"))?,
            description:      row.description,
            price:            Price::from_minor_units(row.price_minor)
                .map_err(corrupted("price_minor"))?,
            duration_minutes: row.duration_minutes,
            is_featured:      row.is_featured,
            is_active:        row.is_active,
            image:            row.image,
            second_image:     row.second_image,
            created_at:       row.created_at,
            updated_at:       row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, category, description, price_minor, duration_minutes,
           is_featured, is_active, image, second_image, created_at, updated_at
    FROM services
"#;

/// 並び順を ORDER BY 句に変換する（固定文字列のみを返す）
fn order_by_clause(ordering: ServiceOrdering) -> &'static str {
    match ordering {
        ServiceOrdering::CategoryThenName => "category ASC, name ASC",
        ServiceOrdering::Name { descending: false } => "name ASC",
        ServiceOrdering::Name { descending: true } => "name DESC",
        ServiceOrdering::Price { descending: false } => "price_minor ASC, name ASC",
        ServiceOrdering::Price { descending: true } => "price_minor DESC, name ASC",
        ServiceOrdering::Duration { descending: false } => "duration_minutes ASC, name ASC",
        ServiceOrdering::Duration { descending: true } => "duration_minutes DESC, name ASC",
    }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, InfraError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Service::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_active(&self, filter: &ServiceFilter) -> Result<Vec<Service>, InfraError> {
        let sql = format!(
            r#"{SELECT_COLUMNS}
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR category = $1)
              AND ($2::boolean IS NULL OR is_featured = $2)
              AND ($3::text IS NULL
                   OR name ILIKE '%' || $3 || '%'
                   OR description ILIKE '%' || $3 || '%')
            ORDER BY {}"#,
            order_by_clause(filter.ordering)
        );
        let category: Option<&'static str> = filter.category.map(Into::into);

        let rows = sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(category)
            .bind(filter.is_featured)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Service::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresServiceRepository>();
    }

    #[rstest]
    #[case(ServiceOrdering::CategoryThenName, "category ASC, name ASC")]
    #[case(ServiceOrdering::Name { descending: true }, "name DESC")]
    #[case(ServiceOrdering::Price { descending: false }, "price_minor ASC, name ASC")]
    #[case(ServiceOrdering::Duration { descending: true }, "duration_minutes DESC, name ASC")]
    fn test_並び順がorder_by句に変換される(
        #[case] ordering: ServiceOrdering,
        #[case] expected: &str,
    ) {
        assert_eq!(order_by_clause(ordering), expected);
    }

    #[test]
    fn test_不正なカテゴリの行はcorrupted_dataになる() {
        let now = Utc::now();
        let row = ServiceRow {
            id:               1,
            name:             "Gel Polish".to_string(),
            category:         "hair".to_string(),
            description:      "".to_string(),
            price_minor:      450000,
            duration_minutes: 60,
            is_featured:      false,
            is_active:        true,
            image:            None,
            second_image:     None,
            created_at:       now,
            updated_at:       now,
        };

        let err = Service::try_from(row).unwrap_err();

        assert!(err.to_string().contains("category"));
    }
}
