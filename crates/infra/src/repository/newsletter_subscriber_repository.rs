//! # NewsletterSubscriberRepository
//!
//! ニュースレター購読者の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **email は一意**: 正規化済みの email に UNIQUE 制約を張り、同時登録の競合は
//!   [`InfraError::conflict`] として返す。ユースケース層が再取得して冪等に処理する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nailbook_domain::{
    DomainError,
    newsletter::{NewsletterSubscriber, SubscriberId, SubscriberRecord},
    value_objects::{EmailAddress, PersonName},
};
use sqlx::{FromRow, PgPool};

use crate::error::{InfraError, corrupted};

/// 購読者リポジトリトレイト
#[async_trait]
pub trait NewsletterSubscriberRepository: Send + Sync {
    /// 正規化済み email で検索する
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<NewsletterSubscriber>, InfraError>;

    async fn find_by_id(&self, id: SubscriberId)
    -> Result<Option<NewsletterSubscriber>, InfraError>;

    /// 有効な購読者を購読日時の降順で取得する
    async fn find_active(&self) -> Result<Vec<NewsletterSubscriber>, InfraError>;

    /// 新規購読者を登録する
    ///
    /// email が既に存在する場合は `InfraErrorKind::Conflict` を返す。
    async fn insert(
        &self,
        email: &EmailAddress,
        name: Option<&PersonName>,
        now: DateTime<Utc>,
    ) -> Result<NewsletterSubscriber, InfraError>;

    /// 状態（有効フラグ・名前・解除日時）を書き戻す
    async fn update(&self, subscriber: &NewsletterSubscriber) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の NewsletterSubscriberRepository
#[derive(Debug, Clone)]
pub struct PostgresNewsletterSubscriberRepository {
    pool: PgPool,
}

impl PostgresNewsletterSubscriberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriberRow {
    id:              i64,
    email:           String,
    name:            Option<String>,
    is_active:       bool,
    subscribed_at:   DateTime<Utc>,
    unsubscribed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriberRow> for NewsletterSubscriber {
    type Error = InfraError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let name = row
            .name
            .filter(|n| !n.trim().is_empty())
            .map(PersonName::new)
            .transpose()
            .map_err(corrupted::<DomainError>("name"))?;

        Ok(NewsletterSubscriber::from_db(SubscriberRecord {
            id: SubscriberId::new(row.id),
            email: EmailAddress::new(row.email).map_err(corrupted::<DomainError>("email"))?,
            name,
            is_active: row.is_active,
            subscribed_at: row.subscribed_at,
            unsubscribed_at: row.unsubscribed_at,
        }))
    }
}

const COLUMNS: &str = "id, email, name, is_active, subscribed_at, unsubscribed_at";

#[async_trait]
impl NewsletterSubscriberRepository for PostgresNewsletterSubscriberRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<NewsletterSubscriber>, InfraError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {COLUMNS} FROM newsletter_subscribers WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(NewsletterSubscriber::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(
        &self,
        id: SubscriberId,
    ) -> Result<Option<NewsletterSubscriber>, InfraError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {COLUMNS} FROM newsletter_subscribers WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(NewsletterSubscriber::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_active(&self) -> Result<Vec<NewsletterSubscriber>, InfraError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {COLUMNS} FROM newsletter_subscribers WHERE is_active = TRUE \
             ORDER BY subscribed_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NewsletterSubscriber::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(
        &self,
        email: &EmailAddress,
        name: Option<&PersonName>,
        now: DateTime<Utc>,
    ) -> Result<NewsletterSubscriber, InfraError> {
        let result = sqlx::query_as::<_, SubscriberRow>(&format!(
            r#"
            INSERT INTO newsletter_subscribers (email, name, is_active, subscribed_at)
            VALUES ($1, $2, TRUE, $3)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(email.as_str())
        .bind(name.map(PersonName::as_str))
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => NewsletterSubscriber::try_from(row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                InfraError::conflict("NewsletterSubscriber", email.as_str()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %subscriber.id()))]
    async fn update(&self, subscriber: &NewsletterSubscriber) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE newsletter_subscribers
            SET name = $2, is_active = $3, unsubscribed_at = $4
            WHERE id = $1
            "#,
        )
        .bind(subscriber.id().as_i64())
        .bind(subscriber.name().map(PersonName::as_str))
        .bind(subscriber.is_active())
        .bind(subscriber.unsubscribed_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
