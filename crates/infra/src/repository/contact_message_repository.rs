//! # ContactMessageRepository
//!
//! お問い合わせメッセージの永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nailbook_domain::{
    DomainError,
    contact::{ContactMessage, ContactMessageId, ContactSubject, NewContactMessage, SubjectType},
    value_objects::{EmailAddress, PersonName, PhoneNumber},
};
use sqlx::{FromRow, PgPool};

use crate::error::{InfraError, corrupted};

/// お問い合わせリポジトリトレイト
#[async_trait]
pub trait ContactMessageRepository: Send + Sync {
    /// 未読状態で登録する
    async fn insert(
        &self,
        message: &NewContactMessage,
        now: DateTime<Utc>,
    ) -> Result<ContactMessage, InfraError>;

    async fn find_by_id(&self, id: ContactMessageId)
    -> Result<Option<ContactMessage>, InfraError>;

    /// 作成日時の降順で取得する
    async fn find_all(&self, is_read: Option<bool>) -> Result<Vec<ContactMessage>, InfraError>;

    /// 既読フラグを更新する。対象行が無い場合は `Ok(false)`
    async fn update(&self, message: &ContactMessage) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の ContactMessageRepository
#[derive(Debug, Clone)]
pub struct PostgresContactMessageRepository {
    pool: PgPool,
}

impl PostgresContactMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ContactMessageRow {
    id:           i64,
    name:         String,
    email:        String,
    phone:        Option<String>,
    subject_type: String,
    subject:      String,
    message:      String,
    is_read:      bool,
    created_at:   DateTime<Utc>,
    updated_at:   DateTime<Utc>,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = InfraError;

    fn try_from(row: ContactMessageRow) -> Result<Self, Self::Error> {
        let phone = row
            .phone
            .filter(|p| !p.trim().is_empty())
            .map(PhoneNumber::new)
            .transpose()
            .map_err(corrupted::<DomainError>("phone"))?;

        Ok(ContactMessage {
            id: ContactMessageId::new(row.id),
            name: PersonName::new(row.name).map_err(corrupted::<DomainError>("name"))?,
            email: EmailAddress::new(row.email).map_err(corrupted::<DomainError>("email"))?,
            phone,
            subject_type: row
                .subject_type
                .parse::<SubjectType>()
                .map_err(corrupted("subject_type"))?,
            subject: ContactSubject::new(row.subject)
                .map_err(corrupted::<DomainError>("subject"))?,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const RETURNING_COLUMNS: &str =
    "id, name, email, phone, subject_type, subject, message, is_read, created_at, updated_at";

#[async_trait]
impl ContactMessageRepository for PostgresContactMessageRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(
        &self,
        message: &NewContactMessage,
        now: DateTime<Utc>,
    ) -> Result<ContactMessage, InfraError> {
        let subject_type: &'static str = message.subject_type.into();
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            r#"
            INSERT INTO contact_messages (
                name, email, phone, subject_type, subject, message, is_read, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $7)
            RETURNING {RETURNING_COLUMNS}
            "#
        ))
        .bind(message.name.as_str())
        .bind(message.email.as_str())
        .bind(message.phone.as_ref().map(PhoneNumber::as_str))
        .bind(subject_type)
        .bind(message.subject.as_str())
        .bind(&message.message)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        ContactMessage::try_from(row)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(
        &self,
        id: ContactMessageId,
    ) -> Result<Option<ContactMessage>, InfraError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "SELECT {RETURNING_COLUMNS} FROM contact_messages WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContactMessage::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self, is_read: Option<bool>) -> Result<Vec<ContactMessage>, InfraError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(&format!(
            r#"
            SELECT {RETURNING_COLUMNS} FROM contact_messages
            WHERE ($1::boolean IS NULL OR is_read = $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(is_read)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ContactMessage::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %message.id))]
    async fn update(&self, message: &ContactMessage) -> Result<bool, InfraError> {
        let result = sqlx::query(
            "UPDATE contact_messages SET is_read = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(message.id.as_i64())
        .bind(message.is_read)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_空文字の電話番号は未入力として復元される() {
        let now = Utc::now();
        let row = ContactMessageRow {
            id:           1,
            name:         "Ada".to_string(),
            email:        "ada@example.com".to_string(),
            phone:        Some("".to_string()),
            subject_type: "pricing".to_string(),
            subject:      "Lash refill".to_string(),
            message:      "How much?".to_string(),
            is_read:      false,
            created_at:   now,
            updated_at:   now,
        };

        let message = ContactMessage::try_from(row).unwrap();

        assert_eq!(message.phone, None);
        assert_eq!(message.subject_type, SubjectType::Pricing);
    }
}
