//! # BookingRepository
//!
//! 予約リクエストの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **INSERT は RETURNING**: 採番された ID とタイムスタンプ込みのエンティティを返す
//! - **UPDATE は全カラム**: ユースケース層で遷移を検証済みのエンティティをそのまま書き戻す

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use nailbook_domain::{
    DomainError,
    booking::{Booking, BookingId, BookingRecord, BookingStatus, NewBooking, TimeSlot},
    service::ServiceId,
    value_objects::{EmailAddress, PersonName, PhoneNumber},
};
use sqlx::{FromRow, PgPool};

use crate::error::{InfraError, corrupted};

/// 予約リポジトリトレイト
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 新規予約を `pending` で登録する
    async fn insert(&self, booking: &NewBooking, now: DateTime<Utc>)
    -> Result<Booking, InfraError>;

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, InfraError>;

    /// 作成日時の降順で取得する
    async fn find_all(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, InfraError>;

    /// 予約を更新する
    ///
    /// 対象行が存在しない場合は `Ok(false)` を返す。
    async fn update(&self, booking: &Booking) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の BookingRepository
#[derive(Debug, Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id:             i64,
    customer_name:  String,
    customer_email: String,
    customer_phone: String,
    service_id:     i64,
    preferred_date: NaiveDate,
    preferred_time: NaiveTime,
    notes:          String,
    status:         String,
    created_at:     DateTime<Utc>,
    updated_at:     DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = InfraError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let preferred_time = TimeSlot::from_time(row.preferred_time).ok_or_else(|| {
            InfraError::corrupted_data(format!("preferred_time: {}", row.preferred_time))
        })?;

        Ok(Booking::from_db(BookingRecord {
            id: BookingId::new(row.id),
            customer_name: PersonName::new(row.customer_name)
                .map_err(corrupted::<DomainError>("customer_name"))?,
            customer_email: EmailAddress::new(row.customer_email)
                .map_err(corrupted::<DomainError>("customer_email"))?,
            customer_phone: PhoneNumber::new(row.customer_phone)
                .map_err(corrupted::<DomainError>("customer_phone"))?,
            service_id: ServiceId::new(row.service_id),
            preferred_date: row.preferred_date,
            preferred_time,
            notes: row.notes,
            status: row
                .status
                .parse::<BookingStatus>()
                .map_err(corrupted("status"))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, customer_name, customer_email, customer_phone, service_id,
           preferred_date, preferred_time, notes, status, created_at, updated_at
    FROM booking_requests
"#;

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(service_id = %booking.service_id))]
    async fn insert(
        &self,
        booking: &NewBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, InfraError> {
        let status: &'static str = BookingStatus::Pending.into();
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO booking_requests (
                customer_name, customer_email, customer_phone, service_id,
                preferred_date, preferred_time, notes, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING id, customer_name, customer_email, customer_phone, service_id,
                      preferred_date, preferred_time, notes, status, created_at, updated_at
            "#,
        )
        .bind(booking.customer_name.as_str())
        .bind(booking.customer_email.as_str())
        .bind(booking.customer_phone.as_str())
        .bind(booking.service_id.as_i64())
        .bind(booking.preferred_date)
        .bind(booking.preferred_time.as_time())
        .bind(&booking.notes)
        .bind(status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Booking::try_from(row)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, InfraError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, InfraError> {
        let status: Option<&'static str> = status.map(Into::into);
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{SELECT_COLUMNS} WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC, id DESC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %booking.id()))]
    async fn update(&self, booking: &Booking) -> Result<bool, InfraError> {
        let status: &'static str = booking.status().into();
        let result = sqlx::query(
            r#"
            UPDATE booking_requests SET
                customer_name = $2,
                customer_email = $3,
                customer_phone = $4,
                service_id = $5,
                preferred_date = $6,
                preferred_time = $7,
                notes = $8,
                status = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(booking.id().as_i64())
        .bind(booking.customer_name().as_str())
        .bind(booking.customer_email().as_str())
        .bind(booking.customer_phone().as_str())
        .bind(booking.service_id().as_i64())
        .bind(booking.preferred_date())
        .bind(booking.preferred_time().as_time())
        .bind(booking.notes())
        .bind(status)
        .bind(booking.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
