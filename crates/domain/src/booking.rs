//! # 予約リクエスト（BookingRequest）
//!
//! お客様からの施術予約リクエストを表現するドメインモデル。
//!
//! ## 状態遷移
//!
//! ステータスは呼び出し側が直接指定する。既定の [`TransitionPolicy::Permissive`] では
//! 任意のステータスから任意のステータスへ遷移できる。
//! [`TransitionPolicy::Strict`] を選ぶと以下のグラフに制限される:
//!
//! ```text
//! pending ──→ confirmed ──→ completed
//!    │            │
//!    └──→ cancelled ←┘
//! ```
//!
//! どちらのポリシーでも、`confirmed` 以外から `confirmed` に入る遷移だけが
//! お客様への確認メール送信のトリガーになる（[`enters_confirmed`]）。
//!
//! ## 使用例
//!
//! ```rust
//! use nailbook_domain::booking::{BookingStatus, TransitionPolicy, enters_confirmed};
//!
//! assert!(TransitionPolicy::Permissive
//!     .check(BookingStatus::Completed, BookingStatus::Pending)
//!     .is_ok());
//! assert!(TransitionPolicy::Strict
//!     .check(BookingStatus::Completed, BookingStatus::Pending)
//!     .is_err());
//! assert!(enters_confirmed(BookingStatus::Pending, BookingStatus::Confirmed));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum::{EnumString, IntoStaticStr};

use crate::{
    DomainError,
    service::{Service, ServiceId},
    value_objects::{EmailAddress, PersonName, PhoneNumber},
};

define_integer_id! {
    /// 予約リクエスト ID
    pub struct BookingId;
}

/// 施術時間に加算する前後の準備時間（分）
pub const BUFFER_MINUTES: i32 = 15;

// =========================================================================
// BookingStatus
// =========================================================================

/// 予約ステータス
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// `confirmed` への進入かどうか
///
/// 確認メールはこの遷移でのみ送信する。`confirmed → confirmed` は進入ではない。
pub fn enters_confirmed(from: BookingStatus, to: BookingStatus) -> bool {
    from != BookingStatus::Confirmed && to == BookingStatus::Confirmed
}

// =========================================================================
// TransitionPolicy
// =========================================================================

/// ステータス遷移ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// 任意の遷移を許可する（既定）
    #[default]
    Permissive,
    /// pending → {confirmed, cancelled}、confirmed → {completed, cancelled} のみ許可する
    Strict,
}

impl TransitionPolicy {
    /// 設定値 `"permissive"` / `"strict"` を解釈する
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    /// 遷移が許可されるか検証する
    ///
    /// 同一ステータスへの遷移（no-op）はどちらのポリシーでも許可する。
    pub fn check(&self, from: BookingStatus, to: BookingStatus) -> Result<(), DomainError> {
        use BookingStatus::*;

        let allowed = match self {
            Self::Permissive => true,
            Self::Strict => {
                from == to
                    || matches!(
                        (from, to),
                        (Pending, Confirmed | Cancelled) | (Confirmed, Completed | Cancelled)
                    )
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: from.into(),
                to:   to.into(),
            })
        }
    }
}

// =========================================================================
// TimeSlot
// =========================================================================

/// 予約可能な開始時刻（9:00〜18:00 の毎正時）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSlot(NaiveTime);

const FIRST_SLOT_HOUR: u32 = 9;
const LAST_SLOT_HOUR: u32 = 18;

impl TimeSlot {
    /// `"HH:MM"` 形式の文字列から生成する
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let invalid = || {
            DomainError::invalid(
                "",
                format!("\"{value}\" is not a valid choice."),
            )
        };

        let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| invalid())?;
        Self::from_time(time).ok_or_else(invalid)
    }

    /// 正時かつ営業時間内の時刻のみ受け付ける
    pub fn from_time(time: NaiveTime) -> Option<Self> {
        use chrono::Timelike;

        let on_the_hour = time.minute() == 0 && time.second() == 0;
        let in_hours = (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR).contains(&time.hour());
        (on_the_hour && in_hours).then_some(Self(time))
    }

    pub fn as_time(&self) -> NaiveTime {
        self.0
    }

    /// 表示用ラベル（例: `"10:00 AM"`、`"1:00 PM"`）
    pub fn label(&self) -> String {
        self.0.format("%-I:%M %p").to_string()
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =========================================================================
// NewBooking
// =========================================================================

/// 予約作成時の入力（検証済み値オブジェクトで構成）
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_name:  PersonName,
    pub customer_email: EmailAddress,
    pub customer_phone: PhoneNumber,
    pub service_id:     ServiceId,
    pub preferred_date: NaiveDate,
    pub preferred_time: TimeSlot,
    pub notes:          String,
}

/// 希望日が過去でないことを検証する
///
/// 当日は許可する。判定は UTC の日付で行う。
pub fn ensure_not_in_past(preferred_date: NaiveDate, today: NaiveDate) -> Result<(), DomainError> {
    if preferred_date < today {
        return Err(DomainError::invalid(
            "preferred_date",
            "Cannot book appointments in the past.",
        ));
    }
    Ok(())
}

/// 参照先メニューが存在し、かつ有効であることを検証する
pub fn ensure_service_available(
    service_id: ServiceId,
    service: Option<&Service>,
) -> Result<(), DomainError> {
    match service {
        Some(s) if s.is_bookable() && s.id == service_id => Ok(()),
        _ => Err(DomainError::invalid(
            "service_id",
            "Selected service is not available.",
        )),
    }
}

// =========================================================================
// Booking
// =========================================================================

/// DB から復元するための行データ
#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub id:             BookingId,
    pub customer_name:  PersonName,
    pub customer_email: EmailAddress,
    pub customer_phone: PhoneNumber,
    pub service_id:     ServiceId,
    pub preferred_date: NaiveDate,
    pub preferred_time: TimeSlot,
    pub notes:          String,
    pub status:         BookingStatus,
    pub created_at:     DateTime<Utc>,
    pub updated_at:     DateTime<Utc>,
}

/// 予約リクエストエンティティ
#[derive(Debug, Clone)]
pub struct Booking {
    id:             BookingId,
    customer_name:  PersonName,
    customer_email: EmailAddress,
    customer_phone: PhoneNumber,
    service_id:     ServiceId,
    preferred_date: NaiveDate,
    preferred_time: TimeSlot,
    notes:          String,
    status:         BookingStatus,
    created_at:     DateTime<Utc>,
    updated_at:     DateTime<Utc>,
}

impl Booking {
    /// データベースから予約を復元する
    pub fn from_db(record: BookingRecord) -> Self {
        Self {
            id:             record.id,
            customer_name:  record.customer_name,
            customer_email: record.customer_email,
            customer_phone: record.customer_phone,
            service_id:     record.service_id,
            preferred_date: record.preferred_date,
            preferred_time: record.preferred_time,
            notes:          record.notes,
            status:         record.status,
            created_at:     record.created_at,
            updated_at:     record.updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn customer_name(&self) -> &PersonName {
        &self.customer_name
    }

    pub fn customer_email(&self) -> &EmailAddress {
        &self.customer_email
    }

    pub fn customer_phone(&self) -> &PhoneNumber {
        &self.customer_phone
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn preferred_date(&self) -> NaiveDate {
        self.preferred_date
    }

    pub fn preferred_time(&self) -> TimeSlot {
        self.preferred_time
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジック

    /// ステータスを変更した新しいインスタンスを返す
    pub fn with_status(
        self,
        status: BookingStatus,
        policy: TransitionPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        policy.check(self.status, status)?;
        Ok(Self {
            status,
            updated_at: now,
            ..self
        })
    }

    /// 希望日時を変更した新しいインスタンスを返す
    pub fn rescheduled(self, date: NaiveDate, time: TimeSlot, now: DateTime<Utc>) -> Self {
        Self {
            preferred_date: date,
            preferred_time: time,
            updated_at: now,
            ..self
        }
    }

    /// 備考を変更した新しいインスタンスを返す
    pub fn with_notes(self, notes: String, now: DateTime<Utc>) -> Self {
        Self {
            notes,
            updated_at: now,
            ..self
        }
    }

    /// 施術時間 + 準備時間（分）
    pub fn total_duration(&self, service: &Service) -> i32 {
        service.duration_minutes + BUFFER_MINUTES
    }

    /// 終了見込み時刻
    pub fn estimated_end_time(&self, service: &Service) -> NaiveDateTime {
        let start = self.preferred_date.and_time(self.preferred_time.as_time());
        start + TimeDelta::minutes(i64::from(self.total_duration(service)))
    }
}
