//! # お問い合わせ（ContactMessage）
//!
//! Web サイトのお問い合わせフォームから送信されたメッセージ。
//! 受信時に管理者へ通知メールを送り、管理者が既読にする。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::value_objects::{EmailAddress, PersonName, PhoneNumber};

define_integer_id! {
    /// お問い合わせ ID
    pub struct ContactMessageId;
}

/// 件名の最大文字数（DB: `VARCHAR(200)`）
pub const MAX_SUBJECT_LENGTH: usize = 200;

define_validated_string! {
    /// お問い合わせ件名
    pub struct ContactSubject {
        label: "Subject",
        max_length: MAX_SUBJECT_LENGTH,
    }
}

/// お問い合わせ種別
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
pub enum SubjectType {
    #[default]
    General,
    Booking,
    Pricing,
    Complaint,
    Compliment,
    Other,
}

impl SubjectType {
    /// 管理者向けメールに載せる表示名
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General Inquiry",
            Self::Booking => "Booking Question",
            Self::Pricing => "Pricing Information",
            Self::Complaint => "Complaint",
            Self::Compliment => "Compliment",
            Self::Other => "Other",
        }
    }
}

/// お問い合わせ作成時の入力
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name:         PersonName,
    pub email:        EmailAddress,
    pub phone:        Option<PhoneNumber>,
    pub subject_type: SubjectType,
    pub subject:      ContactSubject,
    pub message:      String,
}

/// お問い合わせ
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub id:           ContactMessageId,
    pub name:         PersonName,
    pub email:        EmailAddress,
    pub phone:        Option<PhoneNumber>,
    pub subject_type: SubjectType,
    pub subject:      ContactSubject,
    pub message:      String,
    pub is_read:      bool,
    pub created_at:   DateTime<Utc>,
    pub updated_at:   DateTime<Utc>,
}

impl ContactMessage {
    /// 既読にした新しいインスタンスを返す（既読済みでも updated_at は進める）
    pub fn marked_read(self, now: DateTime<Utc>) -> Self {
        Self {
            is_read: true,
            updated_at: now,
            ..self
        }
    }
}
