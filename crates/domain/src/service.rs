//! # 施術メニュー（Service）
//!
//! サロンが提供するネイル・まつげの施術メニュー。公開 API からは読み取り専用で、
//! 予約作成時の参照先（「存在して有効なメニューであること」）になる。
//!
//! 価格は最小通貨単位（kobo）の整数で保持し、表示時に小数 2 桁へ整形する。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum::{EnumString, IntoStaticStr};

use crate::DomainError;

define_integer_id! {
    /// 施術メニュー ID
    pub struct ServiceId;
}

/// 施術カテゴリ
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceCategory {
    Nails,
    Lashes,
    Both,
}

/// 価格（値オブジェクト）
///
/// 最小通貨単位の正の整数。JSON では `"4500.00"` のような小数文字列になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

impl Price {
    pub fn from_minor_units(value: i64) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::invalid(
                "",
                "Ensure this value is greater than or equal to 0.01.",
            ));
        }
        Ok(Self(value))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 施術時間を `"1h 30m"` / `"2h"` / `"45m"` 形式に整形する
pub fn format_duration(duration_minutes: i32) -> String {
    let hours = duration_minutes / 60;
    let minutes = duration_minutes % 60;

    match (hours, minutes) {
        (h, m) if h > 0 && m > 0 => format!("{h}h {m}m"),
        (h, _) if h > 0 => format!("{h}h"),
        (_, m) => format!("{m}m"),
    }
}

/// 施術メニュー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id:               ServiceId,
    pub name:             String,
    pub category:         ServiceCategory,
    pub description:      String,
    pub price:            Price,
    pub duration_minutes: i32,
    pub is_featured:      bool,
    pub is_active:        bool,
    pub image:            Option<String>,
    pub second_image:     Option<String>,
    pub created_at:       DateTime<Utc>,
    pub updated_at:       DateTime<Utc>,
}

impl Service {
    pub fn duration_display(&self) -> String {
        format_duration(self.duration_minutes)
    }

    /// 予約を受け付けられるか
    pub fn is_bookable(&self) -> bool {
        self.is_active
    }
}

/// 一覧の並び順
///
/// `ordering` クエリパラメータ（`name`, `-price` など）から生成する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceOrdering {
    /// カテゴリ → 名前（既定）
    #[default]
    CategoryThenName,
    Name { descending: bool },
    Price { descending: bool },
    Duration { descending: bool },
}

impl ServiceOrdering {
    /// `ordering` パラメータを解釈する。未知のキーは既定順にフォールバックする。
    pub fn parse(value: &str) -> Self {
        let (descending, key) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        match key {
            "name" => Self::Name { descending },
            "price" => Self::Price { descending },
            "duration_minutes" => Self::Duration { descending },
            _ => Self::CategoryThenName,
        }
    }
}

/// 一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub category:    Option<ServiceCategory>,
    pub is_featured: Option<bool>,
    /// 名前・説明の部分一致（大文字小文字を区別しない）
    pub search:      Option<String>,
    pub ordering:    ServiceOrdering,
}
