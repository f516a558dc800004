//! # お客様の声（Testimonial）
//!
//! 公開フォームからの投稿は常に未承認で保存され、管理者が承認したものだけが
//! 一覧に表示される。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{DomainError, service::ServiceCategory, value_objects::PersonName};

define_integer_id! {
    /// お客様の声 ID
    pub struct TestimonialId;
}

/// 評価（1〜5）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, DomainError> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(DomainError::invalid(
                "",
                format!("Rating must be between {} and {}.", Self::MIN, Self::MAX),
            )),
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// `"★★★★☆"` 形式の表示
    pub fn stars_display(&self) -> String {
        let filled = usize::from(self.0);
        let empty = usize::from(Self::MAX) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}

/// 投稿時の入力
#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub client_name:      PersonName,
    pub client_photo:     Option<String>,
    pub service_category: ServiceCategory,
    pub rating:           Rating,
    pub review_text:      String,
}

/// お客様の声
#[derive(Debug, Clone)]
pub struct Testimonial {
    pub id:               TestimonialId,
    pub client_name:      PersonName,
    pub client_photo:     Option<String>,
    pub service_category: ServiceCategory,
    pub rating:           Rating,
    pub review_text:      String,
    pub is_featured:      bool,
    pub is_approved:      bool,
    pub created_at:       DateTime<Utc>,
    pub updated_at:       DateTime<Utc>,
}

/// 一覧の絞り込み条件（承認済みのみが対象）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestimonialFilter {
    pub service_category: Option<ServiceCategory>,
    pub is_featured:      Option<bool>,
    pub rating:           Option<Rating>,
}
