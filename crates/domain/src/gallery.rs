//! # ギャラリー画像（GalleryImage）
//!
//! 施術例の写真。サムネイルは保存後に非同期のフックで生成され、
//! 生成前は `thumbnail` が `None` のまま公開される。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

define_integer_id! {
    /// ギャラリー画像 ID
    pub struct GalleryImageId;
}

/// タイトルの最大文字数（DB: `VARCHAR(200)`）
pub const MAX_TITLE_LENGTH: usize = 200;

define_validated_string! {
    /// ギャラリー画像タイトル
    pub struct GalleryTitle {
        label: "Title",
        max_length: MAX_TITLE_LENGTH,
    }
}

/// ギャラリーカテゴリ
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
pub enum GalleryCategory {
    Nails,
    Lashes,
    BeforeAfter,
    Other,
}

/// 登録時の入力
#[derive(Debug, Clone)]
pub struct NewGalleryImage {
    pub title:            GalleryTitle,
    pub description:      String,
    pub category:         GalleryCategory,
    pub image:            String,
    pub comparison_image: Option<String>,
    pub is_featured:      bool,
    pub sort_order:       i32,
}

/// ギャラリー画像
#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub id:               GalleryImageId,
    pub title:            GalleryTitle,
    pub description:      String,
    pub category:         GalleryCategory,
    pub image:            String,
    pub comparison_image: Option<String>,
    pub thumbnail:        Option<String>,
    pub is_featured:      bool,
    pub is_active:        bool,
    pub sort_order:       i32,
    pub created_at:       DateTime<Utc>,
    pub updated_at:       DateTime<Utc>,
}

/// 一覧の絞り込み条件（有効な画像のみが対象）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryFilter {
    pub category:    Option<GalleryCategory>,
    pub is_featured: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_before_afterはスネークケースで表現される() {
        assert_eq!(
            GalleryCategory::from_str("before_after").unwrap(),
            GalleryCategory::BeforeAfter
        );
        assert_eq!(
            serde_json::to_value(GalleryCategory::BeforeAfter).unwrap(),
            "before_after"
        );
    }
}
