//! # 値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! - [`PersonName`]: お客様・問い合わせ者の氏名（PII）
//! - [`EmailAddress`]: メールアドレス（trim + 小文字化で正規化）
//! - [`PhoneNumber`]: 電話番号（`^\+?1?\d{9,15}$`）

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 氏名の最大文字数（DB: `VARCHAR(100)`）
pub const MAX_NAME_LENGTH: usize = 100;

define_validated_string! {
    /// 氏名（値オブジェクト）
    ///
    /// 予約者、問い合わせ者、ニュースレター購読者、レビュー投稿者の氏名に使う。
    pub struct PersonName {
        label: "Name",
        max_length: MAX_NAME_LENGTH,
        pii: true,
    }
}

// =========================================================================
// EmailAddress
// =========================================================================

/// メールアドレスの最大文字数（RFC 5321）
const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("メールアドレスの正規表現が不正")
});

/// メールアドレス（値オブジェクト）
///
/// 前後の空白を除去し、小文字に正規化して保持する。
/// ニュースレターの重複判定は正規化後の値で行う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_lowercase();

        if value.is_empty() {
            return Err(DomainError::invalid("", "Email is required."));
        }
        if value.chars().count() > MAX_EMAIL_LENGTH || !EMAIL_PATTERN.is_match(&value) {
            return Err(DomainError::invalid("", "Enter a valid email address."));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// PhoneNumber
// =========================================================================

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?1?\d{9,15}$").expect("電話番号の正規表現が不正"));

/// 電話番号（値オブジェクト）
///
/// 任意の `+` と国番号 `1` の後に 9〜15 桁の数字。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if !PHONE_PATTERN.is_match(&value) {
            return Err(DomainError::invalid(
                "",
                "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed.",
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
