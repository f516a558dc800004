//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗（フィールド単位） |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `InvalidTransition` | 409 Conflict | 厳格モードで許可されない状態遷移 |
//!
//! ## 使用例
//!
//! ```rust
//! use nailbook_domain::DomainError;
//!
//! let error = DomainError::invalid("preferred_date", "Cannot book appointments in the past.");
//! assert_eq!(error.violations()[0].field, "preferred_date");
//! ```

use thiserror::Error;

/// フィールド単位のバリデーション違反
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// 対象フィールド名（値オブジェクト単体で生成された場合は空文字列）
    pub field:   String,
    /// 人間可読な違反理由（API レスポンスにそのまま載る）
    pub message: String,
}

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    /// 複数フィールドの違反をまとめて保持できる。
    #[error("バリデーションエラー: {}", format_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// エンティティが見つからない
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"Booking", "Service" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 許可されない状態遷移
    ///
    /// 厳格な遷移ポリシーが有効な場合にのみ発生する。
    #[error("状態遷移が許可されていません: {from} → {to}")]
    InvalidTransition {
        from: &'static str,
        to:   &'static str,
    },
}

impl DomainError {
    /// 単一フィールドのバリデーションエラーを生成する
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation {
            field:   field.into(),
            message: message.into(),
        }])
    }

    /// フィールド名が未設定の違反にフィールド名を付与する
    ///
    /// 値オブジェクトはどのフィールドに使われるかを知らないため、
    /// 呼び出し側で `.map_err(|e| e.at("customer_name"))` として紐付ける。
    pub fn at(self, field: &str) -> Self {
        match self {
            Self::Validation(violations) => Self::Validation(
                violations
                    .into_iter()
                    .map(|v| FieldViolation {
                        field: if v.field.is_empty() {
                            field.to_string()
                        } else {
                            v.field
                        },
                        message: v.message,
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    /// バリデーション違反の一覧を返す（Validation 以外は空）
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| {
            if v.field.is_empty() {
                v.message.clone()
            } else {
                format!("{}: {}", v.field, v.message)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_atは空のフィールド名だけを埋める() {
        let error = DomainError::Validation(vec![
            FieldViolation {
                field:   String::new(),
                message: "Name is required".to_string(),
            },
            FieldViolation {
                field:   "email".to_string(),
                message: "Enter a valid email address".to_string(),
            },
        ])
        .at("customer_name");

        let fields: Vec<_> = error.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["customer_name", "email"]);
    }

    #[test]
    fn test_displayに全違反が含まれる() {
        let error = DomainError::invalid("rating", "Rating must be between 1 and 5");

        assert_eq!(
            error.to_string(),
            "バリデーションエラー: rating: Rating must be between 1 and 5"
        );
    }

    #[test]
    fn test_not_foundのdisplay() {
        let error = DomainError::NotFound {
            entity_type: "Booking",
            id:          "7".to_string(),
        };

        assert_eq!(error.to_string(), "Booking が見つかりません: 7");
        assert!(error.violations().is_empty());
    }
}
