//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! API 全体で共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は api-service の責務（shared に axum 依存を入れない）
//! - バリデーションエラーは RFC 9457 の拡張メンバー `invalid_params` でフィールド単位の詳細を返す

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://nailbook.example.com/errors";

/// フィールド単位のバリデーション違反
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidParam {
    /// リクエストボディ上のフィールド名（例: `"customer_email"`）
    pub name:   String,
    /// 人間可読な違反理由
    pub reason: String,
}

impl InvalidParam {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            reason: reason.into(),
        }
    }
}

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
/// `invalid_params` はバリデーションエラー時のみ出力される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type:     String,
    pub title:          String,
    pub status:         u16,
    pub detail:         String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_params: Vec<InvalidParam>,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"not-found"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type:     format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title:          title.into(),
            status,
            detail:         detail.into(),
            invalid_params: Vec::new(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new("conflict", "Conflict", 409, detail)
    }

    /// 400 Validation Error
    pub fn validation_error(detail: impl Into<String>, invalid_params: Vec<InvalidParam>) -> Self {
        Self {
            invalid_params,
            ..Self::new("validation-error", "Validation Error", 400, detail)
        }
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            "内部エラーが発生しました",
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_new_で全フィールドが正しく設定される() {
        let error = ErrorResponse::new("custom-error", "Custom Error", 418, "カスタムエラー");

        assert_eq!(
            error.error_type,
            "https://nailbook.example.com/errors/custom-error"
        );
        assert_eq!(error.title, "Custom Error");
        assert_eq!(error.status, 418);
        assert_eq!(error.detail, "カスタムエラー");
        assert!(error.invalid_params.is_empty());
    }

    #[test]
    fn test_internal_error_が500と固定detailを返す() {
        let error = ErrorResponse::internal_error();

        assert_eq!(error.status, 500);
        assert_eq!(error.detail, "内部エラーが発生しました");
    }

    #[test]
    fn test_invalid_paramsが空ならjsonに出力されない() {
        let json = serde_json::to_value(ErrorResponse::not_found("予約が見つかりません")).unwrap();

        assert_eq!(json["type"], "https://nailbook.example.com/errors/not-found");
        assert_eq!(json["status"], 404);
        assert!(json.get("invalid_params").is_none());
        assert!(json.get("error_type").is_none());
    }

    #[test]
    fn test_validation_errorはフィールド単位の詳細を出力する() {
        let error = ErrorResponse::validation_error(
            "入力内容に誤りがあります",
            vec![InvalidParam::new(
                "preferred_date",
                "Cannot book appointments in the past.",
            )],
        );
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["status"], 400);
        assert_eq!(json["title"], "Validation Error");
        assert_eq!(
            json["invalid_params"],
            serde_json::json!([{
                "name": "preferred_date",
                "reason": "Cannot book appointments in the past."
            }])
        );
    }

    #[test]
    fn test_全便利コンストラクタのstatusが正しい() {
        assert_eq!(ErrorResponse::bad_request("").status, 400);
        assert_eq!(ErrorResponse::not_found("").status, 404);
        assert_eq!(ErrorResponse::conflict("").status, 409);
        assert_eq!(ErrorResponse::validation_error("", vec![]).status, 400);
        assert_eq!(ErrorResponse::internal_error().status, 500);
    }
}
