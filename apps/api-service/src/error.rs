//! # API エラー定義
//!
//! ユースケース・ハンドラで発生するエラーと、RFC 9457 Problem Details
//! レスポンスへの変換を定義する。
//!
//! ## 設計方針
//!
//! - バリデーションエラーはフィールド単位で `invalid_params` に載せる
//! - 内部エラーの詳細はレスポンスに含めず、ログにのみ出力する
//! - 通知パイプラインのエラーはここを通らない（バックグラウンドで完結する）

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nailbook_domain::{DomainError, FieldViolation};
use nailbook_infra::InfraError;
use nailbook_shared::{ErrorResponse, InvalidParam, event_log::error as error_field};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// API で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値の検証失敗
    #[error("バリデーションエラー")]
    Validation(Vec<InvalidParam>),

    /// 不正なリクエスト（パス・クエリの解釈失敗など）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 競合（許可されない状態遷移など）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),
}

impl ApiError {
    /// エンティティが見つからない場合のエラー
    pub fn not_found(entity_type: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity_type} が見つかりません: {id}"))
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(violations) => {
                Self::Validation(violations.into_iter().map(to_invalid_param).collect())
            }
            e @ DomainError::NotFound { .. } => Self::NotFound(e.to_string()),
            e @ DomainError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
        }
    }
}

fn to_invalid_param(violation: FieldViolation) -> InvalidParam {
    let name = if violation.field.is_empty() {
        "non_field_errors".to_string()
    } else {
        violation.field
    };
    InvalidParam::new(name, violation.message)
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut params = Vec::new();
        collect_validation_errors(None, &errors, &mut params);
        params.sort_by(|a, b| a.name.cmp(&b.name));
        Self::Validation(params)
    }
}

fn collect_validation_errors(
    prefix: Option<&str>,
    errors: &ValidationErrors,
    params: &mut Vec<InvalidParam>,
) {
    for (field, kind) in errors.errors() {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let reason = e
                        .message
                        .as_ref()
                        .map_or_else(|| format!("Invalid value ({}).", e.code), |m| m.to_string());
                    params.push(InvalidParam::new(name.clone(), reason));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(Some(&name), nested, params);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(Some(&format!("{name}[{index}]")), nested, params);
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// パスパラメータが解釈できない場合はリソースが存在しないものとして扱う
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::NotFound(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            Self::Validation(params) => {
                let detail = params
                    .first()
                    .map(|p| p.reason.clone())
                    .unwrap_or_else(|| "入力値が不正です".to_string());
                ErrorResponse::validation_error(detail, params)
            }
            Self::BadRequest(msg) => ErrorResponse::bad_request(msg),
            Self::NotFound(msg) => ErrorResponse::not_found(msg),
            Self::Conflict(msg) => ErrorResponse::conflict(msg),
            Self::Database(e) => {
                tracing::error!(
                    error.category = error_field::category::INFRASTRUCTURE,
                    error.kind = error_field::kind::DATABASE,
                    "データベースエラー: {e:?}"
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use validator::Validate;

    use super::*;

    async fn into_parts(error: ApiError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ドメインのバリデーションエラーは400でフィールドを返す() {
        let error = ApiError::from(DomainError::invalid(
            "preferred_date",
            "Cannot book appointments in the past.",
        ));

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.detail, "Cannot book appointments in the past.");
        assert_eq!(
            body.invalid_params,
            vec![InvalidParam::new(
                "preferred_date",
                "Cannot book appointments in the past."
            )]
        );
    }

    #[tokio::test]
    async fn test_not_foundは404() {
        let error = ApiError::from(DomainError::NotFound {
            entity_type: "Booking",
            id:          "9".to_string(),
        });

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.detail, "Booking が見つかりません: 9");
    }

    #[tokio::test]
    async fn test_許可されない遷移は409() {
        let error = ApiError::from(DomainError::InvalidTransition {
            from: "completed",
            to:   "pending",
        });

        let (status, _) = into_parts(error).await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_内部エラーの詳細はレスポンスに含めない() {
        let error = ApiError::from(InfraError::corrupted_data("pool exhausted"));

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.detail.contains("pool exhausted"));
    }

    #[derive(Validate)]
    struct ContactForm {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        name:  String,
        #[validate(email(message = "Enter a valid email address."))]
        email: String,
    }

    #[tokio::test]
    async fn test_validatorのエラーはフィールド名順に並ぶ() {
        let errors = ContactForm {
            name:  String::new(),
            email: "not-an-email".to_string(),
        }
        .validate()
        .unwrap_err();

        let (status, body) = into_parts(ApiError::from(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.invalid_params,
            vec![
                InvalidParam::new("email", "Enter a valid email address."),
                InvalidParam::new("name", "This field may not be blank."),
            ]
        );
    }
}
