//! # ユースケース層
//!
//! 各リソースの業務処理（検証 → 永続化 → 通知のスケジュール）を実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・スケジューラー・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは入出力の変換のみ行い、ロジックはユースケースに集約
//! - **通知は永続化の後**: 通知ジョブは保存が成功してから積む。スケジュールの失敗は
//!   ログに残すだけでリクエストは成功させる
//!
//! ## モジュール構成
//!
//! - `booking`: 予約リクエスト
//! - `contact`: お問い合わせ
//! - `newsletter`: ニュースレター購読
//! - `service`: 施術メニュー（参照のみ）
//! - `testimonial`: お客様の声
//! - `gallery`: ギャラリー画像

pub mod booking;
pub mod contact;
pub mod gallery;
pub mod newsletter;
pub mod service;
pub mod testimonial;

pub use booking::{BookingUseCaseImpl, BookingWithService, CreateBookingInput, UpdateBookingInput};
pub use contact::{ContactUseCaseImpl, CreateContactInput};
pub use gallery::{GalleryUseCaseImpl, RegisterGalleryImageInput};
pub use newsletter::{NewsletterUseCaseImpl, SubscribeInput, SubscriptionOutcome};
use nailbook_domain::{
    DomainError,
    FieldViolation,
    notification::{NotificationError, NotificationJob},
};
use nailbook_shared::event_log::error as error_field;
pub use service::ServiceUseCaseImpl;
pub use testimonial::{CreateTestimonialInput, TestimonialUseCaseImpl};

use crate::notification::NotificationScheduler;

/// 複数フィールドの検証結果をまとめる
///
/// 値オブジェクトの生成結果を順に `check` に通し、最後に `into_error` で
/// すべての違反を 1 つの [`DomainError::Validation`] にまとめて返す。
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<FieldViolation>);

impl FieldErrors {
    /// 成功なら値を返し、失敗なら違反を `field` に紐付けて記録する
    pub(crate) fn check<T>(&mut self, field: &str, result: Result<T, DomainError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error.at(field), field);
                None
            }
        }
    }

    /// 値オブジェクトを介さない検証の違反を記録する
    pub(crate) fn reject(&mut self, field: &str, message: &str) {
        self.0.push(FieldViolation {
            field:   field.to_string(),
            message: message.to_string(),
        });
    }

    fn push(&mut self, error: DomainError, field: &str) {
        match error {
            DomainError::Validation(violations) => self.0.extend(violations),
            other => self.0.push(FieldViolation {
                field:   field.to_string(),
                message: other.to_string(),
            }),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_error(self) -> DomainError {
        DomainError::Validation(self.0)
    }
}

/// 通知ジョブをスケジュールする
///
/// 失敗（未登録テンプレート）はログに残し、呼び出し元には伝えない。
pub(crate) fn schedule_notification(scheduler: &dyn NotificationScheduler, job: NotificationJob) {
    let entity = job.entity;
    let template: &str = job.template.into();

    if let Err(e) = scheduler.schedule(job) {
        let kind = match e {
            NotificationError::TemplateNotFound(_) | NotificationError::TemplateFailed(_) => {
                error_field::kind::TEMPLATE
            }
            _ => error_field::kind::INTERNAL,
        };
        tracing::error!(
            error.category = error_field::category::BACKGROUND,
            error.kind = kind,
            event.entity_id = %entity,
            notification.template = template,
            "通知ジョブをスケジュールできませんでした: {e}"
        );
    }
}
