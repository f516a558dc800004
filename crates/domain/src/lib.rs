//! # NailBook ドメイン層
//!
//! ネイル・まつげサロンの予約、お問い合わせ、ニュースレター、施術メニュー、
//! お客様の声、ギャラリーのドメインモデルと、トランザクション後の
//! メール通知のモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! api-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、メールプロバイダ）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`booking`] - 予約リクエストと状態遷移ポリシー
//! - [`contact`] - お問い合わせ
//! - [`newsletter`] - ニュースレター購読者と冪等な購読判定
//! - [`service`] - 施術メニュー
//! - [`testimonial`] - お客様の声
//! - [`gallery`] - ギャラリー画像
//! - [`notification`] - 通知ジョブ、組み立て済みメッセージ、送信結果
//! - [`value_objects`] - 共有値オブジェクト
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメインエラー
//!
//! ## 使用例
//!
//! ```rust
//! use nailbook_domain::{DomainError, booking::BookingId};
//!
//! let id = BookingId::new(1);
//! let error = DomainError::NotFound {
//!     entity_type: "Booking",
//!     id:          id.to_string(),
//! };
//! assert_eq!(error.to_string(), "Booking が見つかりません: 1");
//! ```

#[macro_use]
mod macros;

pub mod booking;
pub mod clock;
pub mod contact;
pub mod error;
pub mod gallery;
pub mod newsletter;
pub mod notification;
pub mod service;
pub mod testimonial;
pub mod value_objects;

pub use error::{DomainError, FieldViolation};
