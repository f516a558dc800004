//! # NailBook API サーバー ライブラリ
//!
//! ネイル・まつげサロンの予約・問い合わせ・ニュースレター API と、
//! トランザクション後のメール通知パイプラインを提供する。
//!
//! - [`app`] - 依存コンポーネントから Router を組み立てる
//! - [`handler`] - HTTP ハンドラと DTO
//! - [`usecase`] - 業務ルールと通知のオーケストレーション
//! - [`notification`] - テンプレート描画と通知ジョブ
//! - [`runner`] - 有界キューのバックグラウンドランナー

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod notification;
pub mod runner;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(feature = "test-utils")]
#[doc(hidden)]
pub mod test_utils;
