//! # NailBook インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プールとマイグレーション
//! - **リポジトリ実装**: エンティティごとのリポジトリトレイトと PostgreSQL 実装
//! - **メール送信**: HTTP メール API / SMTP / コンソールの各プロバイダと選択ロジック
//! - **サムネイル生成**: ギャラリー画像登録後のフック
//!
//! ## 依存関係
//!
//! ```text
//! api-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`notification`] - メール送信
//! - [`thumbnail`] - サムネイル生成フック
//! - `mock` - インメモリのテストダブル（`test-utils` feature）

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;
pub mod thumbnail;

pub use error::{InfraError, InfraErrorKind};
