//! # NailBook 共有ユーティリティ
//!
//! このクレートは、NailBook
//! バックエンド全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, api-service）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（tracing 系は `observability` feature の裏に置く）

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::{ApiResponse, StatusMessage};
pub use error_response::{ErrorResponse, InvalidParam};
pub use health::HealthResponse;
