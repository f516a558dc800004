//! # 通知
//!
//! トランザクション後のメール通知を組み立て、バックグラウンドで送信する。
//!
//! - [`renderer`] - テンプレートから件名・本文を生成
//! - [`scheduler`] - 通知ジョブをバックグラウンドランナーに載せる

pub mod renderer;
pub mod scheduler;

#[cfg(any(test, feature = "test-utils"))]
pub use scheduler::RecordingNotificationScheduler;
pub use renderer::{NotificationRenderer, RenderContext, RenderedMessage};
pub use scheduler::{
    BackgroundNotificationScheduler,
    NotificationPipeline,
    NotificationScheduler,
    NotificationSources,
};
