//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で調査しやすいよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。呼び出し側クレートは `tracing` に依存している必要がある。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const BOOKING: &str = "booking";
        pub const CONTACT: &str = "contact";
        pub const NEWSLETTER: &str = "newsletter";
        pub const TESTIMONIAL: &str = "testimonial";
        pub const GALLERY: &str = "gallery";
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        // 予約
        pub const BOOKING_CREATED: &str = "booking.created";
        pub const BOOKING_UPDATED: &str = "booking.updated";
        pub const BOOKING_CONFIRMED: &str = "booking.confirmed";

        // お問い合わせ
        pub const CONTACT_RECEIVED: &str = "contact.received";
        pub const CONTACT_MARKED_READ: &str = "contact.marked_read";

        // ニュースレター
        pub const SUBSCRIBED: &str = "newsletter.subscribed";
        pub const REACTIVATED: &str = "newsletter.reactivated";
        pub const UNSUBSCRIBED: &str = "newsletter.unsubscribed";

        // お客様の声・ギャラリー
        pub const TESTIMONIAL_SUBMITTED: &str = "testimonial.submitted";
        pub const GALLERY_IMAGE_REGISTERED: &str = "gallery.image_registered";
        pub const THUMBNAIL_GENERATED: &str = "gallery.thumbnail_generated";

        // 通知
        pub const NOTIFICATION_SCHEDULED: &str = "notification.scheduled";
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_SKIPPED: &str = "notification.skipped";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const BOOKING: &str = "booking";
        pub const CONTACT_MESSAGE: &str = "contact_message";
        pub const NEWSLETTER_SUBSCRIBER: &str = "newsletter_subscriber";
        pub const TESTIMONIAL: &str = "testimonial";
        pub const GALLERY_IMAGE: &str = "gallery_image";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（メールプロバイダ）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// バックグラウンドジョブ
        pub const BACKGROUND: &str = "background";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const INTERNAL: &str = "internal";
        pub const DELIVERY: &str = "delivery";
        pub const TEMPLATE: &str = "template";
        pub const QUEUE_FULL: &str = "queue_full";
        pub const JOB_PANICKED: &str = "job_panicked";
        pub const JOB_TIMEOUT: &str = "job_timeout";
    }
}
