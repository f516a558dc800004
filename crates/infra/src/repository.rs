//! # リポジトリ実装
//!
//! エンティティごとのリポジトリトレイトと PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **トレイト経由**: ユースケース層はトレイトにのみ依存し、テストではインメモリ実装に差し替える
//! - **実行時クエリ**: `sqlx::query_as` と `FromRow` 行構造体で取得し、ドメインモデルへ変換する
//! - **復元時の検証**: 値オブジェクトに戻せない行は [`InfraError::corrupted_data`](crate::InfraError::corrupted_data) にする

pub mod booking_repository;
pub mod contact_message_repository;
pub mod gallery_image_repository;
pub mod newsletter_subscriber_repository;
pub mod service_repository;
pub mod testimonial_repository;

pub use booking_repository::{BookingRepository, PostgresBookingRepository};
pub use contact_message_repository::{ContactMessageRepository, PostgresContactMessageRepository};
pub use gallery_image_repository::{GalleryImageRepository, PostgresGalleryImageRepository};
pub use newsletter_subscriber_repository::{
    NewsletterSubscriberRepository,
    PostgresNewsletterSubscriberRepository,
};
pub use service_repository::{PostgresServiceRepository, ServiceRepository};
pub use testimonial_repository::{PostgresTestimonialRepository, TestimonialRepository};
