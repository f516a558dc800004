//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各リソースのハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは DTO 変換だけを行い、業務ルールはユースケース層に委譲

pub mod booking;
pub mod contact;
pub mod gallery;
pub mod health;
pub mod newsletter;
pub mod service;
pub mod testimonial;

pub use booking::{
    BookingState,
    confirm_booking,
    create_booking,
    get_booking,
    list_bookings,
    update_booking,
};
pub use contact::{
    ContactState,
    create_contact_message,
    get_contact_message,
    list_contact_messages,
    mark_contact_message_read,
};
pub use gallery::{GalleryState, get_gallery_image, list_gallery_images, register_gallery_image};
pub use health::{api_root, health_check};
pub use newsletter::{NewsletterState, get_subscriber, list_subscribers, subscribe, unsubscribe};
pub use service::{ServiceState, get_service, list_services};
pub use testimonial::{TestimonialState, create_testimonial, get_testimonial, list_testimonials};
