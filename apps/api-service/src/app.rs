//! # アプリケーション構築
//!
//! 依存コンポーネントを受け取り、ユースケース → State → Router の順に組み立てる。
//! `main.rs` はインフラ初期化とサーバー起動に集中し、結合テストはこの関数で
//! モックを注入した Router を得る。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use nailbook_domain::{booking::TransitionPolicy, clock::Clock};
use nailbook_infra::{
    repository::{
        BookingRepository,
        ContactMessageRepository,
        GalleryImageRepository,
        NewsletterSubscriberRepository,
        ServiceRepository,
        TestimonialRepository,
    },
    thumbnail::ThumbnailHook,
};
use nailbook_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{
        BookingState,
        ContactState,
        GalleryState,
        NewsletterState,
        ServiceState,
        TestimonialState,
        api_root,
        confirm_booking,
        create_booking,
        create_contact_message,
        create_testimonial,
        get_booking,
        get_contact_message,
        get_gallery_image,
        get_service,
        get_subscriber,
        get_testimonial,
        health_check,
        list_bookings,
        list_contact_messages,
        list_gallery_images,
        list_services,
        list_subscribers,
        list_testimonials,
        mark_contact_message_read,
        register_gallery_image,
        subscribe,
        unsubscribe,
        update_booking,
    },
    notification::NotificationScheduler,
    runner::BackgroundRunner,
    usecase::{
        BookingUseCaseImpl,
        ContactUseCaseImpl,
        GalleryUseCaseImpl,
        NewsletterUseCaseImpl,
        ServiceUseCaseImpl,
        TestimonialUseCaseImpl,
    },
};

/// Router の構築に必要な依存コンポーネント
///
/// リポジトリはトレイトオブジェクトで受け取るため、本番では PostgreSQL 実装、
/// テストではインメモリ実装を差し込める。
#[derive(Clone)]
pub struct AppDependencies {
    pub services:          Arc<dyn ServiceRepository>,
    pub bookings:          Arc<dyn BookingRepository>,
    pub contacts:          Arc<dyn ContactMessageRepository>,
    pub subscribers:       Arc<dyn NewsletterSubscriberRepository>,
    pub testimonials:      Arc<dyn TestimonialRepository>,
    pub gallery:           Arc<dyn GalleryImageRepository>,
    pub scheduler:         Arc<dyn NotificationScheduler>,
    pub thumbnails:        Arc<dyn ThumbnailHook>,
    pub runner:            BackgroundRunner,
    pub clock:             Arc<dyn Clock>,
    /// 管理者通知の宛先。`None` なら管理者向け通知は送信されない
    pub admin_email:       Option<String>,
    pub transition_policy: TransitionPolicy,
}

/// ユースケースを組み立ててルーターを返す
pub fn build_app(deps: AppDependencies) -> Router {
    let service_state = Arc::new(ServiceState {
        usecase: ServiceUseCaseImpl::new(deps.services.clone()),
    });

    let booking_state = Arc::new(BookingState {
        usecase: BookingUseCaseImpl::new(
            deps.bookings,
            deps.services,
            deps.scheduler.clone(),
            deps.clock.clone(),
            deps.admin_email.clone(),
            deps.transition_policy,
        ),
    });

    let contact_state = Arc::new(ContactState {
        usecase: ContactUseCaseImpl::new(
            deps.contacts,
            deps.scheduler.clone(),
            deps.clock.clone(),
            deps.admin_email,
        ),
    });

    let newsletter_state = Arc::new(NewsletterState {
        usecase: NewsletterUseCaseImpl::new(deps.subscribers, deps.scheduler, deps.clock.clone()),
    });

    let testimonial_state = Arc::new(TestimonialState {
        usecase: TestimonialUseCaseImpl::new(deps.testimonials, deps.clock.clone()),
    });

    let gallery_state = Arc::new(GalleryState {
        usecase: GalleryUseCaseImpl::new(deps.gallery, deps.thumbnails, deps.runner, deps.clock),
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/api", get(api_root))
        // 施術メニュー API
        .merge(
            Router::new()
                .route("/api/services", get(list_services))
                .route("/api/services/{id}", get(get_service))
                .with_state(service_state),
        )
        // 予約 API
        .merge(
            Router::new()
                .route("/api/booking", get(list_bookings).post(create_booking))
                .route("/api/booking/{id}", get(get_booking).patch(update_booking))
                .route("/api/booking/{id}/confirm", post(confirm_booking))
                .with_state(booking_state),
        )
        // お問い合わせ API
        .merge(
            Router::new()
                .route(
                    "/api/contact",
                    get(list_contact_messages).post(create_contact_message),
                )
                .route("/api/contact/{id}", get(get_contact_message))
                .route("/api/contact/{id}/mark_read", post(mark_contact_message_read))
                .with_state(contact_state),
        )
        // ニュースレター API
        .merge(
            Router::new()
                .route("/api/newsletter", get(list_subscribers).post(subscribe))
                .route("/api/newsletter/{id}", get(get_subscriber))
                .route("/api/newsletter/{id}/unsubscribe", post(unsubscribe))
                .with_state(newsletter_state),
        )
        // お客様の声 API
        .merge(
            Router::new()
                .route(
                    "/api/testimonials",
                    get(list_testimonials).post(create_testimonial),
                )
                .route("/api/testimonials/{id}", get(get_testimonial))
                .with_state(testimonial_state),
        )
        // ギャラリー API
        .merge(
            Router::new()
                .route(
                    "/api/gallery",
                    get(list_gallery_images).post(register_gallery_image),
                )
                .route("/api/gallery/{id}", get(get_gallery_image))
                .with_state(gallery_state),
        )
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer: UUID v7 を生成（クライアント提供値があればそれを使う）
        // 2. TraceLayer: request_id を含むスパンを張る
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
