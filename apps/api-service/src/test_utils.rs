//! 結合テスト用のアプリケーションビルダー
//!
//! インメモリリポジトリを注入した Router と、テストから状態を覗くための
//! リポジトリのハンドルをまとめて返す。

use std::{sync::Arc, time::Duration};

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use nailbook_domain::{
    booking::TransitionPolicy,
    clock::FixedClock,
    notification::NotificationJob,
    service::{Price, Service, ServiceCategory, ServiceId},
};
use nailbook_infra::{
    mock::{
        MockBookingRepository,
        MockContactMessageRepository,
        MockGalleryImageRepository,
        MockNewsletterSubscriberRepository,
        MockServiceRepository,
        MockTestimonialRepository,
    },
    notification::{MailDispatcher, MailSender},
    thumbnail::{DisabledThumbnailHook, ThumbnailHook},
};

use crate::{
    app::{AppDependencies, build_app},
    config::RunnerConfig,
    notification::{
        BackgroundNotificationScheduler,
        NotificationPipeline,
        NotificationRenderer,
        NotificationScheduler,
        NotificationSources,
        RecordingNotificationScheduler,
    },
    runner::{BackgroundRunner, RunnerHandle},
};

/// テストで使う管理者アドレス
pub const ADMIN_EMAIL: &str = "owner@naildbybola.test";

/// テスト中の「現在時刻」（2026-05-01 09:00 UTC）
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
}

/// ID 42 の有効な施術メニュー（60 分、4500.00）
pub fn gel_manicure() -> Service {
    Service {
        id:               ServiceId::new(42),
        name:             "Gel Manicure".to_string(),
        category:         ServiceCategory::Nails,
        description:      "Long-lasting gel polish".to_string(),
        price:            Price::from_minor_units(450_000).unwrap(),
        duration_minutes: 60,
        is_featured:      true,
        is_active:        true,
        image:            None,
        second_image:     None,
        created_at:       test_now(),
        updated_at:       test_now(),
    }
}

/// モックを注入したアプリケーション
pub struct TestApp {
    pub router:       Router,
    pub services:     MockServiceRepository,
    pub bookings:     MockBookingRepository,
    pub contacts:     MockContactMessageRepository,
    pub subscribers:  MockNewsletterSubscriberRepository,
    pub testimonials: MockTestimonialRepository,
    pub gallery:      MockGalleryImageRepository,
    /// 送信者を指定しなかった場合に通知ジョブが記録される
    pub recorded:     RecordingNotificationScheduler,
    handle:           RunnerHandle,
}

impl TestApp {
    /// スケジュールされた通知ジョブ
    pub fn jobs(&self) -> Vec<NotificationJob> {
        self.recorded.jobs()
    }

    /// バックグラウンドジョブの完了を待つ
    pub async fn drain(self) {
        self.handle.shutdown(Duration::from_secs(5)).await;
    }
}

/// [`TestApp`] のビルダー
pub struct TestAppBuilder {
    admin_email: Option<String>,
    policy:      TransitionPolicy,
    thumbnails:  Arc<dyn ThumbnailHook>,
    mail_sender: Option<Arc<dyn MailSender>>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            admin_email: Some(ADMIN_EMAIL.to_string()),
            policy:      TransitionPolicy::default(),
            thumbnails:  Arc::new(DisabledThumbnailHook),
            mail_sender: None,
        }
    }
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admin_email(mut self, admin_email: Option<&str>) -> Self {
        self.admin_email = admin_email.map(str::to_string);
        self
    }

    pub fn transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn thumbnails(mut self, hook: Arc<dyn ThumbnailHook>) -> Self {
        self.thumbnails = hook;
        self
    }

    /// 実際の通知パイプライン（描画 → 送信）を指定した送信者で動かす
    pub fn mail_sender(mut self, sender: Arc<dyn MailSender>) -> Self {
        self.mail_sender = Some(sender);
        self
    }

    /// tokio ランタイム上で呼び出すこと
    pub fn build(self) -> TestApp {
        let services = MockServiceRepository::new();
        services.add_service(gel_manicure());
        let bookings = MockBookingRepository::new();
        let contacts = MockContactMessageRepository::new();
        let subscribers = MockNewsletterSubscriberRepository::new();
        let testimonials = MockTestimonialRepository::new();
        let gallery = MockGalleryImageRepository::new();
        let recorded = RecordingNotificationScheduler::new();

        let (runner, handle) = BackgroundRunner::start(&RunnerConfig::default());

        let scheduler: Arc<dyn NotificationScheduler> = match self.mail_sender {
            Some(sender) => {
                let pipeline = NotificationPipeline::new(
                    NotificationRenderer::new().unwrap(),
                    MailDispatcher::new(sender),
                    "noreply@naildbybola.test".to_string(),
                    NotificationSources {
                        bookings:    Arc::new(bookings.clone()),
                        services:    Arc::new(services.clone()),
                        contacts:    Arc::new(contacts.clone()),
                        subscribers: Arc::new(subscribers.clone()),
                    },
                );
                Arc::new(BackgroundNotificationScheduler::new(
                    runner.clone(),
                    Arc::new(pipeline),
                ))
            }
            None => Arc::new(recorded.clone()),
        };

        let router = build_app(AppDependencies {
            services: Arc::new(services.clone()),
            bookings: Arc::new(bookings.clone()),
            contacts: Arc::new(contacts.clone()),
            subscribers: Arc::new(subscribers.clone()),
            testimonials: Arc::new(testimonials.clone()),
            gallery: Arc::new(gallery.clone()),
            scheduler,
            thumbnails: self.thumbnails,
            runner,
            clock: Arc::new(FixedClock::new(test_now())),
            admin_email: self.admin_email,
            transition_policy: self.policy,
        });

        TestApp {
            router,
            services,
            bookings,
            contacts,
            subscribers,
            testimonials,
            gallery,
            recorded,
            handle,
        }
    }
}
