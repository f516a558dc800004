//! # 通知スケジューラー
//!
//! オーケストレーターから受け取った通知ジョブをバックグラウンドランナーに載せ、
//! 再取得 → レンダリング → 送信 → ログ出力を行う。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: `schedule()` はジョブを積むだけで送信を待たない。
//!   送信失敗はログにのみ残り、業務トランザクションには影響しない
//! - **ID だけを渡す**: ジョブはエンティティを自前のリポジトリ呼び出しで再取得する
//! - **未登録テンプレートは積む前に弾く**: `schedule()` がエラーを返すのはこの場合のみ

use std::sync::Arc;

use itertools::Itertools;
use nailbook_domain::notification::{
    DispatchResult,
    EntityReference,
    NotificationError,
    NotificationJob,
};
use nailbook_infra::{
    notification::MailDispatcher,
    repository::{
        BookingRepository,
        ContactMessageRepository,
        NewsletterSubscriberRepository,
        ServiceRepository,
    },
};
use nailbook_shared::{event_log::event, log_business_event};

use super::{NotificationRenderer, RenderContext};
use crate::runner::BackgroundRunner;

/// 通知ジョブの受け口
pub trait NotificationScheduler: Send + Sync {
    /// ジョブをスケジュールする（実行は待たない）
    fn schedule(&self, job: NotificationJob) -> Result<(), NotificationError>;
}

/// ジョブ実行時にエンティティを再取得するためのリポジトリ群
#[derive(Clone)]
pub struct NotificationSources {
    pub bookings:    Arc<dyn BookingRepository>,
    pub services:    Arc<dyn ServiceRepository>,
    pub contacts:    Arc<dyn ContactMessageRepository>,
    pub subscribers: Arc<dyn NewsletterSubscriberRepository>,
}

/// 再取得 → レンダリング → 送信の一連の処理
pub struct NotificationPipeline {
    renderer:     NotificationRenderer,
    dispatcher:   MailDispatcher,
    from_address: String,
    sources:      NotificationSources,
}

impl NotificationPipeline {
    pub fn new(
        renderer: NotificationRenderer,
        dispatcher: MailDispatcher,
        from_address: String,
        sources: NotificationSources,
    ) -> Self {
        Self {
            renderer,
            dispatcher,
            from_address,
            sources,
        }
    }

    /// ジョブを実行して送信結果を返す
    pub async fn execute(&self, job: &NotificationJob) -> Result<DispatchResult, NotificationError> {
        let context = self.load(job.entity).await?;
        let message = self
            .renderer
            .render(job.template, &context)?
            .into_composed(self.from_address.clone(), job.recipients.clone());

        Ok(self.dispatcher.dispatch(&message).await?)
    }

    /// ジョブを実行し、結果をビジネスイベントとして記録する
    ///
    /// エラーは返さない。
    pub async fn run(&self, job: NotificationJob) {
        let template: &str = job.template.into();
        let trigger: &str = job.triggering_event.into();
        let recipients = job.recipients.iter().join(", ");
        let provider = self.dispatcher.provider_name();

        match self.execute(&job).await {
            Ok(result) if result.sent => log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SENT,
                event.entity_id = %job.entity,
                event.result = event::result::SUCCESS,
                notification.template = template,
                notification.trigger = trigger,
                notification.recipients = %recipients,
                notification.provider = provider,
                notification.message_id = result.provider_message_id.as_deref().unwrap_or("-"),
                "通知メール送信成功"
            ),
            Ok(_) => log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SKIPPED,
                event.entity_id = %job.entity,
                event.result = event::result::SUCCESS,
                notification.template = template,
                notification.trigger = trigger,
                notification.provider = provider,
                "宛先が無いため通知メールを送信しませんでした"
            ),
            Err(NotificationError::Delivery(e)) => log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_FAILED,
                event.entity_id = %job.entity,
                event.result = event::result::FAILURE,
                notification.template = template,
                notification.trigger = trigger,
                notification.recipients = %recipients,
                notification.provider = provider,
                error.kind = %e.kind,
                error = %e,
                "通知メール送信失敗"
            ),
            Err(e) => log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_FAILED,
                event.entity_id = %job.entity,
                event.result = event::result::FAILURE,
                notification.template = template,
                notification.trigger = trigger,
                notification.recipients = %recipients,
                error = %e,
                "通知メールの組み立てに失敗"
            ),
        }
    }

    async fn load(&self, entity: EntityReference) -> Result<RenderContext, NotificationError> {
        let lookup = |e: nailbook_infra::InfraError| NotificationError::Lookup(e.to_string());

        match entity {
            EntityReference::Booking(id) => {
                let booking = self
                    .sources
                    .bookings
                    .find_by_id(id)
                    .await
                    .map_err(lookup)?
                    .ok_or(NotificationError::EntityNotFound(entity))?;
                let service = self
                    .sources
                    .services
                    .find_by_id(booking.service_id())
                    .await
                    .map_err(lookup)?
                    .ok_or_else(|| {
                        NotificationError::Lookup(format!(
                            "予約 {id} のメニュー {} が見つかりません",
                            booking.service_id()
                        ))
                    })?;
                Ok(RenderContext::Booking { booking, service })
            }
            EntityReference::ContactMessage(id) => self
                .sources
                .contacts
                .find_by_id(id)
                .await
                .map_err(lookup)?
                .map(RenderContext::ContactMessage)
                .ok_or(NotificationError::EntityNotFound(entity)),
            EntityReference::NewsletterSubscriber(id) => self
                .sources
                .subscribers
                .find_by_id(id)
                .await
                .map_err(lookup)?
                .map(RenderContext::NewsletterSubscriber)
                .ok_or(NotificationError::EntityNotFound(entity)),
        }
    }

    fn ensure_template(&self, job: &NotificationJob) -> Result<(), NotificationError> {
        self.renderer.ensure_template(job.template)
    }
}

/// バックグラウンドランナーで通知を送るスケジューラー
pub struct BackgroundNotificationScheduler {
    runner:   BackgroundRunner,
    pipeline: Arc<NotificationPipeline>,
}

impl BackgroundNotificationScheduler {
    pub fn new(runner: BackgroundRunner, pipeline: Arc<NotificationPipeline>) -> Self {
        Self { runner, pipeline }
    }
}

impl NotificationScheduler for BackgroundNotificationScheduler {
    fn schedule(&self, job: NotificationJob) -> Result<(), NotificationError> {
        self.pipeline.ensure_template(&job)?;

        let template: &str = job.template.into();
        tracing::debug!(
            event.action = event::action::NOTIFICATION_SCHEDULED,
            event.entity_id = %job.entity,
            notification.template = template,
            "通知ジョブをスケジュールします"
        );

        let pipeline = self.pipeline.clone();
        self.runner
            .schedule("notification", async move { pipeline.run(job).await });
        Ok(())
    }
}

/// スケジュールされたジョブを記録するだけのスケジューラー（テスト用）
#[cfg(any(test, feature = "test-utils"))]
#[derive(Clone, Default)]
pub struct RecordingNotificationScheduler {
    jobs: Arc<std::sync::Mutex<Vec<NotificationJob>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingNotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<NotificationJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl NotificationScheduler for RecordingNotificationScheduler {
    fn schedule(&self, job: NotificationJob) -> Result<(), NotificationError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{NaiveDate, TimeZone, Utc};
    use nailbook_domain::{
        booking::{NewBooking, TimeSlot},
        notification::{DeliveryErrorKind, TemplateName, TriggeringEvent},
        service::{Price, Service, ServiceCategory, ServiceId},
        value_objects::{EmailAddress, PersonName, PhoneNumber},
    };
    use nailbook_infra::{
        mock::{
            FailingMailSender,
            MockBookingRepository,
            MockContactMessageRepository,
            MockNewsletterSubscriberRepository,
            MockServiceRepository,
            RecordingMailSender,
        },
        notification::MailSender,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::RunnerConfig;

    struct Fixture {
        bookings: MockBookingRepository,
        sources:  NotificationSources,
    }

    fn fixture() -> Fixture {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let services = MockServiceRepository::new();
        services.add_service(Service {
            id:               ServiceId::new(42),
            name:             "Gel Manicure".to_string(),
            category:         ServiceCategory::Nails,
            description:      "Long-lasting gel polish".to_string(),
            price:            Price::from_minor_units(450_000).unwrap(),
            duration_minutes: 60,
            is_featured:      false,
            is_active:        true,
            image:            None,
            second_image:     None,
            created_at:       now,
            updated_at:       now,
        });
        let bookings = MockBookingRepository::new();

        Fixture {
            bookings: bookings.clone(),
            sources:  NotificationSources {
                bookings:    Arc::new(bookings),
                services:    Arc::new(services),
                contacts:    Arc::new(MockContactMessageRepository::new()),
                subscribers: Arc::new(MockNewsletterSubscriberRepository::new()),
            },
        }
    }

    async fn insert_booking(bookings: &MockBookingRepository) -> EntityReference {
        let booking = bookings
            .insert(
                &NewBooking {
                    customer_name:  PersonName::new("Ada").unwrap(),
                    customer_email: EmailAddress::new("ada@example.com").unwrap(),
                    customer_phone: PhoneNumber::new("+2348012345678").unwrap(),
                    service_id:     ServiceId::new(42),
                    preferred_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                    preferred_time: TimeSlot::parse("10:00").unwrap(),
                    notes:          String::new(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        EntityReference::Booking(booking.id())
    }

    fn pipeline(sender: Arc<dyn MailSender>, sources: NotificationSources) -> NotificationPipeline {
        NotificationPipeline::new(
            NotificationRenderer::new().unwrap(),
            MailDispatcher::new(sender),
            "noreply@example.com".to_string(),
            sources,
        )
    }

    fn job(entity: EntityReference, recipients: &[&str]) -> NotificationJob {
        NotificationJob::new(
            entity,
            TemplateName::BookingNotification,
            recipients.iter().map(|r| r.to_string()).collect(),
            TriggeringEvent::BookingCreated,
        )
    }

    #[tokio::test]
    async fn test_エンティティを再取得して送信する() {
        let fx = fixture();
        let entity = insert_booking(&fx.bookings).await;
        let sender = RecordingMailSender::new();
        let sut = pipeline(Arc::new(sender.clone()), fx.sources);

        let result = sut.execute(&job(entity, &["owner@example.com"])).await.unwrap();

        assert!(result.sent);
        let sent = sender.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "New Booking Request - Ada");
        assert_eq!(sent[0].from_address, "noreply@example.com");
        assert_eq!(sent[0].recipients, vec!["owner@example.com".to_string()]);
        assert!(sent[0].html.is_some());
    }

    #[tokio::test]
    async fn test_宛先が空なら送信せずに終わる() {
        let fx = fixture();
        let entity = insert_booking(&fx.bookings).await;
        let sender = RecordingMailSender::new();
        let sut = pipeline(Arc::new(sender.clone()), fx.sources);

        let result = sut.execute(&job(entity, &[])).await.unwrap();

        assert_eq!(result, DispatchResult::skipped());
        assert!(sender.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_対象が消えていればentity_not_found() {
        let fx = fixture();
        let sut = pipeline(Arc::new(RecordingMailSender::new()), fx.sources);
        let missing = EntityReference::Booking(nailbook_domain::booking::BookingId::new(999));

        let result = sut.execute(&job(missing, &["owner@example.com"])).await;

        assert!(matches!(result, Err(NotificationError::EntityNotFound(e)) if e == missing));
    }

    #[tokio::test]
    async fn test_送信失敗は分類付きのdeliveryエラーになる() {
        let fx = fixture();
        let entity = insert_booking(&fx.bookings).await;
        let sut = pipeline(
            Arc::new(FailingMailSender::new(DeliveryErrorKind::Auth)),
            fx.sources,
        );

        let result = sut.execute(&job(entity, &["owner@example.com"])).await;

        assert!(matches!(
            result,
            Err(NotificationError::Delivery(e)) if e.kind == DeliveryErrorKind::Auth
        ));
    }

    #[tokio::test]
    async fn test_スケジュールしたジョブはランナー上で送信される() {
        let fx = fixture();
        let entity = insert_booking(&fx.bookings).await;
        let sender = RecordingMailSender::new();
        let (runner, handle) = BackgroundRunner::start(&RunnerConfig::default());
        let sut = BackgroundNotificationScheduler::new(
            runner,
            Arc::new(pipeline(Arc::new(sender.clone()), fx.sources)),
        );

        sut.schedule(job(entity, &["owner@example.com"])).unwrap();
        handle.shutdown(Duration::from_secs(5)).await;

        assert_eq!(sender.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_未登録テンプレートのジョブはスケジュールしない() {
        let fx = fixture();
        let entity = insert_booking(&fx.bookings).await;
        let sender = RecordingMailSender::new();
        let (runner, handle) = BackgroundRunner::start(&RunnerConfig::default());
        let sut = BackgroundNotificationScheduler::new(
            runner,
            Arc::new(NotificationPipeline::new(
                NotificationRenderer::from_sources(&[]).unwrap(),
                MailDispatcher::new(Arc::new(sender.clone())),
                "noreply@example.com".to_string(),
                fx.sources,
            )),
        );

        let result = sut.schedule(job(entity, &["owner@example.com"]));
        handle.shutdown(Duration::from_secs(5)).await;

        assert!(matches!(result, Err(NotificationError::TemplateNotFound(_))));
        assert!(sender.sent_messages().is_empty());
    }
}
