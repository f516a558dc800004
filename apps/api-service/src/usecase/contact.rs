//! お問い合わせのユースケース

use std::sync::Arc;

use nailbook_domain::{
    clock::Clock,
    contact::{ContactMessage, ContactMessageId, ContactSubject, NewContactMessage, SubjectType},
    notification::{EntityReference, NotificationJob, TemplateName, TriggeringEvent},
    value_objects::{EmailAddress, PersonName, PhoneNumber},
};
use nailbook_infra::repository::ContactMessageRepository;
use nailbook_shared::{event_log::event, log_business_event};

use super::{FieldErrors, schedule_notification};
use crate::{error::ApiError, notification::NotificationScheduler};

/// お問い合わせ作成の入力
#[derive(Debug, Clone)]
pub struct CreateContactInput {
    pub name:         String,
    pub email:        String,
    /// 空文字は未入力として扱う
    pub phone:        Option<String>,
    pub subject_type: SubjectType,
    pub subject:      String,
    pub message:      String,
}

/// お問い合わせユースケース
pub struct ContactUseCaseImpl {
    messages:    Arc<dyn ContactMessageRepository>,
    scheduler:   Arc<dyn NotificationScheduler>,
    clock:       Arc<dyn Clock>,
    admin_email: Option<String>,
}

impl ContactUseCaseImpl {
    pub fn new(
        messages: Arc<dyn ContactMessageRepository>,
        scheduler: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            messages,
            scheduler,
            clock,
            admin_email,
        }
    }

    /// お問い合わせを保存し、管理者への通知をスケジュールする
    pub async fn create(&self, input: CreateContactInput) -> Result<ContactMessage, ApiError> {
        let mut errors = FieldErrors::default();

        let name = errors.check("name", PersonName::new(input.name));
        let email = errors.check("email", EmailAddress::new(input.email));
        let phone = match input.phone.filter(|p| !p.trim().is_empty()) {
            Some(phone) => errors.check("phone", PhoneNumber::new(phone)).map(Some),
            None => Some(None),
        };
        let subject = errors.check("subject", ContactSubject::new(input.subject));
        let message = input.message.trim().to_string();
        if message.is_empty() {
            errors.reject("message", "This field may not be blank.");
        }

        let (Some(name), Some(email), Some(phone), Some(subject)) = (name, email, phone, subject)
        else {
            return Err(errors.into_error().into());
        };
        if !errors.is_empty() {
            return Err(errors.into_error().into());
        }

        let new_message = NewContactMessage {
            name,
            email,
            phone,
            subject_type: input.subject_type,
            subject,
            message,
        };
        let saved = self.messages.insert(&new_message, self.clock.now()).await?;

        let subject_type: &str = saved.subject_type.into();
        log_business_event!(
            event.category = event::category::CONTACT,
            event.action = event::action::CONTACT_RECEIVED,
            event.entity_type = event::entity_type::CONTACT_MESSAGE,
            event.entity_id = %saved.id,
            event.result = event::result::SUCCESS,
            contact.subject_type = subject_type,
            "お問い合わせを受け付けました"
        );

        schedule_notification(
            self.scheduler.as_ref(),
            NotificationJob::new(
                EntityReference::ContactMessage(saved.id),
                TemplateName::ContactNotification,
                self.admin_email.iter().cloned().collect(),
                TriggeringEvent::ContactReceived,
            ),
        );

        Ok(saved)
    }

    /// 新しい順に取得する（`is_read` で絞り込み可能）
    pub async fn list(&self, is_read: Option<bool>) -> Result<Vec<ContactMessage>, ApiError> {
        Ok(self.messages.find_all(is_read).await?)
    }

    pub async fn get(&self, id: ContactMessageId) -> Result<ContactMessage, ApiError> {
        self.messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("ContactMessage", id))
    }

    /// 既読にする（既読済みでも成功）
    pub async fn mark_read(&self, id: ContactMessageId) -> Result<ContactMessage, ApiError> {
        let message = self.get(id).await?.marked_read(self.clock.now());

        if !self.messages.update(&message).await? {
            return Err(ApiError::not_found("ContactMessage", id));
        }

        log_business_event!(
            event.category = event::category::CONTACT,
            event.action = event::action::CONTACT_MARKED_READ,
            event.entity_type = event::entity_type::CONTACT_MESSAGE,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "お問い合わせを既読にしました"
        );

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use nailbook_infra::mock::MockContactMessageRepository;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{notification::scheduler::RecordingNotificationScheduler, usecase::test_support::clock};

    struct Fixture {
        messages:  MockContactMessageRepository,
        scheduler: RecordingNotificationScheduler,
        sut:       ContactUseCaseImpl,
    }

    fn fixture() -> Fixture {
        let messages = MockContactMessageRepository::new();
        let scheduler = RecordingNotificationScheduler::new();
        let sut = ContactUseCaseImpl::new(
            Arc::new(messages.clone()),
            Arc::new(scheduler.clone()),
            clock(),
            Some("owner@example.com".to_string()),
        );
        Fixture {
            messages,
            scheduler,
            sut,
        }
    }

    fn input() -> CreateContactInput {
        CreateContactInput {
            name:         "Grace Hopper".to_string(),
            email:        "grace@example.com".to_string(),
            phone:        Some(String::new()),
            subject_type: SubjectType::Pricing,
            subject:      "Lash refill prices".to_string(),
            message:      "How much is a classic refill?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_お問い合わせを保存して管理者通知を積む() {
        let fx = fixture();

        let saved = fx.sut.create(input()).await.unwrap();

        assert!(!saved.is_read);
        assert_eq!(saved.phone, None);
        assert_eq!(fx.messages.stored().len(), 1);
        assert_eq!(
            fx.scheduler.jobs(),
            vec![NotificationJob::new(
                EntityReference::ContactMessage(saved.id),
                TemplateName::ContactNotification,
                vec!["owner@example.com".to_string()],
                TriggeringEvent::ContactReceived,
            )]
        );
    }

    #[tokio::test]
    async fn test_不正な入力は保存も通知もしない() {
        let fx = fixture();
        let bad = CreateContactInput {
            email: "grace".to_string(),
            phone: Some("abc".to_string()),
            message: "   ".to_string(),
            ..input()
        };

        let error = fx.sut.create(bad).await.unwrap_err();

        let ApiError::Validation(params) = error else {
            panic!("バリデーションエラーを期待");
        };
        let fields: Vec<_> = params.into_iter().map(|p| p.name).collect();
        assert_eq!(fields, vec!["email", "phone", "message"]);
        assert!(fx.messages.stored().is_empty());
        assert!(fx.scheduler.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_既読にすると一覧の絞り込みに反映される() {
        let fx = fixture();
        let first = fx.sut.create(input()).await.unwrap();
        fx.sut.create(input()).await.unwrap();

        let marked = fx.sut.mark_read(first.id).await.unwrap();

        assert!(marked.is_read);
        assert_eq!(fx.sut.list(Some(true)).await.unwrap().len(), 1);
        assert_eq!(fx.sut.list(Some(false)).await.unwrap().len(), 1);
        assert_eq!(fx.sut.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_既読済みを再度既読にしても成功する() {
        let fx = fixture();
        let id = fx.sut.create(input()).await.unwrap().id;
        fx.sut.mark_read(id).await.unwrap();

        assert!(fx.sut.mark_read(id).await.unwrap().is_read);
    }

    #[tokio::test]
    async fn test_存在しないお問い合わせは404() {
        let fx = fixture();

        let error = fx.sut.get(ContactMessageId::new(1)).await.unwrap_err();

        assert!(matches!(error, ApiError::NotFound(_)));
    }
}
