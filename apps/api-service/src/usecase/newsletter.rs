//! ニュースレター購読のユースケース
//!
//! 購読は冪等: 有効な購読者の再購読は何もせず成功し、解除済みの購読者は
//! 再有効化する。ウェルカムメールは新規購読と再有効化の時だけ送る。

use std::sync::Arc;

use nailbook_domain::{
    clock::Clock,
    newsletter::{NewsletterSubscriber, SubscriberId, SubscriptionDecision, decide_subscription},
    notification::{EntityReference, NotificationJob, TemplateName, TriggeringEvent},
    value_objects::{EmailAddress, PersonName},
};
use nailbook_infra::repository::NewsletterSubscriberRepository;
use nailbook_shared::{event_log::event, log_business_event};

use super::{FieldErrors, schedule_notification};
use crate::{error::ApiError, notification::NotificationScheduler};

/// 購読リクエストの入力
#[derive(Debug, Clone)]
pub struct SubscribeInput {
    pub email: String,
    pub name:  Option<String>,
}

/// 購読リクエストの結果
#[derive(Debug, Clone)]
pub struct SubscriptionOutcome {
    pub subscriber: NewsletterSubscriber,
    pub decision:   SubscriptionDecision,
}

/// ニュースレターユースケース
pub struct NewsletterUseCaseImpl {
    subscribers: Arc<dyn NewsletterSubscriberRepository>,
    scheduler:   Arc<dyn NotificationScheduler>,
    clock:       Arc<dyn Clock>,
}

impl NewsletterUseCaseImpl {
    pub fn new(
        subscribers: Arc<dyn NewsletterSubscriberRepository>,
        scheduler: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscribers,
            scheduler,
            clock,
        }
    }

    /// 購読する
    ///
    /// email は小文字化して照合する。同じアドレスの同時登録で一意制約に
    /// 当たった場合は、先に登録されたレコードに対して判定し直す。
    pub async fn subscribe(&self, input: SubscribeInput) -> Result<SubscriptionOutcome, ApiError> {
        let mut errors = FieldErrors::default();
        let email = errors.check("email", EmailAddress::new(input.email));
        let name = match input.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => errors.check("name", PersonName::new(name)).map(Some),
            None => Some(None),
        };
        let (Some(email), Some(name)) = (email, name) else {
            return Err(errors.into_error().into());
        };

        let outcome = match self.subscribers.find_by_email(&email).await? {
            Some(existing) => self.resolve_existing(existing, name).await?,
            None => match self
                .subscribers
                .insert(&email, name.as_ref(), self.clock.now())
                .await
            {
                Ok(subscriber) => SubscriptionOutcome {
                    subscriber,
                    decision: SubscriptionDecision::Create,
                },
                Err(e) if e.is_conflict() => {
                    let existing = self
                        .subscribers
                        .find_by_email(&email)
                        .await?
                        .ok_or(ApiError::Database(e))?;
                    self.resolve_existing(existing, name).await?
                }
                Err(e) => return Err(e.into()),
            },
        };

        self.record(&outcome);
        Ok(outcome)
    }

    async fn resolve_existing(
        &self,
        existing: NewsletterSubscriber,
        name: Option<PersonName>,
    ) -> Result<SubscriptionOutcome, ApiError> {
        match decide_subscription(Some(&existing)) {
            SubscriptionDecision::Reactivate => {
                let subscriber = existing.reactivated(name);
                if !self.subscribers.update(&subscriber).await? {
                    return Err(ApiError::not_found("NewsletterSubscriber", subscriber.id()));
                }
                Ok(SubscriptionOutcome {
                    subscriber,
                    decision: SubscriptionDecision::Reactivate,
                })
            }
            decision => Ok(SubscriptionOutcome {
                subscriber: existing,
                decision,
            }),
        }
    }

    fn record(&self, outcome: &SubscriptionOutcome) {
        let subscriber = &outcome.subscriber;
        let (action, trigger) = match outcome.decision {
            SubscriptionDecision::Create => {
                (event::action::SUBSCRIBED, TriggeringEvent::NewsletterSubscribed)
            }
            SubscriptionDecision::Reactivate => {
                (event::action::REACTIVATED, TriggeringEvent::NewsletterReactivated)
            }
            SubscriptionDecision::AlreadyActive => {
                tracing::debug!(
                    event.entity_id = %subscriber.id(),
                    "既に購読中のため何もしません"
                );
                return;
            }
        };

        log_business_event!(
            event.category = event::category::NEWSLETTER,
            event.action = action,
            event.entity_type = event::entity_type::NEWSLETTER_SUBSCRIBER,
            event.entity_id = %subscriber.id(),
            event.result = event::result::SUCCESS,
            "ニュースレターの購読を開始しました"
        );

        if outcome.decision.sends_welcome() {
            schedule_notification(
                self.scheduler.as_ref(),
                NotificationJob::new(
                    EntityReference::NewsletterSubscriber(subscriber.id()),
                    TemplateName::NewsletterWelcome,
                    vec![subscriber.email().to_string()],
                    trigger,
                ),
            );
        }
    }

    /// 有効な購読者を新しい順に取得する
    pub async fn list(&self) -> Result<Vec<NewsletterSubscriber>, ApiError> {
        Ok(self.subscribers.find_active().await?)
    }

    /// 有効な購読者を取得する（解除済みは 404）
    pub async fn get(&self, id: SubscriberId) -> Result<NewsletterSubscriber, ApiError> {
        self.subscribers
            .find_by_id(id)
            .await?
            .filter(NewsletterSubscriber::is_active)
            .ok_or_else(|| ApiError::not_found("NewsletterSubscriber", id))
    }

    /// 購読を解除する
    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<NewsletterSubscriber, ApiError> {
        let subscriber = self.get(id).await?.unsubscribed(self.clock.now());

        if !self.subscribers.update(&subscriber).await? {
            return Err(ApiError::not_found("NewsletterSubscriber", id));
        }

        log_business_event!(
            event.category = event::category::NEWSLETTER,
            event.action = event::action::UNSUBSCRIBED,
            event.entity_type = event::entity_type::NEWSLETTER_SUBSCRIBER,
            event.entity_id = %id,
            event.result = event::result::SUCCESS,
            "ニュースレターの購読を解除しました"
        );

        Ok(subscriber)
    }
}
