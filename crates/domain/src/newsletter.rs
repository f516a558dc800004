//! # ニュースレター購読者（NewsletterSubscriber）
//!
//! ## 冪等な購読
//!
//! 同じメールアドレスでの購読リクエストは重複レコードを作らない。
//!
//! | 既存レコード | 結果 | ウェルカムメール |
//! |-------------|------|-----------------|
//! | なし | 新規作成 | 送る |
//! | 無効（購読解除済み） | 再有効化（解除日時をクリア） | 送る |
//! | 有効 | 何もしない（`subscribed_at` も変えない） | 送らない |
//!
//! 判定ロジックは [`decide_subscription`] に集約し、永続化とは切り離す。

use chrono::{DateTime, Utc};

use crate::value_objects::{EmailAddress, PersonName};

define_integer_id! {
    /// 購読者 ID
    pub struct SubscriberId;
}

/// DB から復元するための行データ
#[derive(Debug, Clone)]
pub struct SubscriberRecord {
    pub id:              SubscriberId,
    pub email:           EmailAddress,
    pub name:            Option<PersonName>,
    pub is_active:       bool,
    pub subscribed_at:   DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// ニュースレター購読者
#[derive(Debug, Clone)]
pub struct NewsletterSubscriber {
    id:              SubscriberId,
    email:           EmailAddress,
    name:            Option<PersonName>,
    is_active:       bool,
    subscribed_at:   DateTime<Utc>,
    unsubscribed_at: Option<DateTime<Utc>>,
}

impl NewsletterSubscriber {
    pub fn from_db(record: SubscriberRecord) -> Self {
        Self {
            id:              record.id,
            email:           record.email,
            name:            record.name,
            is_active:       record.is_active,
            subscribed_at:   record.subscribed_at,
            unsubscribed_at: record.unsubscribed_at,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn name(&self) -> Option<&PersonName> {
        self.name.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn subscribed_at(&self) -> DateTime<Utc> {
        self.subscribed_at
    }

    pub fn unsubscribed_at(&self) -> Option<DateTime<Utc>> {
        self.unsubscribed_at
    }

    /// 再有効化した新しいインスタンスを返す
    ///
    /// 名前が指定されていれば上書きする。`subscribed_at` は初回購読日時のまま残す。
    pub fn reactivated(self, name: Option<PersonName>) -> Self {
        Self {
            name: name.or(self.name),
            is_active: true,
            unsubscribed_at: None,
            ..self
        }
    }

    /// 購読解除した新しいインスタンスを返す
    ///
    /// 解除済みの場合は最初の解除日時を保持する。
    pub fn unsubscribed(self, now: DateTime<Utc>) -> Self {
        if !self.is_active {
            return self;
        }
        Self {
            is_active: false,
            unsubscribed_at: Some(now),
            ..self
        }
    }
}

/// 購読リクエストに対する判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionDecision {
    /// 新規作成する
    Create,
    /// 無効なレコードを再有効化する
    Reactivate,
    /// 既に有効なので何もしない
    AlreadyActive,
}

impl SubscriptionDecision {
    /// ウェルカムメールを送るべきか
    pub fn sends_welcome(&self) -> bool {
        matches!(self, Self::Create | Self::Reactivate)
    }
}

/// 既存レコードの有無と状態から購読処理を決める
pub fn decide_subscription(existing: Option<&NewsletterSubscriber>) -> SubscriptionDecision {
    match existing {
        None => SubscriptionDecision::Create,
        Some(s) if s.is_active() => SubscriptionDecision::AlreadyActive,
        Some(_) => SubscriptionDecision::Reactivate,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn subscribed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
    }

    fn make_subscriber(is_active: bool) -> NewsletterSubscriber {
        NewsletterSubscriber::from_db(SubscriberRecord {
            id:              SubscriberId::new(5),
            email:           EmailAddress::new("ada@example.com").unwrap(),
            name:            Some(PersonName::new("Ada").unwrap()),
            is_active,
            subscribed_at:   subscribed_at(),
            unsubscribed_at: (!is_active)
                .then(|| Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
        })
    }

    #[test]
    fn test_既存レコードがなければ新規作成() {
        let decision = decide_subscription(None);

        assert_eq!(decision, SubscriptionDecision::Create);
        assert!(decision.sends_welcome());
    }

    #[test]
    fn test_有効な購読者は何もしない() {
        let subscriber = make_subscriber(true);
        let decision = decide_subscription(Some(&subscriber));

        assert_eq!(decision, SubscriptionDecision::AlreadyActive);
        assert!(!decision.sends_welcome());
    }

    #[test]
    fn test_解除済みの購読者は再有効化() {
        let subscriber = make_subscriber(false);
        let decision = decide_subscription(Some(&subscriber));

        assert_eq!(decision, SubscriptionDecision::Reactivate);
        assert!(decision.sends_welcome());
    }

    #[test]
    fn test_reactivatedは解除日時をクリアし初回購読日時を保持する() {
        let reactivated = make_subscriber(false).reactivated(None);

        assert!(reactivated.is_active());
        assert_eq!(reactivated.unsubscribed_at(), None);
        assert_eq!(reactivated.subscribed_at(), subscribed_at());
        assert_eq!(reactivated.name().map(|n| n.as_str()), Some("Ada"));
    }

    #[test]
    fn test_reactivatedは指定された名前で上書きする() {
        let reactivated =
            make_subscriber(false).reactivated(Some(PersonName::new("Ada L.").unwrap()));

        assert_eq!(reactivated.name().map(|n| n.as_str()), Some("Ada L."));
    }

    #[test]
    fn test_unsubscribedは冪等() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let once = make_subscriber(true).unsubscribed(now);
        let later = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        let twice = once.clone().unsubscribed(later);

        assert!(!once.is_active());
        assert_eq!(once.unsubscribed_at(), Some(now));
        assert_eq!(twice.unsubscribed_at(), Some(now));
    }
}
