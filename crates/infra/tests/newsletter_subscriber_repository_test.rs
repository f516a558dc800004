//! NewsletterSubscriberRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p nailbook-infra --test newsletter_subscriber_repository_test -- --ignored
//! ```

use chrono::Utc;
use nailbook_domain::value_objects::{EmailAddress, PersonName};
use nailbook_infra::repository::{
    NewsletterSubscriberRepository,
    PostgresNewsletterSubscriberRepository,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_同じemailの二重登録はconflictになる(pool: PgPool) {
    let sut = PostgresNewsletterSubscriberRepository::new(pool);
    let email = EmailAddress::new("Ada@Example.com").unwrap();

    sut.insert(&email, None, Utc::now()).await.unwrap();
    let err = sut.insert(&email, None, Utc::now()).await.unwrap_err();

    assert!(err.is_conflict());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_解除と再有効化が書き戻される(pool: PgPool) {
    let sut = PostgresNewsletterSubscriberRepository::new(pool);
    let email = EmailAddress::new("ada@example.com").unwrap();
    let subscriber = sut.insert(&email, None, Utc::now()).await.unwrap();
    let subscribed_at = subscriber.subscribed_at();

    sut.update(&subscriber.unsubscribed(Utc::now())).await.unwrap();
    let unsubscribed = sut.find_by_email(&email).await.unwrap().unwrap();
    assert!(!unsubscribed.is_active());
    assert!(sut.find_active().await.unwrap().is_empty());

    let name = PersonName::new("Ada").unwrap();
    sut.update(&unsubscribed.reactivated(Some(name))).await.unwrap();
    let reactivated = sut.find_by_email(&email).await.unwrap().unwrap();
    assert!(reactivated.is_active());
    assert_eq!(reactivated.unsubscribed_at(), None);
    assert_eq!(reactivated.subscribed_at(), subscribed_at);
    assert_eq!(reactivated.name().map(PersonName::as_str), Some("Ada"));
}
