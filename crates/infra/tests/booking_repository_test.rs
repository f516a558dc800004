//! BookingRepository / ServiceRepository 統合テスト
//!
//! PostgreSQL を使用するため通常の `cargo test` では実行しない。
//! sqlx::test マクロがテストごとに新しいデータベースを作成する。
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p nailbook-infra --test booking_repository_test -- --ignored
//! ```

mod common;

use chrono::Utc;
use common::{insert_service, new_booking};
use nailbook_domain::{
    booking::{BookingStatus, TransitionPolicy},
    service::ServiceFilter,
};
use nailbook_infra::repository::{
    BookingRepository,
    PostgresBookingRepository,
    PostgresServiceRepository,
    ServiceRepository,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_insertでpendingの予約が採番されて返る(pool: PgPool) {
    let service_id = insert_service(&pool, "Gel Polish", true).await;
    let sut = PostgresBookingRepository::new(pool);

    let booking = sut.insert(&new_booking(service_id), Utc::now()).await.unwrap();

    assert_eq!(booking.status(), BookingStatus::Pending);
    assert_eq!(booking.customer_email().as_str(), "ada@example.com");
    let found = sut.find_by_id(booking.id()).await.unwrap().unwrap();
    assert_eq!(found.preferred_time().to_string(), "10:00");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_updateでステータスが書き戻される(pool: PgPool) {
    let service_id = insert_service(&pool, "Gel Polish", true).await;
    let sut = PostgresBookingRepository::new(pool);
    let booking = sut.insert(&new_booking(service_id), Utc::now()).await.unwrap();

    let confirmed = booking
        .with_status(BookingStatus::Confirmed, TransitionPolicy::Permissive, Utc::now())
        .unwrap();
    let updated = sut.update(&confirmed).await.unwrap();

    assert!(updated);
    let pending = sut.find_all(Some(BookingStatus::Pending)).await.unwrap();
    let all_confirmed = sut.find_all(Some(BookingStatus::Confirmed)).await.unwrap();
    assert!(pending.is_empty());
    assert_eq!(all_confirmed.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "PostgreSQL が必要"]
async fn test_find_activeは無効なメニューを除外する(pool: PgPool) {
    insert_service(&pool, "Gel Polish", true).await;
    insert_service(&pool, "Retired Set", false).await;
    let sut = PostgresServiceRepository::new(pool);

    let services = sut.find_active(&ServiceFilter::default()).await.unwrap();

    let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Gel Polish"]);
}
