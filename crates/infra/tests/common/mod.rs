//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するシードデータ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::NaiveDate;
use nailbook_domain::{
    booking::{NewBooking, TimeSlot},
    service::ServiceId,
    value_objects::{EmailAddress, PersonName, PhoneNumber},
};
use sqlx::PgPool;

/// 施術メニューを 1 件作成し、その ID を返す
pub async fn insert_service(pool: &PgPool, name: &str, is_active: bool) -> ServiceId {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO services (name, category, description, price_minor, duration_minutes, is_active)
        VALUES ($1, 'nails', 'Long-lasting gel colour', 450000, 60, $2)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .expect("施術メニューの作成に失敗");
    ServiceId::new(id)
}

pub fn new_booking(service_id: ServiceId) -> NewBooking {
    NewBooking {
        customer_name: PersonName::new("Ada").unwrap(),
        customer_email: EmailAddress::new("ada@example.com").unwrap(),
        customer_phone: PhoneNumber::new("+2348012345678").unwrap(),
        service_id,
        preferred_date: NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
        preferred_time: TimeSlot::parse("10:00").unwrap(),
        notes: "".to_string(),
    }
}
