//! # 予約 API の結合テスト
//!
//! インメモリリポジトリを注入した Router に対してリクエストを送り、
//! レスポンスとスケジュールされた通知ジョブを検証する。
//!
//! ## テストケース
//!
//! - 予約作成で 201・pending・管理者宛ての通知 1 件
//! - 確定で 200・お客様宛ての確定通知 1 件
//! - 入力エラーは 400 とフィールド名
//! - メール送信が失敗し続けても予約は保存される

mod common;

use std::sync::Arc;

use common::{get, invalid_param_names, patch, post, post_empty};
use nailbook_api_service::test_utils::{ADMIN_EMAIL, TestAppBuilder};
use nailbook_domain::{
    booking::{BookingId, TransitionPolicy},
    notification::{DeliveryErrorKind, EntityReference, TemplateName, TriggeringEvent},
};
use nailbook_infra::mock::{FailingMailSender, RecordingMailSender};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn ada_booking() -> Value {
    json!({
        "customer_name": "Ada Lovelace",
        "customer_email": "ada@example.com",
        "customer_phone": "+2348012345678",
        "service": 42,
        "preferred_date": "2026-05-02",
        "preferred_time": "10:00",
        "notes": "Almond shape please"
    })
}

fn booking_id(response: &common::TestResponse) -> i64 {
    response.data()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_予約を作成するとpendingで保存され管理者に通知される() {
    let app = TestAppBuilder::new().build();

    let response = post(&app.router, "/api/booking", ada_booking()).await;

    assert_eq!(response.status, 201);
    let data = response.data();
    assert_eq!(data["status"], "pending");
    assert_eq!(data["customer_name"], "Ada Lovelace");
    assert_eq!(data["preferred_time"], "10:00");
    assert_eq!(data["service"]["name"], "Gel Manicure");
    assert_eq!(data["service"]["price"], "4500.00");
    assert_eq!(data["total_duration"], 75);
    assert_eq!(data["estimated_end_time"], "2026-05-02T11:15:00");
    assert_eq!(app.bookings.stored().len(), 1);

    let jobs = app.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].template, TemplateName::BookingNotification);
    assert_eq!(jobs[0].triggering_event, TriggeringEvent::BookingCreated);
    assert_eq!(jobs[0].recipients, vec![ADMIN_EMAIL.to_string()]);
    assert_eq!(
        jobs[0].entity,
        EntityReference::Booking(BookingId::new(booking_id(&response)))
    );

    app.drain().await;
}

#[tokio::test]
async fn test_予約を確定するとお客様に確定通知が1件送られる() {
    let app = TestAppBuilder::new().build();
    let created = post(&app.router, "/api/booking", ada_booking()).await;
    let id = booking_id(&created);

    let response = post_empty(&app.router, &format!("/api/booking/{id}/confirm")).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "status": "Booking confirmed" }));

    let detail = get(&app.router, &format!("/api/booking/{id}")).await;
    assert_eq!(detail.data()["status"], "confirmed");

    let jobs = app.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].template, TemplateName::BookingConfirmation);
    assert_eq!(jobs[1].triggering_event, TriggeringEvent::BookingConfirmed);
    assert_eq!(jobs[1].recipients, vec!["ada@example.com".to_string()]);

    app.drain().await;
}

#[tokio::test]
async fn test_確定済みの予約を再度確定しても通知は増えない() {
    let app = TestAppBuilder::new().build();
    let id = booking_id(&post(&app.router, "/api/booking", ada_booking()).await);
    post_empty(&app.router, &format!("/api/booking/{id}/confirm")).await;

    let response = post_empty(&app.router, &format!("/api/booking/{id}/confirm")).await;

    assert_eq!(response.status, 200);
    assert_eq!(app.jobs().len(), 2);

    app.drain().await;
}

#[rstest]
#[case::確定("confirmed", 1)]
#[case::キャンセル("cancelled", 0)]
#[case::完了("completed", 0)]
#[tokio::test]
async fn test_patchで確定に遷移した時だけ確定通知が送られる(
    #[case] status: &str,
    #[case] expected_confirmations: usize,
) {
    let app = TestAppBuilder::new().build();
    let id = booking_id(&post(&app.router, "/api/booking", ada_booking()).await);

    let response = patch(
        &app.router,
        &format!("/api/booking/{id}"),
        json!({ "status": status }),
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.data()["status"], status);
    let confirmations = app
        .jobs()
        .iter()
        .filter(|j| j.template == TemplateName::BookingConfirmation)
        .count();
    assert_eq!(confirmations, expected_confirmations);

    app.drain().await;
}

#[tokio::test]
async fn test_patchで備考と希望日時を変更できる() {
    let app = TestAppBuilder::new().build();
    let id = booking_id(&post(&app.router, "/api/booking", ada_booking()).await);

    let response = patch(
        &app.router,
        &format!("/api/booking/{id}"),
        json!({ "notes": "Short square", "preferred_date": "2026-05-03", "preferred_time": "14:00" }),
    )
    .await;

    assert_eq!(response.status, 200);
    let data = response.data();
    assert_eq!(data["notes"], "Short square");
    assert_eq!(data["preferred_date"], "2026-05-03");
    assert_eq!(data["preferred_time"], "14:00");
    assert_eq!(data["status"], "pending");

    app.drain().await;
}

#[tokio::test]
async fn test_strictポリシーでは許可されない遷移が409になる() {
    let app = TestAppBuilder::new()
        .transition_policy(TransitionPolicy::Strict)
        .build();
    let id = booking_id(&post(&app.router, "/api/booking", ada_booking()).await);

    let response = patch(
        &app.router,
        &format!("/api/booking/{id}"),
        json!({ "status": "completed" }),
    )
    .await;

    assert_eq!(response.status, 409);

    app.drain().await;
}

#[rstest]
#[case::過去の日付("preferred_date", json!("2026-04-30"))]
#[case::営業時間外("preferred_time", json!("08:00"))]
#[case::存在しないメニュー("service_id", json!(999))]
#[case::不正なメールアドレス("customer_email", json!("not-an-email"))]
#[tokio::test]
async fn test_入力エラーは400でフィールド名を返す(#[case] field: &str, #[case] value: Value) {
    let app = TestAppBuilder::new().build();
    let mut body = ada_booking();
    let key = if field == "service_id" { "service" } else { field };
    body[key] = value;

    let response = post(&app.router, "/api/booking", body).await;

    assert_eq!(response.status, 400);
    assert_eq!(invalid_param_names(&response), vec![field.to_string()]);
    assert!(app.bookings.stored().is_empty());
    assert!(app.jobs().is_empty());

    app.drain().await;
}

#[tokio::test]
async fn test_必須項目が欠けたjsonは400() {
    let app = TestAppBuilder::new().build();

    let response = post(&app.router, "/api/booking", json!({ "customer_name": "Ada" })).await;

    assert_eq!(response.status, 400);

    app.drain().await;
}

#[rstest]
#[case::存在しないid("/api/booking/999")]
#[case::数値でないid("/api/booking/abc")]
#[tokio::test]
async fn test_存在しない予約は404(#[case] uri: &str) {
    let app = TestAppBuilder::new().build();

    let response = get(&app.router, uri).await;

    assert_eq!(response.status, 404);

    app.drain().await;
}

#[tokio::test]
async fn test_管理者アドレスが未設定でも予約は作成できる() {
    let app = TestAppBuilder::new().admin_email(None).build();

    let response = post(&app.router, "/api/booking", ada_booking()).await;

    assert_eq!(response.status, 201);
    let jobs = app.jobs();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].recipients.is_empty());

    app.drain().await;
}

#[tokio::test]
async fn test_予約一覧をステータスで絞り込める() {
    let app = TestAppBuilder::new().build();
    let first = booking_id(&post(&app.router, "/api/booking", ada_booking()).await);
    post(&app.router, "/api/booking", ada_booking()).await;
    post_empty(&app.router, &format!("/api/booking/{first}/confirm")).await;

    let confirmed = get(&app.router, "/api/booking?status=confirmed").await;
    let all = get(&app.router, "/api/booking").await;

    assert_eq!(confirmed.status, 200);
    let confirmed = confirmed.data().as_array().unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0]["id"], first);
    assert_eq!(all.data().as_array().unwrap().len(), 2);

    app.drain().await;
}

// --- 実際の通知パイプライン ---

#[tokio::test]
async fn test_メール送信が失敗しても予約は保存され送信は1回だけ試みられる() {
    let sender = FailingMailSender::new(DeliveryErrorKind::Auth);
    let app = TestAppBuilder::new()
        .mail_sender(Arc::new(sender.clone()))
        .build();
    let bookings = app.bookings.clone();

    let response = post(&app.router, "/api/booking", ada_booking()).await;
    app.drain().await;

    assert_eq!(response.status, 201);
    assert_eq!(bookings.stored().len(), 1);
    assert_eq!(sender.attempts(), 1);
}

#[tokio::test]
async fn test_予約作成後に管理者宛てのメールが描画されて送信される() {
    let sender = RecordingMailSender::new();
    let app = TestAppBuilder::new()
        .mail_sender(Arc::new(sender.clone()))
        .build();

    let response = post(&app.router, "/api/booking", ada_booking()).await;
    app.drain().await;

    assert_eq!(response.status, 201);
    let sent = sender.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New Booking Request - Ada Lovelace");
    assert_eq!(sent[0].recipients, vec![ADMIN_EMAIL.to_string()]);
    assert_eq!(sent[0].from_address, "noreply@naildbybola.test");
    assert!(sent[0].plain_text.contains("Gel Manicure"));
    assert!(!sent[0].plain_text.contains('<'));
    assert!(sent[0].html.as_deref().is_some_and(|h| h.contains("Ada Lovelace")));
}
