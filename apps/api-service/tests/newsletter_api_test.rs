//! # ニュースレター API の結合テスト
//!
//! 購読の冪等性（新規・再開・購読中）とウェルカムメールのスケジュールを検証する。

mod common;

use chrono::{TimeZone, Utc};
use common::{get, post, post_empty};
use nailbook_api_service::test_utils::TestAppBuilder;
use nailbook_domain::{
    newsletter::{SubscriberId, SubscriberRecord},
    notification::{EntityReference, TemplateName, TriggeringEvent},
    value_objects::EmailAddress,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn seeded(id: i64, email: &str, is_active: bool) -> SubscriberRecord {
    SubscriberRecord {
        id:              SubscriberId::new(id),
        email:           EmailAddress::new(email).unwrap(),
        name:            None,
        is_active,
        subscribed_at:   Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        unsubscribed_at: (!is_active).then(|| Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
    }
}

#[tokio::test]
async fn test_新規購読は201でウェルカムメールが1件スケジュールされる() {
    let app = TestAppBuilder::new().build();

    let response = post(
        &app.router,
        "/api/newsletter",
        json!({ "email": "Grace@Example.com", "name": "Grace Hopper" }),
    )
    .await;

    assert_eq!(response.status, 201);
    assert_eq!(response.data()["email"], "grace@example.com");
    assert_eq!(response.data()["name"], "Grace Hopper");
    assert_eq!(response.data()["is_active"], true);

    let jobs = app.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].template, TemplateName::NewsletterWelcome);
    assert_eq!(jobs[0].triggering_event, TriggeringEvent::NewsletterSubscribed);
    assert_eq!(jobs[0].recipients, vec!["grace@example.com".to_string()]);

    app.drain().await;
}

#[tokio::test]
async fn test_購読中のアドレスは200で購読日時が変わらず通知もされない() {
    let app = TestAppBuilder::new().build();
    app.subscribers
        .add_subscriber(seeded(100, "grace@example.com", true));

    let response = post(
        &app.router,
        "/api/newsletter",
        json!({ "email": "GRACE@example.com" }),
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.data()["id"], 100);
    assert_eq!(response.data()["subscribed_at"], "2026-01-01T00:00:00+00:00");
    assert!(app.jobs().is_empty());
    assert_eq!(app.subscribers.stored().len(), 1);

    app.drain().await;
}

#[tokio::test]
async fn test_購読解除済みのアドレスは再開されウェルカムメールが1件スケジュールされる() {
    let app = TestAppBuilder::new().build();
    app.subscribers
        .add_subscriber(seeded(100, "linus@example.com", false));

    let response = post(
        &app.router,
        "/api/newsletter",
        json!({ "email": "linus@example.com", "name": "Linus" }),
    )
    .await;

    assert_eq!(response.status, 201);
    assert_eq!(response.data()["is_active"], true);

    let stored = app.subscribers.stored();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_active());
    assert_eq!(stored[0].unsubscribed_at(), None);

    let jobs = app.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].triggering_event, TriggeringEvent::NewsletterReactivated);
    assert_eq!(
        jobs[0].entity,
        EntityReference::NewsletterSubscriber(SubscriberId::new(100))
    );

    app.drain().await;
}

#[tokio::test]
async fn test_購読解除すると詳細と一覧から消える() {
    let app = TestAppBuilder::new().build();
    let created = post(
        &app.router,
        "/api/newsletter",
        json!({ "email": "ada@example.com" }),
    )
    .await;
    let id = created.data()["id"].as_i64().unwrap();

    let response = post_empty(&app.router, &format!("/api/newsletter/{id}/unsubscribe")).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "status": "Successfully unsubscribed" }));
    assert_eq!(get(&app.router, &format!("/api/newsletter/{id}")).await.status, 404);
    let list = get(&app.router, "/api/newsletter").await;
    assert_eq!(list.data(), &json!([]));

    app.drain().await;
}

#[tokio::test]
async fn test_不正なメールアドレスは400() {
    let app = TestAppBuilder::new().build();

    let response = post(&app.router, "/api/newsletter", json!({ "email": "nope" })).await;

    assert_eq!(response.status, 400);
    assert_eq!(common::invalid_param_names(&response), vec!["email".to_string()]);
    assert!(app.subscribers.stored().is_empty());

    app.drain().await;
}
