//! HTTP メール API 送信実装
//!
//! Resend 互換のエンドポイント（`POST {base}/emails`）へ JSON で送信する。
//! 1 メッセージにつき 1 リクエストで、宛先は常に配列で渡す。

use async_trait::async_trait;
use nailbook_domain::notification::{
    ComposedMessage,
    DeliveryError,
    DeliveryErrorKind,
    MessageBody,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{MailSender, MailSettings};

/// HTTP メール API 送信
pub struct HttpApiMailSender {
    client:   Client,
    endpoint: String,
    api_key:  String,
}

impl HttpApiMailSender {
    /// タイムアウト付きの HTTP クライアントを構築する
    pub fn new(settings: &MailSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/emails", settings.api_base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from:    &'a str,
    to:      &'a [String],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html:    Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text:    Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc:      Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc:     Option<&'a [String]>,
}

impl<'a> SendEmailRequest<'a> {
    fn from_message(message: &'a ComposedMessage) -> Self {
        let (text, html) = match message.body() {
            MessageBody::Both { text, html } => (Some(text), Some(html)),
            MessageBody::Text(text) => (Some(text), None),
            MessageBody::Html(html) => (None, Some(html)),
        };
        Self {
            from: &message.from_address,
            to: &message.recipients,
            subject: &message.subject,
            html,
            text,
            cc: non_empty(&message.cc),
            bcc: non_empty(&message.bcc),
        }
    }
}

fn non_empty(addresses: &[String]) -> Option<&[String]> {
    (!addresses.is_empty()).then_some(addresses)
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// HTTP 応答の失敗を分類する
///
/// - 401 / 403 → 認証失敗
/// - 429 / 5xx → 一時的な障害
/// - その他の 4xx は本文のキーワードで分類
pub fn classify_http_failure(status: StatusCode, body: &str) -> DeliveryErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeliveryErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => DeliveryErrorKind::TransientNetwork,
        s if s.is_server_error() => DeliveryErrorKind::TransientNetwork,
        _ => DeliveryErrorKind::classify_message(body),
    }
}

fn classify_transport_error(error: &reqwest::Error) -> DeliveryErrorKind {
    if error.is_timeout() || error.is_connect() {
        DeliveryErrorKind::TransientNetwork
    } else {
        DeliveryErrorKind::classify_message(&error.to_string())
    }
}

#[async_trait]
impl MailSender for HttpApiMailSender {
    fn provider_name(&self) -> &'static str {
        "http_api"
    }

    async fn send(&self, message: &ComposedMessage) -> Result<Option<String>, DeliveryError> {
        let payload = SendEmailRequest::from_message(message);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                DeliveryError::new(classify_transport_error(&e), format!("HTTP 送信失敗: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::new(
                classify_http_failure(status, &body),
                format!("メール API がエラーを返しました ({status}): {body}"),
            ));
        }

        // 送信自体は成功しているので、応答本文が読めなくても失敗にはしない
        let id = match response.json::<SendEmailResponse>().await {
            Ok(body) => body.id,
            Err(e) => {
                tracing::warn!(error = %e, "メール API の応答本文を解釈できません");
                None
            }
        };
        Ok(id)
    }
}
