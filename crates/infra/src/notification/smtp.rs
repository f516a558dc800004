//! SMTP 送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! コネクションプールは使わず、送信ごとに接続・認証する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use nailbook_domain::notification::{
    ComposedMessage,
    DeliveryError,
    DeliveryErrorKind,
    MessageBody,
};

use super::{MailSender, MailSettings};

/// SMTP 送信
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailSender {
    /// 設定から SMTP トランスポートを構築する
    ///
    /// `use_tls` が true なら STARTTLS、false なら平文で接続する。
    pub fn new(settings: &MailSettings) -> Result<Self, lettre::transport::smtp::Error> {
        let smtp = &settings.smtp;
        let builder = if smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };

        let mut builder = builder.port(smtp.port).timeout(Some(settings.timeout));
        if let Some((username, password)) = smtp.credentials() {
            builder =
                builder.credentials(Credentials::new(username.to_string(), password.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

/// アドレス文字列を Mailbox に変換する
fn parse_mailbox(
    address: &str,
    kind: DeliveryErrorKind,
    label: &str,
) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| DeliveryError::new(kind, format!("{label}アドレス不正 ({address}): {e}")))
}

/// ComposedMessage を lettre の Message に変換する
fn build_message(message: &ComposedMessage) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(
            &message.from_address,
            DeliveryErrorKind::SenderDomain,
            "送信元",
        )?)
        .subject(&message.subject);

    for to in &message.recipients {
        builder = builder.to(parse_mailbox(to, DeliveryErrorKind::Recipient, "宛先")?);
    }
    for cc in &message.cc {
        builder = builder.cc(parse_mailbox(cc, DeliveryErrorKind::Recipient, "CC ")?);
    }
    for bcc in &message.bcc {
        builder = builder.bcc(parse_mailbox(bcc, DeliveryErrorKind::Recipient, "BCC ")?);
    }

    let built = match message.body() {
        MessageBody::Both { text, html } => {
            builder.multipart(MultiPart::alternative_plain_html(text, html))
        }
        MessageBody::Text(text) => builder.header(ContentType::TEXT_PLAIN).body(text),
        MessageBody::Html(html) => builder.header(ContentType::TEXT_HTML).body(html),
    };

    built.map_err(|e| {
        DeliveryError::new(
            DeliveryErrorKind::Unknown,
            format!("メッセージ構築失敗: {e}"),
        )
    })
}

/// SMTP の失敗を分類する
///
/// - 53x 応答 → 認証失敗
/// - 一時的失敗（4xx 応答）・タイムアウト・ネットワーク障害 → 一時的なネットワーク障害
/// - それ以外はメッセージのキーワードで分類
pub fn classify_smtp_failure(code: Option<&str>, transient: bool, message: &str) -> DeliveryErrorKind {
    if code.is_some_and(|c| c.starts_with("53")) {
        return DeliveryErrorKind::Auth;
    }
    let lower = message.to_ascii_lowercase();
    if transient || lower.contains("network") || lower.contains("connection") {
        return DeliveryErrorKind::TransientNetwork;
    }
    DeliveryErrorKind::classify_message(message)
}

#[async_trait]
impl MailSender for SmtpMailSender {
    fn provider_name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &ComposedMessage) -> Result<Option<String>, DeliveryError> {
        let email = build_message(message)?;

        let response = self.transport.send(email).await.map_err(|e| {
            let code = e.status().map(|c| c.to_string());
            let text = format!("SMTP 送信失敗: {e}");
            DeliveryError::new(
                classify_smtp_failure(code.as_deref(), e.is_transient() || e.is_timeout(), &text),
                text,
            )
        })?;

        // SMTP は標準のメッセージ ID を返さないため、最終応答の 1 行目を記録する
        Ok(response.first_line().map(str::to_string))
    }
}
