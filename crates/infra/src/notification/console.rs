//! コンソール送信実装
//!
//! メールを実際には送らず、内容をログに出力する。
//! プロバイダが設定されていない開発環境のフォールバック。

use async_trait::async_trait;
use nailbook_domain::notification::{ComposedMessage, DeliveryError, MessageBody};

use super::MailSender;

/// コンソール送信（ログ出力のみ、常に成功する）
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailSender;

#[async_trait]
impl MailSender for ConsoleMailSender {
    fn provider_name(&self) -> &'static str {
        "console"
    }

    async fn send(&self, message: &ComposedMessage) -> Result<Option<String>, DeliveryError> {
        let (kind, body) = match message.body() {
            MessageBody::Both { text, .. } => ("multipart", text),
            MessageBody::Text(text) => ("text", text),
            MessageBody::Html(html) => ("html", html),
        };

        tracing::info!(
            from = %message.from_address,
            to = ?message.recipients,
            cc = ?message.cc,
            bcc = ?message.bcc,
            subject = %message.subject,
            body.kind = kind,
            "Console: メール送信の代わりにログ出力\n{body}"
        );
        Ok(None)
    }
}
