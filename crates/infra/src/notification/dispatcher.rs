//! メールディスパッチャー
//!
//! 全プロバイダ共通の前後処理（宛先なしのスキップ、結果のログ出力）を担う。

use std::sync::Arc;

use nailbook_domain::notification::{ComposedMessage, DeliveryError, DispatchResult};

use super::MailSender;

/// プロバイダをラップするディスパッチャー
#[derive(Clone)]
pub struct MailDispatcher {
    sender: Arc<dyn MailSender>,
}

impl MailDispatcher {
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self { sender }
    }

    pub fn provider_name(&self) -> &'static str {
        self.sender.provider_name()
    }

    /// メッセージを送信する
    ///
    /// 宛先が空なら送信せずに `sent = false` を返す（エラーにはしない）。
    /// プロバイダの失敗は分類付きの [`DeliveryError`] として返す。
    pub async fn dispatch(&self, message: &ComposedMessage) -> Result<DispatchResult, DeliveryError> {
        if message.recipients.is_empty() {
            tracing::warn!(
                subject = %message.subject,
                provider = self.provider_name(),
                "宛先が空のためメール送信をスキップ"
            );
            return Ok(DispatchResult::skipped());
        }

        let provider_message_id = self.sender.send(message).await?;
        tracing::debug!(
            provider = self.provider_name(),
            provider_message_id = provider_message_id.as_deref().unwrap_or(""),
            recipients = message.recipients.len(),
            "メール送信完了"
        );
        Ok(DispatchResult::sent(provider_message_id))
    }
}
