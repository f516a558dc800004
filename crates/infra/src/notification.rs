//! # メール送信
//!
//! 組み立て済みメッセージをメールプロバイダへ送るインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`MailSender`] でプロバイダごとの送信方法を隠す
//! - **3 つの実装**: HTTP メール API（Resend 互換）、SMTP、コンソール（ログ出力のみ）
//! - **起動時に一度だけ選択**: [`MailSettings::select_provider`] は設定値だけから
//!   決まる純粋関数。送信経路では環境変数を読まない
//! - **共通処理はディスパッチャー**: 宛先なしのスキップや結果のログ出力は
//!   [`MailDispatcher`] が全プロバイダ共通で行う

mod console;
mod dispatcher;
mod http_api;
mod settings;
mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
pub use console::ConsoleMailSender;
pub use dispatcher::MailDispatcher;
pub use http_api::{HttpApiMailSender, classify_http_failure};
use nailbook_domain::notification::{ComposedMessage, DeliveryError};
pub use settings::{MailSettings, ProviderSelection, SmtpSettings};
pub use smtp::{SmtpMailSender, classify_smtp_failure};

/// メール送信トレイト
///
/// 成功時はプロバイダが採番したメッセージ ID（あれば）を返す。
/// 宛先が空のメッセージはディスパッチャーが弾くため、実装側では考慮しない。
#[async_trait]
pub trait MailSender: Send + Sync {
    /// ログ出力用のプロバイダ名
    fn provider_name(&self) -> &'static str;

    async fn send(&self, message: &ComposedMessage) -> Result<Option<String>, DeliveryError>;
}

/// 設定からプロバイダを構築する
///
/// SMTP トランスポートの構築に失敗した場合やプロバイダが一つも設定されていない
/// 場合は、警告を出してコンソールにフォールバックする（起動は止めない）。
pub fn build_sender(settings: &MailSettings) -> Arc<dyn MailSender> {
    match settings.select_provider() {
        ProviderSelection::HttpApi => match HttpApiMailSender::new(settings) {
            Ok(sender) => return Arc::new(sender),
            Err(e) => {
                tracing::warn!(error = %e, "HTTP メール API クライアントの構築に失敗");
            }
        },
        ProviderSelection::Smtp => match SmtpMailSender::new(settings) {
            Ok(sender) => return Arc::new(sender),
            Err(e) => {
                tracing::warn!(error = %e, "SMTP トランスポートの構築に失敗");
            }
        },
        ProviderSelection::Console => {}
    }

    tracing::warn!(
        "利用可能なメールプロバイダが設定されていません。メールはログに出力されるだけで送信されません"
    );
    Arc::new(ConsoleMailSender)
}
