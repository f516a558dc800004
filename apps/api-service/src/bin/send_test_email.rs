//! # テストメール送信ツール
//!
//! 設定済みのメールプロバイダで 1 通だけテストメールを送り、
//! プロバイダの選択結果と送信結果を標準出力に出す。
//!
//! ## 使い方
//!
//! ```bash
//! cargo run --bin send-test-email -p nailbook-api-service -- someone@example.com
//! ```

use std::process::ExitCode;

use clap::Parser;
use nailbook_api_service::config::mail_settings_from_env;
use nailbook_domain::notification::ComposedMessage;
use nailbook_infra::notification::{MailDispatcher, build_sender};
use nailbook_shared::observability::{TracingConfig, init_tracing};

const SUBJECT: &str = "Test Email from NaildbyBola";
const TEXT_BODY: &str = "This is a test email to verify email functionality.";
const HTML_BODY: &str =
    "<h1>Test Email</h1><p>This is a <strong>test email</strong> to verify email functionality.</p>";

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Send one test email through the configured mail provider"
)]
struct Args {
    /// 宛先メールアドレス
    #[arg(value_parser = parse_recipient)]
    recipient: String,
}

fn parse_recipient(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("recipient must not be blank".to_string());
    }
    Ok(trimmed.to_string())
}

fn test_message(from_address: String, recipient: String) -> ComposedMessage {
    ComposedMessage {
        subject: SUBJECT.to_string(),
        plain_text: TEXT_BODY.to_string(),
        html: Some(HTML_BODY.to_string()),
        from_address,
        recipients: vec![recipient],
        cc: Vec::new(),
        bcc: Vec::new(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing(&TracingConfig::from_env("send-test-email"));

    let settings = match mail_settings_from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid mail configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = MailDispatcher::new(build_sender(&settings));
    let from_address = settings.from_address();
    println!("Provider: {} ({})", settings.select_provider(), dispatcher.provider_name());
    println!("From: {from_address}");
    println!("To: {}", args.recipient);

    match dispatcher
        .dispatch(&test_message(from_address, args.recipient))
        .await
    {
        Ok(result) => {
            println!(
                "Sent. Message ID: {}",
                result.provider_message_id.as_deref().unwrap_or("-")
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to send test email: {e}");
            ExitCode::FAILURE
        }
    }
}
