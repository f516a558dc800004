//! # 通知
//!
//! トランザクション後に送るメール通知のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 寿命 |
//! |---|------------|------|
//! | [`NotificationJob`] | 通知ジョブ | 永続化成功直後に作られ、バックグラウンドタスクの終了とともに破棄 |
//! | [`ComposedMessage`] | 組み立て済みメッセージ | レンダラーが生成し、ディスパッチャーが一度だけ消費 |
//! | [`DispatchResult`] | 送信結果 | ログにのみ出力（呼び出し元には返さない） |
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: 通知の成否は業務トランザクションに影響しない
//! - **ID だけを渡す**: ジョブはエンティティの ID を持ち、実行時に再取得する
//! - **本文の判定**: HTML 本文が無い場合は単一本文を `<html` / `<body` の有無で判定する

use serde::Serialize;
use strum::{EnumString, IntoStaticStr};
use thiserror::Error;

use crate::{booking::BookingId, contact::ContactMessageId, newsletter::SubscriberId};

// =========================================================================
// NotificationJob
// =========================================================================

/// テンプレート名
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    IntoStaticStr,
    EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateName {
    /// 新規予約 → 管理者
    BookingNotification,
    /// 予約確定 → お客様
    BookingConfirmation,
    /// 新規お問い合わせ → 管理者
    ContactNotification,
    /// 購読開始・再開 → 購読者
    NewsletterWelcome,
}

/// 通知の対象エンティティ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityReference {
    Booking(BookingId),
    ContactMessage(ContactMessageId),
    NewsletterSubscriber(SubscriberId),
}

impl std::fmt::Display for EntityReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Booking(id) => write!(f, "booking:{id}"),
            Self::ContactMessage(id) => write!(f, "contact_message:{id}"),
            Self::NewsletterSubscriber(id) => write!(f, "newsletter_subscriber:{id}"),
        }
    }
}

/// 通知を引き起こした業務イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggeringEvent {
    BookingCreated,
    BookingConfirmed,
    ContactReceived,
    NewsletterSubscribed,
    NewsletterReactivated,
}

/// 通知ジョブ
///
/// オーケストレーターが永続化成功の直後に生成する。永続化はしない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationJob {
    pub entity:           EntityReference,
    pub template:         TemplateName,
    pub recipients:       Vec<String>,
    pub triggering_event: TriggeringEvent,
}

impl NotificationJob {
    pub fn new(
        entity: EntityReference,
        template: TemplateName,
        recipients: Vec<String>,
        triggering_event: TriggeringEvent,
    ) -> Self {
        Self {
            entity,
            template,
            recipients,
            triggering_event,
        }
    }
}

// =========================================================================
// ComposedMessage
// =========================================================================

/// 組み立て済みメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject:      String,
    pub plain_text:   String,
    pub html:         Option<String>,
    pub from_address: String,
    pub recipients:   Vec<String>,
    pub cc:           Vec<String>,
    pub bcc:          Vec<String>,
}

/// 送信する本文の形
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// テキストと HTML の両方（multipart/alternative）
    Both { text: String, html: String },
    Text(String),
    Html(String),
}

impl ComposedMessage {
    /// 送信する本文を決める
    ///
    /// - テキストと HTML が両方あれば両方を送る
    /// - HTML だけならそれを送る
    /// - テキスト欄だけなら、その内容に `<html` / `<body` が含まれるかで判定する
    pub fn body(&self) -> MessageBody {
        let text = self.plain_text.trim();
        match self.html.as_deref().map(str::trim) {
            Some(html) if !html.is_empty() && !text.is_empty() => MessageBody::Both {
                text: self.plain_text.clone(),
                html: html.to_string(),
            },
            Some(html) if !html.is_empty() => MessageBody::Html(html.to_string()),
            _ if looks_like_html(text) => MessageBody::Html(self.plain_text.clone()),
            _ => MessageBody::Text(self.plain_text.clone()),
        }
    }
}

/// HTML のルート要素の開始タグを含むか（大文字小文字を区別しない）
pub fn looks_like_html(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("<html") || lower.contains("<body")
}

// =========================================================================
// DispatchResult / DeliveryError
// =========================================================================

/// 送信失敗の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// 認証失敗（API キー・SMTP 認証情報）
    Auth,
    /// 宛先アドレスの問題
    Recipient,
    /// 送信元アドレス・ドメインの問題
    SenderDomain,
    /// 一時的なネットワーク障害・タイムアウト・レート制限
    TransientNetwork,
    Unknown,
}

impl DeliveryErrorKind {
    /// プロバイダのエラーメッセージから分類する
    ///
    /// ステータスコード等で分類できない場合のフォールバック。
    /// 認証 → 送信元 → 宛先 → ネットワークの順に判定する。
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has(&["unauthorized", "invalid api key", "api key is invalid", "authentication"]) {
            Self::Auth
        } else if has(&["domain", "sender", "`from`", "'from'", "\"from\"", "from address"]) {
            Self::SenderDomain
        } else if has(&["recipient", "`to`", "'to'", "\"to\"", "to address", "mailbox"]) {
            Self::Recipient
        } else if has(&["timeout", "timed out", "connection", "temporarily", "rate limit"]) {
            Self::TransientNetwork
        } else {
            Self::Unknown
        }
    }
}

/// 送信失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("メール送信に失敗 ({kind}): {message}")]
pub struct DeliveryError {
    pub kind:    DeliveryErrorKind,
    pub message: String,
}

impl DeliveryError {
    pub fn new(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 送信結果（ログ出力専用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub sent:                bool,
    pub provider_message_id: Option<String>,
    pub error:               Option<DeliveryErrorKind>,
}

impl DispatchResult {
    pub fn sent(provider_message_id: Option<String>) -> Self {
        Self {
            sent: true,
            provider_message_id,
            error: None,
        }
    }

    /// 宛先なしなどで送信しなかった（エラーではない）
    pub fn skipped() -> Self {
        Self {
            sent:                false,
            provider_message_id: None,
            error:               None,
        }
    }

    pub fn failed(kind: DeliveryErrorKind) -> Self {
        Self {
            sent:                false,
            provider_message_id: None,
            error:               Some(kind),
        }
    }
}

// =========================================================================
// NotificationError
// =========================================================================

/// 通知パイプラインのエラー
///
/// いずれもバックグラウンドタスクの境界で捕捉され、リクエストには伝播しない。
#[derive(Debug, Error)]
pub enum NotificationError {
    /// テンプレートが登録されていない（プログラミングエラー）
    #[error("テンプレートが見つかりません: {0}")]
    TemplateNotFound(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),

    /// 通知対象のエンティティを再取得できない
    #[error("通知対象が見つかりません: {0}")]
    EntityNotFound(EntityReference),

    /// テンプレートと対象エンティティの組み合わせが不正
    #[error("テンプレート {template} は {entity} に使用できません")]
    EntityMismatch {
        template: TemplateName,
        entity:   EntityReference,
    },

    /// エンティティの再取得に失敗
    #[error("通知対象の取得に失敗: {0}")]
    Lookup(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
