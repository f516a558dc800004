//! # API サーバー設定
//!
//! 環境変数からサーバー設定を読み込む。
//!
//! ## 設計方針
//!
//! - **起動時に一度だけ読む**: メール送信設定もここで組み立て、ディスパッチャーの
//!   構築時に値として渡す。送信経路で環境変数を参照しない
//! - **必須項目の欠落は起動エラー**: `API_PORT` と `DATABASE_URL` のみ必須
//! - **プロバイダ未設定は起動エラーにしない**: コンソール出力にフォールバックする

use std::{env, time::Duration};

use nailbook_domain::booking::TransitionPolicy;
use nailbook_infra::notification::{MailSettings, SmtpSettings};
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_MAIL_API_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_JOB_TIMEOUT_SECS: u64 = 30;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),

    #[error("環境変数 {name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// サムネイル生成フックの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailMode {
    #[default]
    Disabled,
    Cdn,
}

/// バックグラウンドランナーの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// 同時に実行するジョブ数
    pub workers:        usize,
    /// 待機できるジョブ数（超えた分は破棄）
    pub queue_capacity: usize,
    /// ジョブ 1 件あたりのタイムアウト
    pub job_timeout:    Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers:        DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            job_timeout:    Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
        }
    }
}

/// API サーバー設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// バインドアドレス
    pub host:              String,
    /// ポート番号
    pub port:              u16,
    /// データベース接続 URL
    pub database_url:      String,
    /// メール送信設定
    pub mail:              MailSettings,
    /// 管理者向け通知の宛先（未設定なら管理者通知は送らない）
    pub admin_email:       Option<String>,
    pub runner:            RunnerConfig,
    pub transition_policy: TransitionPolicy,
    pub thumbnail_mode:    ThumbnailMode,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = get("API_PORT").ok_or(ConfigError::Missing("API_PORT"))?;
        let port = parse_value("API_PORT", &port)?;
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let mail = mail_settings(&get)?;
        let admin_email = get("ADMIN_EMAIL").or_else(|| mail.smtp.username.clone());

        let runner = RunnerConfig {
            workers:        positive(
                "NOTIFICATION_WORKERS",
                get("NOTIFICATION_WORKERS"),
                DEFAULT_WORKERS,
            )?,
            queue_capacity: positive(
                "NOTIFICATION_QUEUE_CAPACITY",
                get("NOTIFICATION_QUEUE_CAPACITY"),
                DEFAULT_QUEUE_CAPACITY,
            )?,
            job_timeout:    Duration::from_secs(optional(
                "BACKGROUND_JOB_TIMEOUT_SECS",
                get("BACKGROUND_JOB_TIMEOUT_SECS"),
                DEFAULT_JOB_TIMEOUT_SECS,
            )?),
        };

        let transition_policy = match get("BOOKING_TRANSITION_POLICY") {
            None => TransitionPolicy::default(),
            Some(value) => TransitionPolicy::parse(&value).ok_or(ConfigError::Invalid {
                name: "BOOKING_TRANSITION_POLICY",
                value,
            })?,
        };

        let thumbnail_mode = match get("THUMBNAIL_MODE").as_deref().map(str::trim) {
            None | Some("disabled") => ThumbnailMode::Disabled,
            Some("cdn") => ThumbnailMode::Cdn,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name:  "THUMBNAIL_MODE",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            host: get("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url,
            mail,
            admin_email,
            runner,
            transition_policy,
            thumbnail_mode,
        })
    }
}

/// メール送信設定だけを環境変数から読み込む
///
/// サーバー以外のツール（テストメール送信）から使う。DB 設定は要求しない。
pub fn mail_settings_from_env() -> Result<MailSettings, ConfigError> {
    mail_settings(&|name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty()))
}

fn mail_settings(get: &dyn Fn(&str) -> Option<String>) -> Result<MailSettings, ConfigError> {
    let smtp = SmtpSettings {
        host:     get("EMAIL_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
        port:     optional("EMAIL_PORT", get("EMAIL_PORT"), DEFAULT_SMTP_PORT)?,
        use_tls:  parse_flag("EMAIL_USE_TLS", get("EMAIL_USE_TLS"), true)?,
        username: get("EMAIL_HOST_USER"),
        password: get("EMAIL_HOST_PASSWORD"),
    };

    Ok(MailSettings {
        api_key: get("RESEND_API_KEY"),
        api_base_url: get("MAIL_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_MAIL_API_BASE_URL.to_string()),
        smtp,
        default_from_email: get("DEFAULT_FROM_EMAIL"),
        timeout: Duration::from_secs(optional(
            "MAIL_TIMEOUT_SECS",
            get("MAIL_TIMEOUT_SECS"),
            DEFAULT_MAIL_TIMEOUT_SECS,
        )?),
    })
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn optional<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| parse_value(name, &v))
}

fn positive(
    name: &'static str,
    value: Option<String>,
    default: usize,
) -> Result<usize, ConfigError> {
    match optional(name, value, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}

fn parse_flag(name: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
