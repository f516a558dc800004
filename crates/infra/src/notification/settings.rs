//! メールプロバイダの設定値と選択ロジック

use std::{fmt, time::Duration};

use derive_more::Display;

/// HTTP メール API 利用時の既定送信元（Resend のテスト用ドメイン）
const HTTP_API_DEFAULT_FROM: &str = "onboarding@resend.dev";
/// コンソール利用時の既定送信元
const CONSOLE_DEFAULT_FROM: &str = "noreply@nailbook.local";

/// SMTP サーバーの設定
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host:     String,
    pub port:     u16,
    /// STARTTLS を使うか。false なら平文（Mailpit 等のローカル SMTP 向け）
    pub use_tls:  bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpSettings {
    /// ユーザー名とパスワードが両方揃っている場合のみ返す
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((username, password))
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// メール送信の設定
///
/// 起動時に環境変数から一度だけ組み立て、プロバイダの構築に渡す。
#[derive(Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub api_key:            Option<String>,
    pub api_base_url:       String,
    pub smtp:               SmtpSettings,
    pub default_from_email: Option<String>,
    /// プロバイダ呼び出しのタイムアウト
    pub timeout:            Duration,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .field("smtp", &self.smtp)
            .field("default_from_email", &self.default_from_email)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// 選択されたプロバイダ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProviderSelection {
    #[display("http_api")]
    HttpApi,
    #[display("smtp")]
    Smtp,
    #[display("console")]
    Console,
}

impl MailSettings {
    /// 使用するプロバイダを決める
    ///
    /// 優先順位は固定: API キー → SMTP 認証情報 → コンソール。
    pub fn select_provider(&self) -> ProviderSelection {
        if self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            ProviderSelection::HttpApi
        } else if self.smtp.credentials().is_some() {
            ProviderSelection::Smtp
        } else {
            ProviderSelection::Console
        }
    }

    /// 送信元アドレス
    ///
    /// `DEFAULT_FROM_EMAIL` が無ければプロバイダごとの既定値を使う。
    /// SMTP では認証ユーザーのアドレスから送る。
    pub fn from_address(&self) -> String {
        if let Some(from) = self.default_from_email.as_deref().filter(|f| !f.trim().is_empty()) {
            return from.to_string();
        }
        match self.select_provider() {
            ProviderSelection::HttpApi => HTTP_API_DEFAULT_FROM.to_string(),
            ProviderSelection::Smtp => self
                .smtp
                .credentials()
                .map(|(user, _)| user.to_string())
                .unwrap_or_else(|| CONSOLE_DEFAULT_FROM.to_string()),
            ProviderSelection::Console => CONSOLE_DEFAULT_FROM.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn settings(
        api_key: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> MailSettings {
        MailSettings {
            api_key:            api_key.map(str::to_string),
            api_base_url:       "https://api.resend.com".to_string(),
            smtp:               SmtpSettings {
                host:     "smtp.gmail.com".to_string(),
                port:     587,
                use_tls:  true,
                username: username.map(str::to_string),
                password: password.map(str::to_string),
            },
            default_from_email: None,
            timeout:            Duration::from_secs(10),
        }
    }

    #[rstest]
    #[case(Some("re_123"), Some("salon@gmail.com"), Some("pw"), ProviderSelection::HttpApi)]
    #[case(Some("re_123"), None, None, ProviderSelection::HttpApi)]
    #[case(None, Some("salon@gmail.com"), Some("pw"), ProviderSelection::Smtp)]
    #[case(Some("  "), Some("salon@gmail.com"), Some("pw"), ProviderSelection::Smtp)]
    #[case(None, Some("salon@gmail.com"), None, ProviderSelection::Console)]
    #[case(None, None, None, ProviderSelection::Console)]
    fn test_プロバイダは固定の優先順位で選ばれる(
        #[case] api_key: Option<&str>,
        #[case] username: Option<&str>,
        #[case] password: Option<&str>,
        #[case] expected: ProviderSelection,
    ) {
        assert_eq!(
            settings(api_key, username, password).select_provider(),
            expected
        );
    }

    #[test]
    fn test_api_keyがあればsmtp認証情報があってもsmtpは選ばれない() {
        let s = settings(Some("re_123"), Some("salon@gmail.com"), Some("pw"));

        for _ in 0..3 {
            assert_ne!(s.select_provider(), ProviderSelection::Smtp);
        }
    }

    #[rstest]
    #[case(Some("re_123"), None, "onboarding@resend.dev")]
    #[case(None, Some("salon@gmail.com"), "salon@gmail.com")]
    #[case(None, None, "noreply@nailbook.local")]
    fn test_送信元はプロバイダごとの既定値になる(
        #[case] api_key: Option<&str>,
        #[case] username: Option<&str>,
        #[case] expected: &str,
    ) {
        let s = settings(api_key, username, username.map(|_| "pw"));
        assert_eq!(s.from_address(), expected);
    }

    #[test]
    fn test_default_from_emailが指定されていれば優先される() {
        let mut s = settings(Some("re_123"), None, None);
        s.default_from_email = Some("bookings@nailbook.example.com".to_string());

        assert_eq!(s.from_address(), "bookings@nailbook.example.com");
    }

    #[test]
    fn test_debug出力に秘密情報を含めない() {
        let s = settings(Some("re_secret"), Some("salon@gmail.com"), Some("hunter2"));
        let debug = format!("{s:?}");

        assert!(!debug.contains("re_secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
