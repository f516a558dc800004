//! # 通知レンダラー
//!
//! テンプレート名と対象エンティティから件名・テキスト本文・HTML 本文を生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: HTML テンプレートはバイナリに埋め込まれる
//! - **テキスト本文はコードで組み立てる**: HTML テンプレートが壊れていても読める本文が残る。
//!   HTML のレンダリングに失敗した場合は警告を出してテキストのみで送る
//! - **未登録テンプレートは即時エラー**: スケジュール前に [`NotificationRenderer::ensure_template`]
//!   で検査する

use nailbook_domain::{
    booking::Booking,
    contact::ContactMessage,
    newsletter::NewsletterSubscriber,
    notification::{ComposedMessage, EntityReference, NotificationError, TemplateName},
    service::Service,
};
use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 4] = [
    (
        "booking_notification.html",
        include_str!("../../templates/emails/booking_notification.html"),
    ),
    (
        "booking_confirmation.html",
        include_str!("../../templates/emails/booking_confirmation.html"),
    ),
    (
        "contact_notification.html",
        include_str!("../../templates/emails/contact_notification.html"),
    ),
    (
        "newsletter_welcome.html",
        include_str!("../../templates/emails/newsletter_welcome.html"),
    ),
];

/// レンダリング対象のエンティティ
///
/// バックグラウンドジョブが再取得した値を渡す。
#[derive(Debug, Clone)]
pub enum RenderContext {
    Booking { booking: Booking, service: Service },
    ContactMessage(ContactMessage),
    NewsletterSubscriber(NewsletterSubscriber),
}

impl RenderContext {
    pub fn entity(&self) -> EntityReference {
        match self {
            Self::Booking { booking, .. } => EntityReference::Booking(booking.id()),
            Self::ContactMessage(message) => EntityReference::ContactMessage(message.id),
            Self::NewsletterSubscriber(subscriber) => {
                EntityReference::NewsletterSubscriber(subscriber.id())
            }
        }
    }
}

/// レンダリング結果（宛先・送信元は未設定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject:    String,
    pub plain_text: String,
    pub html:       Option<String>,
}

impl RenderedMessage {
    /// 送信元と宛先を付けて送信可能なメッセージにする
    pub fn into_composed(self, from_address: String, recipients: Vec<String>) -> ComposedMessage {
        ComposedMessage {
            subject: self.subject,
            plain_text: self.plain_text,
            html: self.html,
            from_address,
            recipients,
            cc: Vec::new(),
            bcc: Vec::new(),
        }
    }
}

/// 通知レンダラー
pub struct NotificationRenderer {
    engine: Tera,
}

impl NotificationRenderer {
    /// 埋め込みテンプレートを登録したレンダラーを作成する
    pub fn new() -> Result<Self, NotificationError> {
        Self::from_sources(&TEMPLATES)
    }

    /// 任意のテンプレートソースからレンダラーを作成する
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();
        engine
            .add_raw_templates(sources.iter().copied())
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        Ok(Self { engine })
    }

    /// テンプレートが登録されているか検査する
    pub fn ensure_template(&self, template: TemplateName) -> Result<(), NotificationError> {
        let name = html_template_name(template);
        if self.engine.get_template_names().any(|n| n == name) {
            Ok(())
        } else {
            Err(NotificationError::TemplateNotFound(name))
        }
    }

    /// 件名・テキスト本文・HTML 本文を生成する
    pub fn render(
        &self,
        template: TemplateName,
        context: &RenderContext,
    ) -> Result<RenderedMessage, NotificationError> {
        self.ensure_template(template)?;

        let (subject, plain_text, tera_context) = match (template, context) {
            (TemplateName::BookingNotification, RenderContext::Booking { booking, service }) => {
                booking_notification(booking, service)
            }
            (TemplateName::BookingConfirmation, RenderContext::Booking { booking, service }) => {
                booking_confirmation(booking, service)
            }
            (TemplateName::ContactNotification, RenderContext::ContactMessage(message)) => {
                contact_notification(message)
            }
            (TemplateName::NewsletterWelcome, RenderContext::NewsletterSubscriber(subscriber)) => {
                newsletter_welcome(subscriber)
            }
            _ => {
                return Err(NotificationError::EntityMismatch {
                    template,
                    entity: context.entity(),
                });
            }
        };

        let html = match self
            .engine
            .render(&html_template_name(template), &tera_context)
        {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    template = %template,
                    "HTML テンプレートのレンダリングに失敗。テキスト本文のみで送信します"
                );
                None
            }
        };

        Ok(RenderedMessage {
            subject,
            plain_text,
            html,
        })
    }
}

fn html_template_name(template: TemplateName) -> String {
    format!("{template}.html")
}

fn booking_notification(booking: &Booking, service: &Service) -> (String, String, Context) {
    let notes = if booking.notes().trim().is_empty() {
        "None"
    } else {
        booking.notes()
    };
    let date = booking.preferred_date().format("%Y-%m-%d").to_string();
    let time = booking.preferred_time().to_string();

    let subject = format!(
        "New Booking Request - {}",
        booking.customer_name().as_str()
    );
    let plain_text = format!(
        "New booking request received:\n\
         \n\
         Customer: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Service: {service}\n\
         Date: {date}\n\
         Time: {time}\n\
         Notes: {notes}\n\
         \n\
         Please confirm this appointment.\n",
        name = booking.customer_name().as_str(),
        email = booking.customer_email(),
        phone = booking.customer_phone(),
        service = service.name,
    );

    let mut context = Context::new();
    context.insert("customer_name", booking.customer_name().as_str());
    context.insert("customer_email", booking.customer_email().as_str());
    context.insert("customer_phone", booking.customer_phone().as_str());
    context.insert("service_name", &service.name);
    context.insert("duration", &service.duration_display());
    context.insert("price", &service.price.to_string());
    context.insert("preferred_date", &date);
    context.insert("preferred_time", &booking.preferred_time().label());
    context.insert("notes", notes);

    (subject, plain_text, context)
}

fn booking_confirmation(booking: &Booking, service: &Service) -> (String, String, Context) {
    let date = booking.preferred_date().format("%Y-%m-%d").to_string();
    let time = booking.preferred_time().to_string();
    let duration = service.duration_display();

    let subject = format!("Appointment Confirmed - {}", service.name);
    let plain_text = format!(
        "Your appointment has been confirmed!\n\
         \n\
         Service: {service}\n\
         Date: {date}\n\
         Time: {time}\n\
         Duration: {duration}\n\
         \n\
         We look forward to seeing you!\n",
        service = service.name,
    );

    let mut context = Context::new();
    context.insert("customer_name", booking.customer_name().as_str());
    context.insert("service_name", &service.name);
    context.insert("preferred_date", &date);
    context.insert("preferred_time", &booking.preferred_time().label());
    context.insert("duration", &duration);
    context.insert(
        "estimated_end_time",
        &booking.estimated_end_time(service).format("%-I:%M %p").to_string(),
    );

    (subject, plain_text, context)
}

fn contact_notification(message: &ContactMessage) -> (String, String, Context) {
    let phone = message
        .phone
        .as_ref()
        .map_or("Not provided", |p| p.as_str());

    let subject = format!("New Contact Message - {}", message.subject.as_str());
    let plain_text = format!(
        "New contact message received:\n\
         \n\
         From: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Subject: {subject}\n\
         Type: {subject_type}\n\
         \n\
         Message:\n\
         {body}\n",
        name = message.name.as_str(),
        email = message.email,
        subject = message.subject.as_str(),
        subject_type = message.subject_type.label(),
        body = message.message,
    );

    let mut context = Context::new();
    context.insert("name", message.name.as_str());
    context.insert("email", message.email.as_str());
    context.insert("phone", phone);
    context.insert("subject", message.subject.as_str());
    context.insert("subject_type", message.subject_type.label());
    context.insert("message", &message.message);

    (subject, plain_text, context)
}

fn newsletter_welcome(subscriber: &NewsletterSubscriber) -> (String, String, Context) {
    let name = subscriber.name().map_or("there", |n| n.as_str());

    let subject = "Welcome to our newsletter!".to_string();
    let plain_text = format!(
        "Welcome to our newsletter, {name}!\n\
         \n\
         Thank you for subscribing. You'll receive updates about our latest services, \
         special offers, and beauty tips.\n\
         \n\
         Best regards,\n\
         The Nail & Lash Team\n"
    );

    let mut context = Context::new();
    context.insert("name", name);

    (subject, plain_text, context)
}
