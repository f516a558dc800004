//! # テスト用モック
//!
//! ユースケーステストと HTTP 統合テストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! nailbook-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    cmp::Reverse,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nailbook_domain::{
    booking::{Booking, BookingId, BookingRecord, BookingStatus, NewBooking},
    contact::{ContactMessage, ContactMessageId, NewContactMessage},
    gallery::{GalleryFilter, GalleryImage, GalleryImageId, NewGalleryImage},
    newsletter::{NewsletterSubscriber, SubscriberId, SubscriberRecord},
    notification::{ComposedMessage, DeliveryError, DeliveryErrorKind},
    service::{Service, ServiceFilter, ServiceId, ServiceOrdering},
    testimonial::{NewTestimonial, Testimonial, TestimonialFilter, TestimonialId},
    value_objects::{EmailAddress, PersonName},
};

use crate::{
    error::InfraError,
    notification::MailSender,
    repository::{
        BookingRepository,
        ContactMessageRepository,
        GalleryImageRepository,
        NewsletterSubscriberRepository,
        ServiceRepository,
        TestimonialRepository,
    },
};

/// BIGSERIAL の代わりの採番器
#[derive(Clone)]
struct Sequence(Arc<AtomicI64>);

impl Default for Sequence {
    fn default() -> Self {
        Self(Arc::new(AtomicI64::new(1)))
    }
}

impl Sequence {
    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

// ===== MockServiceRepository =====

#[derive(Clone, Default)]
pub struct MockServiceRepository {
    services: Arc<Mutex<Vec<Service>>>,
}

impl MockServiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_service(&self, service: Service) {
        self.services.lock().unwrap().push(service);
    }
}

#[async_trait]
impl ServiceRepository for MockServiceRepository {
    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, InfraError> {
        Ok(self
            .services
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_active(&self, filter: &ServiceFilter) -> Result<Vec<Service>, InfraError> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut services: Vec<Service> = self
            .services
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active)
            .filter(|s| filter.category.is_none_or(|c| s.category == c))
            .filter(|s| filter.is_featured.is_none_or(|f| s.is_featured == f))
            .filter(|s| {
                search.as_deref().is_none_or(|q| {
                    s.name.to_lowercase().contains(q) || s.description.to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect();

        match filter.ordering {
            ServiceOrdering::CategoryThenName => services.sort_by(|a, b| {
                let a_key: &'static str = a.category.into();
                let b_key: &'static str = b.category.into();
                a_key.cmp(b_key).then_with(|| a.name.cmp(&b.name))
            }),
            ServiceOrdering::Name { descending } => {
                services.sort_by(|a, b| a.name.cmp(&b.name));
                if descending {
                    services.reverse();
                }
            }
            ServiceOrdering::Price { descending } => {
                services.sort_by_key(|s| s.price);
                if descending {
                    services.reverse();
                }
            }
            ServiceOrdering::Duration { descending } => {
                services.sort_by_key(|s| s.duration_minutes);
                if descending {
                    services.reverse();
                }
            }
        }
        Ok(services)
    }
}

// ===== MockBookingRepository =====

#[derive(Clone, Default)]
pub struct MockBookingRepository {
    bookings: Arc<Mutex<Vec<Booking>>>,
    sequence: Sequence,
}

impl MockBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みの予約をすべて返す（登録順）
    pub fn stored(&self) -> Vec<Booking> {
        self.bookings.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingRepository for MockBookingRepository {
    async fn insert(
        &self,
        booking: &NewBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, InfraError> {
        let stored = Booking::from_db(BookingRecord {
            id:             BookingId::new(self.sequence.next()),
            customer_name:  booking.customer_name.clone(),
            customer_email: booking.customer_email.clone(),
            customer_phone: booking.customer_phone.clone(),
            service_id:     booking.service_id,
            preferred_date: booking.preferred_date,
            preferred_time: booking.preferred_time,
            notes:          booking.notes.clone(),
            status:         BookingStatus::Pending,
            created_at:     now,
            updated_at:     now,
        });
        self.bookings.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, InfraError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id() == id)
            .cloned())
    }

    async fn find_all(&self, status: Option<BookingStatus>) -> Result<Vec<Booking>, InfraError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| status.is_none_or(|s| b.status() == s))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| Reverse((b.created_at(), b.id())));
        Ok(bookings)
    }

    async fn update(&self, booking: &Booking) -> Result<bool, InfraError> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.iter_mut().find(|b| b.id() == booking.id()) {
            Some(existing) => {
                *existing = booking.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ===== MockContactMessageRepository =====

#[derive(Clone, Default)]
pub struct MockContactMessageRepository {
    messages: Arc<Mutex<Vec<ContactMessage>>>,
    sequence: Sequence,
}

impl MockContactMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<ContactMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContactMessageRepository for MockContactMessageRepository {
    async fn insert(
        &self,
        message: &NewContactMessage,
        now: DateTime<Utc>,
    ) -> Result<ContactMessage, InfraError> {
        let stored = ContactMessage {
            id:           ContactMessageId::new(self.sequence.next()),
            name:         message.name.clone(),
            email:        message.email.clone(),
            phone:        message.phone.clone(),
            subject_type: message.subject_type,
            subject:      message.subject.clone(),
            message:      message.message.clone(),
            is_read:      false,
            created_at:   now,
            updated_at:   now,
        };
        self.messages.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        id: ContactMessageId,
    ) -> Result<Option<ContactMessage>, InfraError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn find_all(&self, is_read: Option<bool>) -> Result<Vec<ContactMessage>, InfraError> {
        let mut messages: Vec<ContactMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| is_read.is_none_or(|r| m.is_read == r))
            .cloned()
            .collect();
        messages.sort_by_key(|m| Reverse((m.created_at, m.id)));
        Ok(messages)
    }

    async fn update(&self, message: &ContactMessage) -> Result<bool, InfraError> {
        let mut messages = self.messages.lock().unwrap();
        match messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => {
                *existing = message.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ===== MockNewsletterSubscriberRepository =====

#[derive(Clone, Default)]
pub struct MockNewsletterSubscriberRepository {
    subscribers: Arc<Mutex<Vec<NewsletterSubscriber>>>,
    sequence:    Sequence,
}

impl MockNewsletterSubscriberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 任意の状態の購読者を直接登録する
    pub fn add_subscriber(&self, record: SubscriberRecord) {
        self.subscribers
            .lock()
            .unwrap()
            .push(NewsletterSubscriber::from_db(record));
    }

    pub fn stored(&self) -> Vec<NewsletterSubscriber> {
        self.subscribers.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsletterSubscriberRepository for MockNewsletterSubscriberRepository {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<NewsletterSubscriber>, InfraError> {
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.email() == email)
            .cloned())
    }

    async fn find_by_id(
        &self,
        id: SubscriberId,
    ) -> Result<Option<NewsletterSubscriber>, InfraError> {
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id() == id)
            .cloned())
    }

    async fn find_active(&self) -> Result<Vec<NewsletterSubscriber>, InfraError> {
        let mut subscribers: Vec<NewsletterSubscriber> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        subscribers.sort_by_key(|s| Reverse((s.subscribed_at(), s.id())));
        Ok(subscribers)
    }

    async fn insert(
        &self,
        email: &EmailAddress,
        name: Option<&PersonName>,
        now: DateTime<Utc>,
    ) -> Result<NewsletterSubscriber, InfraError> {
        let mut subscribers = self.subscribers.lock().unwrap();
        if subscribers.iter().any(|s| s.email() == email) {
            return Err(InfraError::conflict("NewsletterSubscriber", email.as_str()));
        }
        let stored = NewsletterSubscriber::from_db(SubscriberRecord {
            id:              SubscriberId::new(self.sequence.next()),
            email:           email.clone(),
            name:            name.cloned(),
            is_active:       true,
            subscribed_at:   now,
            unsubscribed_at: None,
        });
        subscribers.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, subscriber: &NewsletterSubscriber) -> Result<bool, InfraError> {
        let mut subscribers = self.subscribers.lock().unwrap();
        match subscribers.iter_mut().find(|s| s.id() == subscriber.id()) {
            Some(existing) => {
                *existing = subscriber.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ===== MockTestimonialRepository =====

#[derive(Clone, Default)]
pub struct MockTestimonialRepository {
    testimonials: Arc<Mutex<Vec<Testimonial>>>,
    sequence:     Sequence,
}

impl MockTestimonialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 承認済みなど任意の状態のものを直接登録する
    pub fn add_testimonial(&self, testimonial: Testimonial) {
        self.testimonials.lock().unwrap().push(testimonial);
    }

    pub fn stored(&self) -> Vec<Testimonial> {
        self.testimonials.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestimonialRepository for MockTestimonialRepository {
    async fn insert(
        &self,
        testimonial: &NewTestimonial,
        now: DateTime<Utc>,
    ) -> Result<Testimonial, InfraError> {
        let stored = Testimonial {
            id:               TestimonialId::new(self.sequence.next()),
            client_name:      testimonial.client_name.clone(),
            client_photo:     testimonial.client_photo.clone(),
            service_category: testimonial.service_category,
            rating:           testimonial.rating,
            review_text:      testimonial.review_text.clone(),
            is_featured:      false,
            is_approved:      false,
            created_at:       now,
            updated_at:       now,
        };
        self.testimonials.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_approved_by_id(
        &self,
        id: TestimonialId,
    ) -> Result<Option<Testimonial>, InfraError> {
        Ok(self
            .testimonials
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.is_approved)
            .cloned())
    }

    async fn find_approved(
        &self,
        filter: &TestimonialFilter,
    ) -> Result<Vec<Testimonial>, InfraError> {
        let mut testimonials: Vec<Testimonial> = self
            .testimonials
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.is_approved)
            .filter(|t| filter.service_category.is_none_or(|c| t.service_category == c))
            .filter(|t| filter.is_featured.is_none_or(|f| t.is_featured == f))
            .filter(|t| filter.rating.is_none_or(|r| t.rating == r))
            .cloned()
            .collect();
        testimonials.sort_by_key(|t| Reverse((t.is_featured, t.rating, t.created_at, t.id)));
        Ok(testimonials)
    }
}

// ===== MockGalleryImageRepository =====

#[derive(Clone, Default)]
pub struct MockGalleryImageRepository {
    images:   Arc<Mutex<Vec<GalleryImage>>>,
    sequence: Sequence,
}

impl MockGalleryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<GalleryImage> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl GalleryImageRepository for MockGalleryImageRepository {
    async fn insert(
        &self,
        image: &NewGalleryImage,
        now: DateTime<Utc>,
    ) -> Result<GalleryImage, InfraError> {
        let stored = GalleryImage {
            id:               GalleryImageId::new(self.sequence.next()),
            title:            image.title.clone(),
            description:      image.description.clone(),
            category:         image.category,
            image:            image.image.clone(),
            comparison_image: image.comparison_image.clone(),
            thumbnail:        None,
            is_featured:      image.is_featured,
            is_active:        true,
            sort_order:       image.sort_order,
            created_at:       now,
            updated_at:       now,
        };
        self.images.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_active_by_id(
        &self,
        id: GalleryImageId,
    ) -> Result<Option<GalleryImage>, InfraError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id && i.is_active)
            .cloned())
    }

    async fn find_active(&self, filter: &GalleryFilter) -> Result<Vec<GalleryImage>, InfraError> {
        let mut images: Vec<GalleryImage> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.is_active)
            .filter(|i| filter.category.is_none_or(|c| i.category == c))
            .filter(|i| filter.is_featured.is_none_or(|f| i.is_featured == f))
            .cloned()
            .collect();
        images.sort_by_key(|i| Reverse((i.sort_order, i.is_featured, i.created_at, i.id)));
        Ok(images)
    }

    async fn set_thumbnail(
        &self,
        id: GalleryImageId,
        thumbnail: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, InfraError> {
        let mut images = self.images.lock().unwrap();
        match images.iter_mut().find(|i| i.id == id) {
            Some(image) => {
                image.thumbnail = Some(thumbnail.to_string());
                image.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ===== MailSender =====

/// 送信内容を記録するだけのメール送信
#[derive(Clone, Default)]
pub struct RecordingMailSender {
    sent: Arc<Mutex<Vec<ComposedMessage>>>,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<ComposedMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    fn provider_name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &ComposedMessage) -> Result<Option<String>, DeliveryError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(Some(format!("recorded-{}", sent.len())))
    }
}

/// 常に失敗するメール送信
#[derive(Clone)]
pub struct FailingMailSender {
    kind:     DeliveryErrorKind,
    attempts: Arc<AtomicI64>,
}

impl FailingMailSender {
    pub fn new(kind: DeliveryErrorKind) -> Self {
        Self {
            kind,
            attempts: Arc::new(AtomicI64::new(0)),
        }
    }

    /// 送信が試みられた回数
    pub fn attempts(&self) -> i64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailSender for FailingMailSender {
    fn provider_name(&self) -> &'static str {
        "failing"
    }

    async fn send(&self, _message: &ComposedMessage) -> Result<Option<String>, DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::new(self.kind, "simulated provider failure"))
    }
}
