//! 予約リクエストのユースケース
//!
//! 作成時は管理者への新規予約通知を、`confirmed` への進入時はお客様への
//! 確認メールをスケジュールする。

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use itertools::Itertools;
use nailbook_domain::{
    booking::{
        Booking,
        BookingId,
        BookingStatus,
        NewBooking,
        TimeSlot,
        TransitionPolicy,
        enters_confirmed,
        ensure_not_in_past,
        ensure_service_available,
    },
    clock::Clock,
    notification::{EntityReference, NotificationJob, TemplateName, TriggeringEvent},
    service::{Service, ServiceId},
    value_objects::{EmailAddress, PersonName, PhoneNumber},
};
use nailbook_infra::repository::{BookingRepository, ServiceRepository};
use nailbook_shared::{event_log::event, log_business_event};

use super::{FieldErrors, schedule_notification};
use crate::{error::ApiError, notification::NotificationScheduler};

/// 予約作成の入力
#[derive(Debug, Clone)]
pub struct CreateBookingInput {
    pub customer_name:  String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_id:     i64,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub notes:          String,
}

/// 予約の部分更新の入力（`None` の項目は変更しない）
#[derive(Debug, Clone, Default)]
pub struct UpdateBookingInput {
    pub notes:          Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub status:         Option<BookingStatus>,
}

/// 予約と参照先メニュー
///
/// メニューが削除されている場合は `service` が `None` になる。
#[derive(Debug, Clone)]
pub struct BookingWithService {
    pub booking: Booking,
    pub service: Option<Service>,
}

/// 予約ユースケース
pub struct BookingUseCaseImpl {
    bookings:    Arc<dyn BookingRepository>,
    services:    Arc<dyn ServiceRepository>,
    scheduler:   Arc<dyn NotificationScheduler>,
    clock:       Arc<dyn Clock>,
    admin_email: Option<String>,
    policy:      TransitionPolicy,
}

impl BookingUseCaseImpl {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        services: Arc<dyn ServiceRepository>,
        scheduler: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
        admin_email: Option<String>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            bookings,
            services,
            scheduler,
            clock,
            admin_email,
            policy,
        }
    }

    /// 予約リクエストを受け付ける
    ///
    /// 1. 入力値と業務ルール（過去日付でない、メニューが有効）を検証
    /// 2. `pending` で保存
    /// 3. 管理者への新規予約通知をスケジュール
    pub async fn create(&self, input: CreateBookingInput) -> Result<BookingWithService, ApiError> {
        let mut errors = FieldErrors::default();

        let customer_name = errors.check("customer_name", PersonName::new(input.customer_name));
        let customer_email =
            errors.check("customer_email", EmailAddress::new(input.customer_email));
        let customer_phone =
            errors.check("customer_phone", PhoneNumber::new(input.customer_phone));
        let preferred_time = errors.check("preferred_time", TimeSlot::parse(&input.preferred_time));
        errors.check(
            "preferred_date",
            ensure_not_in_past(input.preferred_date, self.clock.today()),
        );

        let service_id = ServiceId::new(input.service_id);
        let service = self.services.find_by_id(service_id).await?;
        errors.check(
            "service_id",
            ensure_service_available(service_id, service.as_ref()),
        );

        let (
            Some(customer_name),
            Some(customer_email),
            Some(customer_phone),
            Some(preferred_time),
            Some(service),
        ) = (
            customer_name,
            customer_email,
            customer_phone,
            preferred_time,
            service,
        )
        else {
            return Err(errors.into_error().into());
        };
        if !errors.is_empty() {
            return Err(errors.into_error().into());
        }

        let new_booking = NewBooking {
            customer_name,
            customer_email,
            customer_phone,
            service_id,
            preferred_date: input.preferred_date,
            preferred_time,
            notes: input.notes.trim().to_string(),
        };
        let booking = self.bookings.insert(&new_booking, self.clock.now()).await?;

        log_business_event!(
            event.category = event::category::BOOKING,
            event.action = event::action::BOOKING_CREATED,
            event.entity_type = event::entity_type::BOOKING,
            event.entity_id = %booking.id(),
            event.result = event::result::SUCCESS,
            booking.service_id = %service_id,
            booking.preferred_date = %booking.preferred_date(),
            booking.preferred_time = %booking.preferred_time(),
            "予約リクエストを受け付けました"
        );

        schedule_notification(
            self.scheduler.as_ref(),
            NotificationJob::new(
                EntityReference::Booking(booking.id()),
                TemplateName::BookingNotification,
                self.admin_email.iter().cloned().collect(),
                TriggeringEvent::BookingCreated,
            ),
        );

        Ok(BookingWithService {
            booking,
            service: Some(service),
        })
    }

    /// 予約一覧を新しい順に取得する
    pub async fn list(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingWithService>, ApiError> {
        let bookings = self.bookings.find_all(status).await?;

        let mut services = HashMap::new();
        for service_id in bookings.iter().map(Booking::service_id).unique() {
            if let Some(service) = self.services.find_by_id(service_id).await? {
                services.insert(service_id, service);
            }
        }

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let service = services.get(&booking.service_id()).cloned();
                BookingWithService { booking, service }
            })
            .collect())
    }

    pub async fn get(&self, id: BookingId) -> Result<BookingWithService, ApiError> {
        let booking = self.find(id).await?;
        self.with_service(booking).await
    }

    /// 予約を部分更新する
    ///
    /// 希望日時を変更する場合も過去日付は受け付けない。ステータス変更は
    /// 遷移ポリシーに従い、`confirmed` への進入時のみ確認メールを送る。
    pub async fn update(
        &self,
        id: BookingId,
        input: UpdateBookingInput,
    ) -> Result<BookingWithService, ApiError> {
        let mut errors = FieldErrors::default();
        let preferred_time = match input.preferred_time.as_deref() {
            Some(value) => errors.check("preferred_time", TimeSlot::parse(value)),
            None => None,
        };
        if let Some(date) = input.preferred_date {
            errors.check("preferred_date", ensure_not_in_past(date, self.clock.today()));
        }
        if !errors.is_empty() {
            return Err(errors.into_error().into());
        }

        let mut booking = self.find(id).await?;
        let previous = booking.status();
        let now = self.clock.now();

        if input.preferred_date.is_some() || preferred_time.is_some() {
            let date = input.preferred_date.unwrap_or(booking.preferred_date());
            let time = preferred_time.unwrap_or(booking.preferred_time());
            booking = booking.rescheduled(date, time, now);
        }
        if let Some(notes) = input.notes {
            booking = booking.with_notes(notes.trim().to_string(), now);
        }
        if let Some(status) = input.status {
            booking = booking.with_status(status, self.policy, now)?;
        }

        self.save(&booking).await?;

        let status: &str = booking.status().into();
        log_business_event!(
            event.category = event::category::BOOKING,
            event.action = event::action::BOOKING_UPDATED,
            event.entity_type = event::entity_type::BOOKING,
            event.entity_id = %booking.id(),
            event.result = event::result::SUCCESS,
            booking.status = status,
            "予約を更新しました"
        );

        if enters_confirmed(previous, booking.status()) {
            self.notify_confirmed(&booking);
        }

        self.with_service(booking).await
    }

    /// 予約を確定する
    ///
    /// 既に `confirmed` の場合は成功扱いにするが、確認メールは再送しない。
    pub async fn confirm(&self, id: BookingId) -> Result<Booking, ApiError> {
        let booking = self.find(id).await?;
        let previous = booking.status();

        let booking = booking.with_status(BookingStatus::Confirmed, self.policy, self.clock.now())?;
        self.save(&booking).await?;

        if enters_confirmed(previous, booking.status()) {
            self.notify_confirmed(&booking);
        }

        Ok(booking)
    }

    fn notify_confirmed(&self, booking: &Booking) {
        log_business_event!(
            event.category = event::category::BOOKING,
            event.action = event::action::BOOKING_CONFIRMED,
            event.entity_type = event::entity_type::BOOKING,
            event.entity_id = %booking.id(),
            event.result = event::result::SUCCESS,
            "予約を確定しました"
        );

        schedule_notification(
            self.scheduler.as_ref(),
            NotificationJob::new(
                EntityReference::Booking(booking.id()),
                TemplateName::BookingConfirmation,
                vec![booking.customer_email().to_string()],
                TriggeringEvent::BookingConfirmed,
            ),
        );
    }

    async fn find(&self, id: BookingId) -> Result<Booking, ApiError> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking", id))
    }

    async fn save(&self, booking: &Booking) -> Result<(), ApiError> {
        if self.bookings.update(booking).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Booking", booking.id()))
        }
    }

    async fn with_service(&self, booking: Booking) -> Result<BookingWithService, ApiError> {
        let service = self.services.find_by_id(booking.service_id()).await?;
        Ok(BookingWithService { booking, service })
    }
}
