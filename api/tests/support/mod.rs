//! メモリ上で動くリポジトリ実装とリクエスト組み立ての補助
#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use api::route::v1;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chrono::{DateTime, Utc};
use kernel::model::{
    id::{NotificationId, ReservationId, UserId},
    notification::{CreateNotification, Notification, NotificationList},
    reservation::{
        event::{CancelReservation, ConfirmReservation, CreateReservation},
        index::SeatTimeIndex,
        policy,
        transition::ReservationTransition,
        Reservation, ReservationStatus, SweepReport, TimeWindow,
    },
    role::Permission,
};
use kernel::repository::{
    health::HealthCheckRepository,
    notification::{NotificationRepository, NotificationSink},
    reservation::ReservationRepository,
};
use registry::AppRegistry;
use serde_json::Value;
use shared::error::{AppError, AppResult};

#[derive(Default)]
pub struct InMemoryNotifications {
    items: Mutex<Vec<Notification>>,
    unavailable: AtomicBool,
}

impl InMemoryNotifications {
    // 通知先が落ちている状態を再現する
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn for_user(&self, user_id: UserId) -> Vec<Notification> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotifications {
    async fn notify(&self, event: CreateNotification) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::NoRowsAffectedError(
                "notification store is unavailable".into(),
            ));
        }
        self.items.lock().unwrap().push(Notification {
            notification_id: NotificationId::new(),
            user_id: event.user_id,
            title: event.title,
            message: event.message,
            category: event.category,
            is_read: false,
            related_id: event.related_id,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn find_by_user_id(&self, user_id: UserId, limit: i64) -> AppResult<NotificationList> {
        let mut mine = self.for_user(user_id);
        let unread_count = mine.iter().filter(|n| !n.is_read).count() as i64;
        mine.reverse();
        mine.truncate(limit as usize);
        Ok(NotificationList {
            items: mine,
            unread_count,
        })
    }

    async fn mark_read(&self, notification_id: NotificationId, user_id: UserId) -> AppResult<()> {
        let mut items = self.items.lock().unwrap();
        let n = items
            .iter_mut()
            .find(|n| n.notification_id == notification_id && n.user_id == user_id)
            .ok_or_else(|| AppError::EntityNotFound("Notification not found".into()))?;
        n.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> AppResult<u64> {
        let mut count = 0;
        for n in self.items.lock().unwrap().iter_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                count += 1;
            }
        }
        Ok(count)
    }
}

pub struct InMemoryReservations {
    rows: Mutex<Vec<Reservation>>,
    notifier: Arc<InMemoryNotifications>,
    pub sweeps: AtomicUsize,
}

impl InMemoryReservations {
    pub fn new(notifier: Arc<InMemoryNotifications>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            notifier,
            sweeps: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, reservation_id: ReservationId) -> Option<Reservation> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.reservation_id == reservation_id)
            .cloned()
    }

    // 通知の失敗は記録だけして、確定した状態変更は戻さない
    async fn dispatch(&self, notification: CreateNotification) {
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!(error.message = %e, "Failed to record notification");
        }
    }

    pub fn all(&self) -> Vec<Reservation> {
        self.rows.lock().unwrap().clone()
    }

    fn transition(
        &self,
        reservation_id: ReservationId,
        visible: impl Fn(&Reservation) -> bool,
        transition: ReservationTransition,
        stamp: impl FnOnce(&mut Reservation),
    ) -> AppResult<Reservation> {
        let mut rows = self.rows.lock().unwrap();
        let r = rows
            .iter_mut()
            .find(|r| r.reservation_id == reservation_id && visible(r))
            .ok_or_else(|| AppError::EntityNotFound("Reservation not found".into()))?;
        r.status = r
            .status
            .transition(transition)
            .map_err(|e| AppError::IllegalTransition(e.to_string()))?;
        stamp(r);
        Ok(r.clone())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservations {
    async fn create(&self, event: CreateReservation) -> AppResult<Reservation> {
        policy::validate(&event).map_err(|e| AppError::InvalidReservation(e.to_string()))?;
        let reservation = {
            let mut rows = self.rows.lock().unwrap();
            let unavailable = SeatTimeIndex::from_reservations(rows.iter())
                .unavailable(&event.window, &event.seats);
            if !unavailable.is_empty() {
                return Err(AppError::SeatConflict(unavailable));
            }
            let reservation = Reservation {
                reservation_id: ReservationId::new(),
                reserved_by: event.reserved_by,
                kind: event.kind,
                window: event.window,
                status: ReservationStatus::Active,
                seats: event.seats,
                notes: event.notes,
                reminder_sent_at: None,
                confirmed_at: None,
                cancelled_at: None,
                created_at: event.requested_at,
            };
            rows.push(reservation.clone());
            reservation
        };
        self.dispatch(CreateNotification::reservation_created(&reservation)).await;
        Ok(reservation)
    }

    async fn confirm(&self, event: ConfirmReservation) -> AppResult<Reservation> {
        let reservation = self.transition(
            event.reservation_id,
            |r| r.reserved_by == event.requested_by,
            ReservationTransition::Confirm,
            |r| r.confirmed_at = Some(event.confirmed_at),
        )?;
        self.dispatch(CreateNotification::reservation_confirmed(&reservation)).await;
        Ok(reservation)
    }

    async fn cancel(&self, event: CancelReservation) -> AppResult<Reservation> {
        let caller = event.requested_by;
        let privileged = caller.can(Permission::CancelAnyReservation);
        let reservation = self.transition(
            event.reservation_id,
            |r| privileged || caller.is(r.reserved_by),
            ReservationTransition::Cancel,
            |r| r.cancelled_at = Some(event.cancelled_at),
        )?;
        if !caller.is(reservation.reserved_by) {
            self.dispatch(CreateNotification::reservation_cancelled_by_operator(
                &reservation,
            ))
            .await;
        }
        Ok(reservation)
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.get(reservation_id))
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.reserved_by == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.window.start.cmp(&a.window.start));
        Ok(rows)
    }

    async fn find_all(&self) -> AppResult<Vec<Reservation>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.window.start.cmp(&a.window.start));
        Ok(rows)
    }

    async fn find_occupied_seats(&self, window: TimeWindow) -> AppResult<BTreeSet<String>> {
        let rows = self.rows.lock().unwrap();
        Ok(SeatTimeIndex::from_reservations(rows.iter()).occupied_seats(&window))
    }

    async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        let (reminded, expired) = {
            let mut rows = self.rows.lock().unwrap();
            let mut reminded = Vec::new();
            for r in rows.iter_mut().filter(|r| r.needs_reminder(now)) {
                r.reminder_sent_at = Some(now);
                reminded.push(r.clone());
            }
            let mut expired = Vec::new();
            for r in rows.iter_mut().filter(|r| r.is_expirable(now)) {
                r.status = ReservationStatus::Expired;
                expired.push(r.clone());
            }
            (reminded, expired)
        };
        for r in &reminded {
            self.dispatch(CreateNotification::reservation_starting_soon(r)).await;
        }
        for r in &expired {
            self.dispatch(CreateNotification::reservation_expired(r)).await;
        }
        Ok(SweepReport {
            reminders_set: reminded.len(),
            expired: expired.len(),
        })
    }
}

pub struct AlwaysHealthy;

#[async_trait]
impl HealthCheckRepository for AlwaysHealthy {
    async fn check_db(&self) -> bool {
        true
    }
}

pub struct TestApp {
    pub registry: AppRegistry,
    pub reservations: Arc<InMemoryReservations>,
    pub notifications: Arc<InMemoryNotifications>,
}

impl TestApp {
    pub fn new() -> Self {
        let notifications = Arc::new(InMemoryNotifications::default());
        let reservations = Arc::new(InMemoryReservations::new(notifications.clone()));
        let registry = AppRegistry::from_parts(
            Arc::new(AlwaysHealthy),
            reservations.clone(),
            notifications.clone(),
        );
        Self {
            registry,
            reservations,
            notifications,
        }
    }

    pub fn router(&self) -> Router {
        v1::routes().with_state(self.registry.clone())
    }
}

pub fn request(
    method: &str,
    uri: &str,
    identity: Option<(UserId, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = identity {
        builder = builder
            .header("X-User-Id", user_id.to_string())
            .header("X-User-Role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
