use crate::database::{
    model::reservation::{ReservationRow, ReservationSeatRow, SeatBookingRow},
    ConnectionPool,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::model::{
    id::{ReservationId, UserId},
    notification::CreateNotification,
    reservation::{
        event::{CancelReservation, ConfirmReservation, CreateReservation},
        index::{SeatBooking, SeatTimeIndex},
        policy, reminder_lead,
        transition::ReservationTransition,
        Reservation, ReservationStatus, SweepReport, TimeWindow,
    },
    role::Permission,
};
use kernel::repository::{notification::NotificationSink, reservation::ReservationRepository};
use shared::error::{AppError, AppResult};
use sqlx::PgConnection;
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use uuid::Uuid;

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
    notifier: Arc<dyn NotificationSink>,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    async fn create(&self, event: CreateReservation) -> AppResult<Reservation> {
        policy::validate(&event).map_err(|e| AppError::InvalidReservation(e.to_string()))?;

        let mut tx = self.db.begin().await?;

        // 空席確認の前に、要求された座席のロックを取る。
        // 同じ座席を含む作成処理はここで直列化され、ロックはコミットかロールバックで外れる
        lock_seats(&mut tx, &event.seats).await?;

        {
            let bookings =
                fetch_live_bookings(&mut tx, &event.window, Some(event.seats.as_slice())).await?;
            let unavailable =
                SeatTimeIndex::new(bookings).unavailable(&event.window, &event.seats);
            if !unavailable.is_empty() {
                tracing::debug!(seats = ?unavailable, "requested seats are already reserved");
                return Err(AppError::SeatConflict(unavailable));
            }
        }

        let reservation_id = ReservationId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, user_id, reservation_type, start_time, end_time,
                status, notes, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation_id.raw())
        .bind(event.reserved_by.raw())
        .bind(event.kind.to_string())
        .bind(event.window.start)
        .bind(event.window.end)
        .bind(ReservationStatus::Active.to_string())
        .bind(event.notes.as_deref())
        .bind(event.requested_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been created".into(),
            ));
        }

        let res = sqlx::query(
            r#"
                INSERT INTO reservation_seats (reservation_id, seat_id)
                SELECT $1, UNNEST($2::TEXT[])
            "#,
        )
        .bind(reservation_id.raw())
        .bind(event.seats.as_slice())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() != event.seats.len() as u64 {
            return Err(AppError::NoRowsAffectedError(
                "Not every reservation seat record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        let CreateReservation {
            reserved_by,
            kind,
            window,
            seats,
            notes,
            requested_at,
        } = event;
        let reservation = Reservation {
            reservation_id,
            reserved_by,
            kind,
            window,
            status: ReservationStatus::Active,
            seats,
            notes,
            reminder_sent_at: None,
            confirmed_at: None,
            cancelled_at: None,
            created_at: requested_at,
        };
        tracing::info!(
            reservation_id = %reservation.reservation_id,
            seats = ?reservation.seats,
            "reservation created"
        );

        self.dispatch(CreateNotification::reservation_created(&reservation))
            .await;
        Ok(reservation)
    }

    async fn confirm(&self, event: ConfirmReservation) -> AppResult<Reservation> {
        let transition = ReservationTransition::Confirm;
        let mut conn = self.acquire().await?;

        // ステータスを条件にした UPDATE 1 文で遷移させる。
        // スイープや別リクエストが先に更新した場合は 0 行になる
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
                UPDATE reservations
                SET status = $1, confirmed_at = $2
                WHERE reservation_id = $3
                  AND user_id = $4
                  AND status = ANY($5)
                RETURNING *
            "#,
        )
        .bind(transition.target().to_string())
        .bind(event.confirmed_at)
        .bind(event.reservation_id.raw())
        .bind(event.requested_by.raw())
        .bind(transition.allowed_from_names())
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(reject_transition(
                &mut conn,
                event.reservation_id,
                |r| r.reserved_by == event.requested_by,
                transition,
            )
            .await);
        };

        let reservation = attach_seats(&mut conn, vec![row]).await?.remove(0);
        self.dispatch(CreateNotification::reservation_confirmed(&reservation))
            .await;
        Ok(reservation)
    }

    async fn cancel(&self, event: CancelReservation) -> AppResult<Reservation> {
        let transition = ReservationTransition::Cancel;
        let caller = event.requested_by;
        let privileged = caller.can(Permission::CancelAnyReservation);
        let mut conn = self.acquire().await?;

        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
                UPDATE reservations
                SET status = $1, cancelled_at = $2
                WHERE reservation_id = $3
                  AND ($4 OR user_id = $5)
                  AND status = ANY($6)
                RETURNING *
            "#,
        )
        .bind(transition.target().to_string())
        .bind(event.cancelled_at)
        .bind(event.reservation_id.raw())
        .bind(privileged)
        .bind(caller.user_id.raw())
        .bind(transition.allowed_from_names())
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(reject_transition(
                &mut conn,
                event.reservation_id,
                |r| privileged || caller.is(r.reserved_by),
                transition,
            )
            .await);
        };

        let reservation = attach_seats(&mut conn, vec![row]).await?.remove(0);
        tracing::info!(
            reservation_id = %reservation.reservation_id,
            cancelled_by = %caller.user_id,
            "reservation cancelled"
        );
        if !caller.is(reservation.reserved_by) {
            self.dispatch(CreateNotification::reservation_cancelled_by_operator(
                &reservation,
            ))
            .await;
        }
        Ok(reservation)
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        let mut conn = self.acquire().await?;
        find_by_id(&mut conn, reservation_id).await
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
                SELECT
                reservation_id,
                user_id,
                reservation_type,
                start_time,
                end_time,
                status,
                reminder_sent_at,
                confirmed_at,
                cancelled_at,
                notes,
                created_at
                FROM reservations
                WHERE user_id = $1
                ORDER BY start_time DESC
            "#,
        )
        .bind(user_id.raw())
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

        attach_seats(&mut conn, rows).await
    }

    async fn find_all(&self) -> AppResult<Vec<Reservation>> {
        let mut conn = self.acquire().await?;
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
                SELECT
                reservation_id,
                user_id,
                reservation_type,
                start_time,
                end_time,
                status,
                reminder_sent_at,
                confirmed_at,
                cancelled_at,
                notes,
                created_at
                FROM reservations
                ORDER BY start_time DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::SpecificOperationError)?;

        attach_seats(&mut conn, rows).await
    }

    async fn find_occupied_seats(&self, window: TimeWindow) -> AppResult<BTreeSet<String>> {
        let mut conn = self.acquire().await?;
        let bookings = fetch_live_bookings(&mut conn, &window, None).await?;
        Ok(SeatTimeIndex::new(bookings).occupied_seats(&window))
    }

    async fn sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let mut tx = self.db.begin().await?;

        // 判定は needs_reminder / is_expirable が行い、SQL は候補の絞り込みと行ロックだけを担う。
        // 開始済みで未通知の予約は期限切れにならないので候補から外す
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
                SELECT
                reservation_id,
                user_id,
                reservation_type,
                start_time,
                end_time,
                status,
                reminder_sent_at,
                confirmed_at,
                cancelled_at,
                notes,
                created_at
                FROM reservations
                WHERE status = ANY($1)
                  AND start_time <= $3
                  AND (reminder_sent_at IS NOT NULL OR start_time > $2)
                ORDER BY reservation_id
                FOR UPDATE
            "#,
        )
        .bind(ReservationTransition::Remind.allowed_from_names())
        .bind(now)
        .bind(now + reminder_lead())
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let mut reminded = Vec::new();
        let mut expired = Vec::new();
        // 開始 15 分前に入った未通知の予約にはリマインダー時刻を記録し、
        // 通知済みのまま開始時刻を過ぎた予約は期限切れにする。両者は開始時刻で排他になる
        for mut reservation in attach_seats(&mut tx, rows).await? {
            if reservation.needs_reminder(now) {
                reservation.reminder_sent_at = Some(now);
                reminded.push(reservation);
            } else if reservation.is_expirable(now) {
                reservation.status = reservation
                    .status
                    .transition(ReservationTransition::Expire)
                    .map_err(|e| AppError::IllegalTransition(e.to_string()))?;
                expired.push(reservation);
            }
        }

        if reminded.is_empty() && expired.is_empty() {
            tx.rollback().await.map_err(AppError::TransactionError)?;
            return Ok(SweepReport::default());
        }

        if !reminded.is_empty() {
            let ids: Vec<Uuid> = reminded.iter().map(|r| r.reservation_id.raw()).collect();
            let res = sqlx::query(
                r#"
                    UPDATE reservations
                    SET reminder_sent_at = $1
                    WHERE reservation_id = ANY($2)
                      AND status = ANY($3)
                      AND reminder_sent_at IS NULL
                "#,
            )
            .bind(now)
            .bind(ids.as_slice())
            .bind(ReservationTransition::Remind.allowed_from_names())
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            if res.rows_affected() != ids.len() as u64 {
                return Err(AppError::NoRowsAffectedError(
                    "Not every reminder could be recorded".into(),
                ));
            }
        }

        if !expired.is_empty() {
            let transition = ReservationTransition::Expire;
            let ids: Vec<Uuid> = expired.iter().map(|r| r.reservation_id.raw()).collect();
            let res = sqlx::query(
                r#"
                    UPDATE reservations
                    SET status = $1
                    WHERE reservation_id = ANY($2)
                      AND status = ANY($3)
                      AND reminder_sent_at IS NOT NULL
                "#,
            )
            .bind(transition.target().to_string())
            .bind(ids.as_slice())
            .bind(transition.allowed_from_names())
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            if res.rows_affected() != ids.len() as u64 {
                return Err(AppError::NoRowsAffectedError(
                    "Not every reservation could be expired".into(),
                ));
            }
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        for reservation in &reminded {
            self.dispatch(CreateNotification::reservation_starting_soon(reservation))
                .await;
        }
        for reservation in &expired {
            self.dispatch(CreateNotification::reservation_expired(reservation))
                .await;
        }

        let report = SweepReport {
            reminders_set: reminded.len(),
            expired: expired.len(),
        };
        tracing::info!(
            reminders_set = report.reminders_set,
            expired = report.expired,
            "reservation sweep committed"
        );
        Ok(report)
    }
}

impl ReservationRepositoryImpl {
    async fn acquire(&self) -> AppResult<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.db
            .inner_ref()
            .acquire()
            .await
            .map_err(AppError::SpecificOperationError)
    }

    // 通知はコミット後に送る。失敗しても確定した状態は戻さない
    async fn dispatch(&self, notification: CreateNotification) {
        let user_id = notification.user_id;
        let category = notification.category;
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!(
                error.message = %e,
                %user_id,
                %category,
                "Failed to record notification"
            );
        }
    }
}

// 座席ごとのアドバイザリロックを取得する。並び順を揃えてデッドロックを防ぐ
async fn lock_seats(conn: &mut PgConnection, seats: &[String]) -> AppResult<()> {
    let mut keys: Vec<&str> = seats.iter().map(String::as_str).collect();
    keys.sort_unstable();
    keys.dedup();

    for seat in keys {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('reservation_seat'), hashtext($1))")
            .bind(seat)
            .execute(&mut *conn)
            .await
            .map_err(AppError::SpecificOperationError)?;
    }
    Ok(())
}

// 時間帯が重なる生きた予約の座席を取得する。seats を渡した場合はその座席に絞る
async fn fetch_live_bookings(
    conn: &mut PgConnection,
    window: &TimeWindow,
    seats: Option<&[String]>,
) -> AppResult<Vec<SeatBooking>> {
    let live: Vec<String> = ReservationStatus::LIVE
        .iter()
        .map(ToString::to_string)
        .collect();

    sqlx::query_as::<_, SeatBookingRow>(
        r#"
            SELECT
            s.seat_id,
            r.start_time,
            r.end_time,
            r.status
            FROM reservations AS r
            INNER JOIN reservation_seats AS s ON r.reservation_id = s.reservation_id
            WHERE r.status = ANY($1)
              AND r.start_time < $3
              AND r.end_time > $2
              AND ($4::TEXT[] IS NULL OR s.seat_id = ANY($4))
        "#,
    )
    .bind(live)
    .bind(window.start)
    .bind(window.end)
    .bind(seats)
    .fetch_all(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?
    .into_iter()
    .map(SeatBooking::try_from)
    .collect()
}

async fn find_by_id(
    conn: &mut PgConnection,
    reservation_id: ReservationId,
) -> AppResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, ReservationRow>(
        r#"
            SELECT
            reservation_id,
            user_id,
            reservation_type,
            start_time,
            end_time,
            status,
            reminder_sent_at,
            confirmed_at,
            cancelled_at,
            notes,
            created_at
            FROM reservations
            WHERE reservation_id = $1
        "#,
    )
    .bind(reservation_id.raw())
    .fetch_optional(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?;

    match row {
        None => Ok(None),
        Some(row) => Ok(attach_seats(conn, vec![row]).await?.pop()),
    }
}

// 予約行に reservation_seats の座席を登録順に結びつける
async fn attach_seats(
    conn: &mut PgConnection,
    rows: Vec<ReservationRow>,
) -> AppResult<Vec<Reservation>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.reservation_id).collect();
    let seat_rows = sqlx::query_as::<_, ReservationSeatRow>(
        r#"
            SELECT reservation_id, seat_id
            FROM reservation_seats
            WHERE reservation_id = ANY($1)
            ORDER BY reservation_seat_id
        "#,
    )
    .bind(ids.as_slice())
    .fetch_all(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?;

    let mut seats: HashMap<Uuid, Vec<String>> = HashMap::new();
    for ReservationSeatRow {
        reservation_id,
        seat_id,
    } in seat_rows
    {
        seats.entry(reservation_id).or_default().push(seat_id);
    }

    rows.into_iter()
        .map(|row| {
            let seats = seats.remove(&row.reservation_id).unwrap_or_default();
            row.into_reservation(seats)
        })
        .collect()
}

// 条件付き UPDATE が 0 行だった理由を、現在の行を読み直して判定する
async fn reject_transition(
    conn: &mut PgConnection,
    reservation_id: ReservationId,
    visible: impl Fn(&Reservation) -> bool,
    transition: ReservationTransition,
) -> AppError {
    let current = match find_by_id(conn, reservation_id).await {
        Ok(current) => current,
        Err(e) => return e,
    };
    match current {
        Some(reservation) if visible(&reservation) => {
            match reservation.status.transition(transition) {
                Err(e) => AppError::IllegalTransition(e.to_string()),
                Ok(_) => AppError::IllegalTransition(
                    "Reservation was modified concurrently, please retry".into(),
                ),
            }
        }
        _ => AppError::EntityNotFound("Reservation not found".into()),
    }
}
