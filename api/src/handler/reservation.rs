use crate::{
    extractor::{AppJson, AppPath, AppQuery, AuthorizedUser},
    model::reservation::{
        AvailableSeatsQuery, AvailableSeatsResponse, CreateReservationRequest,
        CreateReservationRequestWithUser, CreatedReservationResponse, MessageResponse,
        ReservationResponse, SweepResponse,
    },
};
use axum::{extract::State, Json};
use chrono::Utc;
use garde::Validate;
use kernel::model::{
    id::ReservationId,
    reservation::{
        event::{CancelReservation, ConfirmReservation},
        TimeWindow,
    },
    role::Permission,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_available_seats(
    AppQuery(query): AppQuery<AvailableSeatsQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AvailableSeatsResponse>> {
    let window = TimeWindow::from(query);
    if window.end <= window.start {
        return Err(AppError::InvalidReservation(
            "End time must be after start time".into(),
        ));
    }

    registry
        .reservation_repository()
        .find_occupied_seats(window)
        .await
        .map(|seats| AvailableSeatsResponse {
            reserved_seats: seats.into_iter().collect(),
        })
        .map(Json)
}

pub async fn show_my_reservations(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ReservationResponse>>> {
    registry
        .reservation_repository()
        .find_by_user_id(user.id())
        .await
        .map(|items| items.into_iter().map(ReservationResponse::from).collect())
        .map(Json)
}

pub async fn show_all_reservations(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<Vec<ReservationResponse>>> {
    if !user.caller().can(Permission::ViewAllReservations) {
        return Err(AppError::ForbiddenOperation);
    }

    registry
        .reservation_repository()
        .find_all()
        .await
        .map(|items| items.into_iter().map(ReservationResponse::from).collect())
        .map(Json)
}

pub async fn register_reservation(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    AppJson(req): AppJson<CreateReservationRequest>,
) -> AppResult<Json<CreatedReservationResponse>> {
    req.validate()?;

    let create_reservation = CreateReservationRequestWithUser::new(user.id(), Utc::now(), req);
    registry
        .reservation_repository()
        .create(create_reservation.into())
        .await
        .map(CreatedReservationResponse::from)
        .map(Json)
}

pub async fn confirm_reservation(
    user: AuthorizedUser,
    AppPath(reservation_id): AppPath<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MessageResponse>> {
    let confirm_reservation = ConfirmReservation::new(reservation_id, user.id(), Utc::now());
    registry
        .reservation_repository()
        .confirm(confirm_reservation)
        .await
        .map(|_| Json(MessageResponse::new("Reservation confirmed! See you there!")))
}

pub async fn cancel_reservation(
    user: AuthorizedUser,
    AppPath(reservation_id): AppPath<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MessageResponse>> {
    let cancel_reservation = CancelReservation::new(reservation_id, user.caller(), Utc::now());
    registry
        .reservation_repository()
        .cancel(cancel_reservation)
        .await
        .map(|_| Json(MessageResponse::new("Reservation cancelled")))
}

// 定期実行とは別に、スイープを 1 回だけ手動で走らせる
pub async fn check_reminders(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SweepResponse>> {
    registry
        .reservation_repository()
        .sweep(Utc::now())
        .await
        .map(SweepResponse::from)
        .map(Json)
}
