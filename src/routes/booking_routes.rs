use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{
    ApiResponse, BookingFilters, CreateBookingRequest, UpdateBookingRequest,
};
use crate::models::booking::{Booking, BookingStats, BookingWithCar, UpcomingExpiration};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/", get(list_bookings))
        .route("/stats", get(booking_stats))
        .route("/expiring", get(upcoming_expirations))
        .route("/user/:identifier", get(list_customer_bookings))
        .route("/:id", get(get_booking))
        .route("/:id", put(update_booking))
        .route("/:id", delete(delete_booking))
        .route("/:id/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(filters): Query<BookingFilters>,
) -> Result<Json<Vec<BookingWithCar>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.list_all(filters).await?;
    Ok(Json(response))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingWithCar>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_customer_bookings(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Vec<BookingWithCar>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.list_by_customer(&identifier).await?;
    Ok(Json(response))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.cancel(id).await?;
    Ok(Json(response))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Reserva eliminada exitosamente"
    })))
}

async fn booking_stats(
    State(state): State<AppState>,
) -> Result<Json<BookingStats>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller.stats().await?;
    Ok(Json(response))
}

#[derive(Debug, serde::Deserialize)]
struct ExpiringQuery {
    days: Option<i64>,
}

async fn upcoming_expirations(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<UpcomingExpiration>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    let response = controller
        .upcoming_expirations(query.days.unwrap_or(1))
        .await?;
    Ok(Json(response))
}
