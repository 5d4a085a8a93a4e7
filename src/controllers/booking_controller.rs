//! Controller de Bookings
//!
//! Valida los requests y delega en el repositorio. Toda la lógica
//! transaccional vive en BookingRepository.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{
    ApiResponse, BookingFilters, CreateBookingRequest, UpdateBookingRequest,
};
use crate::models::booking::{
    Booking, BookingStats, BookingStatus, BookingWithCar, UpcomingExpiration,
};
use crate::models::car::AvailabilityReport;
use crate::repositories::booking_repository::{
    BookingRepository, BookingUpdate, NewBooking, SweepSummary,
};
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::{validate_date_range, validate_not_empty, validate_price};

pub struct BookingController {
    repository: BookingRepository,
}

impl BookingController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BookingRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateBookingRequest,
    ) -> Result<ApiResponse<Booking>, AppError> {
        request.validate()?;
        validate_date_range(request.start_date, request.end_date)?;
        validate_price(request.total_price)?;

        validate_not_empty("customer_name", &request.customer_name)?;

        let booking = self
            .repository
            .create(NewBooking {
                car_id: request.car_id,
                start_date: request.start_date,
                end_date: request.end_date,
                total_price: request.total_price,
                customer_name: request.customer_name,
                customer_email: request.customer_email,
                customer_phone: request.customer_phone,
                notes: request.notes,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            booking,
            "Reserva creada exitosamente".to_string(),
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateBookingRequest,
    ) -> Result<ApiResponse<Booking>, AppError> {
        request.validate()?;

        if request.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        let status = match request.status.as_deref() {
            Some(raw) => Some(BookingStatus::parse(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown booking status '{}'", raw))
            })?),
            None => None,
        };

        let booking = self
            .repository
            .update(
                id,
                BookingUpdate {
                    status,
                    customer_name: request.customer_name,
                    customer_email: request.customer_email,
                    customer_phone: request.customer_phone,
                    notes: request.notes,
                },
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            booking,
            "Reserva actualizada exitosamente".to_string(),
        ))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ApiResponse<Booking>, AppError> {
        let booking = self.repository.cancel(id).await?;

        Ok(ApiResponse::success_with_message(
            booking,
            "Reserva cancelada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<BookingWithCar, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &id.to_string()))
    }

    pub async fn list_all(
        &self,
        filters: BookingFilters,
    ) -> Result<Vec<BookingWithCar>, AppError> {
        let status = match filters.status.as_deref() {
            Some(raw) => Some(BookingStatus::parse(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown booking status '{}'", raw))
            })?),
            None => None,
        };

        self.repository.list_all(status, filters.car_id).await
    }

    pub async fn list_by_customer(
        &self,
        identifier: &str,
    ) -> Result<Vec<BookingWithCar>, AppError> {
        validate_not_empty("identifier", identifier)?;
        self.repository.list_by_customer(identifier).await
    }

    pub async fn check_availability(
        &self,
        car_id: Uuid,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
    ) -> Result<AvailabilityReport, AppError> {
        validate_date_range(start_date, end_date)?;
        self.repository
            .check_availability(car_id, start_date, end_date)
            .await
    }

    pub async fn stats(&self) -> Result<BookingStats, AppError> {
        self.repository.stats().await
    }

    pub async fn upcoming_expirations(
        &self,
        days: i64,
    ) -> Result<Vec<UpcomingExpiration>, AppError> {
        if days < 0 {
            return Err(AppError::Validation(
                "days must not be negative".to_string(),
            ));
        }

        self.repository.upcoming_expirations(days).await
    }

    pub async fn run_expiration_sweep(&self) -> Result<SweepSummary, AppError> {
        self.repository.complete_expired_bookings().await
    }
}
