//! Controller de Cars
//!
//! CRUD fino de coches. El inventario no se muta por aquí.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::ApiResponse;
use crate::dto::car_dto::{AvailableCarsQuery, CreateCarRequest, UpdateCarRequest};
use crate::models::car::Car;
use crate::repositories::car_repository::CarRepository;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::validate_date_range;

pub struct CarController {
    repository: CarRepository,
}

impl CarController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CarRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateCarRequest) -> Result<ApiResponse<Car>, AppError> {
        request.validate()?;

        if request.price_per_day <= rust_decimal::Decimal::ZERO {
            return Err(AppError::Validation(
                "price_per_day must be greater than zero".to_string(),
            ));
        }

        let car = self
            .repository
            .create(
                request.brand,
                request.model,
                request.description,
                request.image_url,
                request.price_per_day,
                request.quantity,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            car,
            "Coche creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Car, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Car", &id.to_string()))
    }

    pub async fn list_all(&self) -> Result<Vec<Car>, AppError> {
        self.repository.find_all().await
    }

    pub async fn list_available(&self, query: AvailableCarsQuery) -> Result<Vec<Car>, AppError> {
        validate_date_range(query.start_date, query.end_date)?;

        self.repository
            .find_available(
                query.start_date,
                query.end_date,
                query.min_price,
                query.max_price,
            )
            .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCarRequest,
    ) -> Result<ApiResponse<Car>, AppError> {
        request.validate()?;

        let car = self
            .repository
            .update(
                id,
                request.brand,
                request.model,
                request.description,
                request.image_url,
                request.price_per_day,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            car,
            "Coche actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }
}
