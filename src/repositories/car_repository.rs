//! Repositorio de Cars
//!
//! CRUD fino sobre la tabla cars. El inventario (quantity) solo lo mutan las
//! operaciones de reserva del BookingRepository; por esta vía nunca se toca.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::car::Car;
use crate::utils::errors::{not_found_error, AppError};

pub struct CarRepository {
    pool: PgPool,
}

impl CarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        brand: String,
        model: String,
        description: Option<String>,
        image_url: Option<String>,
        price_per_day: Decimal,
        quantity: i32,
    ) -> Result<Car, AppError> {
        let car: Car = sqlx::query_as(
            r#"
            INSERT INTO cars
                (id, brand, model, description, image_url, price_per_day,
                 quantity, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7 > 0, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(brand)
        .bind(model)
        .bind(description)
        .bind(image_url)
        .bind(price_per_day)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(car)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, AppError> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    pub async fn find_all(&self) -> Result<Vec<Car>, AppError> {
        let cars = sqlx::query_as::<_, Car>("SELECT * FROM cars ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(cars)
    }

    /// Coches con alguna unidad libre para el rango de fechas pedido,
    /// opcionalmente filtrados por precio, ordenados por precio ascendente.
    /// Un coche queda fuera cuando sus reservas confirmed/active que solapan
    /// el rango consumen todas sus unidades.
    pub async fn find_available(
        &self,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    ) -> Result<Vec<Car>, AppError> {
        let cars = sqlx::query_as::<_, Car>(
            r#"
            SELECT c.*
            FROM cars c
            WHERE c.quantity > (
                SELECT COUNT(*)
                FROM bookings b
                WHERE b.car_id = c.id
                  AND b.status IN ('confirmed', 'active')
                  AND b.start_date <= $2
                  AND b.end_date >= $1
            )
              AND ($3::numeric IS NULL OR c.price_per_day >= $3)
              AND ($4::numeric IS NULL OR c.price_per_day <= $4)
            ORDER BY c.price_per_day ASC
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .bind(min_price)
        .bind(max_price)
        .fetch_all(&self.pool)
        .await?;

        Ok(cars)
    }

    /// Actualización parcial de los datos descriptivos del coche.
    /// quantity/available quedan fuera a propósito.
    pub async fn update(
        &self,
        id: Uuid,
        brand: Option<String>,
        model: Option<String>,
        description: Option<String>,
        image_url: Option<String>,
        price_per_day: Option<Decimal>,
    ) -> Result<Car, AppError> {
        let car: Car = sqlx::query_as(
            r#"
            UPDATE cars
            SET brand = COALESCE($2, brand),
                model = COALESCE($3, model),
                description = COALESCE($4, description),
                image_url = COALESCE($5, image_url),
                price_per_day = COALESCE($6, price_per_day),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(brand)
        .bind(model)
        .bind(description)
        .bind(image_url)
        .bind(price_per_day)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Car", &id.to_string()))?;

        Ok(car)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Car", &id.to_string()));
        }

        Ok(())
    }
}
