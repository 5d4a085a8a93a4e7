//! Modelo de Car
//!
//! Este módulo contiene el struct Car y sus variantes para CRUD operations.
//! Mapea exactamente a la tabla cars del schema PostgreSQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Car principal - mapea exactamente a la tabla cars
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_per_day: Decimal,
    /// Unidades físicas libres en el parking. Se decrementa al confirmar una
    /// reserva y se incrementa exactamente una vez cuando esa reserva termina.
    /// Nunca puede ser negativo.
    pub quantity: i32,
    /// Flag derivado, cacheado: quantity > 0
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resultado del cálculo de disponibilidad para un coche y un rango de fechas
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub car_id: Uuid,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    /// Unidades libres = quantity - reservas confirmadas/activas que solapan
    pub available_quantity: i32,
    pub total_quantity: i32,
    pub conflicting_count: i64,
}

impl AvailabilityReport {
    pub fn is_available(&self) -> bool {
        self.available_quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report(available: i32) -> AvailabilityReport {
        AvailabilityReport {
            car_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            available_quantity: available,
            total_quantity: 3,
            conflicting_count: (3 - available) as i64,
        }
    }

    #[test]
    fn test_is_available() {
        assert!(report(1).is_available());
        assert!(!report(0).is_available());
    }
}
