//! DTOs de Car
//!
//! Requests y responses de la API de coches.

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// Request para crear un nuevo coche
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 100))]
    pub brand: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub image_url: Option<String>,

    pub price_per_day: Decimal,

    #[validate(range(min = 0))]
    pub quantity: i32,
}

/// Request para actualizar un coche existente
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCarRequest {
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub image_url: Option<String>,

    pub price_per_day: Option<Decimal>,
}

/// Query params para buscar coches disponibles en un rango de fechas
#[derive(Debug, Deserialize)]
pub struct AvailableCarsQuery {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}
