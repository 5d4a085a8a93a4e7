//! DTOs de Booking
//!
//! Requests y responses de la API de reservas. La actualización parcial usa
//! un struct con campos opcionales (whitelist explícita), nunca construcción
//! dinámica de SQL.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request para crear una nueva reserva
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: Decimal,

    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,

    #[validate(email)]
    pub customer_email: Option<String>,

    #[validate(length(min = 6, max = 30))]
    pub customer_phone: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Request para actualizar una reserva existente.
///
/// Solo los campos mutables de la whitelist: status, datos de contacto y
/// notas. Nunca car_id ni total_price por esta vía (saltaría la contabilidad
/// de inventario).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    pub status: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub customer_name: Option<String>,

    #[validate(email)]
    pub customer_email: Option<String>,

    #[validate(length(min = 6, max = 30))]
    pub customer_phone: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl UpdateBookingRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.customer_name.is_none()
            && self.customer_email.is_none()
            && self.customer_phone.is_none()
            && self.notes.is_none()
    }
}

/// Query params para listar reservas
#[derive(Debug, Default, Deserialize)]
pub struct BookingFilters {
    pub status: Option<String>,
    pub car_id: Option<Uuid>,
}

/// Query params para el cálculo de disponibilidad
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Envelope estándar de respuesta de la API
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateBookingRequest::default().is_empty());

        let request = UpdateBookingRequest {
            status: Some("cancelled".to_string()),
            ..Default::default()
        };
        assert!(!request.is_empty());
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateBookingRequest {
            car_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            total_price: Decimal::new(20000, 2),
            customer_name: "María García".to_string(),
            customer_email: Some("not-an-email".to_string()),
            customer_phone: None,
            notes: None,
        };
        assert!(validator::Validate::validate(&request).is_err());
    }
}
