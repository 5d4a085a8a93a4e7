//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::utils::errors::AppError;

/// Validar que un campo de texto no esté vacío
pub fn validate_not_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

/// Validar un rango de fechas de reserva: end_date >= start_date.
/// Los intervalos son de límites inclusivos en todo el sistema.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), AppError> {
    if end_date < start_date {
        return Err(AppError::Validation(format!(
            "end_date ({}) must be on or after start_date ({})",
            end_date, start_date
        )));
    }
    Ok(())
}

/// Validar que un precio sea positivo
pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "total_price must be greater than zero, got {}",
            price
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("customer_name", "María").is_ok());
        assert!(validate_not_empty("customer_name", "   ").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(date(2024, 1, 1), date(2024, 1, 5)).is_ok());
        // Reserva de un solo día: permitida (límites inclusivos)
        assert!(validate_date_range(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(validate_date_range(date(2024, 1, 5), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::new(1500, 2)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::new(-100, 2)).is_err());
    }
}
