//! Modelo de Booking
//!
//! Este módulo contiene el struct Booking, la máquina de estados de una
//! reserva y las proyecciones con datos del coche (JOIN con cars).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la reserva - mapea al ENUM booking_status
///
/// Máquina de estados: pending → confirmed → active → completed.
/// cancelled es alcanzable desde pending, confirmed o active.
/// completed y cancelled son terminales.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Estados terminales: no admiten más transiciones
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Mientras la reserva está en confirmed/active retiene exactamente
    /// una unidad del inventario del coche
    pub fn holds_unit(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Active)
    }

    /// Transiciones válidas de la máquina de estados
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Active)
                | (Confirmed, Completed)
                | (Active, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Active, Cancelled)
        )
    }

    /// ¿Devuelve la transición a `next` una unidad al inventario? Solo
    /// cuando la reserva retiene una unidad y pasa a un estado terminal.
    /// Como los estados terminales no retienen unidad ni admiten más
    /// transiciones, la devolución ocurre como mucho una vez por reserva.
    pub fn releases_unit_on(&self, next: BookingStatus) -> bool {
        self.holds_unit() && next.is_terminal()
    }
}

/// Solape de intervalos cerrados de fechas: [a_start, a_end] y [b_start,
/// b_end] solapan sii a_start <= b_end y b_start <= a_end. Es el mismo
/// predicado que aplican las queries de conflictos sobre bookings; dos
/// reservas que solo se tocan en un extremo cuentan como solape.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking con los campos del coche (JOIN con cars) para respuestas de la API
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingWithCar {
    pub id: Uuid,
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub brand: String,
    pub model: String,
    pub price_per_day: Decimal,
    pub image_url: Option<String>,
}

/// Estadísticas de reservas (por estado + ingresos)
#[derive(Debug, Serialize, FromRow)]
pub struct BookingStats {
    pub total_bookings: i32,
    pub pending_bookings: i32,
    pub confirmed_bookings: i32,
    pub active_bookings: i32,
    pub completed_bookings: i32,
    pub cancelled_bookings: i32,
    pub total_revenue: Decimal,
}

/// Reserva que expira pronto (para avisos)
#[derive(Debug, Serialize, FromRow)]
pub struct UpcomingExpiration {
    pub id: Uuid,
    pub end_date: NaiveDate,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub brand: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Active,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("expired"), None);
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Active));
        assert!(BookingStatus::Active.can_transition_to(BookingStatus::Completed));
        // El sweeper completa reservas confirmed directamente
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn test_cancellation_reachable_from_non_terminal() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Active.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Active,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_holds_unit() {
        assert!(BookingStatus::Confirmed.holds_unit());
        assert!(BookingStatus::Active.holds_unit());
        assert!(!BookingStatus::Pending.holds_unit());
        assert!(!BookingStatus::Completed.holds_unit());
        assert!(!BookingStatus::Cancelled.holds_unit());
    }

    #[test]
    fn test_no_skipping_pending_to_active() {
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Active));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn test_release_happens_exactly_once() {
        // La transición a terminal desde un estado que retiene devuelve...
        assert!(BookingStatus::Confirmed.releases_unit_on(BookingStatus::Completed));
        assert!(BookingStatus::Confirmed.releases_unit_on(BookingStatus::Cancelled));
        assert!(BookingStatus::Active.releases_unit_on(BookingStatus::Completed));
        // ...pending no retiene, así cancelarla no devuelve nada
        assert!(!BookingStatus::Pending.releases_unit_on(BookingStatus::Cancelled));
        // ...y una vez en terminal ningún cambio posterior puede volver a
        // devolver: ni retiene unidad ni admite transiciones
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for next in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Active,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ] {
                assert!(!terminal.releases_unit_on(next));
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ranges_overlap_inclusive_bounds() {
        // Solape parcial: 01..05 contra 03..07
        assert!(ranges_overlap(
            date(2024, 1, 1),
            date(2024, 1, 5),
            date(2024, 1, 3),
            date(2024, 1, 7)
        ));
        // Intervalos que solo se tocan en un extremo también solapan
        assert!(ranges_overlap(
            date(2024, 1, 1),
            date(2024, 1, 5),
            date(2024, 1, 5),
            date(2024, 1, 9)
        ));
        // Contención
        assert!(ranges_overlap(
            date(2024, 1, 1),
            date(2024, 1, 31),
            date(2024, 1, 10),
            date(2024, 1, 12)
        ));
        // Disjuntos por un día
        assert!(!ranges_overlap(
            date(2024, 1, 1),
            date(2024, 1, 5),
            date(2024, 1, 6),
            date(2024, 1, 9)
        ));
        // El predicado es simétrico
        assert!(ranges_overlap(
            date(2024, 1, 3),
            date(2024, 1, 7),
            date(2024, 1, 1),
            date(2024, 1, 5)
        ));
    }
}
