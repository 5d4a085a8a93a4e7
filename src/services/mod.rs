//! Services module
//!
//! Este módulo contiene la lógica de negocio que no encaja en un
//! repositorio: el scheduler de expiración de reservas.

pub mod booking_scheduler;

pub use booking_scheduler::*;
