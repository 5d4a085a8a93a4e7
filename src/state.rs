//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::services::booking_scheduler::BookingScheduler;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    /// Scheduler de expiración, construido en main e inyectado aquí para que
    /// los handlers (y los tests) puedan arrancarlo y pararlo
    pub scheduler: Arc<BookingScheduler>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, scheduler: Arc<BookingScheduler>) -> Self {
        Self {
            pool,
            config,
            scheduler,
        }
    }
}
