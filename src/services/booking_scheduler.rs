//! Scheduler de expiración de reservas
//!
//! Timer recurrente que ejecuta el sweep de auto-completación cada hora.
//! Se construye explícitamente en main (composition root) y se inyecta via
//! AppState; no es un global de módulo, así los tests pueden arrancarlo y
//! pararlo limpiamente.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::repositories::booking_repository::{BookingRepository, SweepSummary};
use crate::utils::errors::AppError;

/// Intervalo por defecto entre sweeps: 1 hora
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

struct SchedulerInner {
    handle: Option<JoinHandle<()>>,
    next_check: Option<DateTime<Utc>>,
}

pub struct BookingScheduler {
    pool: PgPool,
    interval: Duration,
    inner: Arc<RwLock<SchedulerInner>>,
}

impl BookingScheduler {
    pub fn new(pool: PgPool, interval: Duration) -> Self {
        Self {
            pool,
            interval,
            inner: Arc::new(RwLock::new(SchedulerInner {
                handle: None,
                next_check: None,
            })),
        }
    }

    /// Arrancar el timer: un sweep inmediato y después uno por intervalo.
    /// Si ya está corriendo es un no-op con warning, no un error.
    pub async fn start(&self) {
        let mut inner = self.inner.write().await;

        if inner.handle.is_some() {
            warn!("⚠️ El scheduler ya está corriendo");
            return;
        }

        info!(
            "🚀 Arrancando el chequeo automático de reservas expiradas (cada {} minutos)",
            self.interval.as_secs() / 60
        );

        let pool = self.pool.clone();
        let interval = self.interval;
        let shared = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let repository = BookingRepository::new(pool);
            // El primer tick es inmediato
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                run_sweep(&repository).await;

                let next = Utc::now() + chrono::Duration::seconds(interval.as_secs() as i64);
                shared.write().await.next_check = Some(next);
            }
        });

        inner.handle = Some(handle);
        // El primer sweep dispara inmediatamente
        inner.next_check = Some(Utc::now());
    }

    /// Parar el timer. Idempotente: parar un scheduler parado no hace nada.
    /// No aborta transacciones por reserva ya confirmadas; cada una es
    /// atómica por sí misma.
    pub async fn stop(&self) {
        let mut inner = self.inner.write().await;

        if let Some(handle) = inner.handle.take() {
            handle.abort();
            inner.next_check = None;
            info!("🛑 Scheduler de reservas parado");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.handle.is_some()
    }

    /// Timestamp proyectado del próximo sweep, None si está parado
    pub async fn next_check_time(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.next_check
    }

    /// Sweep manual (para testing y el endpoint de administración)
    pub async fn run_sweep_now(&self) -> Result<SweepSummary, AppError> {
        let repository = BookingRepository::new(self.pool.clone());
        repository.complete_expired_bookings().await
    }
}

/// Una pasada del sweeper con logging operacional. Los errores nunca llegan
/// al usuario final: se registran y el sweep se reintenta al siguiente tick.
async fn run_sweep(repository: &BookingRepository) {
    let now = Utc::now();
    info!("🔍 [{}] Buscando reservas expiradas...", now.to_rfc3339());

    match repository.complete_expired_bookings().await {
        Ok(summary) if summary.updated > 0 => {
            info!("✅ {} reservas expiradas procesadas:", summary.updated);
            for detail in &summary.details {
                info!(
                    "   - Reserva {}: {} ({} → completed)",
                    detail.booking_id,
                    detail.car_info,
                    detail.old_status.as_str()
                );
            }
        }
        Ok(_) => {
            info!("ℹ️ No se encontraron reservas expiradas");
        }
        Err(e) => {
            error!("❌ Error buscando reservas expiradas: {}", e);
        }
    }
}
