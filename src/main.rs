mod config;
mod controllers;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use tokio::signal;
use tracing::{error, info};

use config::database::DatabaseConfig;
use config::environment::EnvironmentConfig;
use middleware::cors::cors_middleware;
use services::booking_scheduler::BookingScheduler;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("🚗 Car Rental Backend - Bookings & Inventory");
    info!("=============================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match DatabaseConfig::default().create_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Composition root: el scheduler se construye aquí y se inyecta en el
    // estado; no hay ningún singleton global
    let scheduler = Arc::new(BookingScheduler::new(
        pool.clone(),
        Duration::from_secs(config.scheduler_interval_secs),
    ));
    scheduler.start().await;

    let app_state = AppState::new(pool, config.clone(), scheduler.clone());

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api/cars", routes::car_routes::create_car_router())
        .nest("/api/bookings", routes::booking_routes::create_booking_router())
        .nest("/api/scheduler", routes::scheduler_routes::create_scheduler_router())
        .layer(cors_middleware())
        .with_state(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚗 Endpoints - Cars:");
    info!("   POST /api/cars - Crear coche");
    info!("   GET  /api/cars - Listar coches");
    info!("   GET  /api/cars/available - Coches libres para un rango de fechas");
    info!("   GET  /api/cars/:id - Obtener coche");
    info!("   PUT  /api/cars/:id - Actualizar coche");
    info!("   DELETE /api/cars/:id - Eliminar coche");
    info!("   GET  /api/cars/:id/availability - Disponibilidad por fechas");
    info!("📅 Endpoints - Bookings:");
    info!("   POST /api/bookings - Crear reserva");
    info!("   GET  /api/bookings - Listar reservas");
    info!("   GET  /api/bookings/stats - Estadísticas de reservas");
    info!("   GET  /api/bookings/expiring - Reservas que expiran pronto");
    info!("   GET  /api/bookings/user/:identifier - Reservas de un cliente");
    info!("   GET  /api/bookings/:id - Obtener reserva");
    info!("   PUT  /api/bookings/:id - Actualizar reserva");
    info!("   POST /api/bookings/:id/cancel - Cancelar reserva");
    info!("   DELETE /api/bookings/:id - Eliminar reserva");
    info!("⏰ Endpoints - Scheduler:");
    info!("   GET  /api/scheduler/status - Estado del scheduler");
    info!("   POST /api/scheduler/start - Arrancar scheduler");
    info!("   POST /api/scheduler/stop - Parar scheduler");
    info!("   POST /api/scheduler/run-check - Sweep manual");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    // Parar el timer antes de salir; las transacciones por reserva ya
    // confirmadas son definitivas, así que interrumpir entre reservas es seguro
    scheduler.stop().await;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "service": "car-rental",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
