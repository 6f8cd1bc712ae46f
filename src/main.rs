/// Aplicación principal: middleware del panel de operaciones
///
/// Arquitectura:
/// - Airtable es el almacén primario (envíos y registros)
/// - Supabase guarda la tabla auxiliar de recogidas que fecha el SLA
/// - Cada pantalla tiene su controlador: listado en memoria + sondeo de 60s
/// - El panel consume bandejas ya clasificadas por horas hábiles
///
/// Los fallos del almacén auxiliar se registran y se descartan; solo el
/// almacén primario bloquea una acción del usuario.

use anyhow::Context;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Importar módulos de la biblioteca
use operaciones_middleware::{config, models, services, utils, AppState};

mod handlers;

use config::Settings;
use handlers::{
    actualizar_envio, actualizar_registro, alertas_citas, casos_gestionados_24h,
    health_check, listar_envios, listar_registros, ready_check, refrescar_envios,
    refrescar_registros, status_check,
};
use models::{Envio, Registro};
use services::{ListadoController, TrackingSync, INTERVALO_SONDEO_SEGUNDOS};
use utils::logging::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Cargar variables de entorno del archivo .env (si existe)
    if dotenvy::dotenv().is_err() {
        // En producción no hay .env: las variables vienen del entorno
        tracing::debug!("Archivo .env no encontrado - usando variables de entorno del sistema");
    }

    // Inicializar tracing
    tracing_subscriber::fmt::init();

    // Cargar configuración
    let settings = Settings::new().context("Failed to load settings")?;
    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    // Cliente del almacén primario
    let airtable_client = airtable::AirtableClient::new(
        settings.airtable.token.clone(),
        settings.airtable.base_id.clone(),
    )
    .context("Failed to create Airtable client")?;
    let record_manager = airtable::RecordManager::new(airtable_client);
    log_info("⚡ Airtable RecordManager configurado");

    // Cliente del almacén auxiliar de recogidas
    let recogidas_client = recogidas::RecogidasClient::new(
        settings.supabase.url.clone(),
        settings.supabase.api_key.clone(),
    )
    .context("Failed to create Supabase client")?;
    let tracking_sync = TrackingSync::new(recogidas_client.clone());
    log_info("✅ Cliente de recogidas (Supabase) inicializado");

    // Controladores de pantalla: envíos sincroniza recogidas, registros no
    let envios = Arc::new(ListadoController::<Envio>::new(
        "envios",
        settings.airtable.tabla_envios.clone(),
        record_manager.clone(),
        Some(tracking_sync),
    ));
    let registros = Arc::new(ListadoController::<Registro>::new(
        "registros",
        settings.airtable.tabla_registros.clone(),
        record_manager.clone(),
        None,
    ));

    // Carga inicial de ambas pantallas; un fallo no tumba el arranque,
    // el sondeo lo reintentará en el siguiente tick
    if let Err(e) = envios.refrescar().await {
        log_warning(&format!("⚠️ Carga inicial de envíos falló: {}", e));
    }
    if let Err(e) = registros.refrescar().await {
        log_warning(&format!("⚠️ Carga inicial de registros falló: {}", e));
    }

    envios.iniciar_sondeo(INTERVALO_SONDEO_SEGUNDOS).await;
    registros.iniciar_sondeo(INTERVALO_SONDEO_SEGUNDOS).await;

    // Estado de la aplicación
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        airtable: record_manager,
        recogidas: recogidas_client,
        envios: envios.clone(),
        registros: registros.clone(),
    });

    // Configurar rutas
    let app = Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))

        // Pantalla de envíos
        .route("/envios", get(listar_envios))
        .route("/envios/refrescar", post(refrescar_envios))
        .route("/envios/:id", patch(actualizar_envio))

        // Pantalla de registros
        .route("/registros", get(listar_registros))
        .route("/registros/refrescar", post(refrescar_registros))
        .route("/registros/alertas", get(alertas_citas))
        .route("/registros/:id", patch(actualizar_registro))

        // Panel de métricas
        .route("/dashboard/casos-gestionados-24h", get(casos_gestionados_24h))

        // El panel corre en otro origen
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Iniciar servidor; PORT del entorno tiene prioridad
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown con signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Desmontaje exacto de los sondeos antes de salir
    envios.detener().await;
    registros.detener().await;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
