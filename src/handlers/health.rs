use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use operaciones_middleware::utils::logging::*;
use operaciones_middleware::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "operaciones-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    // Prueba la conexión con el almacén primario
    let airtable_status = match state
        .airtable
        .test_connection(&state.settings.airtable.tabla_envios)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let overall_ready = airtable_status == "connected";

    let response = json!({
        "ready": overall_ready,
        "service": "operaciones-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "airtable": {
                "status": airtable_status,
                "base_id": state.settings.airtable.base_id
            },
            "supabase": {
                "status": "best_effort",
                "url": state.settings.supabase.url
            }
        }
    });

    if overall_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let airtable_configured =
        !state.settings.airtable.token.is_empty() && !state.settings.airtable.base_id.is_empty();
    let supabase_configured =
        !state.settings.supabase.url.is_empty() && !state.settings.supabase.api_key.is_empty();

    let envios = state.envios.items().await.len();
    let registros = state.registros.items().await.len();

    Json(json!({
        "service": "operaciones-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
        "integrations": {
            "airtable": {
                "configured": airtable_configured,
                "base_id": state.settings.airtable.base_id,
                "tabla_envios": state.settings.airtable.tabla_envios,
                "tabla_registros": state.settings.airtable.tabla_registros
            },
            "supabase": {
                "configured": supabase_configured,
                "note": "almacén auxiliar best-effort: sus fallos no bloquean el flujo primario"
            }
        },
        "pantallas": {
            "envios": { "elementos_en_memoria": envios },
            "registros": { "elementos_en_memoria": registros }
        }
    }))
}
