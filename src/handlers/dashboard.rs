use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use operaciones_middleware::services::informes::resumen_gestion_24h;
use operaciones_middleware::utils::logging::*;
use operaciones_middleware::utils::AppResult;
use operaciones_middleware::AppState;

/// Métrica del panel: casos gestionados en 24 horas hábiles (última semana)
///
/// Lectura directa del almacén auxiliar. A diferencia de los cierres, aquí
/// un fallo de Supabase SÍ se devuelve al panel: es el flujo primario de
/// este endpoint, no un efecto secundario.
pub async fn casos_gestionados_24h(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/dashboard/casos-gestionados-24h", "GET");

    let filas = state.recogidas.listar_ultima_semana().await?;
    let resumen = resumen_gestion_24h(&filas);

    Ok(Json(json!({
        "resumen": resumen,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
