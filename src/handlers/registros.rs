use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use operaciones_middleware::models::registro::proximas_citas;
use operaciones_middleware::utils::logging::*;
use operaciones_middleware::utils::AppResult;
use operaciones_middleware::AppState;

use super::envios::BusquedaParams;

/// Bandejas de la pantalla de registros (avisos/asesorías)
pub async fn listar_registros(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BusquedaParams>,
) -> Json<Value> {
    log_request_received("/registros", "GET");

    let bandejas = state.registros.listado(&params.buscar).await;
    let guardando = state.registros.guardando_ids().await;

    Json(json!({
        "requieren_accion": bandejas.requieren_accion,
        "en_espera": bandejas.en_espera,
        "guardando": guardando,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn refrescar_registros(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/registros/refrescar", "POST");

    let total = state.registros.refrescar().await?;

    Ok(Json(json!({
        "total": total,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Pasarela de actualización de un registro (sin cierres de recogidas:
/// esa sincronización es exclusiva de los envíos)
pub async fn actualizar_registro(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(campos): Json<Map<String, Value>>,
) -> Json<Value> {
    log_request_received("/registros/:id", "PATCH");

    let resultado = state.registros.actualizar(&id, &campos).await;

    match resultado.mensaje() {
        None => Json(json!({ "exito": true })),
        Some(mensaje) => Json(json!({ "exito": false, "mensaje": mensaje })),
    }
}

/// Citas que caen dentro de la próxima hora, sobre el listado en memoria
pub async fn alertas_citas(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/registros/alertas", "GET");

    let registros = state.registros.items().await;
    let alertas = proximas_citas(&registros, chrono::Utc::now());

    Json(json!({
        "alertas": alertas,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
