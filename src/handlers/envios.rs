use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use operaciones_middleware::utils::logging::*;
use operaciones_middleware::utils::AppResult;
use operaciones_middleware::AppState;

#[derive(Debug, Deserialize)]
pub struct BusquedaParams {
    #[serde(default)]
    pub buscar: String,
}

/// Bandejas de la pantalla de envíos, filtradas por el término de búsqueda
pub async fn listar_envios(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BusquedaParams>,
) -> Json<Value> {
    log_request_received("/envios", "GET");

    let bandejas = state.envios.listado(&params.buscar).await;
    let guardando = state.envios.guardando_ids().await;

    Json(json!({
        "requieren_accion": bandejas.requieren_accion,
        "en_espera": bandejas.en_espera,
        "guardando": guardando,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Relectura completa desde Airtable (la dispara la pantalla al montarse)
pub async fn refrescar_envios(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/envios/refrescar", "POST");

    let total = state.envios.refrescar().await?;

    Ok(Json(json!({
        "total": total,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Pasarela de actualización de un envío
///
/// La respuesta es siempre 200 con `exito` + `mensaje`: el desenlace de la
/// actualización primaria es el contrato con el panel, no un código HTTP.
pub async fn actualizar_envio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(campos): Json<Map<String, Value>>,
) -> Json<Value> {
    log_request_received("/envios/:id", "PATCH");

    let resultado = state.envios.actualizar(&id, &campos).await;

    match resultado.mensaje() {
        None => Json(json!({ "exito": true })),
        Some(mensaje) => Json(json!({ "exito": false, "mensaje": mensaje })),
    }
}
