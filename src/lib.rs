// Biblioteca del middleware de operaciones
// Expone módulos para uso en tests y binarios

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use models::{Envio, Registro};
use services::ListadoController;
use std::sync::Arc;

// AppState se define aquí para ser compartido
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub airtable: airtable::RecordManager,
    pub recogidas: recogidas::RecogidasClient,
    pub envios: Arc<ListadoController<Envio>>,
    pub registros: Arc<ListadoController<Registro>>,
}
