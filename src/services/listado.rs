//! Controlador de listado por pantalla
//!
//! Cada pantalla del panel (envíos, registros) tiene su propio
//! controlador, construido en el arranque y dueño de:
//!
//! - su copia en memoria del listado (no hay caché compartida entre
//!   pantallas: dos pantallas pueden ver el mismo registro con distinta
//!   frescura hasta su siguiente refresco, comportamiento aceptado)
//! - el conjunto de ids "guardando" (para que la vista desactive inputs)
//! - la tarea de sondeo periódico, con su handle cancelable
//!
//! El guard de montaje (`activo`) se aplica de forma uniforme: una
//! petición que resuelve después de `detener()` no escribe estado
//! obsoleto ni puede disparar una alerta con datos viejos.

use crate::models::{validar_campos_fecha, ElementoSeguible};
use crate::services::sla::{clasificar, coincide_busqueda, ordenar_por_numero, Bandeja};
use crate::services::tracking_sync::TrackingSync;
use crate::utils::logging::*;
use crate::utils::AppResult;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

/// Cadencia del sondeo de listados (la que usaba el panel en sus timers)
pub const INTERVALO_SONDEO_SEGUNDOS: u64 = 60;

/// Las dos bandejas activas de una pantalla, ya filtradas y ordenadas
#[derive(Debug, Serialize)]
pub struct Bandejas<E> {
    pub requieren_accion: Vec<E>,
    pub en_espera: Vec<E>,
}

/// Desenlace de una actualización primaria; SIEMPRE debe comprobarse
/// (contraste deliberado con `ResultadoSecundario`, que solo se registra)
#[must_use = "el resultado de la actualización primaria debe comprobarse"]
#[derive(Debug)]
pub enum ResultadoActualizacion {
    Aplicada,
    Rechazada(String),
}

impl ResultadoActualizacion {
    pub fn exito(&self) -> bool {
        matches!(self, ResultadoActualizacion::Aplicada)
    }

    pub fn mensaje(&self) -> Option<&str> {
        match self {
            ResultadoActualizacion::Aplicada => None,
            ResultadoActualizacion::Rechazada(msg) => Some(msg),
        }
    }
}

/// Controlador de una pantalla de listado
pub struct ListadoController<E: ElementoSeguible> {
    pantalla: &'static str,
    tabla: String,
    records: airtable::RecordManager,
    /// Sincronización de recogidas; `None` en pantallas que no escriben en
    /// el almacén auxiliar (registros)
    sync: Option<TrackingSync>,
    items: Arc<RwLock<Vec<E>>>,
    guardando: Arc<RwLock<HashSet<String>>>,
    activo: Arc<AtomicBool>,
    sondeo: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl<E: ElementoSeguible> ListadoController<E> {
    pub fn new(
        pantalla: &'static str,
        tabla: impl Into<String>,
        records: airtable::RecordManager,
        sync: Option<TrackingSync>,
    ) -> Self {
        Self {
            pantalla,
            tabla: tabla.into(),
            records,
            sync,
            items: Arc::new(RwLock::new(Vec::new())),
            guardando: Arc::new(RwLock::new(HashSet::new())),
            activo: Arc::new(AtomicBool::new(true)),
            sondeo: Arc::new(RwLock::new(None)),
        }
    }

    /// Relee el listado completo desde Airtable y reconcilia el almacén
    /// auxiliar con el subconjunto accionable
    pub async fn refrescar(&self) -> AppResult<usize> {
        let registros = self.records.listar_todos(&self.tabla).await?;
        let nuevos: Vec<E> = registros.iter().map(E::desde_record).collect();

        // Guard de montaje: la pantalla pudo desmontarse mientras la
        // petición estaba en vuelo
        if !self.activo.load(Ordering::SeqCst) {
            tracing::debug!("Pantalla '{}' inactiva: refresco descartado", self.pantalla);
            return Ok(0);
        }

        let total = nuevos.len();
        *self.items.write().await = nuevos.clone();
        log_listado_refrescado(self.pantalla, total);

        if let Some(sync) = &self.sync {
            sync.asegurar_accion_requerida(&nuevos, Utc::now())
                .await
                .registrar();
        }

        Ok(total)
    }

    /// Copia del listado en memoria
    pub async fn items(&self) -> Vec<E> {
        self.items.read().await.clone()
    }

    /// Bandejas activas de la pantalla: clasifica, filtra por el término
    /// de búsqueda y ordena por número de seguimiento
    pub async fn listado(&self, busqueda: &str) -> Bandejas<E> {
        let ahora = Utc::now();
        let items = self.items.read().await;

        let mut requieren_accion = Vec::new();
        let mut en_espera = Vec::new();

        for item in items.iter() {
            match clasificar(item, ahora) {
                Bandeja::Ninguna => continue,
                Bandeja::RequiereAccion => {
                    if coincide_busqueda(item, busqueda) {
                        requieren_accion.push(item.clone());
                    }
                }
                Bandeja::EnEspera => {
                    if coincide_busqueda(item, busqueda) {
                        en_espera.push(item.clone());
                    }
                }
            }
        }

        ordenar_por_numero(&mut requieren_accion);
        ordenar_por_numero(&mut en_espera);

        Bandejas {
            requieren_accion,
            en_espera,
        }
    }

    /// Ids con una actualización en vuelo (la vista desactiva sus inputs)
    pub async fn guardando_ids(&self) -> Vec<String> {
        self.guardando.read().await.iter().cloned().collect()
    }

    /// Actualización primaria de un registro (pasarela del panel)
    ///
    /// Valida, parchea Airtable y SOLO tras confirmación fusiona el parche
    /// en el elemento cacheado (no hay nada que revertir si falla). Los
    /// cierres del almacén auxiliar se disparan después y no afectan al
    /// desenlace.
    pub async fn actualizar(&self, id: &str, campos: &Map<String, Value>) -> ResultadoActualizacion {
        if let Err(motivo) = validar_campos_fecha(campos) {
            log_validation_error("fecha", &motivo);
            return ResultadoActualizacion::Rechazada(motivo);
        }

        self.guardando.write().await.insert(id.to_string());
        let resultado = self.records.actualizar_campos(&self.tabla, id, campos).await;
        self.guardando.write().await.remove(id);

        match resultado {
            Ok(_) => {
                let numero = {
                    let mut items = self.items.write().await;
                    match items.iter_mut().find(|item| item.id() == id) {
                        Some(item) => {
                            item.aplicar_campos(campos);
                            item.numero().map(String::from)
                        }
                        None => None,
                    }
                };

                if let Some(sync) = &self.sync {
                    for resultado in sync.tras_actualizacion(numero.as_deref(), campos).await {
                        resultado.registrar();
                    }
                }

                ResultadoActualizacion::Aplicada
            }
            Err(e) => {
                log_airtable_api_error("actualizar_campos", &e.to_string());
                ResultadoActualizacion::Rechazada(format!("No se pudo guardar el cambio: {}", e))
            }
        }
    }

    /// Arranca el sondeo periódico del listado
    pub async fn iniciar_sondeo(self: &Arc<Self>, intervalo_segundos: u64) {
        let mut sondeo = self.sondeo.write().await;
        if sondeo.is_some() {
            log_warning(&format!("Sondeo de '{}' ya en marcha", self.pantalla));
            return;
        }

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(intervalo_segundos));
            // El primer tick resuelve al instante; el refresco inicial ya
            // lo hizo el arranque
            ticks.tick().await;

            loop {
                ticks.tick().await;

                if !controller.activo.load(Ordering::SeqCst) {
                    break;
                }

                if let Err(e) = controller.refrescar().await {
                    log_error(&format!("❌ Sondeo de '{}' falló: {}", controller.pantalla, e));
                }
            }
        });

        *sondeo = Some(handle);
        log_info(&format!(
            "🕐 Sondeo de '{}' iniciado: refresco cada {}s",
            self.pantalla, intervalo_segundos
        ));
    }

    /// Desmonta la pantalla: marca inactivo y cancela la tarea de sondeo
    ///
    /// La cancelación es exacta: el handle se aborta aquí, no se deja
    /// morir al timer por su cuenta.
    pub async fn detener(&self) {
        self.activo.store(false, Ordering::SeqCst);

        if let Some(handle) = self.sondeo.write().await.take() {
            handle.abort();
            log_info(&format!("🛑 Sondeo de '{}' detenido", self.pantalla));
        }
    }
}
