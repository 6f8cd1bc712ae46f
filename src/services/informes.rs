//! Agregado de informes sobre el almacén auxiliar
//!
//! Métrica del panel: de las recogidas abiertas la última semana, cuántas
//! se gestionaron dentro de 24 horas hábiles. Consume las fechas que
//! escribe `tracking_sync`; aquí solo se lee y se cuenta.

use crate::services::sla::horas_habiles;
use recogidas::Recogida;
use serde::Serialize;

/// Horas hábiles de margen para considerar una gestión "en plazo"
pub const UMBRAL_HORAS_GESTION: i64 = 24;

#[derive(Debug, Serialize)]
pub struct ResumenGestion {
    pub total: usize,
    pub gestionadas: usize,
    pub dentro_de_24h: usize,
    pub porcentaje_dentro_de_24h: f64,
}

/// Resume la semana de recogidas para el panel
pub fn resumen_gestion_24h(filas: &[Recogida]) -> ResumenGestion {
    let total = filas.len();
    let gestionadas = filas.iter().filter(|f| f.fecha_gestion.is_some()).count();
    let dentro_de_24h = filas
        .iter()
        .filter(|f| match f.fecha_gestion {
            Some(gestion) => horas_habiles(f.creada_en, gestion) <= UMBRAL_HORAS_GESTION,
            None => false,
        })
        .count();

    let porcentaje_dentro_de_24h = if gestionadas == 0 {
        0.0
    } else {
        (dentro_de_24h as f64 / gestionadas as f64) * 100.0
    };

    ResumenGestion {
        total,
        gestionadas,
        dentro_de_24h,
        porcentaje_dentro_de_24h,
    }
}
