//! Modelos del dominio y su mapeo desde Airtable
//!
//! Airtable guarda los campos bajo claves de texto libre ("Estado",
//! "Fecha de envío", ...). Este módulo concentra esa traducción: los
//! nombres de campo viven aquí como constantes y cada modelo sabe
//! construirse desde un `airtable::Record` y aplicarse un parche parcial
//! de campos.

pub mod envio;
pub mod registro;

pub use envio::Envio;
pub use registro::{AlertaCita, Registro};

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

// Nombres de campo en Airtable (claves de texto libre)
pub const CAMPO_NUMERO: &str = "Número de seguimiento";
pub const CAMPO_ESTADO: &str = "Estado";
pub const CAMPO_SEGUIMIENTO: &str = "Seguimiento";
pub const CAMPO_FECHA_ENVIO: &str = "Fecha de envío";
pub const CAMPO_PRODUCTO: &str = "Producto";
pub const CAMPO_CLIENTE: &str = "Cliente";
pub const CAMPO_ASESOR: &str = "Asesor";
pub const CAMPO_FECHA_CITA: &str = "Fecha cita";

/// Campos cuyo valor debe ser una fecha parseable
const CAMPOS_FECHA: [&str; 2] = [CAMPO_FECHA_ENVIO, CAMPO_FECHA_CITA];

/// Elemento sobre el que operan el clasificador de SLA y la sincronización
/// del almacén auxiliar (generalización de envío y aviso)
pub trait ElementoSeguible: Clone + Send + Sync + 'static {
    fn desde_record(record: &airtable::Record) -> Self;

    fn id(&self) -> &str;

    /// Número de seguimiento; clave de unión con el almacén auxiliar
    fn numero(&self) -> Option<&str>;

    fn estado(&self) -> Option<&str>;

    /// Texto libre del campo Seguimiento ("Email enviado" es el centinela)
    fn seguimiento(&self) -> Option<&str>;

    fn fecha_envio(&self) -> Option<DateTime<Utc>>;

    /// Aplica un parche parcial de campos sobre el elemento en memoria
    fn aplicar_campos(&mut self, campos: &Map<String, Value>);

    /// Campos sobre los que opera el filtro de búsqueda libre
    fn campos_buscables(&self) -> Vec<Option<&str>>;
}

/// Lee un campo de texto de un mapa de campos de Airtable
pub(crate) fn texto(campos: &Map<String, Value>, nombre: &str) -> Option<String> {
    campos
        .get(nombre)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Parsea una fecha de Airtable (RFC 3339 o fecha suelta AAAA-MM-DD)
pub fn parsear_fecha(valor: &str) -> Option<DateTime<Utc>> {
    if let Ok(fecha) = DateTime::parse_from_rfc3339(valor) {
        return Some(fecha.with_timezone(&Utc));
    }
    if let Ok(dia) = NaiveDate::parse_from_str(valor, "%Y-%m-%d") {
        return dia.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    None
}

/// Lee un campo de fecha de un mapa de campos de Airtable
pub(crate) fn fecha(campos: &Map<String, Value>, nombre: &str) -> Option<DateTime<Utc>> {
    campos
        .get(nombre)
        .and_then(|v| v.as_str())
        .and_then(parsear_fecha)
}

/// Valida los campos de fecha de un parche ANTES de enviarlo a Airtable
///
/// Un valor mal formado se rechaza aquí con mensaje para el usuario y no
/// llega a la red. `null` es válido (limpia el campo).
pub fn validar_campos_fecha(campos: &Map<String, Value>) -> Result<(), String> {
    for nombre in CAMPOS_FECHA {
        match campos.get(nombre) {
            None | Some(Value::Null) => continue,
            Some(Value::String(valor)) if parsear_fecha(valor).is_some() => continue,
            Some(otro) => {
                return Err(format!(
                    "El campo \"{}\" no es una fecha válida: {}",
                    nombre, otro
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parsear_fecha_acepta_rfc3339_y_fecha_suelta() {
        assert!(parsear_fecha("2024-03-04T10:30:00.000Z").is_some());
        assert!(parsear_fecha("2024-03-04").is_some());
        assert!(parsear_fecha("04/03/2024").is_none());
        assert!(parsear_fecha("mañana").is_none());
    }

    #[test]
    fn test_validar_campos_fecha_rechaza_valores_mal_formados() {
        let mut campos = Map::new();
        campos.insert(CAMPO_FECHA_CITA.to_string(), json!("no-es-fecha"));

        let err = validar_campos_fecha(&campos).unwrap_err();
        assert!(err.contains("Fecha cita"), "El mensaje debe nombrar el campo: {}", err);
    }

    #[test]
    fn test_validar_campos_fecha_acepta_null_y_ausentes() {
        let mut campos = Map::new();
        campos.insert(CAMPO_ESTADO.to_string(), json!("Entregado"));
        campos.insert(CAMPO_FECHA_ENVIO.to_string(), Value::Null);

        assert!(validar_campos_fecha(&campos).is_ok());
    }
}
