//! Registro: aviso/asesoría de la tabla de registros de Airtable
//!
//! Comparte con los envíos la clasificación de SLA (mismo umbral y mismo
//! centinela de seguimiento, ver `services::sla`) pero no escribe en el
//! almacén auxiliar de recogidas. Añade la fecha de cita para las alertas
//! del panel.

use super::{fecha, texto, ElementoSeguible};
use super::{CAMPO_ASESOR, CAMPO_CLIENTE, CAMPO_ESTADO, CAMPO_FECHA_CITA, CAMPO_FECHA_ENVIO, CAMPO_NUMERO, CAMPO_SEGUIMIENTO};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Ventana de aviso de cita: se alerta cuando falta una hora o menos
const VENTANA_ALERTA_MINUTOS: i64 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct Registro {
    pub id: String,
    pub numero: Option<String>,
    pub estado: Option<String>,
    pub seguimiento: Option<String>,
    pub fecha_envio: Option<DateTime<Utc>>,
    pub asesor: Option<String>,
    pub cliente: Option<String>,
    pub fecha_cita: Option<DateTime<Utc>>,
    pub fecha_creacion: DateTime<Utc>,
}

impl ElementoSeguible for Registro {
    fn desde_record(record: &airtable::Record) -> Self {
        Self {
            id: record.id.clone(),
            numero: texto(&record.fields, CAMPO_NUMERO),
            estado: texto(&record.fields, CAMPO_ESTADO),
            seguimiento: texto(&record.fields, CAMPO_SEGUIMIENTO),
            fecha_envio: fecha(&record.fields, CAMPO_FECHA_ENVIO),
            asesor: texto(&record.fields, CAMPO_ASESOR),
            cliente: texto(&record.fields, CAMPO_CLIENTE),
            fecha_cita: fecha(&record.fields, CAMPO_FECHA_CITA),
            fecha_creacion: record.created_time,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn numero(&self) -> Option<&str> {
        self.numero.as_deref()
    }

    fn estado(&self) -> Option<&str> {
        self.estado.as_deref()
    }

    fn seguimiento(&self) -> Option<&str> {
        self.seguimiento.as_deref()
    }

    fn fecha_envio(&self) -> Option<DateTime<Utc>> {
        self.fecha_envio
    }

    fn aplicar_campos(&mut self, campos: &Map<String, Value>) {
        for (nombre, valor) in campos {
            match nombre.as_str() {
                CAMPO_NUMERO => self.numero = valor.as_str().map(String::from),
                CAMPO_ESTADO => self.estado = valor.as_str().map(String::from),
                CAMPO_SEGUIMIENTO => self.seguimiento = valor.as_str().map(String::from),
                CAMPO_FECHA_ENVIO => {
                    self.fecha_envio = valor.as_str().and_then(super::parsear_fecha)
                }
                CAMPO_ASESOR => self.asesor = valor.as_str().map(String::from),
                CAMPO_CLIENTE => self.cliente = valor.as_str().map(String::from),
                CAMPO_FECHA_CITA => {
                    self.fecha_cita = valor.as_str().and_then(super::parsear_fecha)
                }
                _ => {}
            }
        }
    }

    fn campos_buscables(&self) -> Vec<Option<&str>> {
        vec![
            self.seguimiento.as_deref(),
            self.numero.as_deref(),
            self.cliente.as_deref(),
        ]
    }
}

/// Alerta de cita inminente para el panel
#[derive(Debug, Clone, Serialize)]
pub struct AlertaCita {
    pub id: String,
    pub cliente: Option<String>,
    pub asesor: Option<String>,
    pub fecha_cita: DateTime<Utc>,
    pub minutos_restantes: i64,
}

/// Citas que caen dentro de la próxima hora
///
/// Se evalúa sobre el listado en memoria en cada tick del sondeo; las
/// citas ya pasadas no alertan.
pub fn proximas_citas(registros: &[Registro], ahora: DateTime<Utc>) -> Vec<AlertaCita> {
    let ventana = Duration::minutes(VENTANA_ALERTA_MINUTOS);

    let mut alertas: Vec<AlertaCita> = registros
        .iter()
        .filter_map(|r| {
            let cita = r.fecha_cita?;
            if cita < ahora || cita - ahora > ventana {
                return None;
            }
            Some(AlertaCita {
                id: r.id.clone(),
                cliente: r.cliente.clone(),
                asesor: r.asesor.clone(),
                fecha_cita: cita,
                minutos_restantes: (cita - ahora).num_minutes(),
            })
        })
        .collect();

    alertas.sort_by_key(|a| a.fecha_cita);
    alertas
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registro_con_cita(id: &str, cita: Option<&str>) -> Registro {
        let mut fields = json!({"Cliente": "García", "Asesor": "Marta"});
        if let Some(c) = cita {
            fields["Fecha cita"] = json!(c);
        }
        Registro::desde_record(
            &serde_json::from_value(json!({
                "id": id,
                "createdTime": "2024-03-01T09:00:00.000Z",
                "fields": fields
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_proximas_citas_solo_dentro_de_la_ventana() {
        let ahora = "2024-03-04T10:00:00Z".parse().unwrap();
        let registros = vec![
            registro_con_cita("dentro", Some("2024-03-04T10:30:00Z")),
            registro_con_cita("pasada", Some("2024-03-04T09:30:00Z")),
            registro_con_cita("lejana", Some("2024-03-04T12:00:00Z")),
            registro_con_cita("sin_cita", None),
        ];

        let alertas = proximas_citas(&registros, ahora);

        assert_eq!(alertas.len(), 1, "Solo la cita dentro de la próxima hora");
        assert_eq!(alertas[0].id, "dentro");
        assert_eq!(alertas[0].minutos_restantes, 30);
    }

    #[test]
    fn test_proximas_citas_incluye_el_limite_de_la_hora() {
        let ahora = "2024-03-04T10:00:00Z".parse().unwrap();
        let registros = vec![registro_con_cita("limite", Some("2024-03-04T11:00:00Z"))];

        let alertas = proximas_citas(&registros, ahora);

        assert_eq!(alertas.len(), 1);
        assert_eq!(alertas[0].minutos_restantes, 60);
    }

    #[test]
    fn test_proximas_citas_ordenadas_por_proximidad() {
        let ahora = "2024-03-04T10:00:00Z".parse().unwrap();
        let registros = vec![
            registro_con_cita("b", Some("2024-03-04T10:45:00Z")),
            registro_con_cita("a", Some("2024-03-04T10:10:00Z")),
        ];

        let alertas = proximas_citas(&registros, ahora);

        assert_eq!(alertas[0].id, "a");
        assert_eq!(alertas[1].id, "b");
    }
}
