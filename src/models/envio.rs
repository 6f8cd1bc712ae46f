//! Envío: registro de la tabla de envíos de Airtable

use super::{fecha, texto, ElementoSeguible};
use super::{CAMPO_CLIENTE, CAMPO_ESTADO, CAMPO_FECHA_ENVIO, CAMPO_NUMERO, CAMPO_PRODUCTO, CAMPO_SEGUIMIENTO};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Un envío tal y como lo maneja el panel
///
/// `id` lo posee Airtable y es inmutable; `estado` y `seguimiento` son
/// texto libre con valores bien conocidos (ver `services::sla`).
#[derive(Debug, Clone, Serialize)]
pub struct Envio {
    pub id: String,
    pub numero: Option<String>,
    pub estado: Option<String>,
    pub seguimiento: Option<String>,
    pub fecha_envio: Option<DateTime<Utc>>,
    pub producto: Option<String>,
    pub cliente: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}

impl ElementoSeguible for Envio {
    fn desde_record(record: &airtable::Record) -> Self {
        Self {
            id: record.id.clone(),
            numero: texto(&record.fields, CAMPO_NUMERO),
            estado: texto(&record.fields, CAMPO_ESTADO),
            seguimiento: texto(&record.fields, CAMPO_SEGUIMIENTO),
            fecha_envio: fecha(&record.fields, CAMPO_FECHA_ENVIO),
            producto: texto(&record.fields, CAMPO_PRODUCTO),
            cliente: texto(&record.fields, CAMPO_CLIENTE),
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
                CAMPO_PRODUCTO => self.producto = valor.as_str().map(String::from),
                CAMPO_CLIENTE => self.cliente = valor.as_str().map(String::from),
                // Campos que el panel no modela: se ignoran (quedan en Airtable)
                _ => {}
            }
        }
    }

    fn campos_buscables(&self) -> Vec<Option<&str>> {
        vec![
            self.seguimiento.as_deref(),
            self.numero.as_deref(),
            self.producto.as_deref(),
        ]
    }
}
