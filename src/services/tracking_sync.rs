//! Sincronización del almacén auxiliar de recogidas
//!
//! Reconcilia el conjunto "requiere acción" contra la tabla `recogidas`
//! de Supabase en dos momentos:
//!
//! - al refrescar un listado completo: asegura en UN solo lote que existe
//!   fila para cada elemento accionable con número válido
//! - tras confirmar un parche de campos en Airtable: cierra el SLA de
//!   recogida y/o el de entrega según el valor NUEVO de los campos
//!
//! Solo los números puramente numéricos son clave válida del almacén
//! auxiliar; el resto se excluye de la sincronización (invariante de
//! datos, no cosmética).
//!
//! El resultado de cada llamada es un `ResultadoSecundario`, no un
//! `Result`: el almacén primario ya quedó escrito y un fallo aquí se
//! registra y se descarta sin bloquear ni revertir nada. La asimetría con
//! el flujo primario es deliberada y queda a la vista en los tipos.

use crate::models::{ElementoSeguible, CAMPO_ESTADO, CAMPO_SEGUIMIENTO};
use crate::services::sla::{clasificar, Bandeja, ESTADOS_CIERRAN_RECOGIDA, ESTADO_ENTREGADO};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use recogidas::RecogidasClient;
use regex::Regex;
use serde_json::{Map, Value};

static NUMERO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("regex de número"));

/// ¿Es el número una clave válida del almacén auxiliar?
pub fn numero_valido(numero: &str) -> bool {
    NUMERO_RE.is_match(numero)
}

/// Desenlace de una llamada secundaria: se registra, nunca se propaga
#[derive(Debug)]
pub enum ResultadoSecundario {
    Aplicado { operacion: &'static str },
    Omitido { operacion: &'static str, motivo: String },
    Fallo { operacion: &'static str, mensaje: String },
}

impl ResultadoSecundario {
    /// Vuelca el desenlace al log; único destino previsto de este tipo
    pub fn registrar(&self) {
        match self {
            ResultadoSecundario::Aplicado { operacion } => {
                tracing::info!("✅ Sincronización {}: aplicada", operacion);
            }
            ResultadoSecundario::Omitido { operacion, motivo } => {
                tracing::debug!("Sincronización {}: omitida ({})", operacion, motivo);
            }
            ResultadoSecundario::Fallo { operacion, mensaje } => {
                // Fallo best-effort: el parche primario ya está confirmado
                tracing::warn!("⚠️ Sincronización {}: falló ({}) - se continúa sin reintento", operacion, mensaje);
            }
        }
    }
}

/// Servicio de reconciliación contra la tabla `recogidas`
#[derive(Clone)]
pub struct TrackingSync {
    cliente: RecogidasClient,
}

impl TrackingSync {
    pub fn new(cliente: RecogidasClient) -> Self {
        Self { cliente }
    }

    /// Asegura fila de recogida para todo elemento accionable del listado
    ///
    /// Se invoca en cada refresco completo; el lote puede solaparse con el
    /// del refresco anterior sin problema (upsert idempotente en el
    /// servidor).
    pub async fn asegurar_accion_requerida<E: ElementoSeguible>(
        &self,
        items: &[E],
        ahora: DateTime<Utc>,
    ) -> ResultadoSecundario {
        const OPERACION: &str = "asegurar_recogidas";

        let numeros: Vec<String> = items
            .iter()
            .filter(|item| clasificar(*item, ahora) == Bandeja::RequiereAccion)
            .filter_map(|item| item.numero())
            .filter(|numero| numero_valido(numero))
            .map(String::from)
            .collect();

        if numeros.is_empty() {
            return ResultadoSecundario::Omitido {
                operacion: OPERACION,
                motivo: "sin elementos accionables con número válido".to_string(),
            };
        }

        match self.cliente.asegurar(&numeros).await {
            Ok(()) => ResultadoSecundario::Aplicado { operacion: OPERACION },
            Err(e) => ResultadoSecundario::Fallo {
                operacion: OPERACION,
                mensaje: e.to_string(),
            },
        }
    }

    /// Cierres de SLA tras un parche confirmado en Airtable
    ///
    /// Mira solo el valor NUEVO de los campos del parche (sin diff contra
    /// el valor anterior): re-guardar un estado terminal re-dispara el
    /// cierre, que en el almacén auxiliar es un no-op por contrato.
    ///
    /// - estado en `ESTADOS_CIERRAN_RECOGIDA` o seguimiento recién puesto a
    ///   cualquier valor no vacío → cierra el SLA de recogida
    /// - estado `Entregado` → cierra además el SLA de entrega
    pub async fn tras_actualizacion(
        &self,
        numero: Option<&str>,
        campos: &Map<String, Value>,
    ) -> Vec<ResultadoSecundario> {
        let nuevo_estado = campos.get(CAMPO_ESTADO).and_then(|v| v.as_str());
        let nuevo_seguimiento = campos.get(CAMPO_SEGUIMIENTO).and_then(|v| v.as_str());

        let cierra_recogida = nuevo_estado
            .map(|estado| ESTADOS_CIERRAN_RECOGIDA.contains(&estado))
            .unwrap_or(false)
            || nuevo_seguimiento.map(|s| !s.is_empty()).unwrap_or(false);

        let cierra_entrega = nuevo_estado == Some(ESTADO_ENTREGADO);

        if !cierra_recogida && !cierra_entrega {
            return Vec::new();
        }

        let numero = match numero {
            Some(n) if numero_valido(n) => n,
            _ => {
                return vec![ResultadoSecundario::Omitido {
                    operacion: "completar",
                    motivo: "número ausente o no numérico".to_string(),
                }]
            }
        };

        let mut resultados = Vec::new();

        if cierra_recogida {
            resultados.push(match self.cliente.completar_recogida(numero).await {
                Ok(()) => ResultadoSecundario::Aplicado { operacion: "completar_recogida" },
                Err(e) => ResultadoSecundario::Fallo {
                    operacion: "completar_recogida",
                    mensaje: e.to_string(),
                },
            });
        }

        if cierra_entrega {
            resultados.push(match self.cliente.completar_seguimiento(numero).await {
                Ok(()) => ResultadoSecundario::Aplicado { operacion: "completar_seguimiento" },
                Err(e) => ResultadoSecundario::Fallo {
                    operacion: "completar_seguimiento",
                    mensaje: e.to_string(),
                },
            });
        }

        resultados
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Envio;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn sync(server: &MockServer) -> TrackingSync {
        TrackingSync::new(RecogidasClient::new(server.base_url(), "anon").unwrap())
    }

    fn envio(numero: Option<&str>, estado: &str, fecha_envio: Option<&str>) -> Envio {
        Envio {
            id: "recTEST".to_string(),
            numero: numero.map(String::from),
            estado: Some(estado.to_string()),
            seguimiento: None,
            fecha_envio: fecha_envio.map(|f| f.parse().unwrap()),
            producto: None,
            cliente: None,
            fecha_creacion: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_numero_valido_solo_digitos() {
        assert!(numero_valido("123"));
        assert!(numero_valido("0042"));
        assert!(!numero_valido(""));
        assert!(!numero_valido("AB-123"));
        assert!(!numero_valido("12 3"));
    }

    #[tokio::test]
    async fn test_asegurar_filtra_bandeja_y_numeros_invalidos() {
        let server = MockServer::start();
        // Solo el accionable con número numérico debe viajar en el lote
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/recogidas")
                .json_body(json!([{"numero_seguimiento": "123"}]));
            then.status(201);
        });

        // Lunes 2024-03-04 + 72 horas hábiles → jueves
        let ahora = "2024-03-07T09:00:00Z".parse().unwrap();
        let items = vec![
            envio(Some("123"), "Pendiente recogida", Some("2024-03-04T09:00:00Z")),
            envio(Some("AB-1"), "Pendiente recogida", Some("2024-03-04T09:00:00Z")),
            envio(Some("456"), "Pendiente recogida", Some("2024-03-06T09:00:00Z")),
            envio(Some("789"), "Entregado", Some("2024-03-04T09:00:00Z")),
        ];

        let resultado = sync(&server).asegurar_accion_requerida(&items, ahora).await;

        mock.assert();
        assert!(matches!(resultado, ResultadoSecundario::Aplicado { .. }));
    }

    #[tokio::test]
    async fn test_asegurar_sin_accionables_no_llama_a_la_api() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/recogidas");
            then.status(201);
        });

        let ahora = "2024-03-07T09:00:00Z".parse().unwrap();
        let items = vec![envio(Some("789"), "Entregado", Some("2024-03-04T09:00:00Z"))];

        let resultado = sync(&server).asegurar_accion_requerida(&items, ahora).await;

        mock.assert_hits(0);
        assert!(matches!(resultado, ResultadoSecundario::Omitido { .. }));
    }

    #[tokio::test]
    async fn test_estado_entregado_cierra_solo_el_sla_de_entrega() {
        let server = MockServer::start();
        let entrega = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/recogidas")
                .query_param("numero_seguimiento", "eq.456")
                .query_param("fecha_seguimiento", "is.null");
            then.status(204);
        });
        let recogida = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/recogidas")
                .query_param("fecha_gestion", "is.null");
            then.status(204);
        });

        let mut campos = Map::new();
        campos.insert(CAMPO_ESTADO.to_string(), json!("Entregado"));

        let resultados = sync(&server).tras_actualizacion(Some("456"), &campos).await;

        entrega.assert();
        recogida.assert_hits(0);
        assert_eq!(resultados.len(), 1);
        assert!(matches!(resultados[0], ResultadoSecundario::Aplicado { operacion: "completar_seguimiento" }));
    }

    #[tokio::test]
    async fn test_recogida_hecha_cierra_el_sla_de_recogida() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/recogidas")
                .query_param("numero_seguimiento", "eq.123")
                .query_param("fecha_gestion", "is.null");
            then.status(204);
        });

        let mut campos = Map::new();
        campos.insert(CAMPO_ESTADO.to_string(), json!("Recogida hecha"));

        let resultados = sync(&server).tras_actualizacion(Some("123"), &campos).await;

        mock.assert();
        assert_eq!(resultados.len(), 1);
    }

    #[tokio::test]
    async fn test_seguimiento_no_vacio_cierra_el_sla_de_recogida() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/recogidas")
                .query_param("fecha_gestion", "is.null");
            then.status(204);
        });

        let mut campos = Map::new();
        campos.insert(CAMPO_SEGUIMIENTO.to_string(), json!("Email enviado"));

        let resultados = sync(&server).tras_actualizacion(Some("123"), &campos).await;

        mock.assert();
        assert!(matches!(resultados[0], ResultadoSecundario::Aplicado { operacion: "completar_recogida" }));
    }

    #[tokio::test]
    async fn test_numero_no_numerico_omite_sin_red() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/rest/v1/recogidas");
            then.status(204);
        });

        let mut campos = Map::new();
        campos.insert(CAMPO_ESTADO.to_string(), json!("Entregado"));

        let resultados = sync(&server).tras_actualizacion(Some("AB-9"), &campos).await;

        mock.assert_hits(0);
        assert!(matches!(resultados[0], ResultadoSecundario::Omitido { .. }));
    }

    #[tokio::test]
    async fn test_parche_sin_campos_relevantes_no_hace_nada() {
        let server = MockServer::start();

        let mut campos = Map::new();
        campos.insert("Producto".to_string(), json!("Caldera"));

        let resultados = sync(&server).tras_actualizacion(Some("123"), &campos).await;

        assert!(resultados.is_empty());
    }

    #[tokio::test]
    async fn test_fallo_del_almacen_se_degrada_a_resultado() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PATCH).path("/rest/v1/recogidas");
            then.status(500).json_body(json!({"message": "boom"}));
        });

        let mut campos = Map::new();
        campos.insert(CAMPO_ESTADO.to_string(), json!("Entregado"));

        let resultados = sync(&server).tras_actualizacion(Some("123"), &campos).await;

        // Nada que propagar: el fallo queda encapsulado para el log
        assert!(matches!(resultados[0], ResultadoSecundario::Fallo { .. }));
    }
}
