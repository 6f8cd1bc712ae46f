//! Cliente HTTP para la tabla `recogidas` vía PostgREST

use crate::error::{RecogidasError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client as HttpClient, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration as StdDuration;

const TABLA: &str = "recogidas";

/// Una fila del almacén auxiliar
#[derive(Debug, Clone, Deserialize)]
pub struct Recogida {
    pub numero_seguimiento: String,
    pub creada_en: DateTime<Utc>,
    pub fecha_gestion: Option<DateTime<Utc>>,
    pub fecha_seguimiento: Option<DateTime<Utc>>,
}

/// Cliente PostgREST del almacén auxiliar de recogidas
///
/// Implementa `Clone` y puede compartirse entre tareas vía `Arc<>`.
#[derive(Clone)]
pub struct RecogidasClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl RecogidasClient {
    /// Crea un nuevo cliente
    ///
    /// # Argumentos
    ///
    /// * `base_url` - URL del proyecto Supabase (https://xxxx.supabase.co)
    /// * `api_key` - anon/service key; viaja como `apikey` y como Bearer
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(StdDuration::from_secs(30))
            .connect_timeout(StdDuration::from_secs(5))
            .build()
            .map_err(|e| RecogidasError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn url(&self, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, TABLA)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, TABLA, query)
        }
    }

    /// Asegura que existe una fila por cada número del lote (upsert)
    ///
    /// Llamada segura de repetir con lotes solapados: los duplicados se
    /// descartan en el servidor (`resolution=ignore-duplicates`) sin crear
    /// segundas filas ni devolver error.
    pub async fn asegurar(&self, numeros: &[String]) -> Result<()> {
        if numeros.is_empty() {
            return Ok(());
        }

        let filas: Vec<_> = numeros
            .iter()
            .map(|n| json!({ "numero_seguimiento": n }))
            .collect();

        let url = self.url("on_conflict=numero_seguimiento");

        tracing::debug!("POST {} ({} números)", url, numeros.len());

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(&filas)
            .send()
            .await?;

        self.handle_response(response).await?;

        tracing::info!("Aseguradas {} filas de recogida en el almacén auxiliar", numeros.len());

        Ok(())
    }

    /// Fecha la gestión de la recogida (SLA de recogida)
    ///
    /// El filtro `fecha_gestion=is.null` hace el cierre monotónico: si la
    /// fecha ya estaba puesta el PATCH afecta a 0 filas y la llamada es un
    /// no-op, nunca una sobreescritura.
    pub async fn completar_recogida(&self, numero: &str) -> Result<()> {
        self.completar(numero, "fecha_gestion").await
    }

    /// Fecha el cierre del seguimiento de entrega (SLA de entrega)
    ///
    /// Cierre independiente de `completar_recogida`: ambos pueden
    /// dispararse para el mismo número y fechan columnas distintas.
    pub async fn completar_seguimiento(&self, numero: &str) -> Result<()> {
        self.completar(numero, "fecha_seguimiento").await
    }

    async fn completar(&self, numero: &str, columna: &str) -> Result<()> {
        let query = format!(
            "numero_seguimiento=eq.{}&{}=is.null",
            urlencoding::encode(numero),
            columna
        );
        let url = self.url(&query);
        let body = json!({ columna: Utc::now().to_rfc3339() });

        tracing::debug!("PATCH {} ({})", url, columna);

        let response = self
            .http_client
            .patch(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await?;

        tracing::info!("Recogida {}: columna {} completada (o ya fechada)", numero, columna);

        Ok(())
    }

    /// Lee las filas creadas en los últimos 7 días (consulta de informes)
    ///
    /// Solo lectura; el agregado del panel ("casos gestionados en 24h") se
    /// calcula en el middleware sobre estas filas.
    pub async fn listar_ultima_semana(&self) -> Result<Vec<Recogida>> {
        let desde = (Utc::now() - Duration::days(7)).to_rfc3339();
        let query = format!(
            "select=numero_seguimiento,creada_en,fecha_gestion,fecha_seguimiento&creada_en=gte.{}",
            urlencoding::encode(&desde)
        );
        let url = self.url(&query);

        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let response = self.handle_response(response).await?;
        let filas = response.json().await?;
        Ok(filas)
    }

    /// Procesa la respuesta HTTP y trata errores
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let status_code = status.as_u16();
            let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("Supabase API error ({}): {}", status_code, error_body);

            // PostgREST devuelve {"message": ..., "code": ...}
            let message = if let Ok(json) = serde_json::from_str::<serde_json::Value>(&error_body) {
                json.get("message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
                    .unwrap_or(error_body)
            } else {
                error_body
            };

            Err(RecogidasError::ApiError {
                status: status_code,
                message,
            })
        }
    }

    /// Obtiene la URL base configurada
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
