//! Cliente HTTP para la API de Airtable

use crate::error::{AirtableError, Result};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const BASE_URL: &str = "https://api.airtable.com/v0";

/// Cliente para interactuar con la API REST de Airtable
///
/// Todas las peticiones van autenticadas con Bearer token y apuntan a una
/// única base (`base_id`). Las tablas se resuelven por nombre en cada
/// operación.
#[derive(Clone)]
pub struct AirtableClient {
    http_client: HttpClient,
    api_token: String,
    base_url: String,
    base_id: String,
}

impl AirtableClient {
    /// Crea un nuevo cliente Airtable
    ///
    /// # Argumentos
    ///
    /// * `api_token` - Personal Access Token de Airtable
    /// * `base_id` - ID de la base (appXXXXXXXXXXXXXX)
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(api_token: impl Into<String>, base_id: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AirtableError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_token: api_token.into(),
            base_url: BASE_URL.to_string(),
            base_id: base_id.into(),
        })
    }

    /// Crea un cliente apuntando a otra URL base (tests / proxies)
    pub fn with_base_url(
        api_token: impl Into<String>,
        base_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let mut client = Self::new(api_token, base_id)?;
        client.base_url = base_url.into();
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.base_url, self.base_id, path)
    }

    /// Ejecuta una petición GET sobre la base
    pub(crate) async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = self.url(path);

        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Ejecuta una petición GET y parsea JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.get(path, query).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Ejecuta una petición PATCH sobre la base
    pub(crate) async fn patch(&self, path: &str, body: &Value) -> Result<Response> {
        let url = self.url(path);

        tracing::debug!("PATCH {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self
            .http_client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Ejecuta una petición PATCH y parsea JSON
    pub(crate) async fn patch_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let response = self.patch(path, body).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Ejecuta una petición POST sobre la base
    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Response> {
        let url = self.url(path);

        tracing::debug!("POST {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Ejecuta una petición POST y parsea JSON
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let response = self.post(path, body).await?;
        let json = response.json().await?;
        Ok(json)
    }

    /// Procesa la respuesta HTTP y trata errores
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else {
            let status_code = status.as_u16();
            let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("Airtable API error ({}): {}", status_code, error_body);

            // Airtable devuelve {"error": {"type": ..., "message": ...}} o
            // {"error": "NOT_FOUND"} según el endpoint
            let message = if let Ok(json) = serde_json::from_str::<Value>(&error_body) {
                json.get("error")
                    .map(|e| {
                        e.get("message")
                            .and_then(|m| m.as_str())
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.to_string())
                    })
                    .unwrap_or(error_body)
            } else {
                error_body
            };

            Err(AirtableError::ApiError {
                status: status_code,
                message,
            })
        }
    }

    /// Obtiene el token de autenticación
    pub fn token(&self) -> &str {
        &self.api_token
    }

    /// Obtiene el ID de la base
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Obtiene la URL base
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
