//! Tipos de error para el crate airtable

use thiserror::Error;

/// Errores del cliente Airtable
#[derive(Debug, Error)]
pub enum AirtableError {
    /// Error de petición HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error de la API de Airtable (status code no-2xx)
    #[error("Airtable API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Error de parseo JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Registro no encontrado
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Error de configuración
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Tipo Result estándar para el crate
pub type Result<T> = std::result::Result<T, AirtableError>;
