//! Tipos de error para el crate recogidas

use thiserror::Error;

/// Errores del cliente del almacén auxiliar
#[derive(Debug, Error)]
pub enum RecogidasError {
    /// Error de petición HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Error de PostgREST (status code no-2xx)
    #[error("Supabase API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Error de parseo JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error de configuración
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Tipo Result estándar para el crate
pub type Result<T> = std::result::Result<T, RecogidasError>;
