//! Cliente de la API REST de Airtable
//!
//! Este crate cubre lo que el middleware necesita de Airtable como almacén
//! primario:
//!
//! - Listado completo de una tabla con paginación por `offset`
//! - Actualización parcial de campos de un registro (PATCH)
//! - Alta de registros (POST)
//!
//! Los nombres de campo de Airtable son claves de texto libre ("Estado",
//! "Fecha de envío", "Seguimiento", ...). Este crate NO interpreta esos
//! campos: devuelve el mapa `fields` tal cual y la capa de modelos del
//! middleware hace la traducción a campos semánticos.
//!
//! # Ejemplo básico
//!
//! ```rust,ignore
//! use airtable::{AirtableClient, RecordManager};
//!
//! #[tokio::main]
//! async fn main() -> airtable::Result<()> {
//!     let api_token = std::env::var("AIRTABLE_API_TOKEN")
//!         .expect("AIRTABLE_API_TOKEN no configurado");
//!     let base_id = std::env::var("AIRTABLE_BASE_ID")
//!         .expect("AIRTABLE_BASE_ID no configurado");
//!
//!     let client = AirtableClient::new(api_token, base_id)?;
//!     let manager = RecordManager::new(client);
//!
//!     let envios = manager.listar_todos("Envios").await?;
//!     println!("{} envíos", envios.len());
//!     Ok(())
//! }
//! ```

// Módulos públicos
pub mod client;
pub mod error;
pub mod records;

// Re-exports principales
pub use client::AirtableClient;
pub use error::{AirtableError, Result};
pub use records::{Record, RecordManager};
