// ============================================================================
// Record Manager - Operaciones sobre registros de Airtable
// ============================================================================
//
// Encapsula las tres operaciones que consume el middleware:
//
// 1. listar_todos: lectura completa de una tabla siguiendo el cursor
//    `offset` que devuelve la API (Airtable pagina de 100 en 100)
// 2. actualizar_campos: PATCH parcial de un registro por id
// 3. crear: alta de un registro nuevo
//
// Los campos viajan como mapa JSON libre; la traducción a tipos del
// dominio es responsabilidad de la capa de modelos del middleware.

use crate::client::AirtableClient;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Tamaño de página que pedimos a Airtable (máximo permitido por la API)
const PAGE_SIZE: &str = "100";

/// Un registro de Airtable tal y como lo devuelve la API
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Lee un campo de texto por su nombre libre ("Estado", "Seguimiento", ...)
    pub fn texto(&self, campo: &str) -> Option<String> {
        self.fields
            .get(campo)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Respuesta paginada del endpoint de listado
#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<Record>,
    offset: Option<String>,
}

/// Gestor de registros sobre una base de Airtable
///
/// Implementa `Clone` y puede compartirse entre tareas vía `Arc<>`.
#[derive(Clone)]
pub struct RecordManager {
    client: AirtableClient,
}

impl RecordManager {
    pub fn new(client: AirtableClient) -> Self {
        Self { client }
    }

    /// Crea un RecordManager a partir de credenciales (conveniencia)
    pub fn from_credentials(api_token: String, base_id: String) -> Result<Self> {
        let client = AirtableClient::new(api_token, base_id)?;
        Ok(Self::new(client))
    }

    fn tabla_path(tabla: &str) -> String {
        format!("/{}", urlencoding::encode(tabla))
    }

    /// Lista TODOS los registros de una tabla siguiendo la paginación
    ///
    /// Airtable devuelve un cursor `offset` mientras queden páginas; la
    /// lectura termina cuando la respuesta llega sin cursor.
    pub async fn listar_todos(&self, tabla: &str) -> Result<Vec<Record>> {
        let path = Self::tabla_path(tabla);
        let mut registros = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![("pageSize", PAGE_SIZE)];
            if let Some(ref cursor) = offset {
                query.push(("offset", cursor.as_str()));
            }

            let pagina: ListResponse = self.client.get_json(&path, &query).await?;
            registros.extend(pagina.records);

            match pagina.offset {
                Some(cursor) => offset = Some(cursor),
                None => break,
            }
        }

        tracing::debug!("Tabla '{}': {} registros leídos", tabla, registros.len());

        Ok(registros)
    }

    /// Actualiza campos de un registro (PATCH parcial)
    ///
    /// Solo toca los campos incluidos en `campos`; el resto del registro
    /// queda intacto. Devuelve el registro ya actualizado por la API.
    pub async fn actualizar_campos(
        &self,
        tabla: &str,
        id: &str,
        campos: &Map<String, Value>,
    ) -> Result<Record> {
        let path = format!("{}/{}", Self::tabla_path(tabla), id);
        let body = json!({ "fields": campos });

        let registro: Record = self.client.patch_json(&path, &body).await?;

        tracing::debug!("Registro {} actualizado en '{}'", id, tabla);

        Ok(registro)
    }

    /// Crea un registro nuevo en la tabla
    pub async fn crear(&self, tabla: &str, campos: &Map<String, Value>) -> Result<Record> {
        let path = Self::tabla_path(tabla);
        let body = json!({ "fields": campos });

        let registro: Record = self.client.post_json(&path, &body).await?;

        tracing::debug!("Registro {} creado en '{}'", registro.id, tabla);

        Ok(registro)
    }

    /// Comprueba la conectividad contra la base (lee una página de 1)
    pub async fn test_connection(&self, tabla: &str) -> Result<()> {
        let path = Self::tabla_path(tabla);
        let _: ListResponse = self.client.get_json(&path, &[("pageSize", "1")]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AirtableClient;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;

    fn manager(server: &MockServer) -> RecordManager {
        let client = AirtableClient::with_base_url("tok", "appTEST", server.base_url()).unwrap();
        RecordManager::new(client)
    }

    #[tokio::test]
    async fn test_listar_todos_sigue_paginacion() {
        let server = MockServer::start();

        // httpmock resuelve al primer mock que casa (orden de creación):
        // el de la segunda página va primero por ser el más específico
        let segunda = server.mock(|when, then| {
            when.method(GET)
                .path("/appTEST/Envios")
                .query_param("offset", "itrCURSOR");
            then.status(200).json_body(serde_json::json!({
                "records": [
                    {"id": "rec3", "createdTime": "2024-03-01T12:00:00.000Z", "fields": {"Estado": "Entregado"}}
                ]
            }));
        });

        let primera = server.mock(|when, then| {
            when.method(GET)
                .path("/appTEST/Envios")
                .query_param("pageSize", "100");
            then.status(200).json_body(serde_json::json!({
                "records": [
                    {"id": "rec1", "createdTime": "2024-03-01T10:00:00.000Z", "fields": {"Estado": "Pendiente recogida"}},
                    {"id": "rec2", "createdTime": "2024-03-01T11:00:00.000Z", "fields": {}}
                ],
                "offset": "itrCURSOR"
            }));
        });

        let registros = manager(&server).listar_todos("Envios").await.unwrap();

        primera.assert();
        segunda.assert();
        assert_eq!(registros.len(), 3, "Debe acumular las dos páginas");
        assert_eq!(registros[0].texto("Estado").as_deref(), Some("Pendiente recogida"));
        assert_eq!(registros[1].texto("Estado"), None, "Campo ausente debe ser None");
    }

    #[tokio::test]
    async fn test_actualizar_campos_envia_patch_parcial() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/appTEST/Envios/rec1")
                .json_body(serde_json::json!({"fields": {"Estado": "Entregado"}}));
            then.status(200).json_body(serde_json::json!({
                "id": "rec1",
                "createdTime": "2024-03-01T10:00:00.000Z",
                "fields": {"Estado": "Entregado", "Número de seguimiento": "123"}
            }));
        });

        let mut campos = Map::new();
        campos.insert("Estado".to_string(), serde_json::json!("Entregado"));

        let registro = manager(&server)
            .actualizar_campos("Envios", "rec1", &campos)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(registro.texto("Estado").as_deref(), Some("Entregado"));
    }

    #[tokio::test]
    async fn test_error_api_expone_mensaje() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/appTEST/Envios");
            then.status(422).json_body(serde_json::json!({
                "error": {"type": "INVALID_REQUEST", "message": "Unknown field name"}
            }));
        });

        let err = manager(&server).listar_todos("Envios").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("422"), "Debe incluir el status: {}", msg);
        assert!(msg.contains("Unknown field name"), "Debe incluir el mensaje de la API: {}", msg);
    }
}
