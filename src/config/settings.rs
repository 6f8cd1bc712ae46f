use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub airtable: AirtableSettings,
    pub supabase: SupabaseSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AirtableSettings {
    pub token: String,
    pub base_id: String,
    pub tabla_envios: String,
    pub tabla_registros: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Archivo de configuración base
            .add_source(File::with_name("config/default").required(false))
            // Archivo específico del entorno
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Credenciales por variable de entorno (nunca en los .toml del repo)
        if let Ok(token) = std::env::var("AIRTABLE_API_TOKEN") {
            builder = builder.set_override("airtable.token", token)?;
        }
        if let Ok(base_id) = std::env::var("AIRTABLE_BASE_ID") {
            builder = builder.set_override("airtable.base_id", base_id)?;
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            builder = builder.set_override("supabase.url", url)?;
        }
        if let Ok(api_key) = std::env::var("SUPABASE_API_KEY") {
            builder = builder.set_override("supabase.api_key", api_key)?;
        }

        // Prefijo genérico para el resto de ajustes
        builder = builder.add_source(Environment::with_prefix("SAT_OPERACIONES"));

        let s = builder.build()?;

        s.try_deserialize()
    }
}
