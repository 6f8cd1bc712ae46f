pub mod dashboard;
pub mod envios;
pub mod health;
pub mod registros;

pub use dashboard::casos_gestionados_24h;
pub use envios::{actualizar_envio, listar_envios, refrescar_envios};
pub use health::{health_check, ready_check, status_check};
pub use registros::{actualizar_registro, alertas_citas, listar_registros, refrescar_registros};
