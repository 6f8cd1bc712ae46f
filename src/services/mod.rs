pub mod informes;
pub mod listado;
pub mod sla;
pub mod tracking_sync;

pub use listado::{Bandejas, ListadoController, ResultadoActualizacion, INTERVALO_SONDEO_SEGUNDOS};
pub use tracking_sync::{ResultadoSecundario, TrackingSync};
