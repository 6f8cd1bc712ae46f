//! Cliente del almacén auxiliar de recogidas (Supabase / PostgREST)
//!
//! La tabla `recogidas` vive en Supabase y existe únicamente para fechar
//! transiciones relevantes del SLA de envíos; Airtable sigue siendo el
//! almacén primario. Las filas se identifican por el número de seguimiento
//! (solo claves numéricas) y NUNCA se borran: se crean una vez y se
//! completan una vez.
//!
//! Contrato de idempotencia, del que dependen los llamadores:
//!
//! - `asegurar`: upsert por lotes con `on_conflict` + `ignore-duplicates`.
//!   Repetir la llamada con claves ya existentes no crea filas nuevas ni
//!   falla.
//! - `completar_recogida` / `completar_seguimiento`: PATCH filtrado con
//!   `...=is.null`, de modo que una fecha ya puesta no se sobreescribe y
//!   la segunda llamada es un no-op (0 filas afectadas, sin error).
//!
//! Son dos cierres DISTINTOS (SLA de recogida vs SLA de entrega) y pueden
//! dispararse ambos para el mismo número a lo largo de su ciclo de vida.

pub mod client;
pub mod error;

pub use client::{Recogida, RecogidasClient};
pub use error::{RecogidasError, Result};
