//! Clasificación de SLA por horas hábiles
//!
//! Reglas compartidas por las pantallas de envíos y de registros. Los
//! umbrales y valores centinela viven aquí como constantes con nombre:
//! antes estaban duplicados pantalla por pantalla.
//!
//! El reloj de horas hábiles cuenta TODAS las horas de lunes a viernes
//! (también las nocturnas) y solo descarta sábados y domingos; no mira
//! festivos. Los umbrales de SLA en producción están calibrados contra
//! este recuento, así que el algoritmo se conserva tal cual.

use crate::models::ElementoSeguible;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::Serialize;
use std::cmp::Ordering;

/// Horas hábiles a partir de las cuales un elemento pasa a requerir acción
/// (estrictamente mayor, la hora 48 exacta sigue en espera)
pub const UMBRAL_HORAS_HABILES: i64 = 48;

/// Valor centinela del campo Seguimiento: ya se avisó al destinatario y el
/// elemento no vuelve a requerir acción por tiempo transcurrido
pub const SEGUIMIENTO_EMAIL_ENVIADO: &str = "Email enviado";

/// Estados terminales: fuera de ambas bandejas y sin más escrituras en el
/// almacén auxiliar
pub const ESTADOS_TERMINALES: [&str; 3] = ["Entregado", "Devuelto", "Recogida hecha"];

/// Estados que cierran el SLA de recogida en el almacén auxiliar
pub const ESTADOS_CIERRAN_RECOGIDA: [&str; 2] = ["Recogida enviada", "Recogida hecha"];

/// Estado que cierra el SLA de entrega en el almacén auxiliar
pub const ESTADO_ENTREGADO: &str = "Entregado";

/// Bandeja de SLA en la que cae un elemento activo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bandeja {
    /// Estado terminal: el elemento no está en ninguna bandeja
    Ninguna,
    /// Lleva más del umbral de horas hábiles sin seguimiento
    RequiereAccion,
    /// Activo pero aún dentro de plazo (o ya avisado, o sin expedir)
    EnEspera,
}

/// Horas hábiles transcurridas entre dos instantes
///
/// Avanza de hora en hora desde `desde`; cada paso cuenta si el día del
/// instante ACTUAL es de lunes a viernes. Las horas de fin de semana
/// avanzan el reloj sin sumar. Con `desde >= hasta` devuelve 0.
pub fn horas_habiles(desde: DateTime<Utc>, hasta: DateTime<Utc>) -> i64 {
    let mut horas = 0;
    let mut actual = desde;

    while actual < hasta {
        match actual.weekday() {
            Weekday::Sat | Weekday::Sun => {}
            _ => horas += 1,
        }
        actual += Duration::hours(1);
    }

    horas
}

/// Clasifica un elemento en su bandeja de SLA
///
/// Orden de las reglas (la primera que aplica gana):
/// 1. estado terminal → `Ninguna`
/// 2. seguimiento "Email enviado" → `EnEspera`, da igual el tiempo
/// 3. sin fecha de envío → `EnEspera` (nada que medir todavía)
/// 4. horas hábiles desde el envío: `> 48` → `RequiereAccion`, si no `EnEspera`
pub fn clasificar<E: ElementoSeguible>(item: &E, ahora: DateTime<Utc>) -> Bandeja {
    if let Some(estado) = item.estado() {
        if ESTADOS_TERMINALES.contains(&estado) {
            return Bandeja::Ninguna;
        }
    }

    if item.seguimiento() == Some(SEGUIMIENTO_EMAIL_ENVIADO) {
        return Bandeja::EnEspera;
    }

    let fecha_envio = match item.fecha_envio() {
        Some(fecha) => fecha,
        None => return Bandeja::EnEspera,
    };

    if horas_habiles(fecha_envio, ahora) > UMBRAL_HORAS_HABILES {
        Bandeja::RequiereAccion
    } else {
        Bandeja::EnEspera
    }
}

/// Filtro de búsqueda libre sobre los campos buscables del elemento
///
/// Subcadena sin distinguir mayúsculas; los campos ausentes se normalizan
/// a cadena vacía, con lo que el término vacío casa con todo.
pub fn coincide_busqueda<E: ElementoSeguible>(item: &E, termino: &str) -> bool {
    let termino = termino.to_lowercase();

    item.campos_buscables()
        .iter()
        .any(|campo| campo.unwrap_or("").to_lowercase().contains(&termino))
}

/// Comparación natural de números de seguimiento ("9" antes que "10"),
/// sin distinguir mayúsculas en los tramos no numéricos
pub fn orden_natural(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let na = tomar_digitos(&mut ca);
                    let nb = tomar_digitos(&mut cb);
                    // Sin ceros a la izquierda: primero por longitud, luego lexicográfico
                    let sa = na.trim_start_matches('0');
                    let sb = nb.trim_start_matches('0');
                    let orden = sa
                        .len()
                        .cmp(&sb.len())
                        .then_with(|| sa.cmp(sb))
                        .then_with(|| na.len().cmp(&nb.len()));
                    if orden != Ordering::Equal {
                        return orden;
                    }
                } else {
                    let orden = x.cmp(&y);
                    if orden != Ordering::Equal {
                        return orden;
                    }
                    ca.next();
                    cb.next();
                }
            }
        }
    }
}

fn tomar_digitos(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Ordena un listado por número de seguimiento en orden natural ascendente
pub fn ordenar_por_numero<E: ElementoSeguible>(items: &mut [E]) {
    items.sort_by(|a, b| orden_natural(a.numero().unwrap_or(""), b.numero().unwrap_or("")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Envio;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn envio(numero: Option<&str>, estado: Option<&str>, seguimiento: Option<&str>, fecha_envio: Option<&str>) -> Envio {
        Envio {
            id: "recTEST".to_string(),
            numero: numero.map(String::from),
            estado: estado.map(String::from),
            seguimiento: seguimiento.map(String::from),
            fecha_envio: fecha_envio.map(ts),
            producto: None,
            cliente: None,
            fecha_creacion: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    // --- horas_habiles ---------------------------------------------------

    #[test]
    fn test_intervalo_vacio_son_cero_horas() {
        let t = ts("2024-03-04T10:00:00Z");
        assert_eq!(horas_habiles(t, t), 0);
        // desde > hasta tampoco cuenta nada
        assert_eq!(horas_habiles(ts("2024-03-05T10:00:00Z"), t), 0);
    }

    #[test]
    fn test_sabado_entero_son_cero_horas() {
        // 2024-03-09 es sábado
        assert_eq!(
            horas_habiles(ts("2024-03-09T02:00:00Z"), ts("2024-03-09T22:00:00Z")),
            0
        );
    }

    #[test]
    fn test_una_hora_de_lunes() {
        // 2024-03-04 es lunes
        assert_eq!(
            horas_habiles(ts("2024-03-04T00:00:00Z"), ts("2024-03-04T01:00:00Z")),
            1
        );
    }

    #[test]
    fn test_viernes_noche_a_sabado_solo_cuenta_el_viernes() {
        // 2024-03-08 viernes 23:00 → 2024-03-09 sábado 01:00
        assert_eq!(
            horas_habiles(ts("2024-03-08T23:00:00Z"), ts("2024-03-09T01:00:00Z")),
            1
        );
    }

    #[test]
    fn test_fin_de_semana_avanza_sin_sumar() {
        // Viernes 12:00 → lunes 12:00: 12h de viernes + 12h de lunes
        assert_eq!(
            horas_habiles(ts("2024-03-08T12:00:00Z"), ts("2024-03-11T12:00:00Z")),
            24
        );
    }

    // --- clasificar ------------------------------------------------------

    #[test]
    fn test_estado_terminal_no_cae_en_ninguna_bandeja() {
        let ahora = ts("2024-03-20T10:00:00Z");
        for estado in ESTADOS_TERMINALES {
            // Envío viejísimo y sin seguimiento: daría RequiereAccion si no
            // fuera terminal
            let e = envio(Some("1"), Some(estado), None, Some("2024-03-04T00:00:00Z"));
            assert_eq!(clasificar(&e, ahora), Bandeja::Ninguna, "estado {}", estado);
        }
    }

    #[test]
    fn test_email_enviado_siempre_en_espera() {
        // Más de 100 horas hábiles desde el envío
        let e = envio(
            Some("1"),
            Some("Pendiente recogida"),
            Some(SEGUIMIENTO_EMAIL_ENVIADO),
            Some("2024-03-04T00:00:00Z"),
        );
        assert_eq!(clasificar(&e, ts("2024-03-20T10:00:00Z")), Bandeja::EnEspera);
    }

    #[test]
    fn test_sin_fecha_de_envio_en_espera() {
        let e = envio(Some("1"), Some("Pendiente recogida"), None, None);
        assert_eq!(clasificar(&e, ts("2024-03-20T10:00:00Z")), Bandeja::EnEspera);
    }

    #[test]
    fn test_umbral_de_48_horas_es_estricto() {
        // Lunes 00:00 → miércoles 00:00 son exactamente 48 horas hábiles
        let e = envio(Some("1"), Some("Pendiente recogida"), None, Some("2024-03-04T00:00:00Z"));
        assert_eq!(
            clasificar(&e, ts("2024-03-06T00:00:00Z")),
            Bandeja::EnEspera,
            "A las 48 horas exactas sigue en espera"
        );
        assert_eq!(
            clasificar(&e, ts("2024-03-06T01:00:00Z")),
            Bandeja::RequiereAccion,
            "A las 49 pasa a requerir acción"
        );
    }

    #[test]
    fn test_tres_dias_laborables_requieren_accion() {
        // Lunes → jueves: 72 horas hábiles
        let e = envio(Some("123"), Some("Pendiente recogida"), None, Some("2024-03-04T09:00:00Z"));
        assert_eq!(clasificar(&e, ts("2024-03-07T09:00:00Z")), Bandeja::RequiereAccion);
    }

    // --- búsqueda y orden ------------------------------------------------

    #[test]
    fn test_busqueda_vacia_casa_con_todo() {
        let e = envio(None, None, None, None);
        assert!(coincide_busqueda(&e, ""));
    }

    #[test]
    fn test_busqueda_por_subcadena_sin_mayusculas() {
        let mut e = envio(Some("AB-9921"), Some("Pendiente recogida"), None, None);
        e.producto = Some("Termo Eléctrico".to_string());

        assert!(coincide_busqueda(&e, "ab-99"));
        assert!(coincide_busqueda(&e, "termo elé"));
        assert!(!coincide_busqueda(&e, "caldera"));
    }

    #[test]
    fn test_orden_natural_numerico() {
        assert_eq!(orden_natural("9", "10"), Ordering::Less);
        assert_eq!(orden_natural("100", "20"), Ordering::Greater);
        assert_eq!(orden_natural("abc", "ABD"), Ordering::Less);
        assert_eq!(orden_natural("env-9", "ENV-10"), Ordering::Less);
    }

    #[test]
    fn test_ordenar_por_numero_deja_ausentes_primero() {
        let mut items = vec![
            envio(Some("10"), None, None, None),
            envio(None, None, None, None),
            envio(Some("9"), None, None, None),
        ];
        ordenar_por_numero(&mut items);

        let numeros: Vec<Option<&str>> = items.iter().map(|e| e.numero.as_deref()).collect();
        assert_eq!(numeros, vec![None, Some("9"), Some("10")]);
    }
}
