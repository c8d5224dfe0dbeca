//! Leituras únicas da partida e nome do arquivo de log.

use chrono::{DateTime, Local};
use tap_core::catalog::Catalog;
use tap_core::decoder::char_run;
use tap_core::source::RegisterSource;
use tracing::{info, warn};

/// O que se sabe do equipamento antes da ponte começar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupInfo {
    pub system_voltage: Option<u16>,
    pub product_id: Option<String>,
}

/// Lê classe de tensão e ID do produto, se o catálogo tiver esses registradores.
///
/// Falhas viram aviso; a ponte sobe mesmo sem essas informações.
pub fn read_startup(source: &mut dyn RegisterSource, unit_id: u8, catalog: &Catalog) -> StartupInfo {
    let mut info = StartupInfo::default();
    let Some(startup) = catalog.startup else {
        return info;
    };
    let origin = source.describe();

    match source.read_holding(unit_id, startup.system_voltage, 1) {
        Ok(words) => {
            info.system_voltage = words.first().copied();
            info!("Tensão do sistema ({origin}): {:?} V", info.system_voltage);
        }
        Err(e) => warn!("Falha ao ler tensão do sistema ({origin}): {e}"),
    }

    match source.read_holding(unit_id, startup.product_id, startup.product_id_len) {
        Ok(words) => {
            let id = char_run(&words);
            if id.is_empty() {
                warn!("ID do produto vazio ({origin})");
            } else {
                info!("ID do produto ({origin}): {id}");
                info.product_id = Some(id);
            }
        }
        Err(e) => warn!("Falha ao ler ID do produto ({origin}): {e}"),
    }

    info
}

/// `<id>_<AAAA_MM_DD_HHMM>.csv`, com o nome do canal quando não há ID.
pub fn log_file_name(product_id: Option<&str>, fallback: &str, now: DateTime<Local>) -> String {
    let stem = product_id
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| sanitize(fallback));
    format!("{stem}_{}.csv", now.format("%Y_%m_%d_%H%M"))
}

/// Mantém só caracteres seguros em nome de arquivo.
fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
