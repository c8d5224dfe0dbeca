//! Configuração unificada via TOML.
//!
//! Um único `config.toml` descreve os pares seriais (logger ↔ equipamento),
//! os parâmetros de linha de cada par e o comportamento da ponte.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::Catalog;

/// Máximo de pares seriais simultâneos.
pub const MAX_CHANNELS: usize = 2;

/// Parâmetros de linha de uma porta serial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub baud_rate: u32,
    /// 5 a 8
    pub data_bits: u8,
    /// "none", "even" ou "odd"
    pub parity: String,
    /// 1 ou 2
    pub stop_bits: u8,
    /// Timeout de leitura das leituras síncronas (ms)
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: "none".into(),
            stop_bits: 1,
            timeout_ms: 1000,
        }
    }
}

impl SerialSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self, channel: &str, errors: &mut Vec<String>) {
        const BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

        if !BAUD_RATES.contains(&self.baud_rate) {
            errors.push(format!("{channel}: baud rate inválido: {}", self.baud_rate));
        }
        if !(5..=8).contains(&self.data_bits) {
            errors.push(format!("{channel}: data bits inválido: {} (5–8)", self.data_bits));
        }
        if !matches!(self.parity.as_str(), "none" | "even" | "odd") {
            errors.push(format!(
                "{channel}: paridade inválida: '{}' (none, even, odd)",
                self.parity
            ));
        }
        if !matches!(self.stop_bits, 1 | 2) {
            errors.push(format!("{channel}: stop bits inválido: {} (1 ou 2)", self.stop_bits));
        }
        if self.timeout_ms == 0 {
            errors.push(format!("{channel}: timeout não pode ser 0"));
        }
    }
}

/// Um par serial: porta do logger e porta do equipamento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Nome usado nos logs e como nome de arquivo reserva
    pub name: String,
    /// Porta onde o logger do fabricante está ligado
    pub logger_port: String,
    /// Porta do inversor/medidor (vazio = sem equipamento)
    pub device_port: String,
    /// Endereço Modbus do equipamento
    pub unit_id: u8,
    /// "hyp4850" ou "km-n1"
    pub catalog: String,
    /// Responder o logger com a tabela gravada quando o equipamento faltar
    pub simulate_when_absent: bool,
    pub serial: SerialSettings,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "inversor".into(),
            logger_port: String::new(),
            device_port: String::new(),
            unit_id: 1,
            catalog: "hyp4850".into(),
            simulate_when_absent: true,
            serial: SerialSettings::default(),
        }
    }
}

impl ChannelConfig {
    pub fn has_device(&self) -> bool {
        !self.device_port.trim().is_empty()
    }
}

/// Comportamento geral da ponte.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Janela de silêncio que fecha um frame (ms)
    pub quiescence_ms: u64,
    /// Pausa do laço quando nenhuma porta tem bytes (µs)
    pub idle_sleep_us: u64,
    /// Espera pelo registro do canal irmão (ms)
    pub pairing_grace_ms: u64,
    /// Intervalo entre tentativas de reabrir uma porta (segundos)
    pub reopen_interval_secs: f64,
    /// Diretório dos arquivos CSV
    pub log_dir: String,
    /// Capacidade da fila de eventos ponte → agregador
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            quiescence_ms: 100,
            idle_sleep_us: 500,
            pairing_grace_ms: 2000,
            reopen_interval_secs: 2.0,
            log_dir: ".".into(),
            event_capacity: 1024,
        }
    }
}

impl BridgeConfig {
    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_micros(self.idle_sleep_us)
    }

    pub fn pairing_grace(&self) -> Duration {
        Duration::from_millis(self.pairing_grace_ms)
    }

    pub fn reopen_interval(&self) -> Duration {
        Duration::from_secs_f64(self.reopen_interval_secs.max(0.0))
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub channels: Vec<ChannelConfig>,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let b = &self.bridge;
        if b.quiescence_ms < 5 || b.quiescence_ms > 2000 {
            errors.push(format!("Janela de silêncio inválida: {} ms (5–2000)", b.quiescence_ms));
        }
        if b.idle_sleep_us > 100_000 {
            errors.push(format!("Pausa ociosa longa demais: {} µs (máx. 100000)", b.idle_sleep_us));
        }
        if !(0.1..=600.0).contains(&b.reopen_interval_secs) {
            errors.push(format!(
                "Intervalo de reabertura inválido: {} (0.1–600.0)",
                b.reopen_interval_secs
            ));
        }
        if b.event_capacity == 0 {
            errors.push("Capacidade da fila de eventos não pode ser 0".into());
        }

        if self.channels.len() > MAX_CHANNELS {
            errors.push(format!(
                "No máximo {MAX_CHANNELS} canais, encontrados {}",
                self.channels.len()
            ));
        }

        let mut ports: Vec<&str> = Vec::new();
        for (i, ch) in self.channels.iter().enumerate() {
            let label = if ch.name.trim().is_empty() {
                format!("canal {i}")
            } else {
                ch.name.clone()
            };

            if ch.name.trim().is_empty() {
                errors.push(format!("{label}: nome vazio"));
            } else if self.channels[..i].iter().any(|o| o.name == ch.name) {
                errors.push(format!("{label}: nome repetido"));
            }
            if ch.logger_port.trim().is_empty() {
                errors.push(format!("{label}: porta do logger não configurada"));
            }
            if Catalog::by_name(&ch.catalog).is_none() {
                errors.push(format!("{label}: catálogo desconhecido '{}'", ch.catalog));
            }
            if ch.unit_id == 0 || ch.unit_id > 247 {
                errors.push(format!("{label}: unit id inválido: {} (1–247)", ch.unit_id));
            }
            if !ch.has_device() && !ch.simulate_when_absent {
                errors.push(format!("{label}: sem porta do equipamento e simulação desligada"));
            }

            for port in [ch.logger_port.trim(), ch.device_port.trim()] {
                if port.is_empty() {
                    continue;
                }
                if ports.contains(&port) {
                    errors.push(format!("{label}: porta {port} usada mais de uma vez"));
                }
                ports.push(port);
            }

            ch.serial.validate(&label, &mut errors);
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, logger: &str, device: &str) -> ChannelConfig {
        ChannelConfig {
            name: name.into(),
            logger_port: logger.into(),
            device_port: device.into(),
            ..ChannelConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let mut config = AppConfig::default();
        config.channels.push(channel("inv1", "/dev/ttyUSB0", "/dev/ttyUSB1"));
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.bridge.quiescence_ms, parsed.bridge.quiescence_ms);
        assert_eq!(parsed.channels.len(), 1);
        assert_eq!(parsed.channels[0].device_port, "/dev/ttyUSB1");
        assert_eq!(parsed.channels[0].serial, SerialSettings::default());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[bridge]
quiescence_ms = 50

[[channels]]
name = "medidor"
logger_port = "COM3"
catalog = "km-n1"

[channels.serial]
parity = "even"
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.bridge.quiescence_ms, 50);
        // Outros campos devem ter valor padrão
        assert_eq!(config.bridge.pairing_grace_ms, 2000);
        let ch = &config.channels[0];
        assert_eq!(ch.unit_id, 1);
        assert!(!ch.has_device());
        assert!(ch.simulate_when_absent);
        assert_eq!(ch.serial.parity, "even");
        assert_eq!(ch.serial.baud_rate, 9600);
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn rejects_bad_channels() {
        let mut config = AppConfig::default();
        let mut bad = channel("inv1", "COM1", "COM1");
        bad.catalog = "sofar".into();
        bad.serial.stop_bits = 3;
        config.channels = vec![bad, channel("inv1", "COM2", ""), channel("c", "COM5", "")];

        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("No máximo")));
        assert!(errors.iter().any(|e| e.contains("nome repetido")));
        assert!(errors.iter().any(|e| e.contains("catálogo desconhecido")));
        assert!(errors.iter().any(|e| e.contains("COM1 usada mais de uma vez")));
        assert!(errors.iter().any(|e| e.contains("stop bits")));
    }

    #[test]
    fn absent_device_needs_simulation() {
        let mut config = AppConfig::default();
        let mut ch = channel("inv1", "COM1", "");
        ch.simulate_when_absent = false;
        config.channels.push(ch);
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn durations() {
        let b = BridgeConfig::default();
        assert_eq!(b.quiescence(), Duration::from_millis(100));
        assert_eq!(b.idle_sleep(), Duration::from_micros(500));
        assert_eq!(b.pairing_grace(), Duration::from_secs(2));
        assert_eq!(b.reopen_interval(), Duration::from_secs(2));
    }
}
