//! # Tap Bridge
//!
//! Fica entre o logger do fabricante e o inversor (ou medidor), repassando
//! a conversa serial sem alterar nenhum byte. Ao mesmo tempo decodifica as
//! respostas Modbus RTU e grava uma linha por varredura no CSV do canal.
//!
//! ## Uso
//! ```bash
//! tap_bridge                 # config.toml ao lado do executável
//! tap_bridge /etc/tap.toml   # outro arquivo de configuração
//! ```

mod bridge;
mod link;
mod pipeline;
mod serial_source;
mod startup;

use bridge::{BridgeTiming, ChannelBridge};
use chrono::Local;
use crossbeam_channel::{Sender, bounded};
use link::{PortOpener, SerialLink, SerialOpener};
use pipeline::{Lane, Pipeline};
use serial_source::SerialSource;
use startup::{StartupInfo, log_file_name, read_startup};
use std::path::PathBuf;
use tap_core::aggregator::{BridgeEvent, CycleAggregator};
use tap_core::catalog::Catalog;
use tap_core::config::{AppConfig, ChannelConfig};
use tap_core::decoder::Decoder;
use tap_core::log_writer::TelemetryLogWriter;
use tap_core::source::{RegisterSource, SimulatedSource};
use tap_core::types::ChannelId;
use tracing::{error, info, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        std::process::exit(1);
    }
    if config.channels.is_empty() {
        warn!(
            "Nenhum canal em {}. Adicione um bloco [[channels]] e reinicie.",
            config_path.display()
        );
        return;
    }

    let log_dir = PathBuf::from(&config.bridge.log_dir);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        error!("Falha ao criar {}: {e}", log_dir.display());
        std::process::exit(1);
    }

    // ── Canais ──
    let (tx, rx) = bounded::<BridgeEvent>(config.bridge.event_capacity);
    let timing = BridgeTiming {
        quiescence: config.bridge.quiescence(),
        idle_sleep: config.bridge.idle_sleep(),
        reopen_interval: config.bridge.reopen_interval(),
    };

    let mut lanes = Vec::new();
    let mut bridges = Vec::new();
    let mut banner = Vec::new();

    for (channel, ch, catalog) in resolve_channels(&config.channels) {
        let prepared = prepare_channel(channel, ch, catalog, timing, tx.clone());
        let path = log_dir.join(log_file_name(
            prepared.info.product_id.as_deref(),
            &ch.name,
            Local::now(),
        ));
        let writer = match TelemetryLogWriter::open(&path, catalog) {
            Ok(w) => w,
            Err(e) => {
                error!("Falha ao abrir log {}: {e}", path.display());
                std::process::exit(1);
            }
        };

        banner.push(format!(
            "  {channel} {:<10} {} ↔ {} | {}",
            ch.name,
            ch.logger_port,
            if ch.has_device() { ch.device_port.as_str() } else { "(simulado)" },
            catalog.name,
        ));
        if let Some(volts) = prepared.info.system_voltage {
            banner.push(format!("     Sistema:  {volts} V"));
        }
        banner.push(format!("     Log:      {}", path.display()));

        lanes.push(Lane {
            aggregator: CycleAggregator::new(channel, catalog.sentinel),
            writer,
        });
        bridges.push(prepared.bridge);
    }
    // Só as pontes seguram o channel daqui em diante
    drop(tx);

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ TAP BRIDGE – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    for line in &banner {
        println!("{line}");
    }
    println!("  Silêncio:  {} ms", config.bridge.quiescence_ms);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Threads ──
    let pipeline = Pipeline::new(lanes, config.bridge.pairing_grace());
    let aggregator = std::thread::Builder::new()
        .name("aggregator".into())
        .spawn(move || pipeline.run(rx))
        .expect("Falha ao criar thread do agregador");

    for (i, bridge) in bridges.into_iter().enumerate() {
        std::thread::Builder::new()
            .name(format!("bridge-{i}"))
            .spawn(move || bridge.run())
            .expect("Falha ao criar thread da ponte");
    }

    if aggregator.join().is_err() {
        error!("Thread do agregador terminou com pânico");
        std::process::exit(1);
    }
}

// ──────────────────────────────────────────────
// Preparação de um canal
// ──────────────────────────────────────────────

/// Canais com catálogo conhecido, numerados na ordem em que viram lanes.
///
/// O id é a posição entre os canais aceitos, não no arquivo, para que
/// `ChannelId(i)` sempre aponte para `lanes[i]`.
fn resolve_channels(channels: &[ChannelConfig]) -> Vec<(ChannelId, &ChannelConfig, &'static Catalog)> {
    let mut resolved = Vec::with_capacity(channels.len());
    for ch in channels {
        let Some(catalog) = Catalog::by_name(&ch.catalog) else {
            warn!("{}: catálogo '{}' desconhecido, canal ignorado", ch.name, ch.catalog);
            continue;
        };
        resolved.push((ChannelId(resolved.len() as u8), ch, catalog));
    }
    resolved
}

struct PreparedChannel {
    bridge: ChannelBridge,
    info: StartupInfo,
}

/// Leituras da partida e montagem da ponte de um canal.
///
/// Com o equipamento presente as leituras vão pela serial e a porta segue
/// aberta para a ponte; sem ele, a tabela simulada responde (se permitido).
fn prepare_channel(
    channel: ChannelId,
    ch: &ChannelConfig,
    catalog: &'static Catalog,
    timing: BridgeTiming,
    events: Sender<BridgeEvent>,
) -> PreparedChannel {
    let mut simulated = if ch.simulate_when_absent {
        SimulatedSource::for_catalog(catalog.name)
    } else {
        None
    };

    let mut device: Option<(SerialOpener, Option<Box<dyn SerialLink>>)> = None;
    let mut info = StartupInfo::default();

    if ch.has_device() {
        let opener = SerialOpener::new(ch.device_port.trim(), ch.serial.clone());
        match opener.open() {
            Ok(link) => {
                let mut source = SerialSource::new(link, opener.label(), ch.serial.timeout());
                info = read_startup(&mut source, ch.unit_id, catalog);
                device = Some((opener, Some(source.into_link())));
            }
            Err(e) => {
                warn!("{}: equipamento {} indisponível: {e}", ch.name, opener.label());
                device = Some((opener, None));
            }
        }
    }

    let device_open = device.as_ref().is_some_and(|(_, link)| link.is_some());
    if !device_open {
        if let Some(sim) = simulated.as_mut() {
            info = read_startup(sim, ch.unit_id, catalog);
        }
    }

    let mut decoder = Decoder::new(catalog);
    if let Some(volts) = info.system_voltage {
        decoder.set_system_voltage(volts);
    }

    let logger = SerialOpener::new(ch.logger_port.trim(), ch.serial.clone());
    let mut bridge = ChannelBridge::new(channel, ch.unit_id, Box::new(logger), decoder, timing, events);
    bridge = match device {
        Some((opener, Some(link))) => bridge.with_open_device(Box::new(opener), link),
        Some((opener, None)) => bridge.with_device(Box::new(opener)),
        None => bridge,
    };
    if let Some(sim) = simulated {
        info!("{}: reserva {} pronta", ch.name, sim.describe());
        bridge = bridge.with_fallback(Box::new(sim));
    }

    PreparedChannel { bridge, info }
}
