//! # Tap Core
//!
//! Crate compartilhada da ponte serial logger ↔ inversor: tudo que não
//! toca hardware nem threads. Recebe bytes crus de uma linha Modbus RTU,
//! monta frames, decodifica valores de engenharia, junta uma varredura
//! numa linha e grava o CSV com a linha mais nova no topo.
//!
//! ## Módulos
//! - [`catalog`] – Descritores de registradores e regras de decodificação
//! - [`tables`] – Catálogos estáticos (HYP4850U100-H, KM-N1)
//! - [`crc`] – CRC16 Modbus
//! - [`protocol`] – Layout de pedidos e respostas da função 0x03
//! - [`assembler`] – Remontagem de frames por silêncio na linha
//! - [`decoder`] – Palavras de registrador → valores
//! - [`types`] – Valores, amostras e registros de ciclo
//! - [`aggregator`] – Ciclo por canal e pareamento entre canais
//! - [`log_writer`] – CSV com cabeçalho de duas linhas
//! - [`source`] – Leitura síncrona de registradores (simulada)
//! - [`config`] – Configuração unificada via TOML

pub mod catalog;
pub mod tables;
pub mod crc;
pub mod protocol;
pub mod assembler;
pub mod decoder;
pub mod types;
pub mod aggregator;
pub mod log_writer;
pub mod source;
pub mod config;

// Re-exports convenientes
pub use aggregator::{BridgeEvent, CycleAggregator, CycleState, Pairing};
pub use assembler::FrameAssembler;
pub use catalog::{Catalog, DecodeKind, RegisterDescriptor};
pub use config::{AppConfig, BridgeConfig, ChannelConfig, SerialSettings};
pub use decoder::{DecodeError, Decoder};
pub use log_writer::{LogError, TelemetryLogWriter};
pub use protocol::ProtocolError;
pub use source::{RegisterSource, SimulatedSource, SourceError};
pub use types::{ChannelId, CycleRecord, DecodedSample, Value};
