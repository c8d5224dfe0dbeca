//! Thread de agregação: recebe eventos das pontes, fecha ciclos, pareia
//! canais e grava os logs.
//!
//! É a única dona dos agregadores, do pareamento e dos arquivos; as pontes
//! só falam com ela pelo channel.

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tap_core::aggregator::{BridgeEvent, CycleAggregator, Pairing};
use tap_core::log_writer::TelemetryLogWriter;
use tap_core::types::CycleRecord;
use tracing::{debug, error, info, warn};

/// Espera máxima no channel quando não há registro aguardando par.
const IDLE_WAIT: Duration = Duration::from_secs(1);

/// Agregador e arquivo de um canal.
pub struct Lane {
    pub aggregator: CycleAggregator,
    pub writer: TelemetryLogWriter,
}

pub struct Pipeline {
    lanes: Vec<Lane>,
    pairing: Pairing,
}

impl Pipeline {
    /// `lanes[i]` atende o canal `i`.
    pub fn new(lanes: Vec<Lane>, grace: Duration) -> Self {
        let pairing = Pairing::new(grace, lanes.len());
        Self { lanes, pairing }
    }

    pub fn handle(&mut self, event: BridgeEvent, wall: DateTime<Local>, now: Instant) {
        let channel = event.channel();
        let Some(lane) = self.lanes.get_mut(channel.index()) else {
            warn!("Evento de canal desconhecido: {channel}");
            return;
        };

        match event {
            BridgeEvent::Fault { message, .. } => {
                debug!("{channel}: falha anotada no ciclo: {message}");
                lane.aggregator.note_error(message);
            }
            BridgeEvent::Decoded {
                address,
                count,
                samples,
                ..
            } => {
                if let Some(record) = lane.aggregator.ingest(address, count, samples, wall) {
                    debug!("{channel}: ciclo fechado com {} valores", record.samples.len());
                    let ready = self.pairing.offer(record, now);
                    self.write(ready);
                }
            }
        }
    }

    /// Grava registros cujo par não chegou a tempo.
    pub fn tick(&mut self, now: Instant) {
        let expired = self.pairing.expire(now);
        self.write(expired);
    }

    /// Grava o que sobrou (encerramento).
    pub fn finish(&mut self) {
        let pending = self.pairing.drain();
        self.write(pending);
    }

    fn write(&mut self, records: Vec<CycleRecord>) {
        for record in records {
            let Some(lane) = self.lanes.get_mut(record.channel.index()) else {
                continue;
            };
            match lane.writer.write(&record) {
                Ok(()) => debug!(
                    "{}: linha {} gravada em {}",
                    record.channel,
                    lane.writer.rows_written(),
                    lane.writer.path().display()
                ),
                Err(e) => error!("Falha ao gravar {}: {e}", lane.writer.path().display()),
            }
        }
    }

    /// Consome eventos até todas as pontes soltarem o channel.
    pub fn run(mut self, rx: Receiver<BridgeEvent>) {
        info!("Agregador ativo com {} canal(is)", self.lanes.len());
        loop {
            let timeout = self
                .pairing
                .next_deadline()
                .map_or(IDLE_WAIT, |d| d.saturating_duration_since(Instant::now()));

            match rx.recv_timeout(timeout) {
                Ok(event) => self.handle(event, Local::now(), Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Pontes encerradas, gravando registros pendentes");
                    self.finish();
                    return;
                }
            }
            self.tick(Instant::now());
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
