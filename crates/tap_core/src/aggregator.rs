//! Agregação por varredura e pareamento entre canais.
//!
//! [`CycleAggregator`] junta as amostras de um canal até um pedido cobrir
//! a sentinela e então entrega um [`CycleRecord`] fechado. [`Pairing`] segura
//! o registro por um período curto esperando o registro do canal irmão com
//! o mesmo segundo de relógio; os dois pertencem a uma única thread, sem
//! trava compartilhada.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

use crate::types::{ChannelId, CycleRecord, DecodedSample};

// ──────────────────────────────────────────────
// Eventos vindos das pontes
// ──────────────────────────────────────────────

/// Mensagem de uma thread de ponte para a thread de agregação.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// Amostras de uma resposta decodificada, com a faixa pedida
    Decoded {
        channel: ChannelId,
        address: u16,
        count: u16,
        samples: Vec<DecodedSample>,
    },
    /// Falha de conexão ou decodificação, anexada ao ciclo corrente
    Fault { channel: ChannelId, message: String },
}

impl BridgeEvent {
    pub fn channel(&self) -> ChannelId {
        match self {
            BridgeEvent::Decoded { channel, .. } | BridgeEvent::Fault { channel, .. } => *channel,
        }
    }
}

// ──────────────────────────────────────────────
// Agregador por canal
// ──────────────────────────────────────────────

/// Estado do ciclo de um canal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Accumulating,
}

/// Acumula amostras de uma varredura e fecha na sentinela.
#[derive(Debug)]
pub struct CycleAggregator {
    channel: ChannelId,
    sentinel: u16,
    open: Option<CycleRecord>,
    /// Falhas vistas com o ciclo ocioso; vão para o próximo registro
    pending_errors: Vec<String>,
}

impl CycleAggregator {
    pub fn new(channel: ChannelId, sentinel: u16) -> Self {
        Self {
            channel,
            sentinel,
            open: None,
            pending_errors: Vec::new(),
        }
    }

    pub fn state(&self) -> CycleState {
        if self.open.is_some() {
            CycleState::Accumulating
        } else {
            CycleState::Idle
        }
    }

    /// Mescla as amostras da resposta ao pedido `address`/`count`.
    ///
    /// A resposta inteira entra no ciclo aberto. Se a faixa pedida contém a
    /// sentinela, o registro é fechado com o horário `now` e devolvido. A
    /// amostra da sentinela em si pode nem existir, já que o cursor avança
    /// 1 por valor.
    pub fn ingest(
        &mut self,
        address: u16,
        count: u16,
        samples: Vec<DecodedSample>,
        now: DateTime<Local>,
    ) -> Option<CycleRecord> {
        if samples.is_empty() {
            return None;
        }

        let channel = self.channel;
        let pending = &mut self.pending_errors;
        let record = self.open.get_or_insert_with(|| {
            let mut record = CycleRecord::new(channel, now);
            record.errors = std::mem::take(pending);
            record
        });

        for sample in samples {
            record.merge(sample.address, sample.value);
        }

        if !covers(address, count, self.sentinel) {
            return None;
        }
        let mut record = self.open.take()?;
        record.timestamp = now;
        Some(record)
    }

    /// Registra uma falha no ciclo aberto (ou no próximo, se ocioso).
    pub fn note_error(&mut self, message: String) {
        match self.open.as_mut() {
            Some(record) => record.errors.push(message),
            None => self.pending_errors.push(message),
        }
    }
}

/// `address <= target < address + count`, sem estourar no fim do mapa.
fn covers(address: u16, count: u16, target: u16) -> bool {
    let start = u32::from(address);
    (start..start + u32::from(count)).contains(&u32::from(target))
}

// ──────────────────────────────────────────────
// Pareamento entre canais
// ──────────────────────────────────────────────

#[derive(Debug)]
struct Pending {
    record: CycleRecord,
    deadline: Instant,
}

/// Alinha registros de dois canais pelo segundo de relógio.
///
/// Com um único canal ativo tudo passa direto. Nenhum registro é
/// duplicado ou perdido: cada um sai exatamente uma vez, pareado ou sozinho.
#[derive(Debug)]
pub struct Pairing {
    grace: Duration,
    active_channels: usize,
    slots: [Option<Pending>; 2],
}

impl Pairing {
    pub fn new(grace: Duration, active_channels: usize) -> Self {
        Self {
            grace,
            active_channels,
            slots: [None, None],
        }
    }

    /// Oferece um registro fechado; retorna o que deve ser escrito agora, em ordem.
    pub fn offer(&mut self, record: CycleRecord, now: Instant) -> Vec<CycleRecord> {
        let idx = record.channel.index();
        if self.active_channels < 2 || idx > 1 {
            return vec![record];
        }

        let mut out = Vec::new();

        // Um registro antigo do mesmo canal ainda esperando sai sozinho
        if let Some(stale) = self.slots[idx].take() {
            out.push(stale.record);
        }

        let sibling = 1 - idx;
        let matches = self.slots[sibling]
            .as_ref()
            .is_some_and(|p| p.record.second() == record.second());

        if matches {
            if let Some(other) = self.slots[sibling].take() {
                let (first, second) = if idx == 0 {
                    (record, other.record)
                } else {
                    (other.record, record)
                };
                out.push(first);
                out.push(second);
            }
        } else {
            self.slots[idx] = Some(Pending {
                record,
                deadline: now + self.grace,
            });
        }

        out
    }

    /// Libera registros cujo período de espera acabou.
    pub fn expire(&mut self, now: Instant) -> Vec<CycleRecord> {
        let mut out = Vec::new();
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|p| p.deadline <= now) {
                if let Some(p) = slot.take() {
                    out.push(p.record);
                }
            }
        }
        out
    }

    /// Esvazia tudo (encerramento).
    pub fn drain(&mut self) -> Vec<CycleRecord> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.take().map(|p| p.record))
            .collect()
    }

    /// Próximo instante em que [`Pairing::expire`] terá algo a liberar.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|p| p.deadline).min()
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
