//! Fonte síncrona de registradores (pedido → resposta).
//!
//! Usada nas leituras únicas da partida (classe de tensão, ID do produto)
//! e, quando o equipamento não está conectado, para responder o logger no
//! lugar dele. A implementação serial fica no binário da ponte; aqui mora
//! a versão simulada.

use std::collections::BTreeMap;

use crate::protocol::ProtocolError;

/// Erros de leitura de uma [`RegisterSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Conexão indisponível: {0}")]
    Connection(String),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tempo esgotado: {received} de {expected} bytes")]
    Timeout { received: usize, expected: usize },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Resposta com {got} registradores, pedido de {wanted}")]
    CountMismatch { got: usize, wanted: u16 },
}

/// Capacidade de ler holding registers de um equipamento.
pub trait RegisterSource: Send {
    /// Lê `count` registradores a partir de `address`.
    fn read_holding(&mut self, unit_id: u8, address: u16, count: u16) -> Result<Vec<u16>, SourceError>;

    /// Descrição curta para logs ("serial /dev/ttyUSB1", "simulado hyp4850").
    fn describe(&self) -> String;
}

// ──────────────────────────────────────────────
// Fonte simulada
// ──────────────────────────────────────────────

/// Blocos gravados de um HYP4850U100-H em operação, no formato
/// (endereço inicial, palavras), na ordem em que o logger de fábrica pede.
/// O pedido 0xF040×12 fecha a varredura.
const HYP4850_BLOCKS: &[(u16, &[u16])] = &[
    (0x000B, &[0x0004]),
    (0x0035, &[
        0x0048, 0x0059, 0x0050, 0x0034, 0x0038, 0x0035, 0x0030, 0x0055, 0x0031, 0x0030,
        0x0030, 0x002D, 0x0048, 0x002D, 0x0053, 0x0049, 0x004D, 0x0030, 0x0030, 0x0031,
    ]),
    (0x0100, &[0x0035, 0x020C, 0x000A]),
    (0x0107, &[0x06BF, 0x000E, 0x00F1, 0x0000, 0x0001, 0x0000, 0x0000, 0x00F1, 0x0000]),
    (0x0204, &[
        0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x1705, 0x010E,
        0x2937, 0x0000, 0x0005, 0xFFFF,
    ]),
    (0x0212, &[
        0x0F5A, 0x0000, 0x0000, 0x0000, 0x03E7, 0x0017, 0x176F, 0x0019, 0x0000, 0x02E5,
        0x02F9, 0x0000, 0x0000, 0x0005, 0x019A, 0x0194, 0x0219, 0x0225, 0x0004, 0x0014,
    ]),
    (0xE003, &[48]),
    (0xE004, &[0x0006]),
    (0xE116, &[0x0022]),
    (0xF000, &[0; 7]),
    (0xF007, &[0; 7]),
    (0xF00E, &[0; 7]),
    (0xF015, &[0; 7]),
    (0xF01C, &[0; 7]),
    (0xF023, &[0; 7]),
    (0xF02D, &[28, 11, 17, 16, 0]),
    (0xF034, &[4079, 0, 2488, 0, 3061, 0, 2022, 0, 30, 16]),
    (0xF040, &[0; 12]),
];

/// Leituras do KM-N1 com carga (palavra alta primeiro).
const KM_N1_BLOCKS: &[(u16, &[u16])] = &[
    (0x0000, &[
        0, 966, 0, 1012, 0, 1977, 0, 5943, 0, 3466, 0, 3208, 0, 93, 0, 600, 0, 8552, 0, 6329,
    ]),
    (0x0200, &[0; 10]),
    (0x0220, &[0; 10]),
];

/// Tabela fixa de registradores que responde como um equipamento.
///
/// Registradores ausentes leem 0.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSource {
    label: String,
    registers: BTreeMap<u16, u16>,
    /// (endereço, quantidade) de cada bloco gravado, na ordem de pedido
    sweep: Vec<(u16, u16)>,
}

impl SimulatedSource {
    /// Monta a tabela a partir de blocos contíguos.
    pub fn from_blocks(label: impl Into<String>, blocks: &[(u16, &[u16])]) -> Self {
        let mut registers = BTreeMap::new();
        let mut sweep = Vec::with_capacity(blocks.len());
        for (start, words) in blocks {
            for (offset, word) in words.iter().enumerate() {
                registers.insert(start.wrapping_add(offset as u16), *word);
            }
            sweep.push((*start, words.len() as u16));
        }
        Self {
            label: label.into(),
            registers,
            sweep,
        }
    }

    pub fn hyp4850() -> Self {
        Self::from_blocks("hyp4850", HYP4850_BLOCKS)
    }

    pub fn km_n1() -> Self {
        Self::from_blocks("km-n1", KM_N1_BLOCKS)
    }

    /// Tabela gravada para o catálogo de mesmo nome.
    pub fn for_catalog(name: &str) -> Option<Self> {
        match name {
            "hyp4850" => Some(Self::hyp4850()),
            "km-n1" => Some(Self::km_n1()),
            _ => None,
        }
    }

    pub fn set(&mut self, address: u16, word: u16) {
        self.registers.insert(address, word);
    }

    /// Pedidos de uma varredura do logger, como foram gravados.
    pub fn sweep(&self) -> &[(u16, u16)] {
        &self.sweep
    }
}

impl RegisterSource for SimulatedSource {
    fn read_holding(&mut self, _unit_id: u8, address: u16, count: u16) -> Result<Vec<u16>, SourceError> {
        Ok((0..count)
            .map(|offset| {
                self.registers
                    .get(&address.wrapping_add(offset))
                    .copied()
                    .unwrap_or(0)
            })
            .collect())
    }

    fn describe(&self) -> String {
        format!("simulado {}", self.label)
    }
}
