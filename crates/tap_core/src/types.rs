//! Tipos que circulam entre decodificador, agregador e log.

use chrono::{DateTime, Local};
use std::fmt;

use crate::catalog::DecodeKind;

// ──────────────────────────────────────────────
// Valores
// ──────────────────────────────────────────────

/// Valor de engenharia decodificado de um registrador.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Inteiro (escala ÷1 ou valor bruto sem descritor)
    Integer(i64),
    /// Valor escalado (÷10, ÷100, ÷1000, classe de tensão)
    Number(f64),
    /// Texto livre: caracteres, ID de produto, horário "HH:MM"
    Text(String),
    /// Rótulo de enumeração ou booleano
    Label(&'static str),
}

impl Value {
    /// Valor numérico, se houver. Usado pelas colunas derivadas.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Number(v) => Some(*v),
            Value::Text(_) | Value::Label(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            // Mesmo texto que os logs antigos: 200.0 e não 200
            Value::Number(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Label(s) => f.write_str(s),
        }
    }
}

/// Um registrador decodificado numa varredura.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSample {
    pub address: u16,
    pub value: Value,
    /// `None` quando o endereço não está no catálogo
    pub kind: Option<DecodeKind>,
}

// ──────────────────────────────────────────────
// Canais e registros de ciclo
// ──────────────────────────────────────────────

/// Índice do par serial (0 ou 1 em instalações duplas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Linha completa de uma varredura, pronta para o log.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    pub timestamp: DateTime<Local>,
    pub channel: ChannelId,
    /// Endereço → valor, na ordem em que chegaram; sem chaves repetidas
    pub samples: Vec<(u16, Value)>,
    /// Falhas de conexão/decodificação ocorridas durante o ciclo
    pub errors: Vec<String>,
}

impl CycleRecord {
    pub fn new(channel: ChannelId, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            channel,
            samples: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Insere ou substitui (última escrita vence, posição original mantida).
    pub fn merge(&mut self, address: u16, value: Value) {
        match self.samples.iter_mut().find(|(a, _)| *a == address) {
            Some(slot) => slot.1 = value,
            None => self.samples.push((address, value)),
        }
    }

    pub fn get(&self, address: u16) -> Option<&Value> {
        self.samples
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, v)| v)
    }

    /// Segundo de relógio usado no pareamento entre canais.
    pub fn second(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_display_keeps_decimal_point() {
        assert_eq!(Value::Number(200.0).to_string(), "200.0");
        assert_eq!(Value::Number(12.34).to_string(), "12.34");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Integer(-1).to_string(), "-1");
        assert_eq!(Value::Label("ON").to_string(), "ON");
    }

    #[test]
    fn merge_is_last_write_wins_in_place() {
        let mut record = CycleRecord::new(ChannelId(0), Local::now());
        record.merge(0x0100, Value::Integer(50));
        record.merge(0x0101, Value::Number(52.4));
        record.merge(0x0100, Value::Integer(53));

        assert_eq!(record.samples.len(), 2);
        assert_eq!(record.samples[0], (0x0100, Value::Integer(53)));
        assert_eq!(record.get(0x0101), Some(&Value::Number(52.4)));
        assert_eq!(record.get(0x0102), None);
    }

    #[test]
    fn text_has_no_numeric_view() {
        assert_eq!(Value::Text("07:30".into()).as_f64(), None);
        assert_eq!(Value::Integer(4).as_f64(), Some(4.0));
    }
}
