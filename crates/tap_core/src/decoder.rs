//! Decodificador de valores: palavras brutas de uma resposta 0x03 →
//! valores de engenharia, seguindo as regras do [`Catalog`].
//!
//! O endereço de cada valor vem da requisição que gerou a resposta: o
//! cursor começa no endereço base e avança 1 por valor, seja qual for a
//! largura do valor (16, 32 ou 48 bits). Os logs existentes dependem
//! dessa contagem.

use crate::catalog::{Catalog, DecodeKind, RegisterDescriptor};
use crate::protocol::{self, ProtocolError};
use crate::types::{DecodedSample, Value};

/// Erros de decodificação.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Frame(#[from] ProtocolError),

    #[error("0x{address:04X}: índice {index} fora da enumeração ({len} valores)")]
    EnumIndexOutOfRange { address: u16, index: u64, len: usize },

    #[error("0x{address:04X}: código de caractere inválido {raw}")]
    InvalidCharacter { address: u16, raw: u64 },

    #[error("0x{address:04X}: tabela de extensão 0x{table:04X} inexistente")]
    UnknownTable { address: u16, table: u16 },
}

/// Resultado de um frame: amostras e falhas locais (que já viraram valor bruto).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    pub samples: Vec<DecodedSample>,
    pub errors: Vec<DecodeError>,
}

/// Decodificador ligado a um catálogo e à classe de tensão do sistema.
#[derive(Debug, Clone)]
pub struct Decoder {
    catalog: &'static Catalog,
    system_voltage: Option<u16>,
}

impl Decoder {
    pub fn new(catalog: &'static Catalog) -> Self {
        Self {
            catalog,
            system_voltage: None,
        }
    }

    pub fn with_system_voltage(mut self, volts: u16) -> Self {
        self.system_voltage = Some(volts);
        self
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn system_voltage(&self) -> Option<u16> {
        self.system_voltage
    }

    pub fn set_system_voltage(&mut self, volts: u16) {
        self.system_voltage = Some(volts);
    }

    /// Decodifica uma resposta 0x03 cujo pedido começou em `base`.
    ///
    /// Frames curtos ou de outra função retornam erro e nenhuma amostra.
    /// Falhas de um único registrador não interrompem o frame: o valor bruto
    /// entra no lugar e o erro vai para [`DecodedFrame::errors`].
    pub fn decode_frame(&self, base: u16, frame: &[u8]) -> Result<DecodedFrame, DecodeError> {
        let data = protocol::response_data(frame)?;
        let words: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        let mut out = DecodedFrame::default();
        let mut idx = 0;
        let mut address = base;

        while idx < words.len() {
            let descriptor = self.catalog.get(address);
            let remaining = words.len() - idx;
            let span = match descriptor {
                Some(d) if matches!(d.kind, DecodeKind::CharSeq { .. }) => d.span().min(remaining),
                Some(d) => d.span(),
                None => 1,
            };
            if span > remaining {
                break;
            }
            let regs = &words[idx..idx + span];

            let value = match descriptor {
                Some(d) => self.decode_value(d, regs).unwrap_or_else(|e| {
                    out.errors.push(e);
                    Value::Integer(assemble_raw(regs) as i64)
                }),
                None => Value::Integer(assemble_raw(regs) as i64),
            };
            out.samples.push(DecodedSample {
                address,
                value,
                kind: descriptor.map(|d| d.kind),
            });

            idx += span;
            address = address.wrapping_add(descriptor.map_or(1, |d| d.advance()));
        }

        Ok(out)
    }

    /// Aplica a regra do descritor às palavras de um registrador.
    pub fn decode_value(
        &self,
        descriptor: &RegisterDescriptor,
        words: &[u16],
    ) -> Result<Value, DecodeError> {
        let address = descriptor.address;
        if let DecodeKind::CharSeq { .. } = descriptor.kind {
            return Ok(Value::Text(char_run(words)));
        }
        let raw = assemble_raw(words);

        let value = match descriptor.kind {
            DecodeKind::Raw => Value::Integer(raw as i64),
            DecodeKind::Scaled { decimals } => {
                let signed = to_signed(raw, words.len());
                if decimals == 0 {
                    Value::Integer(signed)
                } else {
                    Value::Number(signed as f64 / 10f64.powi(i32::from(decimals)))
                }
            }
            DecodeKind::VoltageClass => {
                let multiplier = match self.system_voltage {
                    Some(24) => 2.0,
                    Some(48) => 4.0,
                    _ => 1.0,
                };
                Value::Number(raw as f64 / 10.0 * multiplier)
            }
            DecodeKind::Char => {
                let c = u32::try_from(raw)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(DecodeError::InvalidCharacter { address, raw })?;
                Value::Text(c.to_string())
            }
            DecodeKind::CharSeq { .. } => Value::Text(char_run(words)),
            DecodeKind::Boolean => match raw {
                0 => Value::Label("off"),
                1 => Value::Label("on"),
                _ => {
                    return Err(DecodeError::EnumIndexOutOfRange {
                        address,
                        index: raw,
                        len: 2,
                    });
                }
            },
            DecodeKind::PackedTime => Value::Text(packed_time(raw)),
            DecodeKind::Enumerated => Value::Label(pick(descriptor.enum_values, address, raw)?),
            DecodeKind::Extension { table } => {
                let values = self
                    .catalog
                    .get(table)
                    .map(|t| t.enum_values)
                    .ok_or(DecodeError::UnknownTable { address, table })?;
                Value::Label(pick(values, address, raw)?)
            }
        };

        Ok(value)
    }
}

fn pick(values: &'static [&'static str], address: u16, raw: u64) -> Result<&'static str, DecodeError> {
    usize::try_from(raw)
        .ok()
        .and_then(|i| values.get(i).copied())
        .ok_or(DecodeError::EnumIndexOutOfRange {
            address,
            index: raw,
            len: values.len(),
        })
}

// ──────────────────────────────────────────────
// Primitivas
// ──────────────────────────────────────────────

/// Junta as palavras de um registrador num inteiro bruto.
///
/// Uma palavra é o próprio valor. Com 2 ou 3 palavras os dígitos
/// DECIMAIS são concatenados, da última palavra para a primeira:
/// `[4079, 0]` → "0" + "4079" → 4079; `[0, 966]` → "966" + "0" → 9660.
/// Não é uma combinação aritmética, e os logs existentes foram gerados assim.
///
/// Sequências que não cabem em 64 bits saturam em `u64::MAX`.
pub fn assemble_raw(words: &[u16]) -> u64 {
    match words {
        [] => 0,
        [single] => u64::from(*single),
        _ => words
            .iter()
            .rev()
            .try_fold(0u64, |acc, &w| {
                let digits = w.checked_ilog10().map_or(1, |d| d + 1);
                acc.checked_mul(10u64.pow(digits))?.checked_add(u64::from(w))
            })
            .unwrap_or(u64::MAX),
    }
}

/// Complemento de dois para 16 e 32 bits; 48 bits fica sem sinal.
pub fn to_signed(raw: u64, words: usize) -> i64 {
    let raw = raw as i64;
    match words {
        1 if raw > 0x7FFF => raw - 0x1_0000,
        2 if raw > 0x7FFF_FFFF => raw - 0x1_0000_0000,
        _ => raw,
    }
}

/// Horário empacotado: os dígitos hexadecimais de cada byte viram "HH:MM".
///
/// 0x0730 → "07:30". Não é BCD convertido, são os dígitos hex impressos.
pub fn packed_time(raw: u64) -> String {
    format!("{:02X}:{:02X}", (raw >> 8) & 0xFF, raw & 0xFF)
}

/// Um caractere por registrador; NULs e espaços finais são descartados.
pub fn char_run(words: &[u16]) -> String {
    let text: String = words
        .iter()
        .filter(|&&w| w != 0)
        .filter_map(|&w| char::from_u32(u32::from(w)))
        .collect();
    text.trim_end().to_string()
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
