//! Subconjunto Modbus RTU observado entre o logger e o inversor.
//!
//! Formato dos frames:
//!
//! ```text
//! Requisição:
//! ┌─────────┬─────────┬─────────────┬───────────┬──────────┐
//! │ Unit(1) │ Func(1) │ Addr(2, BE) │ Qtd(2,BE) │ CRC(2,LE)│
//! └─────────┴─────────┴─────────────┴───────────┴──────────┘
//!
//! Resposta:
//! ┌─────────┬─────────┬──────────┬──────────────┬──────────┐
//! │ Unit(1) │ Func(1) │ Bytes(1) │ Dados (N)    │ CRC(2,LE)│
//! └─────────┴─────────┴──────────┴──────────────┴──────────┘
//! ```
//!
//! Só a função 0x03 (read holding registers) é decodificada; as demais
//! passam pela ponte sem interpretação.

use crate::crc;

/// Função Modbus "read holding registers".
pub const READ_HOLDING: u8 = 0x03;

/// Bit que marca uma resposta de exceção.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Tamanho de uma requisição 0x03 completa (com CRC).
pub const REQUEST_LEN: usize = 8;

/// Menor resposta válida: unit, função, byte-count, 1 byte de dado, CRC.
pub const MIN_RESPONSE_LEN: usize = 7;

/// Cabeçalho de resposta (unit + função + byte-count).
const RESPONSE_HEADER: usize = 3;

/// Máximo de registradores numa leitura 0x03.
pub const MAX_READ_COUNT: u16 = 125;

/// Erros de framing RTU.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame muito curto ({0} bytes, mínimo {1})")]
    TooShort(usize, usize),

    #[error("Função não suportada: 0x{0:02X}")]
    UnsupportedFunction(u8),

    #[error("Resposta de exceção: função 0x{function:02X}, código {code}")]
    Exception { function: u8, code: u8 },

    #[error("CRC inválido")]
    BadCrc,

    #[error("Quantidade de registradores inválida: {0} (1–{MAX_READ_COUNT})")]
    BadCount(u16),
}

/// Cabeçalho de uma requisição capturada no sentido logger → dispositivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub unit_id: u8,
    pub function: u8,
    pub address: u16,
    pub count: u16,
}

/// Extrai endereço base e quantidade de uma requisição.
///
/// Precisa de pelo menos 6 bytes; o CRC não é conferido, igual ao
/// caminho de decodificação.
pub fn parse_request(frame: &[u8]) -> Result<RequestHeader, ProtocolError> {
    if frame.len() < 6 {
        return Err(ProtocolError::TooShort(frame.len(), 6));
    }
    Ok(RequestHeader {
        unit_id: frame[0],
        function: frame[1],
        address: u16::from_be_bytes([frame[2], frame[3]]),
        count: u16::from_be_bytes([frame[4], frame[5]]),
    })
}

/// Monta uma requisição 0x03 com CRC.
pub fn build_read_request(unit_id: u8, address: u16, count: u16) -> Result<Vec<u8>, ProtocolError> {
    if count == 0 || count > MAX_READ_COUNT {
        return Err(ProtocolError::BadCount(count));
    }
    let mut frame = Vec::with_capacity(REQUEST_LEN);
    frame.push(unit_id);
    frame.push(READ_HOLDING);
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    crc::append(&mut frame);
    Ok(frame)
}

/// Monta uma resposta 0x03 para `words`, com CRC.
pub fn build_read_response(unit_id: u8, words: &[u16]) -> Vec<u8> {
    let byte_count = (words.len() * 2).min(usize::from(u8::MAX)) as u8;
    let mut frame = Vec::with_capacity(RESPONSE_HEADER + usize::from(byte_count) + 2);
    frame.push(unit_id);
    frame.push(READ_HOLDING);
    frame.push(byte_count);
    for word in words.iter().take(usize::from(byte_count) / 2) {
        frame.extend_from_slice(&word.to_be_bytes());
    }
    crc::append(&mut frame);
    frame
}

/// Fatia de dados de uma resposta 0x03.
///
/// Usa o byte-count do cabeçalho, limitado ao que realmente chegou antes
/// do CRC. O CRC não é verificado aqui.
pub fn response_data(frame: &[u8]) -> Result<&[u8], ProtocolError> {
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(ProtocolError::TooShort(frame.len(), MIN_RESPONSE_LEN));
    }
    let function = frame[1];
    if function & EXCEPTION_FLAG != 0 {
        return Err(ProtocolError::Exception {
            function: function & !EXCEPTION_FLAG,
            code: frame[2],
        });
    }
    if function != READ_HOLDING {
        return Err(ProtocolError::UnsupportedFunction(function));
    }
    let available = frame.len() - RESPONSE_HEADER - 2;
    let declared = usize::from(frame[2]);
    Ok(&frame[RESPONSE_HEADER..RESPONSE_HEADER + declared.min(available)])
}

/// Palavras de 16 bits (big-endian) de uma resposta 0x03 com CRC conferido.
///
/// Usado no caminho síncrono do [`RegisterSource`](crate::source::RegisterSource).
pub fn response_words(frame: &[u8]) -> Result<Vec<u16>, ProtocolError> {
    if frame.len() >= 5 && frame[1] & EXCEPTION_FLAG != 0 {
        return Err(ProtocolError::Exception {
            function: frame[1] & !EXCEPTION_FLAG,
            code: frame[2],
        });
    }
    if !crc::verify(frame) {
        return Err(ProtocolError::BadCrc);
    }
    let data = response_data(frame)?;
    Ok(data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Tamanho esperado da resposta para `count` registradores.
pub fn expected_response_len(count: u16) -> usize {
    RESPONSE_HEADER + usize::from(count) * 2 + 2
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
