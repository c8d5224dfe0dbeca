//! [`RegisterSource`] sobre uma porta serial real.
//!
//! Caminho síncrono usado só nas leituras da partida: manda o pedido,
//! espera a resposta inteira dentro do timeout e confere o CRC.

use std::time::{Duration, Instant};
use tap_core::protocol::{self, EXCEPTION_FLAG};
use tap_core::source::{RegisterSource, SourceError};
use tracing::debug;

use crate::link::SerialLink;

/// Tamanho de uma resposta de exceção (unit, função|0x80, código, CRC).
const EXCEPTION_LEN: usize = 5;

/// Intervalo entre consultas à porta enquanto a resposta chega.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

pub struct SerialSource {
    link: Box<dyn SerialLink>,
    label: String,
    timeout: Duration,
}

impl SerialSource {
    pub fn new(link: Box<dyn SerialLink>, label: impl Into<String>, timeout: Duration) -> Self {
        Self {
            link,
            label: label.into(),
            timeout,
        }
    }

    /// Devolve a porta para quem vai usá-la depois (a ponte).
    pub fn into_link(self) -> Box<dyn SerialLink> {
        self.link
    }

    /// Descarta o que sobrou na linha de uma troca anterior.
    fn purge(&mut self) -> Result<(), SourceError> {
        let mut scratch = [0u8; 256];
        loop {
            let waiting = self.link.bytes_waiting()?;
            if waiting == 0 {
                return Ok(());
            }
            let room = waiting.min(scratch.len());
            let n = self.link.receive(&mut scratch[..room])?;
            debug!("{}: {} bytes antigos descartados", self.label, n);
            if n == 0 {
                return Ok(());
            }
        }
    }

    fn collect_response(&mut self, expected: usize) -> Result<Vec<u8>, SourceError> {
        let deadline = Instant::now() + self.timeout;
        let mut frame = Vec::with_capacity(expected);
        let mut chunk = [0u8; 256];

        loop {
            let is_exception = frame.len() >= 2 && frame[1] & EXCEPTION_FLAG != 0;
            let wanted = if is_exception { EXCEPTION_LEN } else { expected };
            if frame.len() >= wanted {
                frame.truncate(wanted);
                return Ok(frame);
            }

            let waiting = self.link.bytes_waiting()?;
            if waiting > 0 {
                let room = (wanted - frame.len()).min(waiting).min(chunk.len());
                let n = self.link.receive(&mut chunk[..room])?;
                frame.extend_from_slice(&chunk[..n]);
                continue;
            }

            if Instant::now() >= deadline {
                return Err(SourceError::Timeout {
                    received: frame.len(),
                    expected: wanted,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl RegisterSource for SerialSource {
    fn read_holding(&mut self, unit_id: u8, address: u16, count: u16) -> Result<Vec<u16>, SourceError> {
        let request = protocol::build_read_request(unit_id, address, count)?;
        self.purge()?;
        self.link.send(&request)?;

        let frame = self.collect_response(protocol::expected_response_len(count))?;
        let words = protocol::response_words(&frame)?;
        if words.len() != usize::from(count) {
            return Err(SourceError::CountMismatch {
                got: words.len(),
                wanted: count,
            });
        }
        Ok(words)
    }

    fn describe(&self) -> String {
        format!("serial {}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::MockLink;
    use tap_core::crc;
    use tap_core::protocol::ProtocolError;

    fn source(link: &MockLink, timeout_ms: u64) -> SerialSource {
        SerialSource::new(Box::new(link.clone()), "COM9", Duration::from_millis(timeout_ms))
    }

    /// Entrega `bytes` na linha um pouco depois do pedido sair.
    fn answer_later(link: &MockLink, bytes: Vec<u8>) -> std::thread::JoinHandle<()> {
        let link = link.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(5));
            link.feed(&bytes);
        })
    }

    #[test]
    fn reads_registers_after_purging_stale_bytes() {
        let link = MockLink::default();
        link.feed(&[0xAA, 0xBB, 0xCC]);
        let mut src = source(&link, 500);

        let handle = answer_later(&link, protocol::build_read_response(1, &[48]));
        let words = src.read_holding(1, 0xE003, 1).unwrap();
        handle.join().unwrap();

        assert_eq!(words, vec![48]);
        assert_eq!(link.take_outbound(), protocol::build_read_request(1, 0xE003, 1).unwrap());
        assert_eq!(src.describe(), "serial COM9");
    }

    #[test]
    fn exception_response_is_reported() {
        let link = MockLink::default();
        let mut src = source(&link, 500);
        let mut frame = vec![0x01, 0x83, 0x02];
        crc::append(&mut frame);
        let handle = answer_later(&link, frame);
        let err = src.read_holding(1, 0x9999, 2).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(
            err,
            SourceError::Protocol(ProtocolError::Exception { function: 0x03, code: 0x02 })
        ));
    }

    #[test]
    fn corrupted_response_fails_crc() {
        let link = MockLink::default();
        let mut src = source(&link, 500);
        let mut frame = protocol::build_read_response(1, &[0x1234]);
        frame[3] ^= 0xFF;
        let handle = answer_later(&link, frame);
        let err = src.read_holding(1, 0x0100, 1).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, SourceError::Protocol(ProtocolError::BadCrc)));
    }

    #[test]
    fn silent_device_times_out() {
        let link = MockLink::default();
        let mut src = source(&link, 30);
        let err = src.read_holding(1, 0x0100, 3).unwrap_err();
        assert!(matches!(err, SourceError::Timeout { received: 0, expected: 11 }));
    }
}
