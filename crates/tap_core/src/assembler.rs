//! Remontagem de frames por silêncio na linha.
//!
//! Modbus RTU não tem campo de tamanho total, então o fim do frame é
//! inferido: bytes acumulam no buffer e, quando nada chega durante a janela
//! de quiescência, o buffer inteiro vira um frame.
//!
//! O assembler não dorme nem bloqueia. Quem chama passa o `Instant` atual
//! em [`FrameAssembler::push`] e [`FrameAssembler::poll`], assim o repasse
//! de bytes nunca espera pela janela.

use std::time::{Duration, Instant};
use tracing::debug;

/// Janela padrão de silêncio.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(100);

/// Maior buffer aceito: um ADU RTU (256 bytes) com folga de cabeçalho.
pub const MAX_BUFFER: usize = 256 + 5;

/// Buffer de um sentido da linha serial.
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    last_byte_at: Option<Instant>,
    quiescence: Duration,
    min_len: usize,
}

impl FrameAssembler {
    /// `min_len`: frames menores são descartados sem decodificar.
    pub fn new(quiescence: Duration, min_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(256),
            last_byte_at: None,
            quiescence,
            min_len,
        }
    }

    /// Acrescenta bytes recém-lidos.
    ///
    /// Se a linha nunca silencia e o buffer passaria de [`MAX_BUFFER`], o que
    /// estava acumulado é descartado e só os bytes mais novos ficam.
    pub fn push(&mut self, bytes: &[u8], now: Instant) {
        if bytes.is_empty() {
            return;
        }
        if self.buffer.len() + bytes.len() > MAX_BUFFER {
            debug!(
                "Buffer sem silêncio passou de {MAX_BUFFER} bytes, descartando {} bytes",
                self.buffer.len()
            );
            self.buffer.clear();
        }
        let keep = bytes.len().min(MAX_BUFFER);
        self.buffer.extend_from_slice(&bytes[bytes.len() - keep..]);
        self.last_byte_at = Some(now);
    }

    /// Retorna o frame completo se a linha ficou em silêncio por toda a janela.
    ///
    /// Frames curtos demais são descartados aqui e retornam `None`.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<u8>> {
        let last = self.last_byte_at?;
        if now.saturating_duration_since(last) < self.quiescence {
            return None;
        }

        self.last_byte_at = None;
        let frame = std::mem::take(&mut self.buffer);
        if frame.len() < self.min_len {
            debug!(
                "Frame descartado: {} bytes (mínimo {}) {:02X?}",
                frame.len(),
                self.min_len,
                frame
            );
            return None;
        }
        Some(frame)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_byte_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MIN_RESPONSE_LEN;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn two_reads_inside_window_make_one_frame() {
        let t0 = Instant::now();
        let mut asm = FrameAssembler::new(DEFAULT_QUIESCENCE, MIN_RESPONSE_LEN);

        asm.push(&[0x01, 0x03, 0x04, 0x00], t0);
        assert_eq!(asm.poll(t0 + ms(40)), None);
        asm.push(&[0x35, 0x02, 0x0C, 0xAA, 0xBB], t0 + ms(50));
        assert_eq!(asm.poll(t0 + ms(120)), None);

        let frame = asm.poll(t0 + ms(150)).unwrap();
        assert_eq!(frame, vec![0x01, 0x03, 0x04, 0x00, 0x35, 0x02, 0x0C, 0xAA, 0xBB]);
        assert!(asm.is_empty());
    }

    #[test]
    fn gap_longer_than_window_splits_frames() {
        let t0 = Instant::now();
        let mut asm = FrameAssembler::new(DEFAULT_QUIESCENCE, MIN_RESPONSE_LEN);
        let first = [0x01, 0x03, 0x02, 0x04, 0xD2, 0x00, 0x00];
        let second = [0x01, 0x03, 0x02, 0x00, 0x30, 0x11, 0x22];

        asm.push(&first, t0);
        let a = asm.poll(t0 + ms(100)).unwrap();
        asm.push(&second, t0 + ms(250));
        let b = asm.poll(t0 + ms(400)).unwrap();

        assert_eq!(a, first.to_vec());
        assert_eq!(b, second.to_vec());
    }

    #[test]
    fn short_buffer_is_discarded() {
        let t0 = Instant::now();
        let mut asm = FrameAssembler::new(DEFAULT_QUIESCENCE, MIN_RESPONSE_LEN);
        asm.push(&[0x01, 0x03, 0x02], t0);
        assert_eq!(asm.poll(t0 + ms(200)), None);
        assert!(asm.is_empty());
        // Nada pendente depois do descarte
        assert_eq!(asm.poll(t0 + ms(400)), None);
    }

    #[test]
    fn idle_assembler_yields_nothing() {
        let mut asm = FrameAssembler::new(DEFAULT_QUIESCENCE, 1);
        assert_eq!(asm.poll(Instant::now()), None);
        asm.push(&[], Instant::now());
        assert_eq!(asm.poll(Instant::now() + ms(500)), None);
    }

    #[test]
    fn endless_traffic_stays_bounded() {
        let t0 = Instant::now();
        let mut asm = FrameAssembler::new(DEFAULT_QUIESCENCE, MIN_RESPONSE_LEN);
        for i in 0..40u64 {
            asm.push(&[0x55; 10], t0 + ms(i * 10));
            assert!(asm.buffer.len() <= MAX_BUFFER);
        }
        asm.push(&[0xAA; 600], t0 + ms(400));
        assert_eq!(asm.buffer.len(), MAX_BUFFER);

        let tail = [0x01, 0x03, 0x02, 0x04, 0xD2, 0x00, 0x00];
        asm.push(&tail, t0 + ms(410));
        let frame = asm.poll(t0 + ms(600)).unwrap();
        assert_eq!(frame, tail.to_vec());
    }

    #[test]
    fn clear_drops_partial_frame() {
        let t0 = Instant::now();
        let mut asm = FrameAssembler::new(DEFAULT_QUIESCENCE, 1);
        asm.push(&[0xAA; 10], t0);
        asm.clear();
        assert_eq!(asm.poll(t0 + ms(500)), None);
    }
}
