//! CRC16 Modbus (polinômio 0xA001 refletido, valor inicial 0xFFFF).
//!
//! No fio o CRC vai little-endian: byte baixo primeiro.

const POLY: u16 = 0xA001;
const INIT: u16 = 0xFFFF;

/// Calcula o CRC16 Modbus de `bytes`, bit menos significativo primeiro.
pub fn compute(bytes: &[u8]) -> u16 {
    let mut crc = INIT;
    for &byte in bytes {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Verifica os dois últimos bytes do frame contra o CRC do restante.
///
/// Frames com menos de 2 bytes nunca são válidos. Divergência é só `false`;
/// quem chama decide se descarta o frame.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let (body, tail) = frame.split_at(frame.len() - 2);
    compute(body) == u16::from_le_bytes([tail[0], tail[1]])
}

/// Anexa o CRC (little-endian) ao final do buffer.
pub fn append(frame: &mut Vec<u8>) {
    let crc = compute(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_read_request_crc() {
        // 01 03 00 00 00 0A → C5 CD
        let crc = compute(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]);
        assert_eq!(crc.to_le_bytes(), [0xC5, 0xCD]);
    }

    #[test]
    fn empty_input_is_init_value() {
        assert_eq!(compute(&[]), 0xFFFF);
    }

    #[test]
    fn appended_crc_always_verifies() {
        let samples: [&[u8]; 5] = [
            &[],
            &[0x00],
            &[0x01, 0x03, 0x02, 0x04, 0xD2],
            &[0xFF; 64],
            b"HYP4850U100-H",
        ];
        for sample in samples {
            let mut frame = sample.to_vec();
            append(&mut frame);
            assert!(verify(&frame), "CRC não confere para {sample:02X?}");
        }
    }

    #[test]
    fn corrupted_byte_fails_verification() {
        let mut frame = vec![0x01, 0x03, 0x02, 0x04, 0xD2];
        append(&mut frame);
        frame[3] ^= 0x01;
        assert!(!verify(&frame));
    }

    #[test]
    fn short_frame_never_verifies() {
        assert!(!verify(&[0xFF]));
        assert!(!verify(&[]));
    }
}
