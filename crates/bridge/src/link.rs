//! Portas seriais vistas pela ponte.
//!
//! A ponte só precisa de três coisas de uma porta: quantos bytes estão
//! esperando, ler esses bytes e escrever. [`SerialLink`] isola isso do
//! crate `serialport` para que o laço possa ser testado com portas em memória.

use std::io::{self, Read, Write};
use tap_core::config::SerialSettings;

/// Uma porta serial aberta.
pub trait SerialLink: Send {
    /// Bytes já recebidos e ainda não lidos. Não bloqueia.
    fn bytes_waiting(&mut self) -> io::Result<usize>;

    /// Lê até `buf.len()` bytes.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Escreve todos os bytes e esvazia o buffer de saída.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Sabe abrir (e reabrir) uma porta.
pub trait PortOpener: Send {
    /// Nome da porta para logs ("/dev/ttyUSB0", "COM3").
    fn label(&self) -> &str;

    fn open(&self) -> io::Result<Box<dyn SerialLink>>;
}

// ──────────────────────────────────────────────
// Implementação com serialport
// ──────────────────────────────────────────────

/// Porta física aberta pelo crate `serialport`.
pub struct SystemPort {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLink for SystemPort {
    fn bytes_waiting(&mut self) -> io::Result<usize> {
        let n = self.port.bytes_to_read().map_err(io::Error::from)?;
        Ok(n as usize)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }
}

/// Abre uma porta pelo caminho com os parâmetros de linha do canal.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    path: String,
    settings: SerialSettings,
}

impl SerialOpener {
    pub fn new(path: impl Into<String>, settings: SerialSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }
}

impl PortOpener for SerialOpener {
    fn label(&self) -> &str {
        &self.path
    }

    fn open(&self) -> io::Result<Box<dyn SerialLink>> {
        let s = &self.settings;
        let port = serialport::new(&self.path, s.baud_rate)
            .data_bits(data_bits(s.data_bits))
            .parity(parity(&s.parity))
            .stop_bits(stop_bits(s.stop_bits))
            .timeout(s.timeout())
            .open()
            .map_err(io::Error::from)?;
        Ok(Box::new(SystemPort { port }))
    }
}

fn data_bits(bits: u8) -> serialport::DataBits {
    match bits {
        5 => serialport::DataBits::Five,
        6 => serialport::DataBits::Six,
        7 => serialport::DataBits::Seven,
        _ => serialport::DataBits::Eight,
    }
}

fn parity(name: &str) -> serialport::Parity {
    match name.to_lowercase().as_str() {
        "even" => serialport::Parity::Even,
        "odd" => serialport::Parity::Odd,
        _ => serialport::Parity::None,
    }
}

fn stop_bits(bits: u8) -> serialport::StopBits {
    match bits {
        2 => serialport::StopBits::Two,
        _ => serialport::StopBits::One,
    }
}

// ──────────────────────────────────────────────
// Portas em memória para testes
// ──────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub struct LineState {
        /// Bytes que a porta vai entregar
        pub inbound: VecDeque<u8>,
        /// Bytes escritos na porta
        pub outbound: Vec<u8>,
        /// Próximas operações falham
        pub broken: bool,
    }

    /// Porta em memória; clones compartilham a mesma linha.
    #[derive(Debug, Clone, Default)]
    pub struct MockLink {
        pub line: Arc<Mutex<LineState>>,
    }

    impl MockLink {
        pub fn feed(&self, bytes: &[u8]) {
            self.line.lock().unwrap().inbound.extend(bytes.iter().copied());
        }

        pub fn take_outbound(&self) -> Vec<u8> {
            std::mem::take(&mut self.line.lock().unwrap().outbound)
        }
    }

    fn broken() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "porta desconectada")
    }

    impl SerialLink for MockLink {
        fn bytes_waiting(&mut self) -> io::Result<usize> {
            let line = self.line.lock().unwrap();
            if line.broken {
                return Err(broken());
            }
            Ok(line.inbound.len())
        }

        fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut line = self.line.lock().unwrap();
            if line.broken {
                return Err(broken());
            }
            let n = buf.len().min(line.inbound.len());
            for (slot, byte) in buf.iter_mut().zip(line.inbound.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            let mut line = self.line.lock().unwrap();
            if line.broken {
                return Err(broken());
            }
            line.outbound.extend_from_slice(bytes);
            Ok(())
        }
    }

    /// Abre sempre a mesma [`MockLink`], ou falha enquanto `available` for falso.
    #[derive(Debug, Clone)]
    pub struct MockOpener {
        pub label: String,
        pub link: MockLink,
        pub available: Arc<Mutex<bool>>,
        pub attempts: Arc<Mutex<u32>>,
    }

    impl MockOpener {
        pub fn new(label: &str, available: bool) -> Self {
            Self {
                label: label.into(),
                link: MockLink::default(),
                available: Arc::new(Mutex::new(available)),
                attempts: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_available(&self, available: bool) {
            *self.available.lock().unwrap() = available;
        }

        pub fn attempts(&self) -> u32 {
            *self.attempts.lock().unwrap()
        }
    }

    impl PortOpener for MockOpener {
        fn label(&self) -> &str {
            &self.label
        }

        fn open(&self) -> io::Result<Box<dyn SerialLink>> {
            *self.attempts.lock().unwrap() += 1;
            if *self.available.lock().unwrap() {
                Ok(Box::new(self.link.clone()))
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "porta ausente"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_settings_map_to_serialport() {
        assert_eq!(data_bits(7), serialport::DataBits::Seven);
        assert_eq!(data_bits(8), serialport::DataBits::Eight);
        assert_eq!(parity("EVEN"), serialport::Parity::Even);
        assert_eq!(parity("none"), serialport::Parity::None);
        assert_eq!(stop_bits(2), serialport::StopBits::Two);
        assert_eq!(stop_bits(1), serialport::StopBits::One);
    }

    #[test]
    fn opener_reports_missing_port() {
        let opener = SerialOpener::new("/dev/tap-bridge-inexistente", SerialSettings::default());
        assert_eq!(opener.label(), "/dev/tap-bridge-inexistente");
        assert!(opener.open().is_err());
    }
}
