//! Ponte de um par serial: logger ↔ equipamento.
//!
//! Cada volta do laço move os bytes que estiverem esperando de um lado para
//! o outro ANTES de qualquer decodificação, e só então entrega uma cópia aos
//! assemblers. O sentido logger → equipamento só é lido até o endereço base
//! e a quantidade do pedido; o sentido equipamento → logger é decodificado
//! inteiro e vira [`BridgeEvent`] para a thread de agregação.
//!
//! Falhas de porta nunca encerram o laço: viram evento de falha e a porta é
//! reaberta depois de `reopen_interval`. Sem equipamento, a fonte simulada
//! responde no lugar dele.

use crossbeam_channel::{Sender, TrySendError};
use std::io;
use std::time::{Duration, Instant};
use tap_core::aggregator::BridgeEvent;
use tap_core::assembler::FrameAssembler;
use tap_core::decoder::{DecodeError, Decoder};
use tap_core::protocol::{self, ProtocolError, RequestHeader, MIN_RESPONSE_LEN, READ_HOLDING};
use tap_core::source::RegisterSource;
use tap_core::types::{ChannelId, DecodedSample};
use tracing::{debug, info, warn};

use crate::link::{PortOpener, SerialLink};

/// Menor pedido do qual dá para tirar endereço e quantidade.
const MIN_REQUEST_LEN: usize = 6;

/// Bytes lidos de uma porta por volta do laço.
const CHUNK: usize = 256;

/// Tempos do laço de uma ponte.
#[derive(Debug, Clone, Copy)]
pub struct BridgeTiming {
    pub quiescence: Duration,
    pub idle_sleep: Duration,
    pub reopen_interval: Duration,
}

// ──────────────────────────────────────────────
// Lado da ponte
// ──────────────────────────────────────────────

/// Uma porta da ponte com reabertura automática.
struct Endpoint {
    opener: Box<dyn PortOpener>,
    link: Option<Box<dyn SerialLink>>,
    next_attempt: Instant,
    /// Já avisou da falha atual
    reported: bool,
}

impl Endpoint {
    fn new(opener: Box<dyn PortOpener>, now: Instant) -> Self {
        Self {
            opener,
            link: None,
            next_attempt: now,
            reported: false,
        }
    }

    fn with_link(opener: Box<dyn PortOpener>, link: Box<dyn SerialLink>, now: Instant) -> Self {
        Self {
            opener,
            link: Some(link),
            next_attempt: now,
            reported: false,
        }
    }

    fn label(&self) -> &str {
        self.opener.label()
    }

    fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Tenta abrir se estiver fechada e o intervalo passou.
    ///
    /// Retorna a mensagem de falha só na primeira tentativa frustrada de uma
    /// sequência, para não encher o ciclo de erros repetidos.
    fn reconnect(&mut self, now: Instant, interval: Duration) -> Option<String> {
        if self.link.is_some() || now < self.next_attempt {
            return None;
        }
        match self.opener.open() {
            Ok(link) => {
                info!("Porta {} aberta", self.label());
                self.link = Some(link);
                self.reported = false;
                None
            }
            Err(e) => {
                self.next_attempt = now + interval;
                if self.reported {
                    debug!("Porta {} ainda indisponível: {e}", self.label());
                    return None;
                }
                self.reported = true;
                warn!("Falha ao abrir {}: {e}. Tentando novamente em {:.1}s", self.label(), interval.as_secs_f64());
                Some(format!("{}: {e}", self.label()))
            }
        }
    }

    /// Fecha a porta depois de um erro de E/S.
    fn drop_link(&mut self, now: Instant, interval: Duration, e: &io::Error) -> String {
        warn!("Erro de E/S em {}: {e}. Fechando a porta", self.label());
        self.link = None;
        self.next_attempt = now + interval;
        self.reported = true;
        format!("{}: {e}", self.label())
    }
}

/// Lê o que estiver esperando, sem bloquear. `Ok(0)` quando não há nada.
fn read_waiting(link: &mut dyn SerialLink, buf: &mut [u8]) -> io::Result<usize> {
    let waiting = link.bytes_waiting()?;
    if waiting == 0 {
        return Ok(0);
    }
    let n = waiting.min(buf.len());
    link.receive(&mut buf[..n])
}

// ──────────────────────────────────────────────
// Ponte
// ──────────────────────────────────────────────

pub struct ChannelBridge {
    channel: ChannelId,
    unit_id: u8,
    logger: Endpoint,
    device: Option<Endpoint>,
    /// Responde o logger quando o equipamento não está aberto
    fallback: Option<Box<dyn RegisterSource>>,
    requests: FrameAssembler,
    responses: FrameAssembler,
    last_request: Option<RequestHeader>,
    decoder: Decoder,
    events: Sender<BridgeEvent>,
    timing: BridgeTiming,
    buf: [u8; CHUNK],
}

impl ChannelBridge {
    pub fn new(
        channel: ChannelId,
        unit_id: u8,
        logger: Box<dyn PortOpener>,
        decoder: Decoder,
        timing: BridgeTiming,
        events: Sender<BridgeEvent>,
    ) -> Self {
        let now = Instant::now();
        Self {
            channel,
            unit_id,
            logger: Endpoint::new(logger, now),
            device: None,
            fallback: None,
            requests: FrameAssembler::new(timing.quiescence, MIN_REQUEST_LEN),
            responses: FrameAssembler::new(timing.quiescence, MIN_RESPONSE_LEN),
            last_request: None,
            decoder,
            events,
            timing,
            buf: [0; CHUNK],
        }
    }

    /// Porta do equipamento, aberta no próximo laço.
    pub fn with_device(mut self, opener: Box<dyn PortOpener>) -> Self {
        self.device = Some(Endpoint::new(opener, Instant::now()));
        self
    }

    /// Porta do equipamento já aberta (sobra das leituras da partida).
    pub fn with_open_device(mut self, opener: Box<dyn PortOpener>, link: Box<dyn SerialLink>) -> Self {
        self.device = Some(Endpoint::with_link(opener, link, Instant::now()));
        self
    }

    pub fn with_fallback(mut self, source: Box<dyn RegisterSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    /// Uma volta do laço. Retorna `true` se algum byte foi movido.
    pub fn poll_once(&mut self, now: Instant) -> bool {
        self.reconnect(now);

        let mut moved = self.pump_requests(now);
        moved |= self.pump_responses(now);

        if let Some(frame) = self.requests.poll(now) {
            self.handle_request(&frame, now);
        }
        if let Some(frame) = self.responses.poll(now) {
            self.handle_response(&frame);
        }

        moved
    }

    /// Laço sem fim da thread da ponte.
    pub fn run(mut self) {
        let fallback = self.fallback.as_ref().map(|s| s.describe());
        info!(
            "{}: ponte ativa | logger {} | equipamento {} | reserva {}",
            self.channel,
            self.logger.label(),
            self.device.as_ref().map_or("-", |d| d.label()),
            fallback.as_deref().unwrap_or("-"),
        );

        loop {
            if !self.poll_once(Instant::now()) {
                std::thread::sleep(self.timing.idle_sleep);
            }
        }
    }

    // ── Portas ──

    fn reconnect(&mut self, now: Instant) {
        let interval = self.timing.reopen_interval;
        let mut faults = Vec::new();

        let was_open = self.logger.is_open();
        faults.extend(self.logger.reconnect(now, interval));
        if !was_open && self.logger.is_open() {
            self.requests.clear();
        }

        if let Some(device) = self.device.as_mut() {
            let was_open = device.is_open();
            faults.extend(device.reconnect(now, interval));
            if !was_open && device.is_open() {
                self.responses.clear();
                self.last_request = None;
            }
        }

        for message in faults {
            self.fault(message);
        }
    }

    /// Logger → equipamento.
    fn pump_requests(&mut self, now: Instant) -> bool {
        let interval = self.timing.reopen_interval;
        let Some(logger) = self.logger.link.as_mut() else {
            return false;
        };
        let n = match read_waiting(logger.as_mut(), &mut self.buf) {
            Ok(0) => return false,
            Ok(n) => n,
            Err(e) => {
                let message = self.logger.drop_link(now, interval, &e);
                self.fault(message);
                return false;
            }
        };
        let chunk = &self.buf[..n];
        debug!("{} logger → equipamento {:02X?}", self.channel, chunk);

        // Repasse primeiro
        if let Some(device) = self.device.as_mut() {
            if let Some(link) = device.link.as_mut() {
                if let Err(e) = link.send(chunk) {
                    let message = device.drop_link(now, interval, &e);
                    self.requests.push(chunk, now);
                    self.fault(message);
                    return true;
                }
            }
        }

        self.requests.push(chunk, now);
        true
    }

    /// Equipamento → logger.
    fn pump_responses(&mut self, now: Instant) -> bool {
        let interval = self.timing.reopen_interval;
        let Some(device) = self.device.as_mut() else {
            return false;
        };
        let Some(link) = device.link.as_mut() else {
            return false;
        };
        let n = match read_waiting(link.as_mut(), &mut self.buf) {
            Ok(0) => return false,
            Ok(n) => n,
            Err(e) => {
                let message = device.drop_link(now, interval, &e);
                self.fault(message);
                return false;
            }
        };
        let chunk = &self.buf[..n];
        debug!("{} equipamento → logger {:02X?}", self.channel, chunk);

        // Repasse primeiro
        if let Some(logger) = self.logger.link.as_mut() {
            if let Err(e) = logger.send(chunk) {
                let message = self.logger.drop_link(now, interval, &e);
                self.responses.push(chunk, now);
                self.fault(message);
                return true;
            }
        }

        self.responses.push(chunk, now);
        true
    }

    // ── Frames ──

    fn handle_request(&mut self, frame: &[u8], now: Instant) {
        let header = match protocol::parse_request(frame) {
            Ok(h) => h,
            Err(e) => {
                debug!("{}: pedido ignorado: {e}", self.channel);
                return;
            }
        };
        if header.function != READ_HOLDING {
            debug!("{}: função 0x{:02X} repassada sem decodificar", self.channel, header.function);
            self.last_request = None;
            return;
        }
        self.last_request = Some(header);

        if self.device.as_ref().is_some_and(Endpoint::is_open) {
            return;
        }
        if header.unit_id != self.unit_id {
            debug!("{}: pedido para unit {} ignorado", self.channel, header.unit_id);
            return;
        }
        if let Some(response) = self.simulated_response(header) {
            if let Some(logger) = self.logger.link.as_mut() {
                if let Err(e) = logger.send(&response) {
                    let message = self.logger.drop_link(now, self.timing.reopen_interval, &e);
                    self.fault(message);
                }
            }
            self.handle_response(&response);
        }
    }

    fn simulated_response(&mut self, header: RequestHeader) -> Option<Vec<u8>> {
        let source = self.fallback.as_mut()?;
        match source.read_holding(header.unit_id, header.address, header.count) {
            Ok(words) => Some(protocol::build_read_response(header.unit_id, &words)),
            Err(e) => {
                let message = format!("{}: {e}", source.describe());
                self.fault(message);
                None
            }
        }
    }

    fn handle_response(&mut self, frame: &[u8]) {
        let Some(request) = self.last_request.take() else {
            debug!("{}: resposta sem pedido correspondente, ignorada", self.channel);
            return;
        };

        match self.decoder.decode_frame(request.address, frame) {
            Ok(decoded) => {
                self.refresh_system_voltage(&decoded.samples);
                for error in decoded.errors {
                    self.fault(error.to_string());
                }
                if !decoded.samples.is_empty() {
                    self.send(BridgeEvent::Decoded {
                        channel: self.channel,
                        address: request.address,
                        count: request.count,
                        samples: decoded.samples,
                    });
                }
            }
            Err(DecodeError::Frame(e @ ProtocolError::Exception { .. })) => {
                self.fault(format!("0x{:04X}: {e}", request.address));
            }
            Err(e) => debug!("{}: resposta não decodificada: {e}", self.channel),
        }
    }

    fn refresh_system_voltage(&mut self, samples: &[DecodedSample]) {
        let Some(startup) = self.decoder.catalog().startup else {
            return;
        };
        let volts = samples
            .iter()
            .find(|s| s.address == startup.system_voltage)
            .and_then(|s| s.value.as_f64());
        if let Some(volts) = volts {
            let volts = volts as u16;
            if self.decoder.system_voltage() != Some(volts) {
                info!("{}: tensão do sistema {} V", self.channel, volts);
                self.decoder.set_system_voltage(volts);
            }
        }
    }

    // ── Eventos ──

    fn fault(&self, message: String) {
        self.send(BridgeEvent::Fault {
            channel: self.channel,
            message,
        });
    }

    fn send(&self, event: BridgeEvent) {
        // Non-blocking: o repasse de bytes nunca espera pelo agregador
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(BridgeEvent::Decoded { address, count, .. })) => {
                warn!(
                    "{}: fila de eventos cheia, resposta 0x{address:04X}×{count} perdida",
                    self.channel
                );
            }
            Err(TrySendError::Full(BridgeEvent::Fault { message, .. })) => {
                warn!("{}: fila de eventos cheia, falha perdida: {message}", self.channel);
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("{}: agregador encerrado, evento descartado", self.channel);
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::MockOpener;
    use crate::pipeline::{Lane, Pipeline};
    use chrono::Local;
    use crossbeam_channel::{Receiver, bounded};
    use tap_core::aggregator::CycleAggregator;
    use tap_core::catalog::Catalog;
    use tap_core::log_writer::TelemetryLogWriter;
    use tap_core::source::SimulatedSource;
    use tap_core::types::Value;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn timing() -> BridgeTiming {
        BridgeTiming {
            quiescence: ms(100),
            idle_sleep: Duration::from_micros(500),
            reopen_interval: Duration::from_secs(2),
        }
    }

    fn bridge(logger: &MockOpener) -> (ChannelBridge, Receiver<BridgeEvent>) {
        let (tx, rx) = bounded(16);
        let b = ChannelBridge::new(
            ChannelId(0),
            1,
            Box::new(logger.clone()),
            Decoder::new(Catalog::hyp4850()),
            timing(),
            tx,
        );
        (b, rx)
    }

    fn decoded(rx: &Receiver<BridgeEvent>) -> Vec<DecodedSample> {
        match rx.try_recv() {
            Ok(BridgeEvent::Decoded { samples, .. }) => samples,
            other => panic!("esperava amostras, veio {other:?}"),
        }
    }

    fn value(samples: &[DecodedSample], address: u16) -> Option<&Value> {
        samples.iter().find(|s| s.address == address).map(|s| &s.value)
    }

    #[test]
    fn forwards_before_decoding_live_traffic() {
        let logger = MockOpener::new("logger", true);
        let device = MockOpener::new("device", true);
        let (b, rx) = bridge(&logger);
        let mut b = b.with_device(Box::new(device.clone()));

        let t0 = Instant::now();
        let request = protocol::build_read_request(1, 0x0100, 3).unwrap();
        logger.link.feed(&request);
        assert!(b.poll_once(t0));
        // O pedido já passou, sem esperar a janela de silêncio
        assert_eq!(device.link.take_outbound(), request);

        let response = protocol::build_read_response(1, &[53, 524, 10]);
        device.link.feed(&response[..4]);
        assert!(b.poll_once(t0 + ms(20)));
        device.link.feed(&response[4..]);
        assert!(b.poll_once(t0 + ms(40)));
        assert_eq!(logger.link.take_outbound(), response);
        assert!(rx.try_recv().is_err());

        assert!(!b.poll_once(t0 + ms(200)));
        let samples = decoded(&rx);
        assert_eq!(value(&samples, 0x0100), Some(&Value::Integer(53)));
        assert_eq!(value(&samples, 0x0101), Some(&Value::Number(52.4)));
        assert_eq!(value(&samples, 0x0102), Some(&Value::Number(1.0)));
    }

    #[test]
    fn simulated_device_answers_logger() {
        let logger = MockOpener::new("logger", true);
        let (b, rx) = bridge(&logger);
        let mut b = b.with_fallback(Box::new(SimulatedSource::hyp4850()));

        let t0 = Instant::now();
        logger.link.feed(&protocol::build_read_request(1, 0x0100, 3).unwrap());
        b.poll_once(t0);
        assert!(logger.link.take_outbound().is_empty());

        b.poll_once(t0 + ms(150));
        assert_eq!(
            logger.link.take_outbound(),
            protocol::build_read_response(1, &[0x0035, 0x020C, 0x000A])
        );
        let samples = decoded(&rx);
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn other_unit_ids_are_not_answered() {
        let logger = MockOpener::new("logger", true);
        let (b, rx) = bridge(&logger);
        let mut b = b.with_fallback(Box::new(SimulatedSource::hyp4850()));

        let t0 = Instant::now();
        logger.link.feed(&protocol::build_read_request(7, 0x0100, 3).unwrap());
        b.poll_once(t0);
        b.poll_once(t0 + ms(150));
        assert!(logger.link.take_outbound().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn missing_device_is_reported_once_and_retried() {
        let logger = MockOpener::new("logger", true);
        let device = MockOpener::new("device", false);
        let (b, rx) = bridge(&logger);
        let mut b = b.with_device(Box::new(device.clone()));

        let t0 = Instant::now();
        b.poll_once(t0);
        assert_eq!(device.attempts(), 1);
        assert!(matches!(rx.try_recv(), Ok(BridgeEvent::Fault { .. })));

        b.poll_once(t0 + ms(500));
        assert_eq!(device.attempts(), 1);

        b.poll_once(t0 + Duration::from_secs(3));
        assert_eq!(device.attempts(), 2);
        assert!(rx.try_recv().is_err());

        device.set_available(true);
        b.poll_once(t0 + Duration::from_secs(6));
        assert_eq!(device.attempts(), 3);
        assert!(b.device.as_ref().is_some_and(Endpoint::is_open));
    }

    #[test]
    fn broken_device_link_is_closed_and_reopened() {
        let logger = MockOpener::new("logger", true);
        let device = MockOpener::new("device", true);
        let (b, rx) = bridge(&logger);
        let mut b = b.with_device(Box::new(device.clone()));

        let t0 = Instant::now();
        b.poll_once(t0);
        device.link.line.lock().unwrap().broken = true;
        b.poll_once(t0 + ms(10));
        assert!(matches!(rx.try_recv(), Ok(BridgeEvent::Fault { .. })));
        assert!(!b.device.as_ref().is_some_and(Endpoint::is_open));

        device.link.line.lock().unwrap().broken = false;
        b.poll_once(t0 + Duration::from_secs(3));
        assert!(b.device.as_ref().is_some_and(Endpoint::is_open));
    }

    #[test]
    fn system_voltage_is_refreshed_from_traffic() {
        let logger = MockOpener::new("logger", true);
        let (b, _rx) = bridge(&logger);
        let mut sim = SimulatedSource::from_blocks("teste", &[]);
        sim.set(0xE003, 24);
        let mut b = b.with_fallback(Box::new(sim));

        let t0 = Instant::now();
        logger.link.feed(&protocol::build_read_request(1, 0xE003, 1).unwrap());
        b.poll_once(t0);
        b.poll_once(t0 + ms(150));
        assert_eq!(b.decoder.system_voltage(), Some(24));
    }

    #[test]
    fn response_without_request_is_ignored() {
        let logger = MockOpener::new("logger", true);
        let device = MockOpener::new("device", true);
        let (b, rx) = bridge(&logger);
        let mut b = b.with_device(Box::new(device.clone()));

        let t0 = Instant::now();
        b.poll_once(t0);
        device.link.feed(&protocol::build_read_response(1, &[1, 2, 3]));
        b.poll_once(t0 + ms(1));
        b.poll_once(t0 + ms(200));
        assert!(rx.try_recv().is_err());
        assert_eq!(logger.link.take_outbound().len(), 11);
    }

    #[test]
    fn full_event_queue_never_blocks_forwarding() {
        let logger = MockOpener::new("logger", true);
        let device = MockOpener::new("device", true);
        let (tx, rx) = bounded(1);
        let mut b = ChannelBridge::new(
            ChannelId(0),
            1,
            Box::new(logger.clone()),
            Decoder::new(Catalog::hyp4850()),
            timing(),
            tx,
        )
        .with_device(Box::new(device.clone()));

        let request = protocol::build_read_request(1, 0x0100, 3).unwrap();
        let response = protocol::build_read_response(1, &[53, 524, 10]);
        let t0 = Instant::now();
        for i in 0..3 {
            let t = t0 + ms(i * 400);
            logger.link.feed(&request);
            assert!(b.poll_once(t));
            assert_eq!(device.link.take_outbound(), request);
            device.link.feed(&response);
            assert!(b.poll_once(t + ms(1)));
            assert_eq!(logger.link.take_outbound(), response);
            b.poll_once(t + ms(150));
        }
        assert_eq!(rx.len(), 1);
    }

    // ── Varredura gravada de ponta a ponta ──

    /// Roda a varredura gravada do logger pela ponte (equipamento simulado)
    /// e pelo agregador. Devolve o cabeçalho de nomes e as linhas de dados.
    fn replay_recorded_sweep(catalog: &'static Catalog, sim: SimulatedSource) -> (Vec<String>, Vec<Vec<String>>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("varredura.csv");
        let writer = TelemetryLogWriter::open(&path, catalog).unwrap();
        let aggregator = CycleAggregator::new(ChannelId(0), catalog.sentinel);
        let mut pipeline = Pipeline::new(vec![Lane { aggregator, writer }], Duration::from_secs(2));

        let logger = MockOpener::new("logger", true);
        let (tx, rx) = bounded(16);
        let sweep = sim.sweep().to_vec();
        let mut b = ChannelBridge::new(
            ChannelId(0),
            1,
            Box::new(logger.clone()),
            Decoder::new(catalog),
            timing(),
            tx,
        )
        .with_fallback(Box::new(sim));

        let mut t = Instant::now();
        for (address, count) in sweep {
            logger.link.feed(&protocol::build_read_request(1, address, count).unwrap());
            b.poll_once(t);
            b.poll_once(t + ms(150));
            let answer = logger.link.take_outbound();
            assert_eq!(answer.len(), protocol::expected_response_len(count), "0x{address:04X}");
            while let Ok(event) = rx.try_recv() {
                assert!(matches!(event, BridgeEvent::Decoded { .. }), "{event:?}");
                pipeline.handle(event, Local::now(), t);
            }
            t += ms(300);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content
            .lines()
            .map(|l| l.split(',').map(str::to_string).collect::<Vec<_>>());
        let names = lines.next().unwrap();
        let rows = lines.skip(1).collect();
        (names, rows)
    }

    fn column<'a>(names: &[String], row: &'a [String], name: &str) -> &'a str {
        let idx = names.iter().position(|n| n == name).unwrap();
        &row[idx]
    }

    #[test]
    fn recorded_inverter_sweep_writes_one_row() {
        let (names, rows) = replay_recorded_sweep(Catalog::hyp4850(), SimulatedSource::hyp4850());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.len(), names.len());

        let expected = [
            ("Product type", "Main frequency off-grid"),
            ("Current state of machine", "Running in invert"),
            ("Battery voltage(V)", "52.4"),
            ("Battery current(A)", "1.0"),
            ("Battery level SOC(%)", "53"),
            ("Battery type", "LFPx16"),
            ("Bus voltage(V)", "393.0"),
            ("PV voltage(V)", "172.7"),
            ("Battery charge today(Ah)", "28"),
            ("Accumulated battery charge(Ah)", "4079"),
            ("Equipment type", "HYP4850U100-H"),
            ("Battery energy today charge(Wh)", "1467.2"),
        ];
        for (name, value) in expected {
            assert_eq!(column(&names, row, name), value, "{name}");
        }
    }

    #[test]
    fn recorded_meter_sweep_writes_one_full_row() {
        let (names, rows) = replay_recorded_sweep(Catalog::km_n1(), SimulatedSource::km_n1());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.len(), names.len());
        assert!(row.iter().all(|field| !field.is_empty()), "{row:?}");

        let expected = [
            ("Voltage 1(V)", "966.0"),
            ("Voltage 2(V)", "1012.0"),
            ("Current 1(A)", "59.43"),
            ("Power factor", "9.3"),
            ("Active power(W)", "8552.0"),
            ("Total reactive energy(kVarh)", "0"),
        ];
        for (name, value) in expected {
            assert_eq!(column(&names, row, name), value, "{name}");
        }
    }
}
