//! Log CSV com as linhas mais recentes no topo.
//!
//! Layout do arquivo:
//! - linha 1: nomes (`Timestamp`, registradores do catálogo, colunas derivadas)
//! - linha 2: unidades
//! - linha 3 em diante: dados, a linha nova sempre na linha 3
//!
//! As ferramentas de relatório leem pela posição da coluna e esperam essa
//! ordem. O arquivo fica aberto enquanto o escritor existir.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::types::{CycleRecord, Value};

/// Formato do carimbo de tempo na primeira coluna.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Erro de E/S no log: {0}")]
    Io(#[from] io::Error),

    #[error("Erro de CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cabeçalho incompleto em {0}")]
    Header(PathBuf),
}

/// Escritor de um arquivo de log.
#[derive(Debug)]
pub struct TelemetryLogWriter {
    file: File,
    path: PathBuf,
    catalog: &'static Catalog,
    /// Bytes das duas linhas de cabeçalho
    header_len: u64,
    rows_written: u64,
}

impl TelemetryLogWriter {
    /// Abre (ou cria) o log. Arquivo novo recebe o cabeçalho do catálogo;
    /// arquivo existente mantém o cabeçalho que já tem.
    pub fn open(path: &Path, catalog: &'static Catalog) -> Result<Self, LogError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let expected = encode_rows(&[catalog.names_row(), catalog.units_row()])?;

        let mut existing = Vec::new();
        file.read_to_end(&mut existing)?;

        let header_len = if existing.iter().all(u8::is_ascii_whitespace) {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&expected)?;
            file.flush()?;
            info!("Log criado: {}", path.display());
            expected.len()
        } else {
            let end = header_end(&existing).ok_or_else(|| LogError::Header(path.to_path_buf()))?;
            if existing[..end] != expected[..] {
                warn!(
                    "Cabeçalho de {} difere do catálogo {}; mantendo o existente",
                    path.display(),
                    catalog.name
                );
            }
            info!("Log reaberto: {}", path.display());
            end
        };

        Ok(Self {
            file,
            path: path.to_path_buf(),
            catalog,
            header_len: header_len as u64,
            rows_written: 0,
        })
    }

    /// Insere a linha do registro logo abaixo do cabeçalho.
    pub fn write(&mut self, record: &CycleRecord) -> Result<(), LogError> {
        for error in &record.errors {
            warn!(
                "{} {}: {}",
                record.channel,
                record.timestamp.format(TIMESTAMP_FORMAT),
                error
            );
        }

        let row = encode_rows(&[row_fields(self.catalog, record)])?;

        let mut older = Vec::new();
        self.file.seek(SeekFrom::Start(self.header_len))?;
        self.file.read_to_end(&mut older)?;

        self.file.seek(SeekFrom::Start(self.header_len))?;
        self.file.write_all(&row)?;
        self.file.write_all(&older)?;
        self.file.flush()?;

        self.rows_written += 1;
        Ok(())
    }

    /// Linhas escritas por este escritor (não conta as de execuções anteriores).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Campos de uma linha de dados, na ordem das colunas do catálogo.
///
/// Registrador sem amostra no ciclo vira campo vazio.
pub fn row_fields(catalog: &Catalog, record: &CycleRecord) -> Vec<String> {
    let mut fields = Vec::with_capacity(1 + catalog.registers.len() + catalog.derived.len());
    fields.push(record.timestamp.format(TIMESTAMP_FORMAT).to_string());
    fields.extend(
        catalog
            .logged()
            .map(|d| record.get(d.address).map(Value::to_string).unwrap_or_default()),
    );
    fields.extend(
        catalog
            .derived
            .iter()
            .map(|c| Value::Number(c.evaluate(record)).to_string()),
    );
    fields
}

fn encode_rows(rows: &[Vec<String>]) -> Result<Vec<u8>, LogError> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner().map_err(|e| LogError::Io(e.into_error()))
}

/// Offset logo após a segunda quebra de linha.
fn header_end(content: &[u8]) -> Option<usize> {
    content
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .nth(1)
        .map(|(i, _)| i + 1)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
