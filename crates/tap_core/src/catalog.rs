//! Catálogo de registradores: endereço, largura, regra de decodificação,
//! nome, unidade e valores de enumeração.
//!
//! Os catálogos são tabelas estáticas imutáveis (ver [`crate::tables`]);
//! nada aqui é alterado em tempo de execução.

use crate::types::CycleRecord;

// ──────────────────────────────────────────────
// Regras de decodificação
// ──────────────────────────────────────────────

/// Regra aplicada ao inteiro bruto de um registrador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    /// Inteiro sem sinal, sem escala (blocos de preenchimento)
    Raw,
    /// Complemento de dois e divisão por 10^`decimals` (0..=3)
    Scaled { decimals: u8 },
    /// ÷10 e multiplicado pela classe de tensão do sistema (24 V → ×2, 48 V → ×4)
    VoltageClass,
    /// Um código de caractere
    Char,
    /// `len` registradores consecutivos, um caractere cada
    CharSeq { len: u8 },
    /// 0 → "off", 1 → "on"
    Boolean,
    /// Dígitos hexadecimais lidos como "HH:MM"
    PackedTime,
    /// Índice em `enum_values` do próprio descritor
    Enumerated,
    /// Índice nos `enum_values` do descritor em `table`
    Extension { table: u16 },
}

// ──────────────────────────────────────────────
// Descritores
// ──────────────────────────────────────────────

/// Descrição de um registrador conhecido.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterDescriptor {
    pub address: u16,
    /// Largura em palavras de 16 bits: 1, 2 ou 3
    pub words: u8,
    pub kind: DecodeKind,
    pub name: &'static str,
    pub unit: &'static str,
    /// `enum_values[i]` é o rótulo do valor bruto `i`
    pub enum_values: &'static [&'static str],
    /// Se entra como coluna no log (na ordem da tabela)
    pub logged: bool,
}

impl RegisterDescriptor {
    pub const fn scaled(
        address: u16,
        words: u8,
        decimals: u8,
        name: &'static str,
        unit: &'static str,
    ) -> Self {
        Self {
            address,
            words,
            kind: DecodeKind::Scaled { decimals },
            name,
            unit,
            enum_values: &[],
            logged: true,
        }
    }

    pub const fn enumerated(
        address: u16,
        name: &'static str,
        enum_values: &'static [&'static str],
    ) -> Self {
        Self {
            address,
            words: 1,
            kind: DecodeKind::Enumerated,
            name,
            unit: "",
            enum_values,
            logged: true,
        }
    }

    pub const fn with_kind(
        address: u16,
        kind: DecodeKind,
        name: &'static str,
        unit: &'static str,
    ) -> Self {
        Self {
            address,
            words: 1,
            kind,
            name,
            unit,
            enum_values: &[],
            logged: true,
        }
    }

    /// Bloco sem significado conhecido que só ocupa `words` palavras.
    pub const fn filler(address: u16, words: u8) -> Self {
        Self {
            address,
            words,
            kind: DecodeKind::Raw,
            name: "",
            unit: "",
            enum_values: &[],
            logged: false,
        }
    }

    pub const fn unlogged(mut self) -> Self {
        self.logged = false;
        self
    }

    /// Palavras consumidas do frame por este descritor.
    pub fn span(&self) -> usize {
        match self.kind {
            DecodeKind::CharSeq { len } => usize::from(len),
            _ => usize::from(self.words),
        }
    }

    /// Quantos endereços o cursor avança depois deste descritor.
    pub fn advance(&self) -> u16 {
        match self.kind {
            DecodeKind::CharSeq { len } => u16::from(len),
            _ => 1,
        }
    }
}

/// Registradores lidos uma única vez na partida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupRegisters {
    /// Classe de tensão do sistema (12/24/48)
    pub system_voltage: u16,
    /// Início do ID do produto (um caractere por registrador)
    pub product_id: u16,
    pub product_id_len: u16,
}

/// Coluna calculada: tensão da bateria × contador de Ah.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedColumn {
    pub name: &'static str,
    pub unit: &'static str,
    pub volts: u16,
    pub amp_hours: u16,
}

impl DerivedColumn {
    /// Energia em Wh arredondada a uma casa. Operando ausente conta como 0.
    pub fn evaluate(&self, record: &CycleRecord) -> f64 {
        let operand = |address| {
            record
                .get(address)
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
        };
        let wh = operand(self.volts) * operand(self.amp_hours);
        (wh * 10.0).round() / 10.0
    }
}

// ──────────────────────────────────────────────
// Catálogo
// ──────────────────────────────────────────────

/// Conjunto de registradores de um modelo de equipamento.
#[derive(Debug)]
pub struct Catalog {
    pub name: &'static str,
    pub registers: &'static [RegisterDescriptor],
    /// Último registrador de uma varredura completa
    pub sentinel: u16,
    pub startup: Option<StartupRegisters>,
    pub derived: &'static [DerivedColumn],
}

/// Rótulo da primeira coluna do log.
pub const TIMESTAMP_LABEL: &str = "Timestamp";

impl Catalog {
    /// Inversor híbrido HYP4850U100-H.
    pub fn hyp4850() -> &'static Catalog {
        &crate::tables::HYP4850
    }

    /// Medidor de energia OMRON KM-N1.
    pub fn km_n1() -> &'static Catalog {
        &crate::tables::KM_N1
    }

    /// Resolve o nome usado no `config.toml`.
    pub fn by_name(name: &str) -> Option<&'static Catalog> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hyp4850" | "hyp4850u100-h" => Some(Self::hyp4850()),
            "km-n1" | "km_n1" | "kmn1" => Some(Self::km_n1()),
            _ => None,
        }
    }

    pub fn get(&self, address: u16) -> Option<&'static RegisterDescriptor> {
        self.registers.iter().find(|d| d.address == address)
    }

    /// Descritores que viram colunas, na ordem das colunas.
    pub fn logged(&self) -> impl Iterator<Item = &'static RegisterDescriptor> {
        self.registers.iter().filter(|d| d.logged)
    }

    pub fn names_row(&self) -> Vec<String> {
        std::iter::once(TIMESTAMP_LABEL.to_string())
            .chain(self.logged().map(|d| d.name.to_string()))
            .chain(self.derived.iter().map(|c| c.name.to_string()))
            .collect()
    }

    pub fn units_row(&self) -> Vec<String> {
        std::iter::once(String::new())
            .chain(self.logged().map(|d| d.unit.to_string()))
            .chain(self.derived.iter().map(|c| c.unit.to_string()))
            .collect()
    }

    /// Confere as invariantes da tabela e retorna a lista de problemas.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (i, d) in self.registers.iter().enumerate() {
            if self.registers[..i].iter().any(|o| o.address == d.address) {
                errors.push(format!("{}: endereço 0x{:04X} duplicado", self.name, d.address));
            }
            if !(1..=3).contains(&d.words) {
                errors.push(format!(
                    "{}: 0x{:04X} com largura inválida {}",
                    self.name, d.address, d.words
                ));
            }
            match d.kind {
                DecodeKind::Scaled { decimals } if decimals > 3 => {
                    errors.push(format!("{}: 0x{:04X} com escala ÷10^{decimals}", self.name, d.address));
                }
                DecodeKind::Enumerated if d.enum_values.is_empty() => {
                    errors.push(format!("{}: 0x{:04X} enumerado sem valores", self.name, d.address));
                }
                DecodeKind::Extension { table } => {
                    if self.get(table).is_none_or(|t| t.enum_values.is_empty()) {
                        errors.push(format!(
                            "{}: 0x{:04X} estende tabela inexistente 0x{table:04X}",
                            self.name, d.address
                        ));
                    }
                }
                _ => {}
            }
            if d.logged && d.name.is_empty() {
                errors.push(format!("{}: coluna 0x{:04X} sem nome", self.name, d.address));
            }
        }

        if self.get(self.sentinel).is_none() {
            errors.push(format!(
                "{}: sentinela 0x{:04X} fora do catálogo",
                self.name, self.sentinel
            ));
        }

        errors
    }
}
