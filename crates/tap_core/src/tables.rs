//! Tabelas estáticas dos equipamentos suportados.
//!
//! A ordem dos descritores marcados como `logged` é a ordem das colunas do
//! log; os relatórios leem o arquivo por posição, então não reordenar.

use crate::catalog::{
    Catalog, DecodeKind, DerivedColumn, RegisterDescriptor as R, StartupRegisters,
};

// ──────────────────────────────────────────────
// HYP4850U100-H
// ──────────────────────────────────────────────

const PRODUCT_TYPE: &[&str] = &[
    "Controller",
    "Controller",
    "Inverter",
    "Integrated inverter controller",
    "Main frequency off-grid",
];

const MACHINE_STATE: &[&str] = &[
    "Power-on",
    "Stand by",
    "Initialization",
    "Soft start",
    "Running in line",
    "Running in invert",
    "Invert to line",
    "Line to invert",
    "remain",
    "remain",
    "Shutdown",
    "Fault",
];

const CHARGE_STATE: &[&str] = &[
    "Not start",
    "Const Current",
    "Const Voltage",
    "-",
    "Float",
    "-",
    "Active",
    "Active",
];

const BATTERY_TYPE: &[&str] = &[
    "User-defined",
    "SLD",
    "FLD",
    "GEL",
    "LFPx14",
    "LFPx15",
    "LFPx16",
    "LFPx7",
    "LFPx8",
    "LFPx9",
    "NCAx7",
    "NCAx8",
    "NCAx13",
    "NCAx14",
];

const EQUIPMENT_TYPE: &[&str] = &[
    "", "", "", "", "", "", "", "", "", "", "", "", "", "HF2430U60-100", "", "", "", "", "", "", "",
    "HF2430S80-H", "", "", "", "", "", "", "", "", "", "", "", "", "HYP4850U100-H",
];

const CHARGE_MODE: &[&str] = &["PV priority", "Mains priority", "Hybrid", "PV only"];

const OUTPUT_PRIORITY: &[&str] = &["PV priority", "Mains priority", "Battery priority"];

const AC_INPUT_RANGE: &[&str] = &["APL(90-280V)", "UPS(90-140V)"];

const PARALLEL_MODE: &[&str] = &["Single", "Parallel", "2P0", "2P1", "2P2", "3P1", "3P2", "3P3"];

const BMS_LINK: &[&str] = &["OFF", "RS485-BMS", "CAN-BMS"];

const CHARGE_CONTROL: &[&str] = &["OFF", "BMS", "Inverter"];

const EQUALIZE: &[&str] = &["Disabled", "Enabled"];

static HYP4850_REGISTERS: [R; 89] = [
    // ── Colunas do log ──
    R::enumerated(0x000B, "Product type", PRODUCT_TYPE),
    R::enumerated(0x0210, "Current state of machine", MACHINE_STATE),
    R::scaled(0x0101, 1, 1, "Battery voltage(V)", "V"),
    R::scaled(0x0102, 1, 1, "Battery current(A)", "A"),
    R::scaled(0x0100, 1, 0, "Battery level SOC(%)", "%"),
    R::enumerated(0xE004, "Battery type", BATTERY_TYPE),
    R::scaled(0x0212, 1, 1, "Bus voltage(V)", "V"),
    R::scaled(0x0213, 1, 1, "Mains voltage(V)", "V"),
    R::scaled(0x0214, 1, 1, "Grid current(A)", "A"),
    R::scaled(0x0215, 1, 2, "Mains frequency(Hz)", "Hz"),
    R::scaled(0x021E, 1, 1, "Mains charging current(A)", "A"),
    R::scaled(0x0107, 1, 1, "PV voltage(V)", "V"),
    R::scaled(0x0108, 1, 1, "PV charging current(A)", "A"),
    R::scaled(0x0109, 1, 0, "PV charging power(W)", "W"),
    R::scaled(0x0224, 1, 1, "PV buck current(A)", "A"),
    R::scaled(0x010E, 1, 0, "Charging power(W)", "W"),
    R::scaled(0x0216, 1, 1, "Output voltage(V)", "V"),
    R::scaled(0x0217, 1, 1, "Inverter current(A)", "A"),
    R::scaled(0x0218, 1, 2, "Output frequency(Hz)", "Hz"),
    R::scaled(0x0219, 1, 1, "Load current(A)", "A"),
    R::scaled(0x021B, 1, 0, "Load active power(W)", "W"),
    R::scaled(0x021C, 1, 0, "Apparent power of load(VA)", "VA"),
    R::scaled(0x021F, 1, 0, "Load rate(%)", "%"),
    R::scaled(0x0220, 1, 1, "PV radiator temperature(°C)", "°C"),
    R::scaled(0x0221, 1, 1, "Inverter heat sink temperature(°C)", "°C"),
    R::scaled(0x0222, 1, 1, "Transformer temperature(°C)", "°C"),
    R::scaled(0xF02D, 1, 0, "Battery charge today(Ah)", "Ah"),
    R::scaled(0xF02E, 1, 0, "Battery discharge today(Ah)", "Ah"),
    R::scaled(0xF02F, 1, 1, "PV generation today(kWh)", "kWh"),
    R::scaled(0xF030, 1, 1, "Load consumption today(kWh)", "kWh"),
    R::scaled(0xF03D, 2, 1, "Mains consumption today(kWh)", "kWh"),
    R::scaled(0xF034, 2, 0, "Accumulated battery charge(Ah)", "Ah"),
    R::scaled(0xF036, 2, 0, "Accumulated battery discharge(Ah)", "Ah"),
    R::scaled(0xF046, 1, 1, "Accumulated mains charge(Ah)", "Ah"),
    R::scaled(0xF038, 2, 1, "Accumulated PV generation(kWh)", "kWh"),
    R::scaled(0xF03A, 2, 1, "Accumulated load consumption(kWh)", "kWh"),
    R::scaled(0xF048, 1, 1, "Accumulated load from mains(kWh)", "kWh"),
    R::enumerated(0xE116, "Equipment type", EQUIPMENT_TYPE),
    // ── Tempo real fora do log ──
    R::enumerated(0x010B, "Charge state", CHARGE_STATE).unlogged(),
    R::scaled(0x0223, 1, 1, "Ambient temperature(°C)", "°C").unlogged(),
    R::scaled(0x0225, 1, 1, "Back current(A)", "A").unlogged(),
    R::scaled(0xF03C, 1, 0, "Mains charge today(Ah)", "Ah").unlogged(),
    R::scaled(0xF04A, 1, 0, "Inverter working hours(h)", "h").unlogged(),
    R::scaled(0xF04B, 1, 0, "Bypass working hours(h)", "h").unlogged(),
    // Blocos de 48 bits; a sentinela 0xF040 fecha a varredura
    R::filler(0xF031, 3),
    R::filler(0xF040, 3),
    R::filler(0xF043, 3),
    // ── Partida ──
    R::with_kind(0x0035, DecodeKind::CharSeq { len: 20 }, "Product ID", "").unlogged(),
    R::scaled(0xE003, 1, 0, "System voltage(V)", "V").unlogged(),
    // ── Configuração ──
    R::scaled(0xE002, 1, 0, "Battery capacity(Ah)", "Ah").unlogged(),
    R::with_kind(0xE005, DecodeKind::VoltageClass, "Over-voltage cut-off(V)", "V").unlogged(),
    R::with_kind(0xE006, DecodeKind::VoltageClass, "Charge limit voltage(V)", "V").unlogged(),
    R::with_kind(0xE007, DecodeKind::VoltageClass, "Equalizing voltage(V)", "V").unlogged(),
    R::with_kind(0xE008, DecodeKind::VoltageClass, "Boost voltage(V)", "V").unlogged(),
    R::with_kind(0xE009, DecodeKind::VoltageClass, "Float voltage(V)", "V").unlogged(),
    R::with_kind(0xE00A, DecodeKind::VoltageClass, "Boost return voltage(V)", "V").unlogged(),
    R::with_kind(0xE00B, DecodeKind::VoltageClass, "Under-voltage recovery(V)", "V").unlogged(),
    R::with_kind(0xE00C, DecodeKind::VoltageClass, "Under-voltage warning(V)", "V").unlogged(),
    R::with_kind(0xE00D, DecodeKind::VoltageClass, "Over-discharge delay voltage(V)", "V").unlogged(),
    R::with_kind(0xE00E, DecodeKind::VoltageClass, "Discharge limit voltage(V)", "V").unlogged(),
    R::with_kind(0xE01B, DecodeKind::VoltageClass, "Mains switch voltage(V)", "V").unlogged(),
    R::with_kind(0xE022, DecodeKind::VoltageClass, "Inverter switch voltage(V)", "V").unlogged(),
    R::scaled(0xE01C, 1, 1, "Charge stop current(A)", "A").unlogged(),
    R::scaled(0xE20A, 1, 1, "Max charging current(A)", "A").unlogged(),
    R::enumerated(0xE20F, "Charge mode", CHARGE_MODE).unlogged(),
    R::enumerated(0xE204, "Output priority", OUTPUT_PRIORITY).unlogged(),
    R::enumerated(0xE20B, "AC input range", AC_INPUT_RANGE).unlogged(),
    R::enumerated(0xE201, "Parallel mode", PARALLEL_MODE).unlogged(),
    R::enumerated(0xE215, "BMS communication", BMS_LINK).unlogged(),
    R::enumerated(0xE025, "Charge control", CHARGE_CONTROL).unlogged(),
    R::enumerated(0xE206, "Equalizing charge", EQUALIZE).unlogged(),
    R::with_kind(0xDF0D, DecodeKind::Extension { table: 0xE206 }, "Equalize now", "").unlogged(),
    R::with_kind(0xE20C, DecodeKind::Boolean, "Power saving mode", "").unlogged(),
    R::with_kind(0xE212, DecodeKind::Boolean, "Bypass output", "").unlogged(),
    R::with_kind(0xE210, DecodeKind::Boolean, "Buzzer", "").unlogged(),
    R::with_kind(0xE20D, DecodeKind::Boolean, "Overload restart", "").unlogged(),
    R::with_kind(0xE20E, DecodeKind::Boolean, "Over-temperature restart", "").unlogged(),
    R::with_kind(0xE02C, DecodeKind::Boolean, "Timed charging", "").unlogged(),
    R::with_kind(0xE033, DecodeKind::Boolean, "Timed discharging", "").unlogged(),
    R::with_kind(0xE026, DecodeKind::PackedTime, "Charge start 1", "").unlogged(),
    R::with_kind(0xE027, DecodeKind::PackedTime, "Charge end 1", "").unlogged(),
    R::with_kind(0xE028, DecodeKind::PackedTime, "Charge start 2", "").unlogged(),
    R::with_kind(0xE029, DecodeKind::PackedTime, "Charge end 2", "").unlogged(),
    R::with_kind(0xE02A, DecodeKind::PackedTime, "Charge start 3", "").unlogged(),
    R::with_kind(0xE02B, DecodeKind::PackedTime, "Charge end 3", "").unlogged(),
    R::with_kind(0xE02D, DecodeKind::PackedTime, "Discharge start 1", "").unlogged(),
    R::with_kind(0xE02E, DecodeKind::PackedTime, "Discharge end 1", "").unlogged(),
    R::with_kind(0xE02F, DecodeKind::PackedTime, "Discharge start 2", "").unlogged(),
    R::with_kind(0xE030, DecodeKind::PackedTime, "Discharge end 2", "").unlogged(),
];

static HYP4850_DERIVED: [DerivedColumn; 4] = [
    DerivedColumn {
        name: "Battery energy today discharge(Wh)",
        unit: "Wh",
        volts: 0x0101,
        amp_hours: 0xF02E,
    },
    DerivedColumn {
        name: "Battery energy today charge(Wh)",
        unit: "Wh",
        volts: 0x0101,
        amp_hours: 0xF02D,
    },
    DerivedColumn {
        name: "Battery energy total charge(Wh)",
        unit: "Wh",
        volts: 0x0101,
        amp_hours: 0xF034,
    },
    DerivedColumn {
        name: "Battery energy total discharge(Wh)",
        unit: "Wh",
        volts: 0x0101,
        amp_hours: 0xF036,
    },
];

pub static HYP4850: Catalog = Catalog {
    name: "hyp4850",
    registers: &HYP4850_REGISTERS,
    sentinel: 0xF040,
    startup: Some(StartupRegisters {
        system_voltage: 0xE003,
        product_id: 0x0035,
        product_id_len: 20,
    }),
    derived: &HYP4850_DERIVED,
};

// ──────────────────────────────────────────────
// OMRON KM-N1
// ──────────────────────────────────────────────

/// O logger pede blocos de 2 palavras por valor (0x0000×20, 0x0200×10,
/// 0x0220×10) e o cursor avança 1 por valor, então cada medida fica no
/// endereço do cursor e não no endereço físico do medidor.
static KM_N1_REGISTERS: [R; 21] = [
    R::scaled(0x0000, 2, 1, "Voltage 1(V)", "V"),
    R::scaled(0x0001, 2, 1, "Voltage 2(V)", "V"),
    R::scaled(0x0002, 2, 1, "Voltage 3(V)", "V"),
    R::scaled(0x0003, 2, 3, "Current 1(A)", "A"),
    R::scaled(0x0004, 2, 3, "Current 2(A)", "A"),
    R::scaled(0x0005, 2, 3, "Current 3(A)", "A"),
    R::scaled(0x0006, 2, 2, "Power factor", ""),
    R::scaled(0x0007, 2, 1, "Frequency(Hz)", "Hz"),
    R::scaled(0x0008, 2, 1, "Active power(W)", "W"),
    R::scaled(0x0009, 2, 1, "Reactive power(Var)", "Var"),
    R::scaled(0x0200, 2, 0, "Active energy(Wh)", "Wh"),
    R::scaled(0x0201, 2, 0, "Regenerated energy(Wh)", "Wh"),
    R::scaled(0x0202, 2, 0, "Leading reactive energy(Varh)", "Varh"),
    R::scaled(0x0203, 2, 0, "Lagging reactive energy(Varh)", "Varh"),
    R::scaled(0x0204, 2, 0, "Total reactive energy(Varh)", "Varh"),
    R::scaled(0x0220, 2, 0, "Active energy(kWh)", "kWh"),
    R::scaled(0x0221, 2, 0, "Regenerated energy(kWh)", "kWh"),
    R::scaled(0x0222, 2, 0, "Leading reactive energy(kVarh)", "kVarh"),
    R::scaled(0x0223, 2, 0, "Lagging reactive energy(kVarh)", "kVarh"),
    R::scaled(0x0224, 2, 0, "Total reactive energy(kVarh)", "kVarh"),
    // Último endereço físico da varredura; o pedido 0x0220×10 o cobre
    R::filler(0x0228, 2),
];

pub static KM_N1: Catalog = Catalog {
    name: "km-n1",
    registers: &KM_N1_REGISTERS,
    sentinel: 0x0228,
    startup: None,
    derived: &[],
};
