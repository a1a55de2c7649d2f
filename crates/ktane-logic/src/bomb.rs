//! The bomb record and the characteristic predicates the rule tables consult.
//!
//! A [`Bomb`] is everything the player reads off the casing (serial number,
//! batteries, lit indicators, ports) plus the progress of the defusal
//! (strikes, per-module state, countdown). Persisted records use camelCase
//! keys; older records missing progress fields are default-filled on load
//! and their module list is normalized to the seven known modules.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::timer::TimerText;

/// Strikes at which the bomb detonates.
pub const MAX_STRIKES: u8 = 3;

/// Largest battery count the casing can hold.
pub const MAX_BATTERIES: u8 = 6;

/// Serial numbers are always this many characters.
pub const SERIAL_LEN: usize = 6;

// ============================================================================
// CASING FEATURES
// ============================================================================

/// Labelled indicator on the casing. Presence in a bomb's set means lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Indicator {
    Frk,
    Frq,
    Car,
    Ind,
    Sig,
    Nsa,
    Msa,
    Trn,
    Bob,
    Clr,
    Snd,
}

impl Indicator {
    pub const ALL: [Indicator; 11] = [
        Self::Frk,
        Self::Frq,
        Self::Car,
        Self::Ind,
        Self::Sig,
        Self::Nsa,
        Self::Msa,
        Self::Trn,
        Self::Bob,
        Self::Clr,
        Self::Snd,
    ];

    /// Three-letter code printed on the casing.
    pub fn code(self) -> &'static str {
        match self {
            Self::Frk => "FRK",
            Self::Frq => "FRQ",
            Self::Car => "CAR",
            Self::Ind => "IND",
            Self::Sig => "SIG",
            Self::Nsa => "NSA",
            Self::Msa => "MSA",
            Self::Trn => "TRN",
            Self::Bob => "BOB",
            Self::Clr => "CLR",
            Self::Snd => "SND",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Indicator {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Port connector type. Presence is tracked per type, not per count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    Parallel,
    Ps2,
    Rj45,
    Serial,
    Usb,
    Dvid,
    StereoRca,
    Empty,
}

impl PortType {
    pub const ALL: [PortType; 8] = [
        Self::Parallel,
        Self::Ps2,
        Self::Rj45,
        Self::Serial,
        Self::Usb,
        Self::Dvid,
        Self::StereoRca,
        Self::Empty,
    ];

    /// Storage label (also accepted by `FromStr`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Ps2 => "ps2",
            Self::Rj45 => "rj45",
            Self::Serial => "serial",
            Self::Usb => "usb",
            Self::Dvid => "dvid",
            Self::StereoRca => "stereo_rca",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PortType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// A label that names no known indicator, port or module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown label `{0}`")]
pub struct UnknownLabel(pub String);

// ============================================================================
// SERIAL NUMBER
// ============================================================================

/// Reasons a serial number is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialError {
    #[error("serial number is required")]
    Empty,
    #[error("serial number must be exactly {SERIAL_LEN} characters, got {0}")]
    WrongLength(usize),
    #[error("serial number may only contain A-Z and 0-9, found `{0}`")]
    InvalidCharacter(char),
}

/// Six-character uppercase alphanumeric serial. Cannot hold an invalid value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Validate and uppercase-normalize raw input.
    pub fn parse(raw: &str) -> Result<Self, SerialError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SerialError::Empty);
        }
        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(SerialError::InvalidCharacter(bad));
        }
        let len = trimmed.chars().count();
        if len != SERIAL_LEN {
            return Err(SerialError::WrongLength(len));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_vowel(&self) -> bool {
        self.0.chars().any(|c| matches!(c, 'A' | 'E' | 'I' | 'O' | 'U'))
    }

    /// Final character as a digit, `None` when it is a letter.
    pub fn last_digit(&self) -> Option<u32> {
        self.0.chars().last().and_then(|c| c.to_digit(10))
    }

    pub fn is_last_digit_odd(&self) -> bool {
        self.last_digit().is_some_and(|d| d % 2 == 1)
    }
}

impl TryFrom<String> for SerialNumber {
    type Error = SerialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SerialNumber> for String {
    fn from(serial: SerialNumber) -> Self {
        serial.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// MODULES
// ============================================================================

/// The seven modules every bomb carries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleId {
    Wires,
    Button,
    Keypads,
    Simon,
    WhosOnFirst,
    Memory,
    Morse,
}

impl ModuleId {
    pub const COUNT: usize = 7;

    pub const ALL: [ModuleId; Self::COUNT] = [
        Self::Wires,
        Self::Button,
        Self::Keypads,
        Self::Simon,
        Self::WhosOnFirst,
        Self::Memory,
        Self::Morse,
    ];

    /// Stable key used in persisted records.
    pub fn key(self) -> &'static str {
        match self {
            Self::Wires => "wires",
            Self::Button => "button",
            Self::Keypads => "keypads",
            Self::Simon => "simon",
            Self::WhosOnFirst => "whos-on-first",
            Self::Memory => "memory",
            Self::Morse => "morse",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModuleId {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.key() == s.trim())
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Per-module progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleState {
    pub id: ModuleId,
    #[serde(default)]
    pub solved: bool,
    /// Strikes attributed to this module; also counted on the bomb.
    #[serde(default)]
    pub strikes: u8,
}

impl ModuleState {
    pub fn new(id: ModuleId) -> Self {
        Self {
            id,
            solved: false,
            strikes: 0,
        }
    }
}

/// Fresh, unsolved state for all seven modules.
pub fn default_modules() -> Vec<ModuleState> {
    ModuleId::ALL.into_iter().map(ModuleState::new).collect()
}

// ============================================================================
// BOMB
// ============================================================================

/// The simulated device under defusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BombRecord")]
pub struct Bomb {
    pub id: Uuid,
    pub serial_number: SerialNumber,
    pub batteries: u8,
    pub indicators: BTreeSet<Indicator>,
    pub ports: BTreeSet<PortType>,
    pub strikes: u8,
    pub modules: Vec<ModuleState>,
    pub timer: TimerText,
    pub timer_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defuse_start_time: Option<i64>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

impl Bomb {
    pub fn has_vowel_in_serial(&self) -> bool {
        self.serial_number.has_vowel()
    }

    pub fn is_last_digit_odd(&self) -> bool {
        self.serial_number.is_last_digit_odd()
    }

    pub fn has_indicator(&self, indicator: Indicator) -> bool {
        self.indicators.contains(&indicator)
    }

    pub fn has_port(&self, port: PortType) -> bool {
        self.ports.contains(&port)
    }

    /// Strictly more than `n` batteries.
    pub fn has_more_batteries_than(&self, n: u8) -> bool {
        self.batteries > n
    }

    pub fn module(&self, id: ModuleId) -> Option<&ModuleState> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> Option<&mut ModuleState> {
        self.modules.iter_mut().find(|m| m.id == id)
    }

    pub fn is_module_solved(&self, id: ModuleId) -> bool {
        self.module(id).is_some_and(|m| m.solved)
    }

    pub fn solved_modules(&self) -> Vec<ModuleId> {
        self.modules.iter().filter(|m| m.solved).map(|m| m.id).collect()
    }

    pub fn unsolved_modules(&self) -> Vec<ModuleId> {
        self.modules.iter().filter(|m| !m.solved).map(|m| m.id).collect()
    }

    pub fn all_modules_solved(&self) -> bool {
        self.modules.len() == ModuleId::COUNT && self.modules.iter().all(|m| m.solved)
    }

    /// Clamp counters and rebuild the module list to the seven known
    /// modules in canonical order, keeping existing progress.
    pub fn normalize(mut self) -> Self {
        self.strikes = self.strikes.min(MAX_STRIKES);
        self.batteries = self.batteries.min(MAX_BATTERIES);
        self.modules = ModuleId::ALL
            .into_iter()
            .map(|id| {
                self.modules
                    .iter()
                    .find(|m| m.id == id)
                    .copied()
                    .unwrap_or_else(|| ModuleState::new(id))
            })
            .collect();
        self
    }
}

// ── Bomb characteristics over an optional bomb ──────────────────────────
// An absent bomb answers `false` to every question.

pub fn has_vowel_in_serial(bomb: Option<&Bomb>) -> bool {
    bomb.is_some_and(Bomb::has_vowel_in_serial)
}

pub fn is_last_digit_odd(bomb: Option<&Bomb>) -> bool {
    bomb.is_some_and(Bomb::is_last_digit_odd)
}

pub fn has_indicator(bomb: Option<&Bomb>, indicator: Indicator) -> bool {
    bomb.is_some_and(|b| b.has_indicator(indicator))
}

pub fn has_port(bomb: Option<&Bomb>, port: PortType) -> bool {
    bomb.is_some_and(|b| b.has_port(port))
}

pub fn has_more_batteries_than(bomb: Option<&Bomb>, n: u8) -> bool {
    bomb.is_some_and(|b| b.has_more_batteries_than(n))
}

// ── Persisted shape ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BombRecord {
    id: Uuid,
    serial_number: SerialNumber,
    batteries: u8,
    #[serde(default)]
    indicators: BTreeSet<Indicator>,
    #[serde(default)]
    ports: BTreeSet<PortType>,
    #[serde(default)]
    strikes: u8,
    #[serde(default)]
    modules: Vec<ModuleRecord>,
    #[serde(default)]
    timer: TimerText,
    #[serde(default)]
    timer_running: bool,
    #[serde(default)]
    defuse_start_time: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

#[derive(Deserialize)]
struct ModuleRecord {
    id: String,
    #[serde(default)]
    solved: bool,
    #[serde(default)]
    strikes: u8,
}

impl From<BombRecord> for Bomb {
    fn from(record: BombRecord) -> Self {
        // Unknown ids are dropped here; duplicates lose to the first entry in normalize().
        let modules = record
            .modules
            .into_iter()
            .filter_map(|m| {
                m.id.parse::<ModuleId>().ok().map(|id| ModuleState {
                    id,
                    solved: m.solved,
                    strikes: m.strikes,
                })
            })
            .collect();

        Bomb {
            id: record.id,
            serial_number: record.serial_number,
            batteries: record.batteries,
            indicators: record.indicators,
            ports: record.ports,
            strikes: record.strikes,
            modules,
            timer: record.timer,
            timer_running: record.timer_running,
            defuse_start_time: record.defuse_start_time,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
        .normalize()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_bomb(serial: &str) -> Bomb {
        Bomb {
            id: Uuid::nil(),
            serial_number: SerialNumber::parse(serial).expect("test serial"),
            batteries: 2,
            indicators: BTreeSet::new(),
            ports: BTreeSet::new(),
            strikes: 0,
            modules: default_modules(),
            timer: TimerText::default(),
            timer_running: false,
            defuse_start_time: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn serial_is_uppercased() {
        let serial = SerialNumber::parse("ab12c3").unwrap();
        assert_eq!(serial.as_str(), "AB12C3");
    }

    #[test]
    fn serial_rejects_bad_input() {
        assert_eq!(SerialNumber::parse(""), Err(SerialError::Empty));
        assert_eq!(SerialNumber::parse("AB12"), Err(SerialError::WrongLength(4)));
        assert_eq!(
            SerialNumber::parse("AB12C34"),
            Err(SerialError::WrongLength(7))
        );
        assert_eq!(
            SerialNumber::parse("AB-12C"),
            Err(SerialError::InvalidCharacter('-'))
        );
        assert!(SerialNumber::parse("ÄB12C3").is_err());
    }

    #[test]
    fn vowel_detection() {
        assert!(sample_bomb("AB12C3").has_vowel_in_serial());
        assert!(sample_bomb("xe12c3").has_vowel_in_serial());
        assert!(!sample_bomb("BC12D3").has_vowel_in_serial());
    }

    #[test]
    fn last_digit_parity() {
        assert!(sample_bomb("BC12D3").is_last_digit_odd());
        assert!(!sample_bomb("BC12D4").is_last_digit_odd());
        // A trailing letter is never odd.
        assert!(!sample_bomb("BC123D").is_last_digit_odd());
    }

    #[test]
    fn absent_bomb_answers_false() {
        assert!(!has_vowel_in_serial(None));
        assert!(!is_last_digit_odd(None));
        assert!(!has_indicator(None, Indicator::Frk));
        assert!(!has_port(None, PortType::Usb));
        assert!(!has_more_batteries_than(None, 0));
    }

    #[test]
    fn battery_threshold_is_strict() {
        let bomb = sample_bomb("AB12C3");
        assert!(bomb.has_more_batteries_than(1));
        assert!(!bomb.has_more_batteries_than(2));
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for indicator in Indicator::ALL {
            assert_eq!(indicator.code().parse::<Indicator>(), Ok(indicator));
        }
        for port in PortType::ALL {
            assert_eq!(port.label().parse::<PortType>(), Ok(port));
        }
        for id in ModuleId::ALL {
            assert_eq!(id.key().parse::<ModuleId>(), Ok(id));
        }
        assert!("XYZ".parse::<Indicator>().is_err());
    }

    #[test]
    fn legacy_record_is_default_filled() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000000",
            "serialNumber": "ab12c3",
            "batteries": 3,
            "indicators": ["FRK"],
            "ports": ["stereo_rca"],
            "strikes": 1,
            "createdAt": 10,
            "updatedAt": 20
        }"#;
        let bomb: Bomb = serde_json::from_str(json).unwrap();
        assert_eq!(bomb.serial_number.as_str(), "AB12C3");
        assert_eq!(bomb.modules, default_modules());
        assert_eq!(bomb.timer.to_string(), "5:00");
        assert!(!bomb.timer_running);
        assert!(bomb.has_port(PortType::StereoRca));
    }

    #[test]
    fn module_list_is_normalized_on_load() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000000",
            "serialNumber": "AB12C3",
            "batteries": 1,
            "modules": [
                {"id": "morse", "solved": true, "strikes": 1},
                {"id": "needy-knob", "solved": true},
                {"id": "wires", "solved": true}
            ],
            "strikes": 9,
            "createdAt": 10,
            "updatedAt": 20
        }"#;
        let bomb: Bomb = serde_json::from_str(json).unwrap();
        assert_eq!(bomb.modules.len(), ModuleId::COUNT);
        assert_eq!(bomb.modules[0].id, ModuleId::Wires);
        assert_eq!(bomb.solved_modules(), vec![ModuleId::Wires, ModuleId::Morse]);
        assert_eq!(bomb.strikes, MAX_STRIKES);
    }

    #[test]
    fn record_with_bad_serial_is_rejected() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000000",
            "serialNumber": "AB1",
            "batteries": 1,
            "createdAt": 10,
            "updatedAt": 20
        }"#;
        assert!(serde_json::from_str::<Bomb>(json).is_err());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let bomb = sample_bomb("AB12C3");
        let value = serde_json::to_value(&bomb).unwrap();
        assert_eq!(value["serialNumber"], "AB12C3");
        assert_eq!(value["timer"], "5:00");
        assert_eq!(value["timerRunning"], false);
        assert_eq!(value["modules"][4]["id"], "whos-on-first");
        assert!(value.get("defuseStartTime").is_none());
    }
}
