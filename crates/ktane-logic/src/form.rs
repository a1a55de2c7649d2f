//! Bomb creation/edit form and its validation.
//!
//! The form holds raw player input. It is validated in one pass that
//! reports every problem at once, and only a clean form converts into a
//! [`BombSpec`] the state machine accepts.
//!
//! ```
//! use ktane_logic::form::{validate_form, BombForm};
//!
//! let mut form = BombForm::default();
//! form.serial_number = "ab12c3".to_string();
//! form.batteries = 2;
//! assert!(validate_form(&form).is_empty());
//! let spec = form.into_spec().unwrap();
//! assert_eq!(spec.serial_number.as_str(), "AB12C3");
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bomb::{
    Indicator, PortType, SerialError, SerialNumber, MAX_BATTERIES, MAX_STRIKES,
};
use crate::timer::{TimerParseError, TimerText, MAX_MINUTES, MAX_SECONDS};

/// Raw bomb characteristics as entered by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BombForm {
    pub serial_number: String,
    pub batteries: u32,
    pub indicators: BTreeSet<Indicator>,
    pub ports: BTreeSet<PortType>,
    pub strikes: u32,
    pub timer_minutes: u32,
    pub timer_seconds: u32,
}

impl Default for BombForm {
    fn default() -> Self {
        Self {
            serial_number: String::new(),
            batteries: 0,
            indicators: BTreeSet::new(),
            ports: BTreeSet::new(),
            strikes: 0,
            timer_minutes: 5,
            timer_seconds: 0,
        }
    }
}

/// Form validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Serial(#[from] SerialError),
    #[error("number of batteries must be between 0 and {MAX_BATTERIES}, got {0}")]
    BatteriesOutOfRange(u32),
    #[error("strikes must be between 0 and {MAX_STRIKES}, got {0}")]
    StrikesOutOfRange(u32),
    #[error(transparent)]
    Timer(#[from] TimerParseError),
}

/// Validate a form, returning all errors found.
pub fn validate_form(form: &BombForm) -> Vec<FormError> {
    let mut errors = Vec::new();

    if let Err(e) = SerialNumber::parse(&form.serial_number) {
        errors.push(FormError::Serial(e));
    }
    if form.batteries > u32::from(MAX_BATTERIES) {
        errors.push(FormError::BatteriesOutOfRange(form.batteries));
    }
    if form.strikes > u32::from(MAX_STRIKES) {
        errors.push(FormError::StrikesOutOfRange(form.strikes));
    }
    if form.timer_minutes > MAX_MINUTES {
        errors.push(FormError::Timer(TimerParseError::MinutesOutOfRange(
            form.timer_minutes,
        )));
    }
    if form.timer_seconds > MAX_SECONDS {
        errors.push(FormError::Timer(TimerParseError::SecondsOutOfRange(
            form.timer_seconds,
        )));
    }

    errors
}

impl BombForm {
    /// Pre-fill an edit form from an existing spec.
    pub fn from_spec(spec: &BombSpec) -> Self {
        Self {
            serial_number: spec.serial_number.to_string(),
            batteries: u32::from(spec.batteries),
            indicators: spec.indicators.clone(),
            ports: spec.ports.clone(),
            strikes: u32::from(spec.strikes),
            timer_minutes: spec.timer.minutes(),
            timer_seconds: spec.timer.seconds(),
        }
    }

    /// Convert into a spec, or every validation error found.
    pub fn into_spec(self) -> Result<BombSpec, Vec<FormError>> {
        let errors = validate_form(&self);
        if !errors.is_empty() {
            return Err(errors);
        }
        let serial_number = SerialNumber::parse(&self.serial_number).map_err(|e| vec![e.into()])?;
        let timer = TimerText::from_parts(self.timer_minutes, self.timer_seconds)
            .map_err(|e| vec![e.into()])?;
        Ok(BombSpec {
            serial_number,
            // Range-checked above.
            batteries: self.batteries.min(u32::from(MAX_BATTERIES)) as u8,
            indicators: self.indicators,
            ports: self.ports,
            strikes: self.strikes.min(u32::from(MAX_STRIKES)) as u8,
            timer,
        })
    }
}

/// Validated bomb characteristics, ready for `CreateBomb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BombSpec {
    pub serial_number: SerialNumber,
    pub batteries: u8,
    pub indicators: BTreeSet<Indicator>,
    pub ports: BTreeSet<PortType>,
    pub strikes: u8,
    pub timer: TimerText,
}

impl BombSpec {
    /// A bare bomb with the given serial and nothing else on the casing.
    pub fn with_serial(serial_number: SerialNumber) -> Self {
        Self {
            serial_number,
            batteries: 0,
            indicators: BTreeSet::new(),
            ports: BTreeSet::new(),
            strikes: 0,
            timer: TimerText::default(),
        }
    }
}

/// Partial update for `UpdateBomb`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BombPatch {
    pub serial_number: Option<SerialNumber>,
    pub batteries: Option<u8>,
    pub indicators: Option<BTreeSet<Indicator>>,
    pub ports: Option<BTreeSet<PortType>>,
    pub strikes: Option<u8>,
    pub timer: Option<TimerText>,
}

impl From<BombSpec> for BombPatch {
    fn from(spec: BombSpec) -> Self {
        Self {
            serial_number: Some(spec.serial_number),
            batteries: Some(spec.batteries),
            indicators: Some(spec.indicators),
            ports: Some(spec.ports),
            strikes: Some(spec.strikes),
            timer: Some(spec.timer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> BombForm {
        BombForm {
            serial_number: "AB12C3".to_string(),
            batteries: 3,
            ..BombForm::default()
        }
    }

    #[test]
    fn default_with_serial_is_valid() {
        let errors = validate_form(&valid_form());
        assert!(errors.is_empty(), "form should be valid: {errors:?}");
    }

    #[test]
    fn empty_serial() {
        let mut form = valid_form();
        form.serial_number = "   ".to_string();
        assert!(validate_form(&form).contains(&FormError::Serial(SerialError::Empty)));
    }

    #[test]
    fn short_and_symbolic_serials() {
        let mut form = valid_form();
        form.serial_number = "AB12".to_string();
        assert!(validate_form(&form).contains(&FormError::Serial(SerialError::WrongLength(4))));
        form.serial_number = "AB 12C".to_string();
        assert!(validate_form(&form)
            .iter()
            .any(|e| matches!(e, FormError::Serial(SerialError::InvalidCharacter(_)))));
    }

    #[test]
    fn batteries_out_of_range() {
        let mut form = valid_form();
        form.batteries = 7;
        assert!(validate_form(&form).contains(&FormError::BatteriesOutOfRange(7)));
        form.batteries = 6;
        assert!(validate_form(&form).is_empty());
    }

    #[test]
    fn strikes_out_of_range() {
        let mut form = valid_form();
        form.strikes = 4;
        assert!(validate_form(&form).contains(&FormError::StrikesOutOfRange(4)));
    }

    #[test]
    fn timer_out_of_range() {
        let mut form = valid_form();
        form.timer_minutes = 120;
        form.timer_seconds = 75;
        let errors = validate_form(&form);
        assert!(errors.contains(&FormError::Timer(TimerParseError::MinutesOutOfRange(120))));
        assert!(errors.contains(&FormError::Timer(TimerParseError::SecondsOutOfRange(75))));
    }

    #[test]
    fn all_errors_reported_together() {
        let form = BombForm {
            serial_number: "x".to_string(),
            batteries: 9,
            strikes: 5,
            ..BombForm::default()
        };
        assert_eq!(validate_form(&form).len(), 3);
        assert_eq!(form.into_spec().unwrap_err().len(), 3);
    }

    #[test]
    fn spec_round_trips_through_edit_form() {
        let mut form = valid_form();
        form.indicators.insert(Indicator::Frk);
        form.ports.insert(PortType::Parallel);
        form.timer_minutes = 3;
        form.timer_seconds = 30;
        let spec = form.clone().into_spec().unwrap();
        assert_eq!(spec.timer.to_string(), "3:30");
        assert_eq!(BombForm::from_spec(&spec), form);
    }
}
