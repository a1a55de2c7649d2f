//! Simon Says.
//!
//! The flashed colour maps to a button colour through one of three tables,
//! chosen by the serial number, with the row chosen by the strike count.

use std::fmt;

use crate::bomb::{Bomb, ModuleId};
use crate::steps::{numbered, yes_no, InstructionStep, StepKind};

use super::{Category, Difficulty, ModuleInfo, NarrativeModule};

pub const MODULE: NarrativeModule = NarrativeModule {
    info: ModuleInfo {
        id: ModuleId::Simon,
        name: "Simon Says",
        description: "Repeat the color sequence shown on the Simon module.",
        category: Category::Regular,
        difficulty: Difficulty::Easy,
    },
    steps,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimonColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl fmt::Display for SimonColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
        })
    }
}

/// Which serial-number table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimonTable {
    Vowel,
    NoVowelOdd,
    Otherwise,
}

use SimonColor::{Blue, Green, Red, Yellow};

impl SimonTable {
    pub fn for_bomb(bomb: &Bomb) -> Self {
        if bomb.has_vowel_in_serial() {
            Self::Vowel
        } else if bomb.is_last_digit_odd() {
            Self::NoVowelOdd
        } else {
            Self::Otherwise
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Self::Vowel => "If the serial number contains a vowel",
            Self::NoVowelOdd => "If the serial number has NO vowel and the last digit is ODD",
            Self::Otherwise => "Otherwise (no vowel, last digit even)",
        }
    }

    /// Rows for 0, 1 and 2+ strikes.
    fn rows(self) -> [[SimonColor; 4]; 3] {
        match self {
            Self::Vowel => [
                [Blue, Red, Green, Yellow],
                [Yellow, Blue, Red, Green],
                [Green, Yellow, Blue, Red],
            ],
            Self::NoVowelOdd => [
                [Yellow, Green, Blue, Red],
                [Red, Yellow, Green, Blue],
                [Blue, Red, Yellow, Green],
            ],
            Self::Otherwise => [
                [Green, Yellow, Red, Blue],
                [Blue, Green, Yellow, Red],
                [Red, Blue, Yellow, Green],
            ],
        }
    }

    pub fn row(self, strikes: u8) -> [SimonColor; 4] {
        self.rows()[usize::from(strikes.min(2))]
    }
}

/// The input order for the bomb's current serial and strike count.
pub fn simon_sequence(bomb: &Bomb) -> [SimonColor; 4] {
    SimonTable::for_bomb(bomb).row(bomb.strikes)
}

fn arrows(row: &[SimonColor]) -> String {
    row.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}

fn steps(bomb: &Bomb) -> Vec<InstructionStep> {
    let tables = [SimonTable::Vowel, SimonTable::NoVowelOdd, SimonTable::Otherwise]
        .into_iter()
        .map(|table| {
            let [zero, one, more] = table.rows();
            format!(
                "{}:\n  Strike count 0: {}\n  Strike count 1: {}\n  Strike count 2+: {}",
                table.heading(),
                arrows(&zero),
                arrows(&one),
                arrows(&more)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    numbered(vec![
        InstructionStep::info(
            "Observe the Flashing Sequence",
            "Watch the sequence of colors that flash on the Simon module. The colors are: RED, BLUE, GREEN, YELLOW.",
        ),
        InstructionStep::info("Determine the Correct Input Sequence", tables).with_condition(
            format!(
                "Serial vowel: {} | Last digit odd: {} | Strikes: {}",
                yes_no(bomb.has_vowel_in_serial()),
                yes_no(bomb.is_last_digit_odd()),
                bomb.strikes
            ),
        ),
        InstructionStep::new(
            StepKind::Action,
            "Current Mapping",
            format!(
                "For this bomb, the flashes RED, BLUE, GREEN, YELLOW map to: {}",
                arrows(&simon_sequence(bomb))
            ),
        )
        .with_note("Re-check after every strike; the mapping changes with the strike count."),
        InstructionStep::info(
            "Input the Correct Sequence",
            "1. Press the buttons in the order given by the table above.\n\
             2. Each correct sequence adds one more flash to the sequence.\n\
             3. Repeat the growing sequence until the module is solved.",
        )
        .with_note("The sequence grows longer with each successful round!"),
        InstructionStep::final_warning(
            "Execute the Pattern",
            "Watch carefully and repeat the color pattern.",
            "Wrong color or wrong order will cause a strike!",
        ),
    ])
}
