//! Who's on First.
//!
//! The display word selects a button position. The step one table is
//! consulted first and the step two table only when the word is absent
//! from it.

use std::fmt;

use crate::bomb::{Bomb, ModuleId};
use crate::steps::{numbered, InstructionStep};

use super::{Category, Difficulty, ModuleInfo, NarrativeModule};

pub const MODULE: NarrativeModule = NarrativeModule {
    info: ModuleInfo {
        id: ModuleId::WhosOnFirst,
        name: "Who's on First",
        description: "Match the word on the display with the correct button based on position labels.",
        category: Category::Regular,
        difficulty: Difficulty::Hard,
    },
    steps,
};

/// The six word buttons, read left to right, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPosition {
    TopLeft,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomRight,
}

impl ButtonPosition {
    /// 1-based reading-order index.
    pub fn index(self) -> u8 {
        self as u8 + 1
    }

    pub fn short(self) -> &'static str {
        match self {
            Self::TopLeft => "TL",
            Self::TopRight => "TR",
            Self::MiddleLeft => "ML",
            Self::MiddleRight => "MR",
            Self::BottomLeft => "BL",
            Self::BottomRight => "BR",
        }
    }
}

impl fmt::Display for ButtonPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordinal = match self.index() {
            1 => "1st",
            2 => "2nd",
            3 => "3rd",
            4 => "4th",
            5 => "5th",
            _ => "6th",
        };
        write!(f, "{ordinal} ({})", self.short())
    }
}

use ButtonPosition::{BottomLeft, BottomRight, MiddleLeft, MiddleRight, TopLeft, TopRight};

type WordTable = [(&'static str, ButtonPosition); 24];

pub const STEP_ONE: WordTable = [
    ("YES", TopRight),
    ("FIRST", TopLeft),
    ("DISPLAY", MiddleRight),
    ("OKAY", BottomLeft),
    ("SAYS", BottomRight),
    ("NOTHING", TopRight),
    ("EMPTY", TopRight),
    ("LED", MiddleLeft),
    ("LIE", BottomRight),
    ("READ", TopRight),
    ("RED", TopRight),
    ("REED", MiddleRight),
    ("LEED", MiddleRight),
    ("HOLD ON", BottomLeft),
    ("YOU", MiddleRight),
    ("YOUR", BottomRight),
    ("YOU'RE", MiddleRight),
    ("UR", TopLeft),
    ("WHAT", MiddleLeft),
    ("U", MiddleRight),
    ("UM", MiddleRight),
    ("UH", MiddleRight),
    ("UH OH", BottomLeft),
    ("ALREADY", BottomLeft),
];

pub const STEP_TWO: WordTable = [
    ("YES", TopRight),
    ("FIRST", TopLeft),
    ("DISPLAY", MiddleRight),
    ("OKAY", BottomLeft),
    ("SAYS", BottomRight),
    ("NOTHING", TopRight),
    ("EMPTY", TopLeft),
    ("LED", MiddleLeft),
    ("LIE", BottomLeft),
    ("READ", TopRight),
    ("RED", TopRight),
    ("REED", MiddleRight),
    ("LEED", MiddleRight),
    ("HOLD ON", BottomLeft),
    ("YOU", MiddleRight),
    ("YOUR", BottomRight),
    ("YOU'RE", MiddleRight),
    ("UR", TopLeft),
    ("WHAT", MiddleLeft),
    ("U", MiddleRight),
    ("UM", TopLeft),
    ("UH", TopLeft),
    ("UH OH", BottomLeft),
    ("ALREADY", BottomLeft),
];

fn find(table: &WordTable, word: &str) -> Option<ButtonPosition> {
    table
        .iter()
        .find(|(w, _)| w.eq_ignore_ascii_case(word))
        .map(|&(_, position)| position)
}

/// Position to press for a display word, trying step one then step two.
pub fn lookup(display: &str) -> Option<ButtonPosition> {
    let word = display.trim();
    find(&STEP_ONE, word).or_else(|| find(&STEP_TWO, word))
}

fn render(table: &WordTable) -> String {
    table
        .iter()
        .map(|(word, position)| format!("  • \"{word}\" - press the button in the {position} position"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn steps(_bomb: &Bomb) -> Vec<InstructionStep> {
    numbered(vec![
        InstructionStep::info(
            "Read the Display Word",
            "The top display shows a word. Note what it says.\n\n\
             Common words: YES, FIRST, DISPLAY, OKAY, SAYS, NOTHING, EMPTY, LED, etc.",
        ),
        InstructionStep::info(
            "Check Step 1 - Look for these words on buttons",
            format!("If the display shows:\n{}", render(&STEP_ONE)),
        )
        .with_note("If the display word is not in this list, proceed to Step 2!"),
        InstructionStep::info(
            "Check Step 2 - If display not found in Step 1",
            format!(
                "If the display word is not in the Step 1 list:\n{}",
                render(&STEP_TWO)
            ),
        )
        .with_note("This is a DIFFERENT table from Step 1!"),
        InstructionStep::info(
            "Button Positions Reference",
            "Button positions (top to bottom, left to right):\n\n\
             \x20 TL  TR    (Top Left, Top Right)\n\
             \x20 ML  MR    (Middle Left, Middle Right)\n\
             \x20 BL  BR    (Bottom Left, Bottom Right)",
        ),
        InstructionStep::final_warning(
            "Press the Correct Button",
            "Press the button in the position indicated by the tables.",
            "Wrong button will cause a strike!",
        ),
    ])
}
