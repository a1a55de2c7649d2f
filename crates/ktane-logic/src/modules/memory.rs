//! Memory.
//!
//! Five stages. From stage two on, what to press depends on the number an
//! earlier stage displayed, so the player has to remember each display.

use std::fmt;

use crate::bomb::{Bomb, ModuleId};
use crate::steps::{numbered, InstructionStep};

use super::{Category, Difficulty, ModuleInfo, NarrativeModule};

pub const MODULE: NarrativeModule = NarrativeModule {
    info: ModuleInfo {
        id: ModuleId::Memory,
        name: "Memory",
        description: "Remember and repeat the correct sequence of numbers based on position rules.",
        category: Category::Regular,
        difficulty: Difficulty::Hard,
    },
    steps,
};

pub const STAGE_COUNT: u8 = 5;

/// Where a rule points the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A fixed button position, 1–6.
    Position(u8),
    /// The position given by an earlier stage's display, plus an offset.
    Display { stage: u8, plus: u8 },
    /// The button labelled with an earlier stage's display.
    LabelOf { stage: u8 },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Position(n) => write!(f, "Press the button in position {n}"),
            Self::Display { stage, plus: 0 } => {
                write!(f, "Press the button in position (Stage {stage} display)")
            }
            Self::Display { stage, plus } => {
                write!(f, "Press the button in position (Stage {stage} display + {plus})")
            }
            Self::LabelOf { stage } => {
                write!(f, "Press the number that matches Stage {stage}'s display")
            }
        }
    }
}

/// Rule pair for one earlier display value: the preferred press and the
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRule {
    pub press: Target,
    pub otherwise: Target,
}

const fn rule(press: Target, otherwise: Target) -> MemoryRule {
    MemoryRule { press, otherwise }
}

const fn pos(n: u8) -> Target {
    Target::Position(n)
}

const fn disp(stage: u8, plus: u8) -> Target {
    Target::Display { stage, plus }
}

/// Rules for one stage after the first, indexed by the earlier display
/// value minus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStage {
    pub stage: u8,
    /// Whose display selects the row.
    pub keyed_by: u8,
    pub rules: [MemoryRule; 6],
}

impl MemoryStage {
    /// Row for the keyed stage's display value (1–6).
    pub fn rule_for(&self, display: u8) -> Option<&MemoryRule> {
        usize::from(display)
            .checked_sub(1)
            .and_then(|i| self.rules.get(i))
    }
}

pub const STAGES: [MemoryStage; 4] = [
    MemoryStage {
        stage: 2,
        keyed_by: 1,
        rules: [
            rule(Target::LabelOf { stage: 1 }, pos(4)),
            rule(disp(1, 2), disp(1, 0)),
            rule(pos(1), disp(1, 0)),
            rule(pos(1), disp(1, 0)),
            rule(disp(1, 2), disp(1, 0)),
            rule(disp(1, 1), disp(1, 0)),
        ],
    },
    MemoryStage {
        stage: 3,
        keyed_by: 2,
        rules: [
            rule(pos(1), disp(2, 2)),
            rule(disp(2, 1), disp(1, 0)),
            rule(disp(1, 1), disp(2, 0)),
            rule(disp(2, 2), disp(1, 1)),
            rule(disp(1, 2), disp(2, 0)),
            rule(disp(1, 1), disp(2, 1)),
        ],
    },
    MemoryStage {
        stage: 4,
        keyed_by: 1,
        rules: [
            rule(disp(2, 0), disp(3, 0)),
            rule(disp(1, 0), disp(3, 0)),
            rule(disp(3, 0), disp(1, 0)),
            rule(disp(4, 0), disp(1, 0)),
            rule(disp(1, 1), disp(2, 0)),
            rule(disp(2, 1), disp(4, 0)),
        ],
    },
    MemoryStage {
        stage: 5,
        keyed_by: 3,
        rules: [
            rule(disp(4, 0), disp(2, 0)),
            rule(disp(1, 0), disp(4, 0)),
            rule(disp(3, 0), disp(1, 0)),
            rule(disp(2, 0), disp(4, 0)),
            rule(disp(1, 0), disp(3, 0)),
            rule(disp(4, 0), disp(2, 0)),
        ],
    },
];

/// Rules for stage 2–5.
pub fn stage(number: u8) -> Option<&'static MemoryStage> {
    STAGES.iter().find(|s| s.stage == number)
}

fn render(stage: &MemoryStage) -> String {
    stage
        .rules
        .iter()
        .zip(1..)
        .map(|(rule, value)| {
            let otherwise = rule.otherwise.to_string();
            let otherwise = otherwise.strip_prefix("Press").unwrap_or(&otherwise);
            format!(
                "STAGE {} WAS {value}:\n  • {}\n  • Otherwise, press{otherwise}",
                stage.keyed_by, rule.press
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn steps(_bomb: &Bomb) -> Vec<InstructionStep> {
    let mut steps = vec![InstructionStep::info(
        "Stage 1 - Display 1",
        "A number will appear on the display. Press the button in the position that corresponds to that number.\n\n\
         Positions: 1 (Top-Left), 2 (Top-Right), 3 (Middle-Left), 4 (Middle-Right), 5 (Bottom-Left), 6 (Bottom-Right)\n\n\
         After pressing, a new number will appear. Remember the DISPLAY number for later stages.",
    )
    .with_note("Memorize the displayed number - you will need it!")];

    for s in STAGES.iter() {
        let title = if s.stage == STAGE_COUNT {
            "Stage 5 - Final Display".to_string()
        } else {
            format!("Stage {0} - Display {0}", s.stage)
        };
        let mut step = InstructionStep::info(
            title,
            format!(
                "A new number appears. Use these rules based on Stage {}'s display:\n\n{}",
                s.keyed_by,
                render(s)
            ),
        );
        if s.stage == STAGE_COUNT {
            step = step.with_note("This is the final stage - complete it correctly!");
        }
        steps.push(step);
    }

    steps.push(InstructionStep::final_warning(
        "Complete All 5 Stages",
        "Work through all 5 stages in order, memorizing the displayed numbers.",
        "Wrong position at any stage will cause a strike!",
    ));
    numbered(steps)
}
