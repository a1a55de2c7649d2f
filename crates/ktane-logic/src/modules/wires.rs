//! Simple Wires.
//!
//! One ordered rule table per wire count (3–6). Conditions are checked top
//! to bottom and the first that holds picks the wire; the last row of each
//! table always holds. Counts outside 3–6 have no table and are reported
//! as an error.

use crate::bomb::{Bomb, ModuleId};
use crate::steps::{numbered, yes_no, InstructionStep};

use super::{
    required_list, required_text, Answers, Category, Difficulty, ModuleInfo, Question,
    QuestionKind, Solution, SolveError, StructuredModule,
};

pub const MODULE: StructuredModule = StructuredModule {
    info: ModuleInfo {
        id: ModuleId::Wires,
        name: "Wires",
        description: "Cut the correct wire based on the color pattern and bomb characteristics.",
        category: Category::Regular,
        difficulty: Difficulty::Easy,
    },
    steps,
    questions,
    solve,
    default_answers,
};

pub const MIN_WIRES: u32 = 3;
pub const MAX_WIRES: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireColor {
    Red,
    Yellow,
    Blue,
    White,
    Green,
    Black,
}

impl WireColor {
    pub const ALL: [WireColor; 6] = [
        Self::Red,
        Self::Yellow,
        Self::Blue,
        Self::White,
        Self::Green,
        Self::Black,
    ];

    /// Single-letter code used in the colour answer. Black is `K`.
    pub fn code(self) -> char {
        match self {
            Self::Red => 'R',
            Self::Yellow => 'Y',
            Self::Blue => 'B',
            Self::White => 'W',
            Self::Green => 'G',
            Self::Black => 'K',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Yellow => "Yellow",
            Self::Blue => "Blue",
            Self::White => "White",
            Self::Green => "Green",
            Self::Black => "Black",
        }
    }

    /// Accepts the letter code or the full name, any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch.to_ascii_uppercase()),
            _ => None,
        };
        Self::ALL
            .into_iter()
            .find(|c| letter == Some(c.code()) || raw.eq_ignore_ascii_case(c.name()))
    }
}

/// The wires on the module, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSet {
    colors: Vec<WireColor>,
}

impl WireSet {
    pub fn new(colors: Vec<WireColor>) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn count(&self, color: WireColor) -> usize {
        self.colors.iter().filter(|&&c| c == color).count()
    }

    pub fn last_is(&self, color: WireColor) -> bool {
        self.colors.last() == Some(&color)
    }

    pub fn first_is(&self, color: WireColor) -> bool {
        self.colors.first() == Some(&color)
    }

    fn last_index(&self) -> usize {
        self.colors.len().saturating_sub(1)
    }

    /// 0-based index of the `nth` (0-based) wire of `color`.
    fn nth_of(&self, color: WireColor, nth: usize) -> Option<usize> {
        self.colors
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == color)
            .nth(nth)
            .map(|(i, _)| i)
    }

    fn last_of(&self, color: WireColor) -> Option<usize> {
        self.colors.iter().rposition(|&c| c == color)
    }
}

/// One row of a wire table.
pub struct WireRule {
    pub description: &'static str,
    pub applies: fn(&WireSet, &Bomb) -> bool,
    /// 0-based index of the wire to cut.
    pub pick: fn(&WireSet) -> usize,
}

use WireColor::{Black, Blue, Red, White, Yellow};

const THREE_WIRES: &[WireRule] = &[
    WireRule {
        description: "No red wires: cut the second wire",
        applies: |w, _| w.count(Red) == 0,
        pick: |_| 1,
    },
    WireRule {
        description: "Last wire is white: cut the last wire",
        applies: |w, _| w.last_is(White),
        pick: WireSet::last_index,
    },
    WireRule {
        description: "More than one blue wire: cut the last blue wire",
        applies: |w, _| w.count(Blue) > 1,
        pick: |w| w.last_of(Blue).unwrap_or_else(|| w.last_index()),
    },
    WireRule {
        description: "Otherwise: cut the last wire",
        applies: |_, _| true,
        pick: WireSet::last_index,
    },
];

const FOUR_WIRES: &[WireRule] = &[
    WireRule {
        description: "More than one red wire and the last digit of the serial is odd: cut the second red wire",
        applies: |w, b| w.count(Red) > 1 && b.is_last_digit_odd(),
        pick: |w| w.nth_of(Red, 1).unwrap_or_else(|| w.last_index()),
    },
    WireRule {
        description: "Last wire is yellow and there are no red wires: cut the first wire",
        applies: |w, _| w.last_is(Yellow) && w.count(Red) == 0,
        pick: |_| 0,
    },
    WireRule {
        description: "Exactly one blue wire: cut the first wire",
        applies: |w, _| w.count(Blue) == 1,
        pick: |_| 0,
    },
    WireRule {
        description: "More than one yellow wire: cut the last wire",
        applies: |w, _| w.count(Yellow) > 1,
        pick: WireSet::last_index,
    },
    WireRule {
        description: "Otherwise: cut the second wire",
        applies: |_, _| true,
        pick: |_| 1,
    },
];

const FIVE_WIRES: &[WireRule] = &[
    WireRule {
        description: "Last wire is black and the last digit of the serial is odd: cut the fourth wire",
        applies: |w, b| w.last_is(Black) && b.is_last_digit_odd(),
        pick: |_| 3,
    },
    WireRule {
        description: "Exactly one red wire and more than one yellow wire: cut the first wire",
        applies: |w, _| w.count(Red) == 1 && w.count(Yellow) > 1,
        pick: |_| 0,
    },
    WireRule {
        description: "No black wires: cut the second wire",
        applies: |w, _| w.count(Black) == 0,
        pick: |_| 1,
    },
    WireRule {
        description: "Otherwise: cut the first wire",
        applies: |_, _| true,
        pick: |_| 0,
    },
];

const SIX_WIRES: &[WireRule] = &[
    WireRule {
        description: "No yellow wires and the last digit of the serial is odd: cut the third wire",
        applies: |w, b| w.count(Yellow) == 0 && b.is_last_digit_odd(),
        pick: |_| 2,
    },
    WireRule {
        description: "Exactly one yellow wire: cut the fourth wire",
        applies: |w, _| w.count(Yellow) == 1,
        pick: |_| 3,
    },
    WireRule {
        description: "No red wires: cut the last wire",
        applies: |w, _| w.count(Red) == 0,
        pick: WireSet::last_index,
    },
    WireRule {
        description: "Otherwise: cut the fourth wire",
        applies: |_, _| true,
        pick: |_| 3,
    },
];

/// The rule table for a wire count, if the manual has one.
pub fn rules_for(count: u32) -> Option<&'static [WireRule]> {
    match count {
        3 => Some(THREE_WIRES),
        4 => Some(FOUR_WIRES),
        5 => Some(FIVE_WIRES),
        6 => Some(SIX_WIRES),
        _ => None,
    }
}

/// First matching rule and the 0-based wire it selects.
pub fn evaluate<'a>(rules: &'a [WireRule], wires: &WireSet, bomb: &Bomb) -> Option<(&'a WireRule, usize)> {
    rules
        .iter()
        .find(|rule| (rule.applies)(wires, bomb))
        .map(|rule| (rule, (rule.pick)(wires)))
}

/// Parse `wire-count` and `wire-colors` into a checked wire set.
pub fn parse_wires(answers: &Answers) -> Result<WireSet, SolveError> {
    let count_text = required_text(answers, "wire-count")?;
    let count: u32 = count_text.parse().map_err(|_| SolveError::InvalidAnswer {
        question: "wire-count",
        value: count_text.clone(),
    })?;
    if !(MIN_WIRES..=MAX_WIRES).contains(&count) {
        return Err(SolveError::UnsupportedWireCount(count));
    }

    let colors = required_list(answers, "wire-colors")?
        .iter()
        .map(|raw| {
            WireColor::parse(raw).ok_or_else(|| SolveError::InvalidAnswer {
                question: "wire-colors",
                value: raw.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if colors.len() != count as usize {
        return Err(SolveError::WireCountMismatch {
            expected: count as usize,
            found: colors.len(),
        });
    }
    Ok(WireSet::new(colors))
}

fn solve(bomb: &Bomb, answers: &Answers) -> Result<Solution, SolveError> {
    let wires = parse_wires(answers)?;
    let count = wires.len() as u32;
    let rules = rules_for(count).ok_or(SolveError::UnsupportedWireCount(count))?;
    // The final row of every table always applies.
    let (rule, index) =
        evaluate(rules, &wires, bomb).ok_or(SolveError::UnsupportedWireCount(count))?;
    let color = wires.colors[index.min(wires.last_index())];

    Ok(Solution {
        solution: format!("Cut wire {} ({})", index + 1, color.name()),
        explanation: rule.description.to_string(),
    })
}

fn steps(bomb: &Bomb) -> Vec<InstructionStep> {
    let mut tables = String::new();
    for count in MIN_WIRES..=MAX_WIRES {
        tables.push_str(&format!("{count} WIRES:\n"));
        for rule in rules_for(count).unwrap_or_default() {
            tables.push_str(&format!("  • {}\n", rule.description));
        }
        tables.push('\n');
    }

    numbered(vec![
        InstructionStep::info(
            "Analyze the Wires",
            "Count the wires and note their colors from top to bottom.",
        )
        .with_condition(format!(
            "Vowel in serial: {} | Last digit odd: {} | Batteries: {}",
            yes_no(bomb.has_vowel_in_serial()),
            yes_no(bomb.is_last_digit_odd()),
            bomb.batteries
        )),
        InstructionStep::info("Determine Which Wire to Cut", tables.trim_end())
            .with_note("These rules must be checked in order - use the first rule that applies!"),
        InstructionStep::final_warning(
            "Cut the Correct Wire",
            "After identifying the correct wire, cut it to solve the module.",
            "Cutting the wrong wire will cause a strike!",
        ),
    ])
}

fn questions(_bomb: &Bomb, _answers: &Answers) -> Vec<Question> {
    vec![
        Question {
            id: "wire-count",
            kind: QuestionKind::Select,
            label: "How many wires?",
            description: "Count the wires from top to bottom",
            options: vec!["3", "4", "5", "6"],
        },
        Question {
            id: "wire-colors",
            kind: QuestionKind::Text,
            label: "Wire colors",
            description: "Enter wire colors from top to bottom (R, Y, B, W, G, K for black), e.g. R,Y,B",
            options: Vec::new(),
        },
    ]
}

fn default_answers() -> Answers {
    super::answers([("wire-count", "3"), ("wire-colors", "R,Y,B")])
}
