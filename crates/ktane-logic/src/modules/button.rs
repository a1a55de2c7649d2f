//! The Button.
//!
//! Nine ordered rules decide between "press and release" and "hold". A held
//! button shows a coloured strip, and the strip colour fixes the timer digit
//! to release on.

use std::fmt;
use std::str::FromStr;

use crate::bomb::{Bomb, Indicator, ModuleId, UnknownLabel};
use crate::steps::{numbered, yes_no, InstructionStep};

use super::{
    required_text, Answers, Category, Difficulty, ModuleInfo, Question, QuestionKind, Solution,
    SolveError, StructuredModule,
};

pub const MODULE: StructuredModule = StructuredModule {
    info: ModuleInfo {
        id: ModuleId::Button,
        name: "The Button",
        description: "Press or hold the button based on its color, label, and bomb characteristics.",
        category: Category::Regular,
        difficulty: Difficulty::Medium,
    },
    steps,
    questions,
    solve,
    default_answers,
};

/// Declares a select-style enum whose variants parse from and display as
/// their option text.
macro_rules! select_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn options() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.label()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownLabel(s.to_string()))
            }
        }
    };
}

select_enum!(ButtonColor {
    Red => "Red",
    Blue => "Blue",
    Yellow => "Yellow",
    White => "White",
    Black => "Black",
});

select_enum!(ButtonLabel {
    Detonate => "Detonate",
    Hold => "Hold",
    Abort => "Abort",
    Press => "Press",
    Release => "Release",
});

select_enum!(StripColor {
    White => "White",
    Blue => "Blue",
    Yellow => "Yellow",
    Red => "Red",
    Green => "Green",
    Orange => "Orange",
    Purple => "Purple",
    Black => "Black",
    Pink => "Pink",
    Brown => "Brown",
});

impl StripColor {
    /// Timer digit to release on. Brown means release immediately.
    pub fn hold_seconds(self) -> u8 {
        match self {
            Self::White => 1,
            Self::Blue => 2,
            Self::Yellow => 3,
            Self::Red => 4,
            Self::Green => 5,
            Self::Orange => 6,
            Self::Purple => 7,
            Self::Black => 8,
            Self::Pink => 9,
            Self::Brown => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    PressAndRelease,
    Hold,
}

pub struct ButtonRule {
    pub description: &'static str,
    pub applies: fn(ButtonColor, ButtonLabel, &Bomb) -> bool,
    pub action: ButtonAction,
}

use ButtonAction::{Hold, PressAndRelease};

pub const RULES: &[ButtonRule] = &[
    ButtonRule {
        description: "Button says ABORT and BOB is lit",
        applies: |_, label, bomb| label == ButtonLabel::Abort && bomb.has_indicator(Indicator::Bob),
        action: Hold,
    },
    ButtonRule {
        description: "Button says DETONATE and more than 1 battery",
        applies: |_, label, bomb| label == ButtonLabel::Detonate && bomb.has_more_batteries_than(1),
        action: PressAndRelease,
    },
    ButtonRule {
        description: "Button says HOLD and 2+ batteries",
        applies: |_, label, bomb| label == ButtonLabel::Hold && bomb.batteries >= 2,
        action: Hold,
    },
    ButtonRule {
        description: "White button and CAR is lit",
        applies: |color, _, bomb| color == ButtonColor::White && bomb.has_indicator(Indicator::Car),
        action: Hold,
    },
    ButtonRule {
        description: "Yellow button and BOB is not lit",
        applies: |color, _, bomb| {
            color == ButtonColor::Yellow && !bomb.has_indicator(Indicator::Bob)
        },
        action: Hold,
    },
    ButtonRule {
        description: "Red button saying HOLD with more than 1 battery",
        applies: |color, label, bomb| {
            color == ButtonColor::Red && label == ButtonLabel::Hold && bomb.has_more_batteries_than(1)
        },
        action: PressAndRelease,
    },
    ButtonRule {
        description: "2+ batteries and FRK is lit",
        applies: |_, _, bomb| bomb.batteries >= 2 && bomb.has_indicator(Indicator::Frk),
        action: PressAndRelease,
    },
    ButtonRule {
        description: "Blue button saying HOLD",
        applies: |color, label, _| color == ButtonColor::Blue && label == ButtonLabel::Hold,
        action: Hold,
    },
    ButtonRule {
        description: "Default rule: hold the button",
        applies: |_, _, _| true,
        action: Hold,
    },
];

/// First rule that applies. The last rule always does.
pub fn decide(color: ButtonColor, label: ButtonLabel, bomb: &Bomb) -> &'static ButtonRule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(color, label, bomb))
        .unwrap_or(&RULES[RULES.len() - 1])
}

fn parse_select<T: FromStr>(answers: &Answers, id: &'static str) -> Result<T, SolveError> {
    let raw = required_text(answers, id)?;
    raw.parse()
        .map_err(|_| SolveError::InvalidAnswer { question: id, value: raw })
}

/// Button colour and label, if both have been answered with known options.
fn button_of(answers: &Answers) -> Option<(ButtonColor, ButtonLabel)> {
    let color = parse_select(answers, "button-color").ok()?;
    let label = parse_select(answers, "button-label").ok()?;
    Some((color, label))
}

fn solve(bomb: &Bomb, answers: &Answers) -> Result<Solution, SolveError> {
    let color: ButtonColor = parse_select(answers, "button-color")?;
    let label: ButtonLabel = parse_select(answers, "button-label")?;
    let rule = decide(color, label, bomb);

    let solution = match rule.action {
        PressAndRelease => "Press and immediately release".to_string(),
        Hold => {
            let strip: StripColor = parse_select(answers, "strip-color")?;
            format!(
                "Hold button until timer shows {}, then release",
                strip.hold_seconds()
            )
        }
    };

    Ok(Solution {
        solution,
        explanation: rule.description.to_string(),
    })
}

fn steps(bomb: &Bomb) -> Vec<InstructionStep> {
    let rules = RULES
        .iter()
        .zip(1..)
        .map(|(rule, n)| {
            let verb = match rule.action {
                PressAndRelease => "press and immediately release",
                Hold => "hold the button and refer to \"Holding a Button\"",
            };
            format!("STEP {n}: {}: {verb}.", rule.description)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let strips = StripColor::ALL
        .iter()
        .map(|s| match s {
            StripColor::Brown => "• BROWN strip = 0 seconds (release immediately)".to_string(),
            _ => format!(
                "• {} strip = {} second{}",
                s.label().to_uppercase(),
                s.hold_seconds(),
                if s.hold_seconds() == 1 { "" } else { "s" }
            ),
        })
        .collect::<Vec<_>>()
        .join("\n");

    numbered(vec![
        InstructionStep::info(
            "Examine the Button",
            "Note the button's color and the text label on it. Common labels include: DETONATE, HOLD, PRESS, ABORT, RELEASE.",
        ),
        InstructionStep::info("Determine Action", rules)
            .with_note("These rules must be checked in order - use the first rule that applies!"),
        InstructionStep::info(
            "Holding a Button",
            format!(
                "If instructed to hold the button, a colored strip will appear. \
                 The strip color tells you which digit to release on:\n\n{strips}\n\n\
                 Wait for the countdown timer to show that digit, then release the button."
            ),
        )
        .with_condition(format!(
            "Batteries: {} | Serial vowel: {} | Last digit odd: {}",
            bomb.batteries,
            yes_no(bomb.has_vowel_in_serial()),
            yes_no(bomb.is_last_digit_odd())
        )),
        InstructionStep::final_warning(
            "Execute the Correct Action",
            "Press and release immediately, or hold until the countdown reaches the correct number.",
            "Incorrect timing or wrong action will cause a strike!",
        ),
    ])
}

fn questions(bomb: &Bomb, answers: &Answers) -> Vec<Question> {
    let mut questions = vec![
        Question {
            id: "button-color",
            kind: QuestionKind::Select,
            label: "Button color",
            description: "What color is the button?",
            options: ButtonColor::options(),
        },
        Question {
            id: "button-label",
            kind: QuestionKind::Select,
            label: "Button label",
            description: "What does the button say?",
            options: ButtonLabel::options(),
        },
    ];

    let holding = button_of(answers)
        .is_some_and(|(color, label)| decide(color, label, bomb).action == Hold);
    if holding {
        questions.push(Question {
            id: "strip-color",
            kind: QuestionKind::Select,
            label: "Strip color",
            description: "Hold the button. What color strip appears?",
            options: StripColor::options(),
        });
    }
    questions
}

fn default_answers() -> Answers {
    super::answers([
        ("button-color", "Red"),
        ("button-label", "Press"),
        ("strip-color", "White"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bomb::tests::sample_bomb;
    use crate::modules::answers;
    use rstest::rstest;

    fn bomb_with(batteries: u8, indicators: &[Indicator]) -> Bomb {
        let mut bomb = sample_bomb("AB12C3");
        bomb.batteries = batteries;
        bomb.indicators = indicators.iter().copied().collect();
        bomb
    }

    #[test]
    fn detonate_with_batteries_and_frk_is_pressed() {
        let bomb = bomb_with(2, &[Indicator::Frk]);
        let s = solve(
            &bomb,
            &answers([("button-color", "Red"), ("button-label", "Detonate")]),
        )
        .unwrap();
        assert_eq!(s.solution, "Press and immediately release");
        assert_eq!(s.explanation, "Button says DETONATE and more than 1 battery");
    }

    #[rstest]
    #[case::abort_bob("Blue", "Abort", 0, &[Indicator::Bob], 0)]
    #[case::detonate_batteries("Blue", "Detonate", 2, &[], 1)]
    #[case::hold_batteries("Blue", "Hold", 2, &[], 2)]
    #[case::white_car("White", "Press", 0, &[Indicator::Car], 3)]
    #[case::yellow_no_bob("Yellow", "Press", 0, &[], 4)]
    #[case::red_hold("Red", "Hold", 1, &[], 8)]
    #[case::frk("Black", "Press", 3, &[Indicator::Frk], 6)]
    #[case::blue_hold("Blue", "Hold", 1, &[], 7)]
    #[case::fallback("Black", "Press", 0, &[], 8)]
    fn first_matching_rule(
        #[case] color: &str,
        #[case] label: &str,
        #[case] batteries: u8,
        #[case] indicators: &[Indicator],
        #[case] rule_index: usize,
    ) {
        let bomb = bomb_with(batteries, indicators);
        let rule = decide(color.parse().unwrap(), label.parse().unwrap(), &bomb);
        assert_eq!(rule.description, RULES[rule_index].description);
    }

    #[test]
    fn red_hold_rule_is_shadowed_by_hold_with_batteries() {
        // Rule 3 (HOLD, 2+ batteries) precedes rule 6, so a red HOLD
        // button with batteries is held, not pressed.
        let rule = decide(ButtonColor::Red, ButtonLabel::Hold, &bomb_with(2, &[]));
        assert_eq!(rule.action, Hold);
    }

    #[test]
    fn hold_uses_strip_timing() {
        let bomb = bomb_with(0, &[]);
        let base = [("button-color", "Black"), ("button-label", "Press")];

        let s = solve(&bomb, &answers(base.into_iter().chain([("strip-color", "Yellow")]))).unwrap();
        assert_eq!(s.solution, "Hold button until timer shows 3, then release");

        let s = solve(&bomb, &answers(base.into_iter().chain([("strip-color", "Brown")]))).unwrap();
        assert_eq!(s.solution, "Hold button until timer shows 0, then release");
    }

    #[test]
    fn hold_without_strip_is_missing_answer() {
        let result = solve(
            &bomb_with(0, &[]),
            &answers([("button-color", "Black"), ("button-label", "Press")]),
        );
        assert_eq!(result, Err(SolveError::MissingAnswer("strip-color")));
    }

    #[test]
    fn strip_question_only_when_holding() {
        let bomb = bomb_with(2, &[Indicator::Frk]);
        let ids = |a: &Answers| -> Vec<&'static str> { questions(&bomb, a).iter().map(|q| q.id).collect() };

        assert_eq!(ids(&Answers::new()), vec!["button-color", "button-label"]);
        let press = answers([("button-color", "Red"), ("button-label", "Detonate")]);
        assert_eq!(ids(&press), vec!["button-color", "button-label"]);
        let hold = answers([("button-color", "Blue"), ("button-label", "Abort")]);
        assert_eq!(ids(&hold), vec!["button-color", "button-label", "strip-color"]);
    }

    #[test]
    fn unknown_options_are_rejected() {
        let result = solve(
            &bomb_with(0, &[]),
            &answers([("button-color", "Purple"), ("button-label", "Press")]),
        );
        assert!(matches!(
            result,
            Err(SolveError::InvalidAnswer { question: "button-color", .. })
        ));
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("detonate".parse::<ButtonLabel>().unwrap(), ButtonLabel::Detonate);
        assert_eq!("PINK".parse::<StripColor>().unwrap().hold_seconds(), 9);
    }

    #[test]
    fn steps_list_all_rules() {
        let steps = steps(&bomb_with(2, &[]));
        assert_eq!(steps.len(), 4);
        assert!(steps[1].content.contains("STEP 9: Default rule"));
        assert!(steps[2].content.contains("• PINK strip = 9 seconds"));
        assert!(steps[2].content.contains("• WHITE strip = 1 second\n"));
    }
}
