//! KTANE Assistant Headless Harness
//!
//! Sweeps every rule table over a set of fixture bombs, walks the state
//! machine through a defusal, and drives a live session service.
//! No UI involved.
//!
//! Usage:
//!   cargo run -p ktane-simtest
//!   cargo run -p ktane-simtest -- --verbose
//!   cargo run -p ktane-simtest -- --data-dir /tmp/ktane-harness

mod logging;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{debug, info};

use ktane_logic::bomb::{Bomb, Indicator, ModuleId, PortType, SerialNumber, MAX_STRIKES};
use ktane_logic::form::{BombForm, BombSpec};
use ktane_logic::modules::button::{self, ButtonAction, ButtonColor, ButtonLabel, StripColor};
use ktane_logic::modules::keypads::{self, COLUMNS, KEY_COUNT};
use ktane_logic::modules::wires::{self, WireColor, WireSet, MAX_WIRES, MIN_WIRES};
use ktane_logic::modules::{all_modules, answers, morse, whos_on_first};
use ktane_logic::state::{reduce, BombAction, BombMachine, DetonationCause, Outcome};
use ktane_logic::timer::{countdown_tick, TickOutcome, TimerText};
use ktane_session::{Session, SessionConfig, TimerService};
use ktane_store::{BombStorage, FsStore, KeyValueStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "ktane-simtest", about = "Headless checks for the KTANE assistant")]
struct Args {
    /// Print every check, not only failures, and enable debug logs.
    #[arg(short, long)]
    verbose: bool,

    /// Run the persistence checks against this directory instead of memory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    logging::init(args.verbose);
    println!("=== KTANE Assistant Harness ===\n");

    let bombs = fixture_bombs();
    let mut results = Vec::new();

    // 1. Registry and instruction generation
    results.extend(validate_registry(&bombs));

    // 2. Wires: every colour sequence of every length
    results.extend(validate_wires(&bombs));

    // 3. Button: every colour/label pair, every strip
    results.extend(validate_button(&bombs));

    // 4. Keypads: every key combination
    results.extend(validate_keypads());

    // 5. Reference tables
    results.extend(validate_reference_tables());

    // 6. State machine walkthrough
    results.extend(validate_state_machine());

    // 7. Persistence
    results.extend(validate_persistence(args.data_dir.as_deref()));

    // 8. Live session service
    results.extend(validate_session_service().await);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// Bombs covering both serial parities, vowels, battery counts and the
/// indicators the rules look at.
fn fixture_bombs() -> Vec<Bomb> {
    let fixtures: [(&str, u8, &[Indicator]); 6] = [
        ("AB12C3", 2, &[]),
        ("XY98Z4", 0, &[]),
        ("QQ00R7", 3, &[Indicator::Frk]),
        ("EZ55K2", 4, &[Indicator::Car, Indicator::Frk]),
        ("MN11P0", 1, &[Indicator::Car]),
        ("UV34W9", 6, &[]),
    ];
    fixtures
        .iter()
        .filter_map(|&(serial, batteries, indicators)| {
            let mut spec = BombSpec::with_serial(SerialNumber::parse(serial).ok()?);
            spec.batteries = batteries;
            spec.indicators = indicators.iter().copied().collect();
            spec.ports.insert(PortType::Parallel);
            reduce(None, BombAction::CreateBomb(spec), 0)
        })
        .collect()
}

// ── 1. Registry ─────────────────────────────────────────────────────────

fn validate_registry(bombs: &[Bomb]) -> Vec<TestResult> {
    println!("--- Module Registry ---");
    let mut results = Vec::new();
    let modules = all_modules();

    results.push(TestResult::new(
        "registry_complete",
        modules.len() == ModuleId::COUNT
            && ModuleId::ALL
                .iter()
                .zip(&modules)
                .all(|(id, m)| m.info().id == *id),
        format!("{} modules registered in order", modules.len()),
    ));

    let mut empty = Vec::new();
    let mut unnumbered = Vec::new();
    for bomb in bombs {
        for module in &modules {
            let steps = module.steps(bomb);
            if steps.is_empty() {
                empty.push(module.info().name);
            }
            if steps.iter().enumerate().any(|(i, s)| s.step as usize != i + 1) {
                unnumbered.push(module.info().name);
            }
        }
    }
    results.push(TestResult::new(
        "steps_present",
        empty.is_empty(),
        format!("every module has steps on {} bombs {empty:?}", bombs.len()),
    ));
    results.push(TestResult::new(
        "steps_numbered",
        unnumbered.is_empty(),
        format!("steps numbered from 1 {unnumbered:?}"),
    ));

    let mut failing = Vec::new();
    for bomb in bombs {
        for module in modules.iter().filter_map(|m| m.as_structured()) {
            if let Err(e) = module.solve(bomb, &module.default_answers()) {
                failing.push(format!("{}: {e}", module.info.name));
            }
        }
    }
    results.push(TestResult::new(
        "defaults_solve",
        failing.is_empty(),
        format!("default answers solve {failing:?}"),
    ));

    results
}

// ── 2. Wires ────────────────────────────────────────────────────────────

fn validate_wires(bombs: &[Bomb]) -> Vec<TestResult> {
    println!("--- Wires ---");
    let mut results = Vec::new();

    for count in MIN_WIRES..=MAX_WIRES {
        let Some(rules) = wires::rules_for(count) else {
            results.push(TestResult::new("wires_rules", false, format!("no rules for {count}")));
            continue;
        };
        let n = count as usize;
        let combos = WireColor::ALL.len().pow(count);
        let mut checked = 0usize;
        let mut bad = 0usize;

        for code in 0..combos {
            let mut rest = code;
            let colors: Vec<WireColor> = (0..n)
                .map(|_| {
                    let color = WireColor::ALL[rest % WireColor::ALL.len()];
                    rest /= WireColor::ALL.len();
                    color
                })
                .collect();
            let set = WireSet::new(colors);
            for bomb in bombs {
                checked += 1;
                match wires::evaluate(rules, &set, bomb) {
                    Some((_, index)) if index < n => {}
                    _ => bad += 1,
                }
            }
        }
        debug!("{count} wires: {checked} cases");
        results.push(TestResult::new(
            &format!("wires_{count}_total"),
            bad == 0,
            format!("{checked} cases, {bad} without a valid cut"),
        ));
    }

    if let Some(bomb) = bombs.first() {
        let unsupported = wires::MODULE.solve(
            bomb,
            &answers([("wire-count", "7"), ("wire-colors", "R,R,R,R,R,R,R")]),
        );
        results.push(TestResult::new(
            "wires_out_of_range",
            unsupported.is_err(),
            "7 wires are rejected",
        ));
    }

    results
}

// ── 3. Button ───────────────────────────────────────────────────────────

fn validate_button(bombs: &[Bomb]) -> Vec<TestResult> {
    println!("--- Button ---");
    let mut results = Vec::new();
    let mut holds = 0usize;
    let mut presses = 0usize;
    let mut failures = Vec::new();

    for bomb in bombs {
        for &color in ButtonColor::ALL {
            for &label in ButtonLabel::ALL {
                let rule = button::decide(color, label, bomb);
                match rule.action {
                    ButtonAction::PressAndRelease => {
                        presses += 1;
                        let a = answers([
                            ("button-color", color.label()),
                            ("button-label", label.label()),
                        ]);
                        if button::MODULE.solve(bomb, &a).is_err() {
                            failures.push(format!("{color}/{label}"));
                        }
                    }
                    ButtonAction::Hold => {
                        holds += 1;
                        for &strip in StripColor::ALL {
                            let a = answers([
                                ("button-color", color.label()),
                                ("button-label", label.label()),
                                ("strip-color", strip.label()),
                            ]);
                            let expected = strip.hold_seconds().to_string();
                            match button::MODULE.solve(bomb, &a) {
                                Ok(s) if s.solution.contains(&expected) => {}
                                _ => failures.push(format!("{color}/{label}/{strip}")),
                            }
                        }
                    }
                }
            }
        }
    }

    results.push(TestResult::new(
        "button_total",
        failures.is_empty(),
        format!("{presses} press, {holds} hold decisions {failures:?}"),
    ));
    results.push(TestResult::new(
        "button_both_actions",
        presses > 0 && holds > 0,
        "fixtures reach both press and hold",
    ));

    results
}

// ── 4. Keypads ──────────────────────────────────────────────────────────

fn validate_keypads() -> Vec<TestResult> {
    println!("--- Keypads ---");
    let mut results = Vec::new();
    let mut solved = 0usize;
    let mut out_of_order = 0usize;

    for column in &COLUMNS {
        for picks in combinations(column.len(), KEY_COUNT) {
            // Entered in reverse to make sure ordering comes from the column.
            let entered: Vec<_> = picks.iter().rev().map(|&i| column[i]).collect();
            match keypads::press_order(&entered) {
                Ok(order) => {
                    let expected: Vec<_> = picks.iter().map(|&i| column[i]).collect();
                    if order == expected {
                        solved += 1;
                    } else {
                        out_of_order += 1;
                    }
                }
                Err(_) => out_of_order += 1,
            }
        }
    }
    results.push(TestResult::new(
        "keypads_single_column",
        out_of_order == 0,
        format!("{solved} combinations ordered by column"),
    ));

    let mixed = [COLUMNS[0][0], COLUMNS[1][0], COLUMNS[2][0], COLUMNS[0][1]];
    results.push(TestResult::new(
        "keypads_mixed_columns",
        keypads::press_order(&mixed).is_err(),
        "symbols from different columns have no order",
    ));

    results
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    (0..n)
        .rev()
        .flat_map(|last| {
            combinations(last, k - 1).into_iter().map(move |mut c| {
                c.push(last);
                c
            })
        })
        .collect()
}

// ── 5. Reference tables ─────────────────────────────────────────────────

fn validate_reference_tables() -> Vec<TestResult> {
    println!("--- Reference Tables ---");
    let mut results = Vec::new();

    let mut decoded = true;
    for &(letter, code) in morse::LETTERS.iter().chain(morse::DIGITS.iter()) {
        if morse::decode_letter(code) != Some(letter) {
            decoded = false;
        }
    }
    results.push(TestResult::new(
        "morse_chart",
        decoded,
        "every chart entry decodes to itself",
    ));

    let frequencies: Vec<u32> = ('A'..='Z').filter_map(morse::frequency_for).collect();
    let ascending = frequencies.windows(2).all(|w| w[0] < w[1]);
    results.push(TestResult::new(
        "morse_frequencies",
        frequencies.len() == 26 && ascending,
        format!(
            "{} to {}",
            frequencies.first().map_or(String::new(), |&f| morse::format_mhz(f)),
            frequencies.last().map_or(String::new(), |&f| morse::format_mhz(f)),
        ),
    ));

    let missing: Vec<&str> = whos_on_first::STEP_ONE
        .iter()
        .chain(whos_on_first::STEP_TWO.iter())
        .map(|&(word, _)| word)
        .filter(|word| whos_on_first::lookup(word).is_none())
        .collect();
    results.push(TestResult::new(
        "whos_on_first_lookup",
        missing.is_empty(),
        format!("every listed word resolves {missing:?}"),
    ));

    let mut timer = TimerText::default();
    let mut ticks = 0u32;
    loop {
        ticks += 1;
        match countdown_tick(timer) {
            TickOutcome::Running(left) => timer = left,
            TickOutcome::Expired => break,
        }
    }
    results.push(TestResult::new(
        "countdown_length",
        ticks == TimerText::default().total_seconds(),
        format!("5:00 expires after {ticks} ticks"),
    ));

    results
}

// ── 6. State machine ────────────────────────────────────────────────────

fn validate_state_machine() -> Vec<TestResult> {
    println!("--- State Machine ---");
    let mut results = Vec::new();

    let form = BombForm {
        serial_number: "ab12c3".into(),
        batteries: 2,
        ..BombForm::default()
    };
    let spec = match form.into_spec() {
        Ok(spec) => spec,
        Err(errors) => {
            results.push(TestResult::new("form_valid", false, format!("{errors:?}")));
            return results;
        }
    };

    let mut machine = BombMachine::new();
    machine.dispatch(BombAction::CreateBomb(spec.clone()));
    for id in ModuleId::ALL {
        machine.dispatch(BombAction::SetModuleSolved(id));
    }
    results.push(TestResult::new(
        "defuse_all_modules",
        machine.outcome() == Some(Outcome::Defused),
        format!("{} modules solved", machine.solved_modules().len()),
    ));

    machine.dispatch(BombAction::ResetModules);
    for _ in 0..5 {
        machine.dispatch(BombAction::AddModuleStrike(ModuleId::Memory));
    }
    let strikes = machine.bomb().map_or(0, |b| b.strikes);
    results.push(TestResult::new(
        "strike_cap",
        strikes == MAX_STRIKES
            && machine.outcome() == Some(Outcome::Detonated(DetonationCause::Strikes)),
        format!("five strikes recorded as {strikes}"),
    ));

    machine.dispatch(BombAction::CreateBomb(spec));
    machine.dispatch(BombAction::StartTimer);
    let mut ticks = 0;
    while machine.tick().is_some() {
        ticks += 1;
    }
    results.push(TestResult::new(
        "timer_detonation",
        machine.outcome() == Some(Outcome::Detonated(DetonationCause::Timer))
            && !machine.is_timer_running(),
        format!("stopped after {ticks} ticks"),
    ));

    machine.dispatch(BombAction::ClearBomb);
    results.push(TestResult::new(
        "clear",
        !machine.has_active_bomb() && machine.outcome().is_none(),
        "no bomb after clear",
    ));

    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(data_dir: Option<&std::path::Path>) -> Vec<TestResult> {
    println!("--- Persistence ---");
    match data_dir {
        Some(dir) => match FsStore::at(dir) {
            Ok(store) => {
                info!("Persistence checks in {}", dir.display());
                persistence_checks(|| store.clone())
            }
            Err(e) => vec![TestResult::new("fs_store_open", false, e.to_string())],
        },
        None => {
            let store = MemoryStore::new();
            persistence_checks(|| store.clone())
        }
    }
}

fn persistence_checks<S, F>(open: F) -> Vec<TestResult>
where
    S: KeyValueStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();
    let config = SessionConfig::default();

    let mut session = Session::new(BombStorage::new(open()), config.clone());
    let form = BombForm {
        serial_number: "QQ00R7".into(),
        batteries: 3,
        ..session.new_form()
    };
    if let Err(errors) = session.create_bomb(form) {
        results.push(TestResult::new("persist_create", false, format!("{errors:?}")));
        return results;
    }
    session.dispatch(BombAction::ToggleIndicator(Indicator::Frk));
    session.dispatch(BombAction::SetModuleSolved(ModuleId::Wires));
    let saved_id = session.save_as("harness");

    let reopened = Session::new(BombStorage::new(open()), config);
    let restored = reopened.machine().bomb();
    results.push(TestResult::new(
        "persist_current",
        restored.is_some_and(|b| {
            b.has_indicator(Indicator::Frk) && b.is_module_solved(ModuleId::Wires)
        }),
        "current bomb restored with progress",
    ));
    results.push(TestResult::new(
        "persist_saved",
        saved_id.is_some_and(|id| reopened.saved_bombs().iter().any(|s| s.bomb.id == id)),
        format!("{} saved bombs", reopened.saved_bombs().len()),
    ));

    if let Some(id) = saved_id {
        reopened.delete_saved(id);
    }
    session.dispatch(BombAction::ClearBomb);
    results
}

// ── 8. Session service ──────────────────────────────────────────────────

async fn validate_session_service() -> Vec<TestResult> {
    println!("--- Session Service ---");
    let mut results = Vec::new();

    let config = SessionConfig {
        tick_interval_ms: 5,
        ..SessionConfig::default()
    };
    let session = Session::new(BombStorage::new(MemoryStore::new()), config);
    let (handle, task) = TimerService::spawn(session);

    let mut spec = match SerialNumber::parse("AB12C3") {
        Ok(serial) => BombSpec::with_serial(serial),
        Err(e) => {
            results.push(TestResult::new("service_setup", false, e.to_string()));
            return results;
        }
    };
    spec.timer = TimerText::from_seconds(3);

    let sent = handle.dispatch(BombAction::CreateBomb(spec)).await.is_ok()
        && handle.dispatch(BombAction::StartTimer).await.is_ok();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let outcome = handle.snapshot().await.ok().and_then(|s| s.outcome);
    results.push(TestResult::new(
        "service_countdown",
        sent && outcome == Some(Outcome::Detonated(DetonationCause::Timer)),
        format!("3 second timer at 5 ms per tick: {outcome:?}"),
    ));

    let stopped = handle.shutdown().await.is_ok() && task.await.is_ok();
    results.push(TestResult::new(
        "service_shutdown",
        stopped && handle.snapshot().await.is_err(),
        "service stops and returns the session",
    ));

    results
}
