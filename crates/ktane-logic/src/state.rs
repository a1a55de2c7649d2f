//! Bomb/module state machine.
//!
//! [`reduce`] is the single transition function over `Option<Bomb>`. It runs
//! to completion, never fails, and treats every action other than create
//! and load as a no-op while no bomb is active. [`BombMachine`] owns the
//! state and a [`Clock`] and adds the derived queries and the timer tick.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::bomb::{default_modules, Bomb, Indicator, ModuleId, PortType, MAX_BATTERIES, MAX_STRIKES};
use crate::form::{BombPatch, BombSpec};
use crate::timer::{countdown_tick, TickOutcome, TimerText};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BombAction {
    /// Fresh bomb: new id, seven unsolved modules, stopped timer.
    CreateBomb(BombSpec),
    /// Restore a previously stored bomb.
    LoadBomb(Bomb),
    UpdateBomb(BombPatch),
    SetIndicators(BTreeSet<Indicator>),
    ToggleIndicator(Indicator),
    SetPorts(BTreeSet<PortType>),
    TogglePort(PortType),
    AddStrike,
    ResetStrikes,
    SetModuleSolved(ModuleId),
    /// Strike against one module. Also counts toward the bomb's strikes.
    AddModuleStrike(ModuleId),
    /// Every module back to unsolved, strikes to zero.
    ResetModules,
    StartTimer,
    StopTimer,
    UpdateTimer(TimerText),
    ClearBomb,
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, item: T) {
    if !set.remove(&item) {
        set.insert(item);
    }
}

fn create(spec: BombSpec, id: Uuid, now: i64) -> Bomb {
    Bomb {
        id,
        serial_number: spec.serial_number,
        batteries: spec.batteries.min(MAX_BATTERIES),
        indicators: spec.indicators,
        ports: spec.ports,
        strikes: spec.strikes.min(MAX_STRIKES),
        modules: default_modules(),
        timer: spec.timer,
        timer_running: false,
        defuse_start_time: None,
        created_at: now,
        updated_at: now,
    }
}

/// Apply one action. `now` is the wall clock in Unix milliseconds.
pub fn reduce(state: Option<Bomb>, action: BombAction, now: i64) -> Option<Bomb> {
    let mut bomb = match action {
        BombAction::CreateBomb(spec) => return Some(create(spec, Uuid::new_v4(), now)),
        BombAction::LoadBomb(bomb) => {
            return Some(Bomb {
                updated_at: now,
                ..bomb.normalize()
            })
        }
        BombAction::ClearBomb => return None,
        _ => state?,
    };

    if apply(&mut bomb, action, now) {
        bomb.updated_at = now;
    }
    Some(bomb)
}

/// Mutate an active bomb. Returns `false` when the action was refused and
/// the bomb is untouched.
fn apply(bomb: &mut Bomb, action: BombAction, now: i64) -> bool {
    use BombAction::*;

    match action {
        UpdateBomb(patch) => {
            if let Some(serial) = patch.serial_number {
                bomb.serial_number = serial;
            }
            if let Some(batteries) = patch.batteries {
                bomb.batteries = batteries.min(MAX_BATTERIES);
            }
            if let Some(indicators) = patch.indicators {
                bomb.indicators = indicators;
            }
            if let Some(ports) = patch.ports {
                bomb.ports = ports;
            }
            if let Some(strikes) = patch.strikes {
                bomb.strikes = strikes.min(MAX_STRIKES);
            }
            if let Some(timer) = patch.timer {
                bomb.timer = timer;
            }
        }
        SetIndicators(indicators) => bomb.indicators = indicators,
        ToggleIndicator(indicator) => toggle(&mut bomb.indicators, indicator),
        SetPorts(ports) => bomb.ports = ports,
        TogglePort(port) => toggle(&mut bomb.ports, port),
        AddStrike => bomb.strikes = bomb.strikes.saturating_add(1).min(MAX_STRIKES),
        ResetStrikes => bomb.strikes = 0,
        SetModuleSolved(id) => match bomb.module_mut(id) {
            Some(module) => module.solved = true,
            None => return false,
        },
        AddModuleStrike(id) => {
            // Module and bomb strikes move together or not at all.
            if bomb.strikes >= MAX_STRIKES {
                return false;
            }
            match bomb.module_mut(id) {
                Some(module) => module.strikes = module.strikes.saturating_add(1),
                None => return false,
            }
            bomb.strikes += 1;
        }
        ResetModules => {
            bomb.modules = default_modules();
            bomb.strikes = 0;
        }
        StartTimer => {
            if bomb.timer.is_zero() {
                return false;
            }
            bomb.timer_running = true;
            bomb.defuse_start_time.get_or_insert(now);
        }
        StopTimer => bomb.timer_running = false,
        UpdateTimer(timer) => bomb.timer = timer,
        CreateBomb(_) | LoadBomb(_) | ClearBomb => return false,
    }
    true
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetonationCause {
    Strikes,
    Timer,
}

/// Terminal state of a defusal, derived from the bomb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Defused,
    Detonated(DetonationCause),
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Self::InProgress
    }
}

/// Strikes beat a full solve, and a full solve beats an expired timer.
pub fn outcome(bomb: &Bomb) -> Outcome {
    if bomb.strikes >= MAX_STRIKES {
        Outcome::Detonated(DetonationCause::Strikes)
    } else if bomb.all_modules_solved() {
        Outcome::Defused
    } else if bomb.timer.is_zero() && bomb.defuse_start_time.is_some() {
        // Once started, a clock at 0:00 has expired whether it got there by
        // ticking or by an edit.
        Outcome::Detonated(DetonationCause::Timer)
    } else {
        Outcome::InProgress
    }
}

// ============================================================================
// MACHINE
// ============================================================================

/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + 'static {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Owns the current bomb, if any, and applies actions to it.
#[derive(Debug, Default)]
pub struct BombMachine<C: Clock = SystemClock> {
    bomb: Option<Bomb>,
    clock: C,
}

impl BombMachine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> BombMachine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { bomb: None, clock }
    }

    pub fn dispatch(&mut self, action: BombAction) {
        let now = self.clock.now_millis();
        self.bomb = reduce(self.bomb.take(), action, now);
    }

    /// Advance a running timer by one second. When it reaches `0:00` the
    /// timer is also stopped. Returns `None` when nothing was running.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        let bomb = self.bomb.as_ref().filter(|b| b.timer_running)?;
        let tick = countdown_tick(bomb.timer);
        match tick {
            TickOutcome::Running(left) => self.dispatch(BombAction::UpdateTimer(left)),
            TickOutcome::Expired => {
                self.dispatch(BombAction::UpdateTimer(TimerText::ZERO));
                self.dispatch(BombAction::StopTimer);
            }
        }
        Some(tick)
    }

    pub fn bomb(&self) -> Option<&Bomb> {
        self.bomb.as_ref()
    }

    pub fn has_active_bomb(&self) -> bool {
        self.bomb.is_some()
    }

    pub fn solved_modules(&self) -> Vec<ModuleId> {
        self.bomb.as_ref().map(Bomb::solved_modules).unwrap_or_default()
    }

    pub fn unsolved_modules(&self) -> Vec<ModuleId> {
        self.bomb.as_ref().map(Bomb::unsolved_modules).unwrap_or_default()
    }

    pub fn is_module_solved(&self, id: ModuleId) -> bool {
        self.bomb.as_ref().is_some_and(|b| b.is_module_solved(id))
    }

    /// Remaining seconds on the countdown.
    pub fn time_remaining(&self) -> Option<u32> {
        self.bomb.as_ref().map(|b| b.timer.total_seconds())
    }

    pub fn is_timer_running(&self) -> bool {
        self.bomb.as_ref().is_some_and(|b| b.timer_running)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.bomb.as_ref().map(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bomb::SerialNumber;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Test clock that advances by one millisecond per reading.
    #[derive(Debug, Clone, Default)]
    struct StepClock(Arc<AtomicI64>);

    impl Clock for StepClock {
        fn now_millis(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    fn spec() -> BombSpec {
        let mut spec = BombSpec::with_serial(SerialNumber::parse("AB12C3").unwrap());
        spec.batteries = 2;
        spec
    }

    fn machine() -> BombMachine<StepClock> {
        let mut m = BombMachine::with_clock(StepClock::default());
        m.dispatch(BombAction::CreateBomb(spec()));
        m
    }

    #[test]
    fn create_initialises_defaults() {
        let m = machine();
        let bomb = m.bomb().unwrap();
        assert_eq!(bomb.modules.len(), ModuleId::COUNT);
        assert!(bomb.modules.iter().all(|s| !s.solved && s.strikes == 0));
        assert_eq!(bomb.timer.to_string(), "5:00");
        assert!(!bomb.timer_running);
        assert_eq!(bomb.defuse_start_time, None);
        assert_eq!(bomb.created_at, bomb.updated_at);
    }

    #[test]
    fn creates_get_distinct_ids() {
        let a = reduce(None, BombAction::CreateBomb(spec()), 1).unwrap();
        let b = reduce(None, BombAction::CreateBomb(spec()), 1).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn actions_without_bomb_are_noops() {
        for action in [
            BombAction::AddStrike,
            BombAction::StartTimer,
            BombAction::ToggleIndicator(Indicator::Car),
            BombAction::SetModuleSolved(ModuleId::Wires),
            BombAction::UpdateTimer(TimerText::ZERO),
            BombAction::ClearBomb,
        ] {
            assert_eq!(reduce(None, action, 5), None);
        }
    }

    #[test]
    fn strikes_clamp_at_three() {
        let mut m = machine();
        for _ in 0..5 {
            m.dispatch(BombAction::AddStrike);
        }
        assert_eq!(m.bomb().unwrap().strikes, MAX_STRIKES);
        m.dispatch(BombAction::ResetStrikes);
        assert_eq!(m.bomb().unwrap().strikes, 0);
    }

    #[test]
    fn module_strike_moves_with_bomb_strike() {
        let mut m = machine();
        m.dispatch(BombAction::AddModuleStrike(ModuleId::Wires));
        m.dispatch(BombAction::AddModuleStrike(ModuleId::Wires));
        let bomb = m.bomb().unwrap();
        assert_eq!(bomb.strikes, 2);
        assert_eq!(bomb.module(ModuleId::Wires).unwrap().strikes, 2);

        m.dispatch(BombAction::AddModuleStrike(ModuleId::Memory));
        m.dispatch(BombAction::AddModuleStrike(ModuleId::Memory));
        let bomb = m.bomb().unwrap();
        assert_eq!(bomb.strikes, 3);
        assert_eq!(bomb.module(ModuleId::Memory).unwrap().strikes, 1);
    }

    #[test]
    fn toggling_twice_restores_the_set() {
        let mut m = machine();
        let before = m.bomb().unwrap().indicators.clone();
        m.dispatch(BombAction::ToggleIndicator(Indicator::Frk));
        assert!(m.bomb().unwrap().has_indicator(Indicator::Frk));
        m.dispatch(BombAction::ToggleIndicator(Indicator::Frk));
        assert_eq!(m.bomb().unwrap().indicators, before);

        m.dispatch(BombAction::TogglePort(PortType::Parallel));
        m.dispatch(BombAction::TogglePort(PortType::Serial));
        m.dispatch(BombAction::TogglePort(PortType::Parallel));
        assert_eq!(
            m.bomb().unwrap().ports,
            BTreeSet::from([PortType::Serial])
        );
    }

    #[test]
    fn set_replaces_whole_sets() {
        let mut m = machine();
        m.dispatch(BombAction::ToggleIndicator(Indicator::Bob));
        m.dispatch(BombAction::SetIndicators(BTreeSet::from([Indicator::Car, Indicator::Nsa])));
        assert_eq!(
            m.bomb().unwrap().indicators,
            BTreeSet::from([Indicator::Car, Indicator::Nsa])
        );
        m.dispatch(BombAction::SetPorts(BTreeSet::new()));
        assert!(m.bomb().unwrap().ports.is_empty());
    }

    #[test]
    fn update_keeps_identity_and_refreshes_timestamp() {
        let mut m = machine();
        let original = m.bomb().unwrap().clone();
        m.dispatch(BombAction::UpdateBomb(BombPatch {
            serial_number: Some(SerialNumber::parse("ZZ99Z8").unwrap()),
            batteries: Some(9),
            ..BombPatch::default()
        }));
        let bomb = m.bomb().unwrap();
        assert_eq!(bomb.id, original.id);
        assert_eq!(bomb.created_at, original.created_at);
        assert!(bomb.updated_at > original.updated_at);
        assert_eq!(bomb.serial_number.as_str(), "ZZ99Z8");
        assert_eq!(bomb.batteries, MAX_BATTERIES);
    }

    #[test]
    fn solving_is_idempotent_and_victory_is_revocable() {
        let mut m = machine();
        m.dispatch(BombAction::SetModuleSolved(ModuleId::Simon));
        m.dispatch(BombAction::SetModuleSolved(ModuleId::Simon));
        assert_eq!(m.solved_modules(), vec![ModuleId::Simon]);
        assert_eq!(m.unsolved_modules().len(), ModuleId::COUNT - 1);

        for id in ModuleId::ALL {
            m.dispatch(BombAction::SetModuleSolved(id));
        }
        assert_eq!(m.outcome(), Some(Outcome::Defused));

        m.dispatch(BombAction::ResetModules);
        assert_eq!(m.outcome(), Some(Outcome::InProgress));
        assert_eq!(m.bomb().unwrap().modules.len(), ModuleId::COUNT);
        assert!(!m.is_module_solved(ModuleId::Simon));
    }

    #[test]
    fn reset_modules_clears_all_strikes() {
        let mut m = machine();
        m.dispatch(BombAction::SetModuleSolved(ModuleId::Wires));
        m.dispatch(BombAction::AddModuleStrike(ModuleId::Memory));
        m.dispatch(BombAction::AddModuleStrike(ModuleId::Memory));
        m.dispatch(BombAction::AddModuleStrike(ModuleId::Morse));
        assert_eq!(m.bomb().unwrap().strikes, MAX_STRIKES);

        m.dispatch(BombAction::ResetModules);
        let bomb = m.bomb().unwrap();
        assert_eq!(bomb.strikes, 0);
        assert_eq!(bomb.modules.len(), ModuleId::COUNT);
        assert!(bomb.modules.iter().all(|s| !s.solved && s.strikes == 0));
        assert_eq!(m.outcome(), Some(Outcome::InProgress));
    }

    #[test]
    fn timer_edited_to_zero_after_start_counts_as_expired() {
        let mut m = machine();
        m.dispatch(BombAction::UpdateTimer(TimerText::ZERO));
        assert_eq!(m.outcome(), Some(Outcome::InProgress));

        m.dispatch(BombAction::UpdateTimer(TimerText::from_seconds(30)));
        m.dispatch(BombAction::StartTimer);
        m.dispatch(BombAction::StopTimer);
        m.dispatch(BombAction::UpdateTimer(TimerText::ZERO));
        assert!(!m.is_timer_running());
        assert_eq!(
            m.outcome(),
            Some(Outcome::Detonated(DetonationCause::Timer))
        );
    }

    #[test]
    fn strikes_take_precedence_over_victory() {
        let mut m = machine();
        for id in ModuleId::ALL {
            m.dispatch(BombAction::SetModuleSolved(id));
        }
        for _ in 0..3 {
            m.dispatch(BombAction::AddStrike);
        }
        assert_eq!(
            m.outcome(),
            Some(Outcome::Detonated(DetonationCause::Strikes))
        );
    }

    #[test]
    fn first_start_latches_defuse_start_time() {
        let mut m = machine();
        m.dispatch(BombAction::StartTimer);
        let first = m.bomb().unwrap().defuse_start_time;
        assert!(first.is_some());
        m.dispatch(BombAction::StopTimer);
        m.dispatch(BombAction::StartTimer);
        assert_eq!(m.bomb().unwrap().defuse_start_time, first);
        assert!(m.is_timer_running());
        m.dispatch(BombAction::StopTimer);
        m.dispatch(BombAction::StopTimer);
        assert!(!m.is_timer_running());
    }

    #[test]
    fn start_at_zero_is_a_noop() {
        let mut m = machine();
        m.dispatch(BombAction::UpdateTimer(TimerText::ZERO));
        let before = m.bomb().unwrap().clone();
        m.dispatch(BombAction::StartTimer);
        assert_eq!(m.bomb().unwrap(), &before);
        assert_eq!(m.outcome(), Some(Outcome::InProgress));
    }

    #[test]
    fn one_minute_runs_out_after_sixty_ticks() {
        let mut m = machine();
        m.dispatch(BombAction::UpdateTimer("1:00".parse().unwrap()));
        m.dispatch(BombAction::StartTimer);
        for _ in 0..59 {
            assert!(matches!(m.tick(), Some(TickOutcome::Running(_))));
        }
        assert_eq!(m.time_remaining(), Some(1));
        assert_eq!(m.tick(), Some(TickOutcome::Expired));

        let bomb = m.bomb().unwrap();
        assert_eq!(bomb.timer.to_string(), "0:00");
        assert!(!bomb.timer_running);
        assert_eq!(m.tick(), None);
        assert_eq!(m.outcome(), Some(Outcome::Detonated(DetonationCause::Timer)));
    }

    #[test]
    fn stopped_timer_does_not_tick() {
        let mut m = machine();
        assert_eq!(m.tick(), None);
        assert_eq!(m.time_remaining(), Some(300));
    }

    #[test]
    fn load_restores_and_clear_removes() {
        let mut m = machine();
        m.dispatch(BombAction::SetModuleSolved(ModuleId::Morse));
        let saved = m.bomb().unwrap().clone();
        m.dispatch(BombAction::ClearBomb);
        assert!(!m.has_active_bomb());
        assert_eq!(m.outcome(), None);
        assert!(m.solved_modules().is_empty());

        m.dispatch(BombAction::LoadBomb(saved.clone()));
        let loaded = m.bomb().unwrap();
        assert_eq!(loaded.id, saved.id);
        assert!(loaded.is_module_solved(ModuleId::Morse));
        assert!(loaded.updated_at > saved.updated_at);
    }
}
