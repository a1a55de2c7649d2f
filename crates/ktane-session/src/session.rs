//! A defusal session: the bomb machine plus its persistence.

use log::{debug, info};
use thiserror::Error;
use uuid::Uuid;

use ktane_logic::bomb::{Bomb, ModuleId};
use ktane_logic::form::{BombForm, FormError};
use ktane_logic::modules::{module_logic, module_name, Answers, Solution, SolveError, Validation};
use ktane_logic::state::{BombAction, BombMachine, Clock, Outcome, SystemClock};
use ktane_logic::steps::InstructionStep;
use ktane_logic::timer::TickOutcome;
use ktane_store::{BombStorage, KeyValueStore, SavedBomb};

use crate::config::SessionConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active bomb")]
    NoActiveBomb,
    #[error("{0} has no questionnaire")]
    Narrative(&'static str),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub bomb: Option<Bomb>,
    pub outcome: Option<Outcome>,
    pub timer_running: bool,
}

pub struct Session<S, C: Clock = SystemClock> {
    machine: BombMachine<C>,
    storage: BombStorage<S>,
    config: SessionConfig,
}

impl<S: KeyValueStore> Session<S, SystemClock> {
    pub fn new(storage: BombStorage<S>, config: SessionConfig) -> Self {
        Self::with_clock(storage, config, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> Session<S, C> {
    pub fn with_clock(storage: BombStorage<S>, config: SessionConfig, clock: C) -> Self {
        let mut session = Self {
            machine: BombMachine::with_clock(clock),
            storage,
            config,
        };
        if session.config.restore_on_start {
            session.restore();
        }
        session
    }

    fn restore(&mut self) {
        match self.storage.current_bomb() {
            Some(bomb) => {
                info!("Restored bomb {}", bomb.serial_number);
                self.machine.dispatch(BombAction::LoadBomb(bomb));
            }
            None => debug!("No bomb to restore"),
        }
    }

    pub fn machine(&self) -> &BombMachine<C> {
        &self.machine
    }

    pub fn storage(&self) -> &BombStorage<S> {
        &self.storage
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Apply an action; the current bomb is saved when it changed.
    pub fn dispatch(&mut self, action: BombAction) {
        let before = self.machine.bomb().cloned();
        self.machine.dispatch(action);
        if self.machine.bomb() != before.as_ref() {
            self.autosave();
        }
    }

    pub fn tick(&mut self) -> Option<TickOutcome> {
        let tick = self.machine.tick()?;
        self.autosave();
        Some(tick)
    }

    fn autosave(&self) {
        if self.config.autosave {
            self.persist();
        }
    }

    /// Write the current bomb regardless of `autosave`.
    pub fn persist(&self) {
        self.storage.set_current_bomb(self.machine.bomb());
    }

    /// Empty form carrying the configured default timer.
    pub fn new_form(&self) -> BombForm {
        BombForm {
            timer_minutes: self.config.default_timer.minutes(),
            timer_seconds: self.config.default_timer.seconds(),
            ..BombForm::default()
        }
    }

    pub fn create_bomb(&mut self, form: BombForm) -> Result<(), Vec<FormError>> {
        let spec = form.into_spec()?;
        self.dispatch(BombAction::CreateBomb(spec));
        Ok(())
    }

    pub fn steps(&self, id: ModuleId) -> Result<Vec<InstructionStep>, SessionError> {
        let bomb = self.machine.bomb().ok_or(SessionError::NoActiveBomb)?;
        Ok(module_logic(id).steps(bomb))
    }

    pub fn solve(&self, id: ModuleId, answers: &Answers) -> Result<Solution, SessionError> {
        let bomb = self.machine.bomb().ok_or(SessionError::NoActiveBomb)?;
        let logic = module_logic(id);
        let module = logic
            .as_structured()
            .ok_or(SessionError::Narrative(module_name(id)))?;
        Ok(module.solve(bomb, answers)?)
    }

    pub fn validate(&self, id: ModuleId, answers: &Answers) -> Result<Validation, SessionError> {
        let bomb = self.machine.bomb().ok_or(SessionError::NoActiveBomb)?;
        Ok(module_logic(id).validate(bomb, answers))
    }

    /// Save the active bomb under `name`. Returns its id, or `None` without
    /// a bomb.
    pub fn save_as(&self, name: &str) -> Option<Uuid> {
        let bomb = self.machine.bomb()?;
        self.storage.save_bomb(name, bomb);
        Some(bomb.id)
    }

    pub fn saved_bombs(&self) -> Vec<SavedBomb> {
        self.storage.saved_bombs()
    }

    /// Make a saved bomb the active one. Returns `false` when no saved bomb
    /// has that id.
    pub fn load_saved(&mut self, id: Uuid) -> bool {
        match self.storage.find_saved(id) {
            Some(saved) => {
                info!("Loading saved bomb \"{}\"", saved.name);
                self.dispatch(BombAction::LoadBomb(saved.bomb));
                true
            }
            None => false,
        }
    }

    pub fn delete_saved(&self, id: Uuid) {
        self.storage.delete_saved_bomb(id);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bomb: self.machine.bomb().cloned(),
            outcome: self.machine.outcome(),
            timer_running: self.machine.is_timer_running(),
        }
    }
}

impl<S, C: Clock> std::fmt::Debug for Session<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("bomb", &self.machine.bomb().map(|b| b.serial_number.as_str()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktane_logic::modules::answers;
    use ktane_store::bombs::CURRENT_BOMB_KEY;
    use ktane_store::MemoryStore;

    fn form(serial: &str) -> BombForm {
        BombForm {
            serial_number: serial.to_string(),
            batteries: 2,
            ..BombForm::default()
        }
    }

    fn session(store: &MemoryStore) -> Session<MemoryStore> {
        Session::new(BombStorage::new(store.clone()), SessionConfig::default())
    }

    #[test]
    fn changes_are_autosaved_and_restored() {
        let store = MemoryStore::new();
        let mut first = session(&store);
        first.create_bomb(form("AB12C3")).unwrap();
        first.dispatch(BombAction::SetModuleSolved(ModuleId::Wires));
        assert!(store.contains(CURRENT_BOMB_KEY));

        let second = session(&store);
        let restored = second.machine().bomb().unwrap();
        assert_eq!(restored.id, first.machine().bomb().unwrap().id);
        assert!(second.machine().is_module_solved(ModuleId::Wires));
    }

    #[test]
    fn clearing_removes_the_saved_bomb() {
        let store = MemoryStore::new();
        let mut s = session(&store);
        s.create_bomb(form("AB12C3")).unwrap();
        s.dispatch(BombAction::ClearBomb);
        assert!(!store.contains(CURRENT_BOMB_KEY));
        assert!(!session(&store).machine().has_active_bomb());
    }

    #[test]
    fn autosave_off_writes_only_on_persist() {
        let store = MemoryStore::new();
        let config = SessionConfig {
            autosave: false,
            ..SessionConfig::default()
        };
        let mut s = Session::new(BombStorage::new(store.clone()), config);
        s.create_bomb(form("AB12C3")).unwrap();
        assert!(!store.contains(CURRENT_BOMB_KEY));
        s.persist();
        assert!(store.contains(CURRENT_BOMB_KEY));
    }

    #[test]
    fn restore_can_be_disabled() {
        let store = MemoryStore::new();
        session(&store).create_bomb(form("AB12C3")).unwrap();
        let config = SessionConfig {
            restore_on_start: false,
            ..SessionConfig::default()
        };
        let s = Session::new(BombStorage::new(store), config);
        assert!(!s.machine().has_active_bomb());
    }

    #[test]
    fn invalid_form_creates_nothing() {
        let mut s = session(&MemoryStore::new());
        let errors = s.create_bomb(form("AB1")).unwrap_err();
        assert!(!errors.is_empty());
        assert!(!s.machine().has_active_bomb());
    }

    #[test]
    fn new_form_uses_configured_timer() {
        let config = SessionConfig {
            default_timer: "3:15".parse().unwrap(),
            ..SessionConfig::default()
        };
        let s = Session::new(BombStorage::new(MemoryStore::new()), config);
        let form = s.new_form();
        assert_eq!((form.timer_minutes, form.timer_seconds), (3, 15));
        assert!(form.serial_number.is_empty());
    }

    #[test]
    fn solving_needs_a_bomb_and_a_questionnaire() {
        let mut s = session(&MemoryStore::new());
        let wires = answers([("wire-count", "3"), ("wire-colors", "Y,W,B")]);
        assert!(matches!(
            s.solve(ModuleId::Wires, &wires),
            Err(SessionError::NoActiveBomb)
        ));

        s.create_bomb(form("AB12C3")).unwrap();
        let solution = s.solve(ModuleId::Wires, &wires).unwrap();
        assert_eq!(solution.solution, "Cut wire 2 (White)");
        assert!(matches!(
            s.solve(ModuleId::Simon, &Answers::new()),
            Err(SessionError::Narrative(_))
        ));
        assert!(!s.steps(ModuleId::Simon).unwrap().is_empty());
        assert!(s.validate(ModuleId::Wires, &wires).unwrap().correct);
    }

    #[test]
    fn saved_bombs_can_be_reloaded() {
        let store = MemoryStore::new();
        let mut s = session(&store);
        assert_eq!(s.save_as("nothing"), None);

        s.create_bomb(form("AB12C3")).unwrap();
        s.dispatch(BombAction::AddStrike);
        let id = s.save_as("practice").unwrap();
        s.dispatch(BombAction::ClearBomb);

        assert!(s.load_saved(id));
        assert_eq!(s.machine().bomb().unwrap().strikes, 1);
        assert!(!s.load_saved(Uuid::nil()));

        s.delete_saved(id);
        assert!(s.saved_bombs().is_empty());
    }

    #[test]
    fn ticks_are_autosaved() {
        let store = MemoryStore::new();
        let mut s = session(&store);
        s.create_bomb(form("AB12C3")).unwrap();
        assert_eq!(s.tick(), None);

        s.dispatch(BombAction::StartTimer);
        assert!(s.tick().is_some());
        let reloaded = session(&store);
        assert_eq!(reloaded.machine().time_remaining(), Some(299));
    }
}
