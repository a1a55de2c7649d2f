//! Countdown service.
//!
//! One tokio task owns the [`Session`]. Player commands and countdown
//! ticks are handled in the same `select!` loop, so a tick never sees a
//! half-applied command.

use log::{debug, info};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use ktane_logic::state::{BombAction, Clock, Outcome};
use ktane_logic::timer::{TickOutcome, TimerText};
use ktane_store::KeyValueStore;

use crate::session::{Session, Snapshot};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

#[derive(Debug)]
pub enum SessionCommand {
    Dispatch(BombAction),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Ticked(TimerText),
    TimerExpired,
    OutcomeChanged(Outcome),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("session service has stopped")]
    Stopped,
}

/// Cloneable handle to a running [`TimerService`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub async fn dispatch(&self, action: BombAction) -> Result<(), ServiceError> {
        self.send(SessionCommand::Dispatch(action)).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        rx.await.map_err(|_| ServiceError::Stopped)
    }

    /// Ask the service to stop. The session comes back through the
    /// `JoinHandle` returned by [`TimerService::spawn`].
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.send(SessionCommand::Shutdown).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), ServiceError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ServiceError::Stopped)
    }
}

pub struct TimerService;

impl TimerService {
    /// Move `session` onto a tokio task. Must be called inside a runtime.
    pub fn spawn<S, C>(session: Session<S, C>) -> (SessionHandle, JoinHandle<Session<S, C>>)
    where
        S: KeyValueStore + Send + 'static,
        C: Clock,
    {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(run(session, command_rx, events.clone()));
        (SessionHandle { commands, events }, task)
    }
}

async fn run<S, C>(
    mut session: Session<S, C>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
) -> Session<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    let period = session.config().tick_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_outcome = session.machine().outcome();
    info!("Session service started");

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(SessionCommand::Dispatch(action)) => {
                    let was_running = session.machine().is_timer_running();
                    session.dispatch(action);
                    if !was_running && session.machine().is_timer_running() {
                        // First decrement lands one full period after the start.
                        ticker.reset();
                        debug!("Countdown armed");
                    }
                }
                Some(SessionCommand::Snapshot(reply)) => {
                    let _ = reply.send(session.snapshot());
                }
                Some(SessionCommand::Shutdown) | None => break,
            },
            _ = ticker.tick() => match session.tick() {
                Some(TickOutcome::Running(left)) => {
                    let _ = events.send(SessionEvent::Ticked(left));
                }
                Some(TickOutcome::Expired) => {
                    info!("Countdown expired");
                    let _ = events.send(SessionEvent::TimerExpired);
                }
                None => {}
            },
        }

        let outcome = session.machine().outcome();
        if outcome != last_outcome {
            if let Some(outcome) = outcome {
                info!("Outcome changed: {outcome:?}");
                let _ = events.send(SessionEvent::OutcomeChanged(outcome));
            }
            last_outcome = outcome;
        }
    }

    info!("Session service stopped");
    session
}
