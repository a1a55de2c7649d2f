//! Live defusal session for the KTANE assistant.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | `SessionConfig`, loaded from and saved to the store |
//! | [`session`] | `Session`: bomb machine, autosave, saved bombs, solving |
//! | [`timer`] | `TimerService`: tokio task driving the countdown |

pub mod config;
pub mod session;
pub mod timer;

pub use config::SessionConfig;
pub use session::{Session, SessionError, Snapshot};
pub use timer::{ServiceError, SessionEvent, SessionHandle, TimerService};
