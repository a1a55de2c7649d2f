//! Pure defusal logic for the KTANE assistant.
//!
//! This crate contains everything that decides what the player should do,
//! independent of storage, async runtime, or presentation. Functions take
//! plain data and return results, so every rule table is unit-testable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bomb`] | Bomb record, serial number, indicators, ports, predicates |
//! | [`form`] | Creation/edit form, all-errors validation, partial updates |
//! | [`modules`] | Per-module rule engines (3 structured, 4 narrative) |
//! | [`state`] | Action reducer, `BombMachine`, defusal outcome |
//! | [`steps`] | Instruction step model shared by every module |
//! | [`timer`] | `m:ss` countdown value and fixed one-second tick |

pub mod bomb;
pub mod form;
pub mod modules;
pub mod state;
pub mod steps;
pub mod timer;
