//! Spoodblort engine: deterministic tick combat, matchmaking and the
//! tournament calendar.
//!
//! Everything in this crate is synchronous and free of I/O. The server crate
//! owns persistence, timers and spectators; the engine only answers "what
//! happens next" for a given seed.

pub mod calendar;
pub mod combat;
pub mod fight;
pub mod fighter;
pub mod matchup;
pub mod rng;
