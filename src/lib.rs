//! # Chorale
//!
//! Interactive front end for `chorale-core`: generate diatonic progressions
//! for a key, step through them, and see each one voiced for soprano, alto,
//! tenor and bass in a chosen ensemble.
//!
//! ## Modules
//!
//! - `commands`: The REPL command registry and its handlers.
//! - `repl`: The Read-Eval-Print Loop.

pub mod commands;
pub mod repl;

pub use chorale_core::{
    generate, Formation, Progression, Session, SessionConfig, Strategy, VoicedProgression,
    VoicingAlgorithm,
};
