//! # Chorale Core
//!
//! Four-part harmony for tonal music education. Generates diatonic chord
//! progressions under classical constraints and voices them for soprano, alto,
//! tenor and bass. No terminal or file I/O lives here.
//!
//! ## Features
//!
//! - **serde**: Enable JSON serialization of snapshots for export
//! - **colored**: Enable colored terminal output for voiced progressions
//!
//! ## Example
//!
//! ```ignore
//! use chorale_core::generator::{generate, GeneratorConfig, Strategy};
//! use chorale_core::voice_leading::{assign, VoicingOptions};
//! use chorale_core::types::Tessituras;
//!
//! let mut search = generate("C", 4, Strategy::Tonal, GeneratorConfig::default())?;
//! let progression = search.next().unwrap();
//! let voiced = assign(&progression, &Tessituras::default(), &VoicingOptions::default())?;
//! println!("{}", voiced);
//! ```

pub mod generator;
pub mod lookup;
pub mod session;
pub mod types;
pub mod voice_leading;

// Re-export commonly used types
pub use generator::{generate, GeneratorConfig, ProgressionStrategy, Strategy};
pub use lookup::{lookup, lookup_degree};
pub use session::{Entry, Session, SessionConfig, SessionState};
pub use types::{
    DegreeToken, Formation, Mode, Note, Progression, ResolvedChord, Tessituras, VoicedProgression,
    Voicing,
};
pub use voice_leading::{assign, VoicingAlgorithm, VoicingOptions};
