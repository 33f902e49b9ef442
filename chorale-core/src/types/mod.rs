// chorale-core/src/types/mod.rs

pub mod chord;
pub mod formation;
pub mod note;
pub mod progression;
pub mod roman_numeral;
pub mod voicing;

pub use chord::{HarmonicFunction, ResolvedChord};
pub use formation::{Clef, Formation, Tessitura, Tessituras, Voice};
pub use note::{parse_tonality, Note, Spelling, TONALITIES};
pub use progression::{Progression, ProgressionSnapshot};
pub use roman_numeral::*;
pub use voicing::{VoicedProgression, Voicing, VoicingWarning, WarningKind};
