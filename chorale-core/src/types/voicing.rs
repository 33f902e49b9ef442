//! Voiced progressions: four concrete pitches per chord
//!
//! A [`Voicing`] is only constructible with soprano > alto > tenor > bass, so
//! every voicing held by a [`VoicedProgression`] satisfies the no-crossing
//! rule. Range problems are not errors; they travel alongside the result as
//! [`VoicingWarning`]s.

use crate::types::formation::Voice;
use crate::types::note::Note;
use anyhow::{bail, Result};
#[cfg(feature = "colored")]
use colored::*;
use std::fmt;

/// One pitch per voice for a single chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Voicing {
    soprano: Note,
    alto: Note,
    tenor: Note,
    bass: Note,
}

impl Voicing {
    /// Fails unless soprano > alto > tenor > bass strictly
    pub fn new(soprano: Note, alto: Note, tenor: Note, bass: Note) -> Result<Self> {
        let pitches = [soprano.midi(), alto.midi(), tenor.midi(), bass.midi()];
        if !pitches.windows(2).all(|w| w[0] > w[1]) {
            bail!(
                "Voices cross or overlap: S={} A={} T={} B={}",
                soprano.scientific(),
                alto.scientific(),
                tenor.scientific(),
                bass.scientific()
            );
        }
        Ok(Voicing {
            soprano,
            alto,
            tenor,
            bass,
        })
    }

    pub fn soprano(&self) -> Note {
        self.soprano
    }

    pub fn alto(&self) -> Note {
        self.alto
    }

    pub fn tenor(&self) -> Note {
        self.tenor
    }

    pub fn bass(&self) -> Note {
        self.bass
    }

    pub fn get(&self, voice: Voice) -> Note {
        match voice {
            Voice::Soprano => self.soprano,
            Voice::Alto => self.alto,
            Voice::Tenor => self.tenor,
            Voice::Bass => self.bass,
        }
    }

    /// MIDI pitches, soprano first
    pub fn pitches(&self) -> [i32; 4] {
        [
            self.soprano.midi(),
            self.alto.midi(),
            self.tenor.midi(),
            self.bass.midi(),
        ]
    }

    /// Total absolute semitone motion of all four voices from `previous`
    pub fn movement_from(&self, previous: &Voicing) -> u32 {
        self.pitches()
            .iter()
            .zip(previous.pitches())
            .map(|(a, b)| (a - b).unsigned_abs())
            .sum()
    }
}

impl fmt::Display for Voicing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S={} A={} T={} B={}",
            self.soprano.scientific(),
            self.alto.scientific(),
            self.tenor.scientific(),
            self.bass.scientific()
        )
    }
}

/// Why a voiced result is degraded
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningKind {
    /// Nothing to voice
    EmptyProgression,
    /// The voice sits outside its tessitura
    OutOfRange { pitch: i32, min: i32, max: i32 },
    /// The voice had to take a pitch outside the chord to stay in range
    ClampedOffChord { pitch: i32 },
    /// The exhaustive search found no candidate and greedy was used instead
    ExhaustiveFallback,
    /// A voicing could not be built at all
    Degenerate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoicingWarning {
    pub chord_index: Option<usize>,
    pub voice: Option<Voice>,
    pub kind: WarningKind,
}

impl VoicingWarning {
    pub fn whole(kind: WarningKind) -> Self {
        VoicingWarning {
            chord_index: None,
            voice: None,
            kind,
        }
    }

    pub fn at(chord_index: usize, voice: Voice, kind: WarningKind) -> Self {
        VoicingWarning {
            chord_index: Some(chord_index),
            voice: Some(voice),
            kind,
        }
    }
}

impl fmt::Display for VoicingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(i) = self.chord_index {
            write!(f, "chord {}", i + 1)?;
            if let Some(v) = self.voice {
                write!(f, " {}", v)?;
            }
            write!(f, ": ")?;
        }
        match &self.kind {
            WarningKind::EmptyProgression => write!(f, "empty progression, nothing to voice"),
            WarningKind::OutOfRange { pitch, min, max } => {
                write!(f, "pitch {} outside tessitura {}..={}", pitch, min, max)
            }
            WarningKind::ClampedOffChord { pitch } => {
                write!(f, "clamped to {} which is not a chord tone", pitch)
            }
            WarningKind::ExhaustiveFallback => {
                write!(f, "no voicing satisfies every range, fell back to greedy")
            }
            WarningKind::Degenerate(reason) => write!(f, "{}", reason),
        }
    }
}

/// The voice-leading result for one progression
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoicedProgression {
    voicings: Vec<Voicing>,
    warnings: Vec<VoicingWarning>,
}

impl VoicedProgression {
    pub fn new(voicings: Vec<Voicing>, warnings: Vec<VoicingWarning>) -> Self {
        VoicedProgression { voicings, warnings }
    }

    /// An empty result explained by a single warning
    pub fn empty(kind: WarningKind) -> Self {
        VoicedProgression {
            voicings: Vec::new(),
            warnings: vec![VoicingWarning::whole(kind)],
        }
    }

    pub fn len(&self) -> usize {
        self.voicings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voicings.is_empty()
    }

    pub fn voicings(&self) -> &[Voicing] {
        &self.voicings
    }

    pub fn get(&self, index: usize) -> Option<&Voicing> {
        self.voicings.get(index)
    }

    pub fn warnings(&self) -> &[VoicingWarning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether a range warning was reported for this voice at this chord
    pub fn is_flagged(&self, chord_index: usize, voice: Voice) -> bool {
        self.warnings
            .iter()
            .any(|w| w.chord_index == Some(chord_index) && w.voice == Some(voice))
    }

    /// Semitone motion between each pair of consecutive voicings
    pub fn movements(&self) -> Vec<u32> {
        self.voicings
            .windows(2)
            .map(|w| w[1].movement_from(&w[0]))
            .collect()
    }

    pub fn total_movement(&self) -> u32 {
        self.movements().iter().sum()
    }
}

impl fmt::Display for VoicedProgression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for voice in Voice::ALL {
            write!(f, "{:<8}", voice.name())?;
            for voicing in &self.voicings {
                write!(f, " {:>4}", voicing.get(voice).scientific())?;
            }
            writeln!(f)?;
        }
        let summary = format!(
            "total movement: {} semitones, {} warning(s)",
            self.total_movement(),
            self.warnings.len()
        );
        #[cfg(feature = "colored")]
        let summary = if self.warnings.is_empty() {
            summary.green().to_string()
        } else {
            summary.yellow().to_string()
        };
        write!(f, "{}", summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(s: &str) -> Note {
        s.parse().unwrap()
    }

    #[test]
    fn test_voicing_requires_strict_order() {
        assert!(Voicing::new(note("E4"), note("C4"), note("G3"), note("C3")).is_ok());
        assert!(Voicing::new(note("C4"), note("C4"), note("G3"), note("C3")).is_err());
        assert!(Voicing::new(note("E4"), note("G4"), note("G3"), note("C3")).is_err());
    }

    #[test]
    fn test_movement() {
        let a = Voicing::new(note("E4"), note("C4"), note("G3"), note("C3")).unwrap();
        let b = Voicing::new(note("D4"), note("B3"), note("G3"), note("G2")).unwrap();
        assert_eq!(b.movement_from(&a), 2 + 1 + 0 + 5);

        let voiced = VoicedProgression::new(vec![a, b, a], Vec::new());
        assert_eq!(voiced.movements(), vec![8, 8]);
        assert_eq!(voiced.total_movement(), 16);
        assert!(!voiced.has_warnings());
    }

    #[test]
    fn test_empty_result_carries_warning() {
        let voiced = VoicedProgression::empty(WarningKind::EmptyProgression);
        assert!(voiced.is_empty());
        assert_eq!(voiced.warnings()[0].kind, WarningKind::EmptyProgression);
    }
}
