use crate::types::note::Note;
use crate::types::roman_numeral::{DegreeToken, Inversion, Mode, ScaleDegree};
use anyhow::{anyhow, Result};
use std::fmt;

/// The role a chord plays in establishing or resolving tension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

impl HarmonicFunction {
    pub fn of(degree: ScaleDegree) -> Self {
        match degree {
            ScaleDegree::I | ScaleDegree::III | ScaleDegree::VI => HarmonicFunction::Tonic,
            ScaleDegree::II | ScaleDegree::IV => HarmonicFunction::Subdominant,
            ScaleDegree::V | ScaleDegree::VII => HarmonicFunction::Dominant,
        }
    }

    /// Short tag used on scores: T, SD or D
    pub fn abbreviation(&self) -> &'static str {
        match self {
            HarmonicFunction::Tonic => "T",
            HarmonicFunction::Subdominant => "SD",
            HarmonicFunction::Dominant => "D",
        }
    }
}

impl fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HarmonicFunction::Tonic => "Tonic",
            HarmonicFunction::Subdominant => "Subdominant",
            HarmonicFunction::Dominant => "Dominant",
        };
        write!(f, "{}", name)
    }
}

/// A degree token resolved against a key: labels, triad tones and function.
///
/// Immutable once built. `pitch_classes` always holds four slots with exactly
/// three distinct pitch classes, ordered from the bass upward for the inversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChord {
    token: DegreeToken,
    roman_label: String,
    chord_symbol: String,
    triad: [Note; 3], // root, third, fifth
    pitch_classes: [Note; 4],
    function: HarmonicFunction,
}

impl ResolvedChord {
    /// Build a chord from its root-position triad.
    ///
    /// Fails if the three tones are not distinct pitch classes stacked in thirds.
    pub fn from_triad(token: DegreeToken, mode: Mode, triad: [Note; 3]) -> Result<Self> {
        let [root, third, fifth] = triad;
        if root.same_pitch_class(&third)
            || root.same_pitch_class(&fifth)
            || third.same_pitch_class(&fifth)
        {
            return Err(anyhow!("Triad for {} has repeated pitch classes", token));
        }

        let suffix = match (third - root, fifth - root) {
            (4, 7) => "",
            (3, 7) => "m",
            (3, 6) => "dim",
            (4, 8) => "aug",
            (a, b) => {
                return Err(anyhow!(
                    "Triad for {} is not stacked in thirds ({} and {} semitones)",
                    token,
                    a,
                    b
                ))
            }
        };

        let base_symbol = format!("{}{}", root.name(), suffix);
        let (pitch_classes, chord_symbol) = match token.inversion {
            Inversion::Root => ([root, third, fifth, root], base_symbol),
            Inversion::First => (
                [third, fifth, root, root],
                format!("{}/{}", base_symbol, third.name()),
            ),
            Inversion::Second => (
                [fifth, root, third, fifth],
                format!("{}/{}", base_symbol, fifth.name()),
            ),
        };

        let roman_label = format!("{}{}", token.degree.label(mode), token.inversion.figure());

        Ok(ResolvedChord {
            token,
            roman_label,
            chord_symbol,
            triad,
            pitch_classes,
            function: HarmonicFunction::of(token.degree),
        })
    }

    pub fn token(&self) -> DegreeToken {
        self.token
    }

    pub fn inversion(&self) -> Inversion {
        self.token.inversion
    }

    /// Roman numeral with figured-bass suffix, e.g. "V6/4"
    pub fn roman_label(&self) -> &str {
        &self.roman_label
    }

    /// Chord symbol, with slash bass for inversions, e.g. "G/D"
    pub fn chord_symbol(&self) -> &str {
        &self.chord_symbol
    }

    pub fn function(&self) -> HarmonicFunction {
        self.function
    }

    pub fn root(&self) -> Note {
        self.triad[0]
    }

    pub fn third(&self) -> Note {
        self.triad[1]
    }

    pub fn fifth(&self) -> Note {
        self.triad[2]
    }

    /// Root-position triad: root, third, fifth
    pub fn triad(&self) -> [Note; 3] {
        self.triad
    }

    /// Four slots, bass first, one tone doubled
    pub fn pitch_classes(&self) -> &[Note; 4] {
        &self.pitch_classes
    }

    /// The chord tone the inversion puts in the bass
    pub fn bass_tone(&self) -> Note {
        self.pitch_classes[0]
    }

    /// Pitch classes left for soprano, alto and tenor once the bass is placed
    pub fn upper_pool(&self) -> Vec<Note> {
        self.pitch_classes[1..].to_vec()
    }

    /// Whether the two triads share at least one pitch class
    pub fn shares_tone_with(&self, other: &ResolvedChord) -> bool {
        self.triad
            .iter()
            .any(|n| other.triad.iter().any(|m| n.same_pitch_class(m)))
    }

    pub fn contains_pitch_class(&self, pitch_class: u8) -> bool {
        self.triad.iter().any(|n| n.pitch_class() == pitch_class)
    }
}

impl fmt::Display for ResolvedChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let notes: Vec<String> = self.pitch_classes.iter().map(|n| n.to_string()).collect();
        write!(
            f,
            "{} ({}): [{}]",
            self.roman_label,
            self.chord_symbol,
            notes.join(", ")
        )
    }
}
