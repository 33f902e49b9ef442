use crate::lookup::lookup;
use crate::types::chord::ResolvedChord;
use crate::types::note::{parse_tonality, Note};
use crate::types::roman_numeral::{DegreeToken, Mode};
use anyhow::Result;
use std::fmt;
use std::ops::Index;

/// Represents a sequence of resolved chords in one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progression {
    tonic: Note,
    mode: Mode,
    chords: Vec<ResolvedChord>,
}

/// Read-only view handed to rendering and export collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressionSnapshot {
    pub tonality: String,
    pub mode: Mode,
    pub roman_labels: Vec<String>,
    pub chord_symbols: Vec<String>,
    pub pitch_class_sets: Vec<Vec<String>>,
    pub harmonic_functions: Vec<Vec<String>>,
}

impl Progression {
    /// Create a progression from already resolved chords
    pub fn from_chords(tonic: Note, mode: Mode, chords: Vec<ResolvedChord>) -> Self {
        Progression {
            tonic,
            mode,
            chords,
        }
    }

    /// Resolve every token through the harmonic lookup
    pub fn from_tokens(tokens: &[DegreeToken], tonic: Note, mode: Mode) -> Result<Self> {
        let chords = tokens
            .iter()
            .map(|&token| lookup(token, tonic, mode))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_chords(tonic, mode, chords))
    }

    /// Parse a whitespace or dash separated list of tokens, e.g. "I iii/1 V I"
    pub fn parse(tokens: &str, tonality: &str, mode: Mode) -> Result<Self> {
        let tonic = parse_tonality(tonality)?;
        let tokens = tokens
            .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<DegreeToken>>>()?;
        Self::from_tokens(&tokens, tonic, mode)
    }

    pub fn tonic(&self) -> Note {
        self.tonic
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get the number of chords in the progression
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    /// Check if the progression is empty
    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Get an iterator over the chords in the progression
    pub fn chords(&self) -> impl Iterator<Item = &ResolvedChord> {
        self.chords.iter()
    }

    /// Get a reference to a specific chord by index
    pub fn get(&self, index: usize) -> Option<&ResolvedChord> {
        self.chords.get(index)
    }

    pub fn first(&self) -> Option<&ResolvedChord> {
        self.chords.first()
    }

    pub fn last(&self) -> Option<&ResolvedChord> {
        self.chords.last()
    }

    pub fn tokens(&self) -> Vec<DegreeToken> {
        self.chords.iter().map(|c| c.token()).collect()
    }

    pub fn roman_labels(&self) -> Vec<String> {
        self.chords
            .iter()
            .map(|c| c.roman_label().to_string())
            .collect()
    }

    pub fn chord_symbols(&self) -> Vec<String> {
        self.chords
            .iter()
            .map(|c| c.chord_symbol().to_string())
            .collect()
    }

    /// Count of chords not in root position
    pub fn inversion_count(&self) -> usize {
        self.chords
            .iter()
            .filter(|c| c.inversion().is_inverted())
            .count()
    }

    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            tonality: self.tonic.name().to_string(),
            mode: self.mode,
            roman_labels: self.roman_labels(),
            chord_symbols: self.chord_symbols(),
            pitch_class_sets: self
                .chords
                .iter()
                .map(|c| c.pitch_classes().iter().map(|n| n.to_string()).collect())
                .collect(),
            harmonic_functions: self
                .chords
                .iter()
                .map(|c| vec![c.function().abbreviation().to_string()])
                .collect(),
        }
    }
}

impl Index<usize> for Progression {
    type Output = ResolvedChord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.chords[index]
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.roman_labels().join(" → "))
    }
}
