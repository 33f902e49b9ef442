use anyhow::{anyhow, Result};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Represents a musical note using chromatic representation (0-11) plus an octave.
/// 0=C, 1=C#/Db, 2=D, 3=D#/Eb, 4=E, 5=F, 6=F#/Gb, 7=G, 8=G#/Ab, 9=A, 10=A#/Bb, 11=B
///
/// Octaves follow scientific pitch notation, so middle C is `C4` and MIDI 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note {
    pitch_class: u8, // 0-11 chromatic representation
    octave: i8,      // Standard scientific pitch notation (4 = middle C)
    spelling: Spelling,
}

/// How accidentals are written when a note is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Spelling {
    #[default]
    Sharp,
    Flat,
}

/// The twelve tonalities offered to callers, in chromatic order
pub const TONALITIES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    /// Create a new note from chromatic pitch class (0-11), defaulting to octave 4
    pub fn new(pitch_class: u8) -> Result<Self> {
        Self::new_with_octave(pitch_class, 4)
    }

    /// Create a new note with explicit octave
    pub fn new_with_octave(pitch_class: u8, octave: i8) -> Result<Self> {
        if pitch_class > 11 {
            return Err(anyhow!("Pitch class must be 0-11, got {}", pitch_class));
        }

        Ok(Note {
            pitch_class,
            octave,
            spelling: Spelling::Sharp,
        })
    }

    /// Build a note from a MIDI number, spelled with the given preference
    pub fn from_midi(midi: i32, spelling: Spelling) -> Self {
        Note {
            pitch_class: midi.rem_euclid(12) as u8,
            octave: (midi.div_euclid(12) - 1) as i8,
            spelling,
        }
    }

    /// Get the chromatic pitch class (0-11)
    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn spelling(&self) -> Spelling {
        self.spelling
    }

    /// MIDI-style pitch number (C4 = 60)
    pub fn midi(&self) -> i32 {
        (self.octave as i32 + 1) * 12 + self.pitch_class as i32
    }

    /// Same pitch class, different octave
    pub fn with_octave(self, octave: i8) -> Self {
        Note { octave, ..self }
    }

    /// Same pitch, different accidental spelling
    pub fn respelled(self, spelling: Spelling) -> Self {
        Note { spelling, ..self }
    }

    /// Whether two notes share a pitch class, ignoring octave and spelling
    pub fn same_pitch_class(&self, other: &Note) -> bool {
        self.pitch_class == other.pitch_class
    }

    /// The note name without octave, e.g. "F#" or "Bb"
    pub fn name(&self) -> &'static str {
        match self.spelling {
            Spelling::Sharp => Self::sharp_name(self.pitch_class),
            Spelling::Flat => Self::flat_name(self.pitch_class),
        }
    }

    /// The note name with octave always present, e.g. "C4"
    pub fn scientific(&self) -> String {
        format!("{}{}", self.name(), self.octave)
    }

    /// Check if a pitch class corresponds to a natural note (white key)
    fn is_natural_note(pitch_class: u8) -> bool {
        matches!(pitch_class, 0 | 2 | 4 | 5 | 7 | 9 | 11) // C, D, E, F, G, A, B
    }

    fn sharp_name(pitch_class: u8) -> &'static str {
        match pitch_class {
            0 => "C",
            1 => "C#",
            2 => "D",
            3 => "D#",
            4 => "E",
            5 => "F",
            6 => "F#",
            7 => "G",
            8 => "G#",
            9 => "A",
            10 => "A#",
            _ => "B",
        }
    }

    fn flat_name(pitch_class: u8) -> &'static str {
        match pitch_class {
            1 => "Db",
            3 => "Eb",
            6 => "Gb",
            8 => "Ab",
            10 => "Bb",
            pc => Self::sharp_name(pc),
        }
    }

    /// Transpose the note by a number of semitones, keeping its spelling preference
    pub fn transpose(self, semitones: i8) -> Note {
        Note::from_midi(self.midi() + semitones as i32, self.spelling)
    }

    /// Smallest distance between two pitch classes, in semitones (0-6)
    pub fn pitch_class_distance(&self, other: &Note) -> u8 {
        let diff = (self.pitch_class as i8 - other.pitch_class as i8).rem_euclid(12) as u8;
        diff.min(12 - diff)
    }
}

/// Parse a tonality name into its tonic, rejecting anything with an octave.
///
/// F and the flat-named keys spell accidentals with flats; every other key uses sharps.
pub fn parse_tonality(name: &str) -> Result<Note> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_digit() || c == '-') {
        return Err(anyhow!("Unsupported tonality: '{}'", name));
    }
    let tonic: Note = trimmed
        .parse()
        .map_err(|_| anyhow!("Unsupported tonality: '{}'", name))?;
    let spelling = if tonic.pitch_class == 5 || tonic.spelling == Spelling::Flat {
        Spelling::Flat
    } else {
        Spelling::Sharp
    };
    Ok(tonic.respelled(spelling))
}

impl FromStr for Note {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();

        let letter = chars
            .next()
            .ok_or_else(|| anyhow!("Empty note name"))?
            .to_ascii_uppercase();
        let rest = chars.as_str();

        let base = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(anyhow!("Invalid note name: {}", s)),
        };

        // Accidental is one char: '#' or 'b' (lowercase b, so "Bb" and "B" stay distinct)
        let (pitch_class, spelling, octave_part) = if let Some(r) = rest.strip_prefix('#') {
            ((base + 1) % 12, Spelling::Sharp, r)
        } else if let Some(r) = rest.strip_prefix('b') {
            ((base + 11) % 12, Spelling::Flat, r)
        } else {
            (base, Spelling::Sharp, rest)
        };

        let octave = if octave_part.is_empty() {
            4
        } else {
            octave_part
                .parse::<i8>()
                .map_err(|_| anyhow!("Invalid octave: {}", octave_part))?
        };

        // A natural written as a flat spelling (Cb, Fb) keeps sharp display for simplicity
        let spelling = if Self::is_natural_note(pitch_class) {
            Spelling::Sharp
        } else {
            spelling
        };

        Ok(Note {
            pitch_class,
            octave,
            spelling,
        })
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;

        // Only display octave if it's not 4, for cleaner pitch-class output
        if self.octave != 4 {
            write!(f, "{}", self.octave)
        } else {
            Ok(())
        }
    }
}

// Arithmetic operations for transposition
impl Add<i8> for Note {
    type Output = Note;

    fn add(self, semitones: i8) -> Self::Output {
        self.transpose(semitones)
    }
}

impl Sub<i8> for Note {
    type Output = Note;

    fn sub(self, semitones: i8) -> Self::Output {
        self.transpose(-semitones)
    }
}

// Calculate ascending interval between two notes
impl Sub<Note> for Note {
    type Output = i8;

    fn sub(self, other: Note) -> Self::Output {
        let diff = (self.pitch_class as i8) - (other.pitch_class as i8);
        if diff < 0 {
            diff + 12
        } else {
            diff
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Note {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.scientific())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Note {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let c = Note::new(0).unwrap();
        assert_eq!(c.pitch_class(), 0);

        let invalid = Note::new(12);
        assert!(invalid.is_err());
    }

    #[test]
    fn test_note_parsing() {
        let c: Note = "C".parse().unwrap();
        assert_eq!(c.pitch_class(), 0);

        let cs: Note = "C#".parse().unwrap();
        assert_eq!(cs.pitch_class(), 1);

        let db: Note = "Db".parse().unwrap();
        assert_eq!(db.pitch_class(), 1);

        let b: Note = "B".parse().unwrap();
        assert_eq!(b.pitch_class(), 11);

        let invalid: Result<Note> = "H".parse();
        assert!(invalid.is_err());
    }

    #[test]
    fn test_note_display() {
        let db: Note = "Db".parse().unwrap();
        assert_eq!(format!("{}", db), "Db");

        let g3: Note = "G3".parse().unwrap();
        assert_eq!(format!("{}", g3), "G3");
        assert_eq!(g3.scientific(), "G3");
    }

    #[test]
    fn test_midi_round_trip_through_octaves() {
        let c4: Note = "C4".parse().unwrap();
        assert_eq!(c4.midi(), 60);

        let a0: Note = "A0".parse().unwrap();
        assert_eq!(a0.midi(), 21);

        let from = Note::from_midi(55, Spelling::Sharp);
        assert_eq!(from.scientific(), "G3");

        let b3 = c4 - 1;
        assert_eq!(b3.pitch_class(), 11);
        assert_eq!(b3.octave(), 3);
    }

    #[test]
    fn test_interval_calculation() {
        let c: Note = "C".parse().unwrap();
        let e: Note = "E".parse().unwrap();
        let g: Note = "G".parse().unwrap();
        assert_eq!(e - c, 4);
        assert_eq!(c - g, 5);
        assert_eq!(c.pitch_class_distance(&g), 5);
    }

    #[test]
    fn test_tonality_spelling() {
        assert_eq!(parse_tonality("F").unwrap().spelling(), Spelling::Flat);
        assert_eq!(parse_tonality("Bb").unwrap().spelling(), Spelling::Flat);
        assert_eq!(parse_tonality("F#").unwrap().spelling(), Spelling::Sharp);
        assert_eq!(parse_tonality("c").unwrap().pitch_class(), 0);

        assert!(parse_tonality("H").is_err());
        assert!(parse_tonality("C4").is_err());
        assert!(parse_tonality("").is_err());
    }
}
